//! Kernel elements: local interaction profiles correlated with their input.
//!
//! All three kernel types share the same machinery: a sampled [`Kernel`],
//! a wrap table for circular fields, and an optional FFT path. They differ
//! only in how the profile is built and whether a global term is added.

use std::fmt;

use super::{Dynamics, Io, KERNEL};
use crate::compute::{
    FftConvolver, Kernel, convolve_valid_into, create_extended_index,
    obtain_circular_vector_into, obtain_padded_vector_into,
};
use crate::schema::{
    ConvolutionMethod, ElementParameters, GaussKernelParameters, KernelOptions,
    LateralInteractionsParameters, MexicanHatKernelParameters,
};

/// Correlation state shared by every kernel element.
pub struct KernelCore {
    kernel: Kernel,
    extended_index: Vec<usize>,
    extended: Vec<f64>,
    fft: Option<FftConvolver>,
    amplitude_global: f64,
}

impl fmt::Debug for KernelCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelCore")
            .field("kernel", &self.kernel)
            .field("fft", &self.fft.is_some())
            .field("amplitude_global", &self.amplitude_global)
            .finish_non_exhaustive()
    }
}

impl KernelCore {
    fn new(kernel: Kernel, size: usize, options: &KernelOptions, amplitude_global: f64) -> Self {
        let fft = (options.method == ConvolutionMethod::Fft && kernel.circular)
            .then(|| FftConvolver::new(&kernel, size));
        let extended_index = if kernel.circular {
            create_extended_index(size, kernel.range)
        } else {
            Vec::new()
        };

        Self {
            extended: vec![0.0; kernel.range.extended_len(size)],
            extended_index,
            kernel,
            fft,
            amplitude_global,
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// `output[i] = (input correlated with kernel)[i] + amplitude_global * sum(input)`.
    pub fn apply(&mut self, input: &[f64], output: &mut [f64]) {
        match &mut self.fft {
            Some(fft) => fft.convolve_into(input, output),
            None => {
                if self.kernel.circular {
                    obtain_circular_vector_into(&self.extended_index, input, &mut self.extended);
                } else {
                    obtain_padded_vector_into(self.kernel.range, input, &mut self.extended);
                }
                convolve_valid_into(&self.extended, &self.kernel.data, output);
            }
        }

        if self.amplitude_global != 0.0 {
            let global = self.amplitude_global * input.iter().sum::<f64>();
            for out in output.iter_mut() {
                *out += global;
            }
        }
    }
}

macro_rules! kernel_element {
    ($(#[$meta:meta])* $name:ident, $params:ident, $variant:ident, |$p:ident, $size:ident| $build:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            parameters: $params,
            core: KernelCore,
        }

        impl $name {
            pub(crate) fn new($p: $params, $size: usize) -> Self {
                let core = $build;
                Self { parameters: $p, core }
            }

            pub fn kernel(&self) -> &Kernel {
                self.core.kernel()
            }
        }

        impl Dynamics for $name {
            fn init(&mut self, io: Io<'_>) {
                io.output.fill(0.0);
            }

            fn step(&mut self, io: Io<'_>, _t: f64, _delta_t: f64) {
                self.core.apply(io.input, io.output);
            }

            fn component(&self, name: &str) -> Option<&[f64]> {
                (name == KERNEL).then_some(self.core.kernel.data.as_slice())
            }

            fn component_names(&self) -> &'static [&'static str] {
                &[KERNEL]
            }

            fn parameters(&self) -> ElementParameters {
                ElementParameters::$variant(self.parameters.clone())
            }
        }
    };
}

kernel_element!(
    /// Single Gaussian kernel with an optional global term.
    GaussKernel,
    GaussKernelParameters,
    GaussKernel,
    |p, size| {
        let kernel = Kernel::gauss(p.width, p.amplitude, size, &p.options);
        KernelCore::new(kernel, size, &p.options, p.amplitude_global)
    }
);

kernel_element!(
    /// Local excitation surrounded by inhibition.
    MexicanHatKernel,
    MexicanHatKernelParameters,
    MexicanHatKernel,
    |p, size| {
        let kernel = Kernel::mexican_hat(
            p.width_exc,
            p.amplitude_exc,
            p.width_inh,
            p.amplitude_inh,
            size,
            &p.options,
        );
        KernelCore::new(kernel, size, &p.options, 0.0)
    }
);

kernel_element!(
    /// Mexican-hat profile plus all-to-all global interaction.
    LateralInteractions,
    LateralInteractionsParameters,
    LateralInteractions,
    |p, size| {
        let kernel = Kernel::mexican_hat(
            p.width_exc,
            p.amplitude_exc,
            p.width_inh,
            p.amplitude_inh,
            size,
            &p.options,
        );
        KernelCore::new(kernel, size, &p.options, p.amplitude_global)
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementId, INPUT, OUTPUT, SourceInfo};
    use crate::schema::{ElementCommonParameters, ElementDimensions};

    fn element(size: usize, parameters: impl Into<ElementParameters>) -> Element {
        Element::new(
            ElementId(0),
            &ElementCommonParameters::new("kernel", ElementDimensions::with_size(size)),
            parameters,
        )
        .unwrap()
    }

    /// Feed `values` into the kernel through a self-edge on its input.
    fn run_with_input(element: &mut Element, values: &[f64]) -> Vec<f64> {
        element.init();
        let source = [values.to_vec()];
        element.step(1.0, 1.0, |_, _| Some(source[0].as_slice()));
        element.get_component(OUTPUT).unwrap()
    }

    fn wire_external(element: &mut Element) {
        let size = element.size();
        element
            .register_input(
                SourceInfo {
                    id: ElementId(99),
                    name: "source",
                    component_len: size,
                },
                OUTPUT,
            )
            .unwrap();
    }

    #[test]
    fn test_impulse_kernel_identity() {
        let mut e = element(
            16,
            GaussKernelParameters {
                width: 0.01,
                amplitude: 1.0,
                ..Default::default()
            },
        );
        wire_external(&mut e);
        let input: Vec<f64> = (0..16).map(|i| (i as f64).sin()).collect();
        let output = run_with_input(&mut e, &input);
        for (o, i) in output.iter().zip(&input) {
            assert!((o - i).abs() < 1e-12);
        }
        assert_eq!(e.component(INPUT).unwrap(), &input[..]);
    }

    #[test]
    fn test_global_term_added_uniformly() {
        let mut e = element(
            10,
            GaussKernelParameters {
                width: 0.01,
                amplitude: 0.0,
                amplitude_global: -0.5,
                ..Default::default()
            },
        );
        wire_external(&mut e);
        let output = run_with_input(&mut e, &[1.0; 10]);
        for o in output {
            assert!((o + 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mexican_hat_kernel_symmetric() {
        let e = element(
            101,
            MexicanHatKernelParameters {
                width_exc: 4.0,
                width_inh: 4.0,
                amplitude_exc: 10.0,
                amplitude_inh: 4.0,
                ..Default::default()
            },
        );
        let kernel = e.component(KERNEL).unwrap();
        let l = kernel.len() / 2;
        for k in 0..=l {
            assert_eq!(kernel[l - k], kernel[l + k]);
        }
    }

    #[test]
    fn test_fft_method_matches_direct() {
        let direct_params = LateralInteractionsParameters::default();
        let fft_params = LateralInteractionsParameters {
            options: KernelOptions {
                method: ConvolutionMethod::Fft,
                ..Default::default()
            },
            ..Default::default()
        };
        let input: Vec<f64> = (0..64).map(|i| ((i as f64) * 0.3).cos()).collect();

        let mut direct = element(64, direct_params);
        let mut fast = element(64, fft_params);
        wire_external(&mut direct);
        wire_external(&mut fast);

        let a = run_with_input(&mut direct, &input);
        let b = run_with_input(&mut fast, &input);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_non_circular_kernel_does_not_wrap() {
        let mut e = element(
            20,
            GaussKernelParameters {
                width: 1.0,
                amplitude: 1.0,
                options: KernelOptions {
                    circular: false,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        wire_external(&mut e);
        let mut input = vec![0.0; 20];
        input[0] = 1.0;
        let output = run_with_input(&mut e, &input);
        assert!(output[1] > 0.0);
        assert_eq!(output[19], 0.0);
    }

    #[test]
    fn test_kernel_component_read_only() {
        let mut e = element(20, GaussKernelParameters::default());
        assert!(e.component(KERNEL).is_ok());
        assert!(e.component_mut(KERNEL).is_err());
        assert_eq!(e.component_names(), vec!["input", "output", "kernel"]);
    }
}
