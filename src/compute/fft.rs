//! FFT-based circular correlation of a field with a kernel.
//!
//! Uses rustfft for O(N log N) correlation instead of the O(N * K) direct path.
//! Results agree with the direct path up to floating-point rounding.

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::Kernel;

/// Circular correlator with cached FFT plans and a precomputed kernel spectrum.
pub struct FftConvolver {
    size: usize,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
    kernel_freq: Vec<Complex<f64>>,
    buffer: Vec<Complex<f64>>,
}

impl FftConvolver {
    /// Prepare a correlator for fields of `size` samples.
    pub fn new(kernel: &Kernel, size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);

        // Reverse the kernel around sample zero so the circular convolution
        // computes output[i] = sum_o input[i + o] * kernel(o).
        let mut kernel_freq = vec![Complex::new(0.0, 0.0); size];
        let left = kernel.range.left as isize;
        for (k, &value) in kernel.data.iter().enumerate() {
            let offset = k as isize - left;
            let idx = (-offset).rem_euclid(size as isize) as usize;
            kernel_freq[idx].re += value;
        }
        fft.process(&mut kernel_freq);

        Self {
            size,
            fft,
            ifft,
            kernel_freq,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Correlate `input` with the kernel.
    pub fn convolve(&mut self, input: &[f64]) -> Vec<f64> {
        let mut output = vec![0.0; self.size];
        self.convolve_into(input, &mut output);
        output
    }

    /// Correlate into a pre-allocated buffer.
    pub fn convolve_into(&mut self, input: &[f64], output: &mut [f64]) {
        assert_eq!(input.len(), self.size);

        for (c, &x) in self.buffer.iter_mut().zip(input) {
            *c = Complex::new(x, 0.0);
        }
        self.fft.process(&mut self.buffer);

        for (c, k) in self.buffer.iter_mut().zip(&self.kernel_freq) {
            *c *= k;
        }
        self.ifft.process(&mut self.buffer);

        let scale = 1.0 / self.size as f64;
        for (out, c) in output.iter_mut().zip(&self.buffer) {
            *out = c.re * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{convolve_valid, create_extended_index, obtain_circular_vector};
    use crate::schema::KernelOptions;
    use proptest::prelude::*;

    #[test]
    fn test_convolution_with_delta() {
        let kernel = Kernel::gauss(0.01, 1.0, 16, &KernelOptions::default());
        let mut convolver = FftConvolver::new(&kernel, 16);

        let input: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let output = convolver.convolve(&input);
        for (o, i) in output.iter().zip(&input) {
            assert!((o - i).abs() < 1e-9);
        }
    }

    #[test]
    fn test_asymmetric_kernel_direction() {
        let kernel = Kernel {
            data: vec![1.0, 2.0, 3.0],
            range: crate::compute::KernelRange { left: 1, right: 1 },
            circular: true,
        };
        let mut convolver = FftConvolver::new(&kernel, 6);
        let output = convolver.convolve(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let expected = [2.0, 1.0, 0.0, 0.0, 0.0, 3.0];
        for (o, e) in output.iter().zip(&expected) {
            assert!((o - e).abs() < 1e-9, "{output:?}");
        }
    }

    proptest! {
        #[test]
        fn fft_matches_direct(
            input in prop::collection::vec(-10.0f64..10.0, 8..80),
            width in 0.5f64..6.0,
        ) {
            let kernel = Kernel::mexican_hat(width, 5.0, width * 2.0, 3.0, input.len(), &KernelOptions::default());
            let index = create_extended_index(input.len(), kernel.range);
            let direct = convolve_valid(&obtain_circular_vector(&index, &input), &kernel.data);

            let mut convolver = FftConvolver::new(&kernel, input.len());
            let fast = convolver.convolve(&input);
            for (a, b) in direct.iter().zip(&fast) {
                prop_assert!((a - b).abs() < 1e-8);
            }
        }
    }
}
