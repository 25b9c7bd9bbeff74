//! Direct "valid" correlation over a pre-extended input.
//!
//! The input is first gathered into an extended buffer of length
//! `range.left + n + range.right`, either by wrapping through a precomputed
//! index table (circular fields) or by zero padding. The correlation itself
//! then runs without any index arithmetic beyond a sliding window.
//!
//! # Complexity
//!
//! O(N * K) where N is the field size and K the kernel length.

use super::KernelRange;

/// Gather `input` through a wrap table built by `create_extended_index`.
#[inline]
pub fn obtain_circular_vector(extended_index: &[usize], input: &[f64]) -> Vec<f64> {
    let mut output = vec![0.0; extended_index.len()];
    obtain_circular_vector_into(extended_index, input, &mut output);
    output
}

/// Gather into a pre-allocated buffer of `extended_index.len()` samples.
#[inline]
pub fn obtain_circular_vector_into(extended_index: &[usize], input: &[f64], output: &mut [f64]) {
    for (out, &idx) in output.iter_mut().zip(extended_index) {
        *out = input[idx];
    }
}

/// Copy `input` into the middle of `output`, zeroing `range.left` samples in
/// front and `range.right` behind.
pub fn obtain_padded_vector_into(range: KernelRange, input: &[f64], output: &mut [f64]) {
    let (front, rest) = output.split_at_mut(range.left);
    let (middle, back) = rest.split_at_mut(input.len());
    front.fill(0.0);
    middle.copy_from_slice(input);
    back.fill(0.0);
}

/// "Valid" correlation: `output[i] = sum_k extended[i + k] * kernel[k]`,
/// producing `extended.len() - kernel.len() + 1` samples.
#[inline]
pub fn convolve_valid(extended: &[f64], kernel: &[f64]) -> Vec<f64> {
    let len = (extended.len() + 1).saturating_sub(kernel.len());
    let mut output = vec![0.0; len];
    convolve_valid_into(extended, kernel, &mut output);
    output
}

/// Perform "valid" correlation into a pre-allocated buffer.
#[inline]
pub fn convolve_valid_into(extended: &[f64], kernel: &[f64], output: &mut [f64]) {
    for (out, window) in output.iter_mut().zip(extended.windows(kernel.len())) {
        *out = window.iter().zip(kernel).map(|(x, k)| x * k).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{Kernel, create_extended_index};
    use crate::schema::KernelOptions;
    use proptest::prelude::*;

    fn correlate_circular(input: &[f64], kernel: &Kernel) -> Vec<f64> {
        let index = create_extended_index(input.len(), kernel.range);
        let extended = obtain_circular_vector(&index, input);
        convolve_valid(&extended, &kernel.data)
    }

    #[test]
    fn test_uniform_input() {
        let options = KernelOptions::default();
        let kernel = Kernel::gauss(2.0, 1.0, 32, &options);
        let input = vec![0.5; 32];
        let output = correlate_circular(&input, &kernel);

        assert_eq!(output.len(), 32);
        for v in output {
            assert!((v - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_impulse_wraps_around() {
        let kernel = Kernel {
            data: vec![1.0, 2.0, 3.0],
            range: KernelRange { left: 1, right: 1 },
            circular: true,
        };
        let mut input = vec![0.0; 6];
        input[0] = 1.0;

        // output[i] = input[i-1] + 2 input[i] + 3 input[i+1]
        let output = correlate_circular(&input, &kernel);
        assert_eq!(output, vec![2.0, 1.0, 0.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_zero_padding_does_not_wrap() {
        let range = KernelRange { left: 1, right: 1 };
        let input = [1.0, 0.0, 0.0, 0.0];
        let mut extended = vec![9.0; range.extended_len(input.len())];
        obtain_padded_vector_into(range, &input, &mut extended);
        assert_eq!(extended, vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

        let output = convolve_valid(&extended, &[1.0, 2.0, 3.0]);
        assert_eq!(output, vec![2.0, 1.0, 0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn impulse_kernel_is_identity(input in prop::collection::vec(-100.0f64..100.0, 1..64)) {
            let kernel = Kernel::gauss(0.01, 1.0, input.len(), &KernelOptions::default());
            let output = correlate_circular(&input, &kernel);
            prop_assert_eq!(output.len(), input.len());
            for (o, i) in output.iter().zip(&input) {
                prop_assert!((o - i).abs() < 1e-12);
            }
        }
    }
}
