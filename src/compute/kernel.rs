//! Kernel sizing, circular index tables and Gaussian sampling.
//!
//! A kernel is sampled at integer offsets from `-range.left` to
//! `+range.right` around its centre. The range is chosen so that samples
//! beyond it are negligible and, for circular fields, so that the kernel
//! never wraps more than once around the field.

use crate::schema::KernelOptions;

/// Half-extents of a kernel's footprint around its centre sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelRange {
    pub left: usize,
    pub right: usize,
}

impl KernelRange {
    /// Number of kernel samples, `left + right + 1`.
    #[inline]
    pub fn len(&self) -> usize {
        self.left + self.right + 1
    }

    /// Length of an input padded for "valid" correlation over `field_size` samples.
    #[inline]
    pub fn extended_len(&self, field_size: usize) -> usize {
        self.left + field_size + self.right
    }
}

/// Footprint of a kernel with dominant width `width`, keeping
/// `cutoff_factor` widths on either side.
///
/// Circular ranges are clipped to `floor((n-1)/2)` on the left and
/// `ceil((n-1)/2)` on the right, so the footprint never exceeds the field.
/// Non-circular ranges are clipped to `n - 1`.
pub fn compute_kernel_range(
    width: f64,
    cutoff_factor: f64,
    field_size: usize,
    circular: bool,
) -> KernelRange {
    let half = (width * cutoff_factor).ceil().max(0.0) as usize;
    let last = field_size.saturating_sub(1);

    if circular {
        KernelRange {
            left: half.min(last / 2),
            right: half.min(last.div_ceil(2)),
        }
    } else {
        KernelRange {
            left: half.min(last),
            right: half.min(last),
        }
    }
}

/// Wrap table mapping each position of an extended input to a field sample:
/// entry `i` is `(i - range.left) mod field_size`.
pub fn create_extended_index(field_size: usize, range: KernelRange) -> Vec<usize> {
    if field_size == 0 {
        return Vec::new();
    }
    let shift = field_size - range.left % field_size;
    (0..range.extended_len(field_size))
        .map(|i| (i + shift) % field_size)
        .collect()
}

/// Unnormalized Gaussian `exp(-0.5 (x - mean)^2 / sigma^2)`.
#[inline]
pub fn gauss(x: f64, mean: f64, sigma: f64) -> f64 {
    let d = x - mean;
    (-0.5 * d * d / (sigma * sigma)).exp()
}

/// Divide every sample by the sum of all samples. Profiles summing to zero
/// are left untouched.
pub fn normalize_sum(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum != 0.0 {
        let inv_sum = 1.0 / sum;
        for v in values {
            *v *= inv_sum;
        }
    }
}

/// Gaussian sampled at the kernel offsets `-range.left..=range.right`.
pub fn sample_gauss(range: KernelRange, sigma: f64, normalized: bool) -> Vec<f64> {
    let left = range.left as isize;
    let mut values: Vec<f64> = (-left..=range.right as isize)
        .map(|offset| gauss(offset as f64, 0.0, sigma))
        .collect();
    if normalized {
        normalize_sum(&mut values);
    }
    values
}

/// Gaussian over a whole field of `size` samples, centred at `position`
/// (in samples). Circular profiles use the wrapped distance `min(d, size - d)`.
pub fn gauss_profile(size: usize, position: f64, sigma: f64, circular: bool) -> Vec<f64> {
    let period = size as f64;
    (0..size)
        .map(|i| {
            let mut d = (i as f64 - position).abs();
            if circular {
                d %= period;
                d = d.min(period - d);
            }
            gauss(d, 0.0, sigma)
        })
        .collect()
}

/// Precomputed kernel samples ready for correlation.
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Samples at offsets `-range.left..=range.right`.
    pub data: Vec<f64>,
    pub range: KernelRange,
    pub circular: bool,
}

impl Kernel {
    /// Single amplitude-scaled Gaussian.
    pub fn gauss(width: f64, amplitude: f64, field_size: usize, options: &KernelOptions) -> Self {
        let range =
            compute_kernel_range(width, options.cutoff_factor, field_size, options.circular);
        let data = sample_gauss(range, width, options.normalized)
            .into_iter()
            .map(|v| amplitude * v)
            .collect();

        Self {
            data,
            range,
            circular: options.circular,
        }
    }

    /// Difference of an excitatory and an inhibitory Gaussian.
    ///
    /// The footprint follows the widest profile whose amplitude is non-zero.
    pub fn mexican_hat(
        width_exc: f64,
        amplitude_exc: f64,
        width_inh: f64,
        amplitude_inh: f64,
        field_size: usize,
        options: &KernelOptions,
    ) -> Self {
        let dominant = match (amplitude_exc != 0.0, amplitude_inh != 0.0) {
            (true, true) => width_exc.max(width_inh),
            (false, true) => width_inh,
            _ => width_exc,
        };
        let range =
            compute_kernel_range(dominant, options.cutoff_factor, field_size, options.circular);
        let excitatory = sample_gauss(range, width_exc, options.normalized);
        let inhibitory = sample_gauss(range, width_inh, options.normalized);
        let data = excitatory
            .iter()
            .zip(&inhibitory)
            .map(|(e, i)| amplitude_exc * e - amplitude_inh * i)
            .collect();

        Self {
            data,
            range,
            circular: options.circular,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at a signed offset from the centre.
    #[inline]
    pub fn at_offset(&self, offset: isize) -> f64 {
        self.data[(self.range.left as isize + offset) as usize]
    }
}
