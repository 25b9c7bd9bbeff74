//! Compute module - Numerical building blocks for field dynamics.

mod activation;
mod direct_convolution;
mod fft;
mod kernel;
mod learning;

pub use activation::*;
pub use direct_convolution::*;
pub use fft::*;
pub use kernel::*;
pub use learning::*;
