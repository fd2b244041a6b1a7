//! Stock transform kernels.
//!
//! spec.md treats kernels as black boxes outside the core's scope; this
//! module ships real (if intentionally minimal) implementations of exactly
//! the transforms spec.md names by name (§8 S5, S6), so the compiler and
//! executor have something non-trivial to compile and run end to end.

mod bytes;
mod converters;
mod dct;
mod elementwise;
mod filter_bank;
mod identity;
mod rdft;
mod selector;
mod window;

pub use window::hamming;
