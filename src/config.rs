//! Process-wide configuration knobs (spec.md §6, §9 "Global state").
//!
//! The original source reads the SIMD flag, thread count, and cache/chunk
//! hints from globals at every call site; here they are centralized into one
//! immutable-after-construction value threaded through `compile`/`execute`.

/// `cfg(soundgraph_debug_assertions)` is set by a surrounding build under a
/// memory-checking sandbox (ASan/Miri-style instrumentation); SIMD defaults
/// off there since vectorized kernels tend to defeat such checkers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub max_transform_threads: usize,
    pub use_simd: bool,
    pub cpu_cache_size: Option<usize>,
    pub chunk_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_transform_threads: num_cpus::get().max(1),
            use_simd: !cfg!(soundgraph_debug_assertions),
            cpu_cache_size: None,
            chunk_size: None,
        }
    }
}
