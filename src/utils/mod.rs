//! Cross-cutting helpers.
//!
//! Currently only the parallel-iteration shim used by the water sampler.

pub mod parallel;
