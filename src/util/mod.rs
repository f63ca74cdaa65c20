//! Utility helpers.

pub mod timeout;

pub use timeout::{run_bounded, with_timeout};
