//! Layered instructions: system, domain and user tiers.

pub mod compiler;
pub mod sources;

pub use compiler::{derive_domain_instructions, domain_line, render, InstructionCompiler};
pub use sources::InstructionSources;
