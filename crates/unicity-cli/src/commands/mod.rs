//! Command modules for CLI

/// Demo round generation
pub mod demo;

/// Tagged value inspection
pub mod inspect;

/// Proof verification
pub mod verify;
