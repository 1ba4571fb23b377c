//! Core library components.
//!
//! Everything here is free of console I/O; the binary in `cli` renders
//! results and errors.

pub mod api;
pub mod constants;
pub mod domain;
pub mod expand;
pub mod expander;
pub mod keypair;
pub mod resolve;
pub mod secrets;
pub mod settings;
pub mod share;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
