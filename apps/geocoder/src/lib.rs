//! MapQuest geocoding adapter process.
//!
//! A host launches this binary and talks to it over stdin/stdout; see
//! [`geocoder_core::host_channel`] for the envelope protocol and
//! [`geocoder_core::dispatcher`] for the geocoding itself. This crate wires
//! them together with configuration, logging and fatal-error supervision.

pub mod adapter;
pub mod error;
pub mod logger;
pub mod supervisor;

#[cfg(test)]
mod tests;
