//! ECDS Shock Index: composite risk scoring for healthcare quality measures.
//!
//! The [`scoring`] module is the pure engine. [`data`], [`config`] and
//! [`output`] are the I/O layers the binary wraps around it.

pub mod config;
pub mod data;
pub mod output;
pub mod scoring;
