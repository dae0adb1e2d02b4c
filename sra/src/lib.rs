// sra/src/lib.rs
//! # sra command-line application
//!
//! Thin shell around `sra-core`: parses flags, resolves configuration,
//! builds the live service adapters and prints remediation outcomes.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
