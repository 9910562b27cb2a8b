//! FLOATARB: cash-float arbitrage simulator.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod types;
pub mod simulator;
pub mod data;
pub mod broker;
pub mod engine;
pub mod dashboard;
