//! End-to-end tests for the Cotick runtime
//!
//! These tests compile scripts, run them through the host loop against a
//! fake clock and check what they printed.

mod harness;

mod cancellation;
mod deferral;
mod errors;
mod exit_callbacks;
mod fundamentals;
mod timing;
