//! Fermix classification API server
//!
//! Library half of the `fermix-api` binary: router, handlers and
//! configuration, exposed so integration tests can drive the real router.

pub mod api;
pub mod config;
