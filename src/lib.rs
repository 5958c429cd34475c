//! Scribe API - backend for the Scribe writing assistant.
//!
//! Fronts a hosted auth service and REST data store with account, profile
//! and conversation endpoints, per-tier rate limiting and usage accounting.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
