//! Roster use-case services.
//!
//! # Responsibility
//! - Orchestrate reconciliation and store calls into use-case level APIs.
//! - Keep callers decoupled from SQL and transaction handling.

pub mod entity_service;
