//! Core use-case services.
//!
//! # Responsibility
//! - Own transaction boundaries around repository calls.
//! - Keep handler layers decoupled from storage details.

pub mod sample_service;
