#![deny(missing_docs)]

//! Core library for the student records service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Request metrics helpers.
pub mod metrics;
/// Student storage contract and its in-memory and Postgres variants.
pub mod repository;
/// Orchestration of validation, storage, and summaries.
pub mod service;
/// Student entity and request payloads.
pub mod student;
/// Text-generation client producing student summaries.
pub mod summary;
/// Field validation for student payloads.
pub mod validation;
