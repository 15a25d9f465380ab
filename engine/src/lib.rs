//! LeafScan Engine Library
//!
//! This library provides the core functionality of the LeafScan engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Capability adapters for the backend services
pub mod adapters;

/// Fallback knowledge store for canned explanations
pub mod fallback;

/// Tool registry and dispatcher
pub mod tools;

/// Diagnosis orchestrator
pub mod agent;

/// Result aggregation into the caller-facing response
pub mod aggregator;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
