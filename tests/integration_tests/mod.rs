//! Integration tests module
//!
//! End-to-end tests for the newsdesk pipeline, including:
//! - discover → ingest against a mock news site
//! - Batch and run number bookkeeping across runs
//! - Error handling and recovery scenarios

pub mod discovery_test;
pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
