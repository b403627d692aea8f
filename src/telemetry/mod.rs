//! # Telemetry Module
//!
//! Handles logging of published records to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting each published record as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;

pub use logger::RecordLogger;
