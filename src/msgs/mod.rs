//! # Message Module
//!
//! Record types of both interfaces the bridge translates between.
//!
//! This module handles:
//! - Shared geometry (vectors, quaternions, headers) and orientation helpers
//! - Generic multi-rotor commands, status and joystick records
//! - Flight-controller attitude targets and telemetry records

pub mod controller;
pub mod generic;
pub mod geometry;
