//! # PX4 Bridge Library
//!
//! Translate between a generic multi-rotor command/status interface and the
//! PX4 autopilot's MAVROS interface.
//!
//! This library provides the message shapes of both interfaces, the stateful
//! conversion handlers, the topic routing table, and a JSON-lines stand-in for
//! the publish/subscribe middleware.

pub mod bridge;
pub mod config;
pub mod error;
pub mod msgs;
pub mod telemetry;
pub mod transport;
