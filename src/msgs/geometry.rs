//! # Geometry Primitives
//!
//! Vector, quaternion and header types shared by both interfaces, plus the two
//! orientation helpers the bridge needs.
//!
//! ## Conventions
//!
//! - Angles are radians.
//! - Quaternions are stored `x, y, z, w`; identity is `(0, 0, 0, 1)`.
//! - Euler angles follow the intrinsic Z-Y-X order used by the flight
//!   controller: `q = Rz(yaw) * Ry(pitch) * Rx(roll)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record header carried by every message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    /// Time the record was produced
    pub stamp: DateTime<Utc>,

    /// Coordinate frame the record refers to
    pub frame_id: String,
}

impl Header {
    /// Creates a header stamped at `stamp` with an empty frame id.
    #[must_use]
    pub fn stamped(stamp: DateTime<Utc>) -> Self {
        Self {
            stamp,
            frame_id: String::new(),
        }
    }
}

/// A vector in free space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Creates a vector from its three components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// An orientation in quaternion form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    /// The identity rotation.
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// The identity rotation `(0, 0, 0, 1)`.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a quaternion from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

/// Builds a quaternion from roll, pitch and yaw.
///
/// Rotation order is intrinsic Z-Y-X: yaw about Z, then pitch about Y, then
/// roll about X.
///
/// # Arguments
///
/// * `roll` - Rotation about X in radians
/// * `pitch` - Rotation about Y in radians
/// * `yaw` - Rotation about Z in radians
///
/// # Examples
///
/// ```
/// use px4_bridge::msgs::geometry::{quaternion_from_rpy, Quaternion};
///
/// let q = quaternion_from_rpy(0.0, 0.0, 0.0);
/// assert_eq!(q, Quaternion::IDENTITY);
/// ```
#[must_use]
pub fn quaternion_from_rpy(roll: f64, pitch: f64, yaw: f64) -> Quaternion {
    let (sr, cr) = (roll * 0.5).sin_cos();
    let (sp, cp) = (pitch * 0.5).sin_cos();
    let (sy, cy) = (yaw * 0.5).sin_cos();

    Quaternion {
        x: sr * cp * cy - cr * sp * sy,
        y: cr * sp * cy + sr * cp * sy,
        z: cr * cp * sy - sr * sp * cy,
        w: cr * cp * cy + sr * sp * sy,
    }
}

/// Extracts the yaw angle (rotation about Z) from a quaternion.
///
/// The result is in `(-pi, pi]`. The quaternion is not normalized first.
///
/// # Examples
///
/// ```
/// use px4_bridge::msgs::geometry::{quaternion_from_rpy, quaternion_get_yaw};
///
/// let q = quaternion_from_rpy(0.1, -0.2, 1.0);
/// assert!((quaternion_get_yaw(&q) - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn quaternion_get_yaw(q: &Quaternion) -> f64 {
    let siny_cosp = 2.0 * (q.w * q.z + q.x * q.y);
    let cosy_cosp = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
    siny_cosp.atan2(cosy_cosp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const EPS: f64 = 1e-12;

    fn assert_quat_eq(a: &Quaternion, b: &Quaternion) {
        assert!((a.x - b.x).abs() < EPS, "x: {} != {}", a.x, b.x);
        assert!((a.y - b.y).abs() < EPS, "y: {} != {}", a.y, b.y);
        assert!((a.z - b.z).abs() < EPS, "z: {} != {}", a.z, b.z);
        assert!((a.w - b.w).abs() < EPS, "w: {} != {}", a.w, b.w);
    }

    // ==================== quaternion_from_rpy Tests ====================

    #[test]
    fn test_zero_angles_is_identity() {
        assert_quat_eq(&quaternion_from_rpy(0.0, 0.0, 0.0), &Quaternion::IDENTITY);
    }

    #[test]
    fn test_pure_yaw() {
        let q = quaternion_from_rpy(0.0, 0.0, FRAC_PI_2);
        let half = FRAC_PI_4;
        assert_quat_eq(&q, &Quaternion::new(0.0, 0.0, half.sin(), half.cos()));
    }

    #[test]
    fn test_pure_roll() {
        let q = quaternion_from_rpy(FRAC_PI_2, 0.0, 0.0);
        let half = FRAC_PI_4;
        assert_quat_eq(&q, &Quaternion::new(half.sin(), 0.0, 0.0, half.cos()));
    }

    #[test]
    fn test_pure_pitch() {
        let q = quaternion_from_rpy(0.0, FRAC_PI_2, 0.0);
        let half = FRAC_PI_4;
        assert_quat_eq(&q, &Quaternion::new(0.0, half.sin(), 0.0, half.cos()));
    }

    #[test]
    fn test_result_is_unit_length() {
        let q = quaternion_from_rpy(0.3, -1.1, 2.5);
        let norm = (q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w).sqrt();
        assert!((norm - 1.0).abs() < EPS);
    }

    // ==================== quaternion_get_yaw Tests ====================

    #[test]
    fn test_yaw_of_identity_is_zero() {
        assert_eq!(quaternion_get_yaw(&Quaternion::IDENTITY), 0.0);
    }

    #[test]
    fn test_yaw_recovered_with_roll_and_pitch() {
        for &yaw in &[-3.0, -FRAC_PI_2, -0.5, 0.0, 0.7, FRAC_PI_4, 3.0] {
            let q = quaternion_from_rpy(0.2, -0.35, yaw);
            assert!((quaternion_get_yaw(&q) - yaw).abs() < 1e-9, "yaw {}", yaw);
        }
    }

    #[test]
    fn test_yaw_at_pi() {
        let q = quaternion_from_rpy(0.0, 0.0, PI);
        assert!((quaternion_get_yaw(&q).abs() - PI).abs() < 1e-9);
    }

    // ==================== Default Tests ====================

    #[test]
    fn test_quaternion_default_is_identity() {
        assert_eq!(Quaternion::default(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_partial_quaternion_fills_identity_fields() {
        let q: Quaternion = serde_json::from_str(r#"{"z": 0.5}"#).unwrap();
        assert_eq!(q, Quaternion::new(0.0, 0.0, 0.5, 1.0));
    }

    #[test]
    fn test_header_default_is_epoch() {
        let header = Header::default();
        assert_eq!(header.stamp.timestamp(), 0);
        assert!(header.frame_id.is_empty());
    }
}
