//! # Flight Controller Messages
//!
//! Records of the flight-controller interface (MAVROS conventions).

use serde::{Deserialize, Serialize};

use super::geometry::{Header, Quaternion, Vector3};

/// Ignore the roll body rate
pub const IGNORE_ROLL_RATE: u8 = 1;

/// Ignore the pitch body rate
pub const IGNORE_PITCH_RATE: u8 = 2;

/// Ignore the yaw body rate
pub const IGNORE_YAW_RATE: u8 = 4;

/// Ignore the thrust value
pub const IGNORE_THRUST: u8 = 64;

/// Ignore the orientation
pub const IGNORE_ATTITUDE: u8 = 128;

/// Attitude setpoint sent to the flight controller.
///
/// `type_mask` names the fields the controller should ignore, so it falls
/// back to another control mode for those axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttitudeTarget {
    pub header: Header,
    /// Bitwise OR of the `IGNORE_*` constants
    pub type_mask: u8,
    pub orientation: Quaternion,
    /// Body rates in rad/s
    pub body_rate: Vector3,
    /// Normalized collective thrust (0.0-1.0 when correctly scaled)
    pub thrust: f32,
}

impl AttitudeTarget {
    /// Checks whether every bit of `mask` is set in `type_mask`.
    ///
    /// # Examples
    ///
    /// ```
    /// use px4_bridge::msgs::controller::{AttitudeTarget, IGNORE_ATTITUDE, IGNORE_THRUST};
    ///
    /// let target = AttitudeTarget { type_mask: IGNORE_ATTITUDE, ..Default::default() };
    /// assert!(target.ignores(IGNORE_ATTITUDE));
    /// assert!(!target.ignores(IGNORE_THRUST));
    /// ```
    #[must_use]
    pub fn ignores(&self, mask: u8) -> bool {
        self.type_mask & mask == mask
    }
}

/// Raw RC input as received by the flight controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcIn {
    pub header: Header,
    pub rssi: u8,
    /// Channel values in microseconds (typically 1000-2000)
    pub channels: Vec<u16>,
}

/// Flight controller connection, arming and mode state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub header: Header,
    pub connected: bool,
    pub armed: bool,
    pub guided: bool,
    /// Flight mode name, e.g. "OFFBOARD", "POSCTL", "MANUAL"
    pub mode: String,
    pub system_status: u8,
}

/// Battery reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryState {
    pub header: Header,
    /// Voltage in volts
    pub voltage: f32,
    /// Current in amperes (negative when discharging)
    pub current: f32,
    /// Charge in Ah
    pub charge: f32,
    /// Capacity in Ah
    pub capacity: f32,
    /// Charge percentage (0.0-1.0)
    pub percentage: f32,
    pub present: bool,
}

/// Altitude reading in its several references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Altitude {
    pub header: Header,
    pub monotonic: f32,
    pub amsl: f32,
    pub local: f32,
    pub relative: f32,
    pub terrain: f32,
    pub bottom_clearance: f32,
}

/// IMU sample with fused orientation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Imu {
    pub header: Header,
    pub orientation: Quaternion,
    pub angular_velocity: Vector3,
    pub linear_acceleration: Vector3,
}
