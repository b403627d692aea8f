//! # Generic Multi-Rotor Messages
//!
//! Command, status and joystick records of the generic multi-rotor interface.
//!
//! | Record | Direction | Carries |
//! |--------|-----------|---------|
//! | [`RollPitchYawrateThrust`] | inbound | roll/pitch angles, yaw rate, thrust |
//! | [`RateThrust`] | inbound | body rates, thrust |
//! | [`Status`] | outbound | vehicle status snapshot |
//! | [`Joy`] | outbound | RC channels as joystick axes |

use serde::{Deserialize, Serialize};

use super::geometry::{Header, Vector3};

/// Attitude command: roll and pitch angles, yaw rate, body-frame thrust.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollPitchYawrateThrust {
    pub header: Header,
    /// Roll angle in radians
    pub roll: f64,
    /// Pitch angle in radians
    pub pitch: f64,
    /// Yaw rate in rad/s
    pub yaw_rate: f64,
    /// Thrust vector in the body frame (N)
    pub thrust: Vector3,
}

/// Rate command: body angular rates and body-frame thrust.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateThrust {
    pub header: Header,
    /// Roll, pitch and yaw rates in rad/s
    pub angular_rates: Vector3,
    /// Thrust vector in the body frame
    pub thrust: Vector3,
}

/// Motor state reported in [`Status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorStatus {
    Running,
    #[default]
    Stopped,
    Starting,
    Stopping,
}

/// GPS lock state reported in [`Status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpsStatus {
    Lock,
    #[default]
    NoLock,
}

/// Which command form the RC sticks map to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RcCommandMode {
    #[default]
    #[serde(rename = "attitude_thrust")]
    AttitudeThrust,
    #[serde(rename = "rate_thrust")]
    RateThrust,
}

/// Vehicle status snapshot.
///
/// The bridge keeps one of these for its whole lifetime and updates fields
/// from different inbound sources. Fields no source has touched keep the
/// values from [`Status::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub header: Header,
    pub vehicle_name: String,
    pub vehicle_type: String,
    /// Battery voltage in volts
    pub battery_voltage: f32,
    pub rc_command_mode: RcCommandMode,
    /// True while the flight controller accepts offboard commands
    pub command_interface_enabled: bool,
    /// Flight time in seconds
    pub flight_time: u32,
    /// System uptime in seconds
    pub system_uptime: u32,
    /// CPU load as a fraction (0.0-1.0)
    pub cpu_load: f32,
    pub motor_status: MotorStatus,
    pub in_air: bool,
    pub gps_status: GpsStatus,
    pub gps_num_satellites: u32,
}

impl Status {
    /// Creates a status record with every field at its initial value.
    ///
    /// # Arguments
    ///
    /// * `vehicle_name` - Name placeholder reported until something better is known
    /// * `vehicle_type` - Type placeholder reported until something better is known
    /// * `header` - Initial header (normally stamped at construction)
    ///
    /// # Examples
    ///
    /// ```
    /// use px4_bridge::msgs::generic::{GpsStatus, MotorStatus, Status};
    /// use px4_bridge::msgs::geometry::Header;
    ///
    /// let status = Status::new("no type", "no name", Header::default());
    /// assert_eq!(status.motor_status, MotorStatus::Stopped);
    /// assert_eq!(status.gps_status, GpsStatus::NoLock);
    /// assert!(!status.in_air);
    /// ```
    #[must_use]
    pub fn new(vehicle_name: impl Into<String>, vehicle_type: impl Into<String>, header: Header) -> Self {
        Self {
            header,
            vehicle_name: vehicle_name.into(),
            vehicle_type: vehicle_type.into(),
            battery_voltage: 0.0,
            rc_command_mode: RcCommandMode::AttitudeThrust,
            command_interface_enabled: false,
            flight_time: 0,
            system_uptime: 0,
            cpu_load: 0.0,
            motor_status: MotorStatus::Stopped,
            in_air: false,
            gps_status: GpsStatus::NoLock,
            gps_num_satellites: 0,
        }
    }
}

/// Joystick record: RC channels relabeled as axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Joy {
    pub header: Header,
    pub axes: Vec<f32>,
    pub buttons: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_initial_values() {
        let status = Status::new("no type", "no name", Header::default());

        assert_eq!(status.vehicle_name, "no type");
        assert_eq!(status.vehicle_type, "no name");
        assert_eq!(status.battery_voltage, 0.0);
        assert_eq!(status.rc_command_mode, RcCommandMode::AttitudeThrust);
        assert!(!status.command_interface_enabled);
        assert_eq!(status.flight_time, 0);
        assert_eq!(status.system_uptime, 0);
        assert_eq!(status.cpu_load, 0.0);
        assert_eq!(status.motor_status, MotorStatus::Stopped);
        assert!(!status.in_air);
        assert_eq!(status.gps_status, GpsStatus::NoLock);
        assert_eq!(status.gps_num_satellites, 0);
    }

    #[test]
    fn test_status_enum_wire_names() {
        let status = Status::new("a", "b", Header::default());
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["motor_status"], "stopped");
        assert_eq!(json["gps_status"], "no_lock");
        assert_eq!(json["rc_command_mode"], "attitude_thrust");
    }

    #[test]
    fn test_motor_status_wire_names() {
        assert_eq!(serde_json::to_string(&MotorStatus::Running).unwrap(), "\"running\"");
        assert_eq!(serde_json::to_string(&MotorStatus::Starting).unwrap(), "\"starting\"");
        assert_eq!(serde_json::to_string(&MotorStatus::Stopping).unwrap(), "\"stopping\"");
        assert_eq!(serde_json::to_string(&RcCommandMode::RateThrust).unwrap(), "\"rate_thrust\"");
        assert_eq!(serde_json::to_string(&GpsStatus::Lock).unwrap(), "\"lock\"");
    }

    #[test]
    fn test_command_missing_fields_default_to_zero() {
        let cmd: RollPitchYawrateThrust =
            serde_json::from_str(r#"{"roll": 0.1, "thrust": {"z": 9.81}}"#).unwrap();

        assert_eq!(cmd.roll, 0.1);
        assert_eq!(cmd.pitch, 0.0);
        assert_eq!(cmd.yaw_rate, 0.0);
        assert_eq!(cmd.thrust, Vector3::new(0.0, 0.0, 9.81));
    }

    #[test]
    fn test_rate_thrust_parses_nested_vectors() {
        let cmd: RateThrust = serde_json::from_str(
            r#"{"angular_rates": {"x": 0.1, "y": -0.2, "z": 0.3}, "thrust": {"z": 0.5}}"#,
        )
        .unwrap();

        assert_eq!(cmd.angular_rates, Vector3::new(0.1, -0.2, 0.3));
        assert_eq!(cmd.thrust.z, 0.5);
    }
}
