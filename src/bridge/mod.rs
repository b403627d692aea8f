//! # Bridge Module
//!
//! Conversion handlers between the generic multi-rotor interface and the
//! flight-controller interface.
//!
//! ## Handlers
//!
//! | Inbound record | Handler | Outbound record |
//! |----------------|---------|-----------------|
//! | [`RollPitchYawrateThrust`] | [`Bridge::convert_attitude_command`] | [`AttitudeTarget`] |
//! | [`RateThrust`] | [`Bridge::convert_rate_command`] | [`AttitudeTarget`] |
//! | [`RcIn`] | [`Bridge::relay_rc_channels`] | [`Joy`] |
//! | [`State`] | [`Bridge::update_status_from_state`] | [`Status`] snapshot |
//! | [`BatteryState`] | [`Bridge::update_battery`] | none |
//! | [`Imu`] | [`Bridge::update_cached_yaw`] | none |
//! | [`Altitude`] | [`Bridge::discard_altitude`] | none |
//!
//! Handlers never fail and do not validate their input. Wiring handlers to
//! topic names lives in [`router`].

pub mod router;
pub mod state;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::msgs::controller::{
    Altitude, AttitudeTarget, BatteryState, Imu, RcIn, State, IGNORE_ATTITUDE, IGNORE_PITCH_RATE,
    IGNORE_ROLL_RATE,
};
use crate::msgs::generic::{Joy, MotorStatus, RateThrust, RollPitchYawrateThrust, Status};
use crate::msgs::geometry::{quaternion_from_rpy, quaternion_get_yaw, Header, Quaternion, Vector3};
use state::{LastKnownYaw, WarnOnce};

/// Calibration from body thrust (N) to the controller's normalized thrust.
pub const DEFAULT_THRUST_SCALE: f64 = 0.030;

/// Mode name in which the controller accepts offboard commands.
pub const DEFAULT_OFFBOARD_MODE: &str = "OFFBOARD";

/// Clock used to stamp outbound records.
pub type Clock = fn() -> DateTime<Utc>;

/// Protocol translator state and handlers.
///
/// Owns the long-lived status snapshot, the yaw cache and the one-time
/// warning flags. Everything else is built fresh per call.
///
/// # Examples
///
/// ```
/// use px4_bridge::bridge::Bridge;
/// use px4_bridge::msgs::controller::State;
/// use px4_bridge::msgs::generic::MotorStatus;
///
/// let mut bridge = Bridge::default();
/// let state = State { mode: "OFFBOARD".to_string(), armed: true, ..Default::default() };
///
/// let snapshot = bridge.update_status_from_state(&state);
/// assert!(snapshot.command_interface_enabled);
/// assert_eq!(snapshot.motor_status, MotorStatus::Running);
/// ```
#[derive(Debug, Clone)]
pub struct Bridge {
    status: Status,
    yaw: LastKnownYaw,
    rate_command_warning: WarnOnce,
    altitude_warning: WarnOnce,
    thrust_scale: f64,
    offboard_mode: String,
    clock: Clock,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

impl Bridge {
    /// Creates a bridge with the given calibration and placeholders.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self::with_clock(config, Utc::now)
    }

    /// Creates a bridge that stamps records with `clock`.
    ///
    /// # Arguments
    ///
    /// * `config` - Calibration, offboard mode name and vehicle placeholders
    /// * `clock` - Time source for headers
    #[must_use]
    pub fn with_clock(config: &BridgeConfig, clock: Clock) -> Self {
        let status = Status::new(
            config.vehicle_name.as_str(),
            config.vehicle_type.as_str(),
            Header::stamped(clock()),
        );

        Self {
            status,
            yaw: LastKnownYaw::default(),
            rate_command_warning: WarnOnce::default(),
            altitude_warning: WarnOnce::default(),
            thrust_scale: config.thrust_scale,
            offboard_mode: config.offboard_mode.clone(),
            clock,
        }
    }

    /// Converts an attitude command into an attitude target.
    ///
    /// Orientation is built from the command's roll and pitch and the cached
    /// yaw, since the command only carries a yaw rate. Roll and pitch rates are
    /// masked out so the controller holds attitude on those axes and rate on
    /// yaw. Thrust is `thrust.z` times the calibration scale.
    ///
    /// # Examples
    ///
    /// ```
    /// use px4_bridge::bridge::Bridge;
    /// use px4_bridge::msgs::generic::RollPitchYawrateThrust;
    /// use px4_bridge::msgs::geometry::Vector3;
    ///
    /// let bridge = Bridge::default();
    /// let cmd = RollPitchYawrateThrust {
    ///     yaw_rate: 0.4,
    ///     thrust: Vector3::new(0.0, 0.0, 20.0),
    ///     ..Default::default()
    /// };
    ///
    /// let target = bridge.convert_attitude_command(&cmd);
    /// assert_eq!(target.body_rate.z, 0.4);
    /// assert!((target.thrust - 0.6).abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn convert_attitude_command(&self, cmd: &RollPitchYawrateThrust) -> AttitudeTarget {
        let orientation = quaternion_from_rpy(cmd.roll, cmd.pitch, self.yaw.yaw_or_zero());

        AttitudeTarget {
            header: self.stamp(),
            type_mask: IGNORE_ROLL_RATE | IGNORE_PITCH_RATE,
            orientation,
            body_rate: Vector3::new(0.0, 0.0, cmd.yaw_rate),
            thrust: (cmd.thrust.z * self.thrust_scale) as f32,
        }
    }

    /// Converts a body-rate command into an attitude target.
    ///
    /// Orientation is masked out and set to identity. Rates and `thrust.z` are
    /// copied unchanged; thrust is not scaled on this path. The first call
    /// logs a warning since this path has not been validated on a vehicle.
    pub fn convert_rate_command(&mut self, cmd: &RateThrust) -> AttitudeTarget {
        if self.rate_command_warning.fire() {
            warn!("Got rate thrust command, not implemented");
        }

        AttitudeTarget {
            header: self.stamp(),
            type_mask: IGNORE_ATTITUDE,
            orientation: Quaternion::IDENTITY,
            body_rate: cmd.angular_rates,
            thrust: cmd.thrust.z as f32,
        }
    }

    /// Relays raw RC channels as joystick axes, preserving order.
    #[must_use]
    pub fn relay_rc_channels(&self, rc: &RcIn) -> Joy {
        Joy {
            header: self.stamp(),
            axes: rc.channels.iter().map(|&ch| f32::from(ch)).collect(),
            buttons: Vec::new(),
        }
    }

    /// Updates the status from the controller's mode and arming state.
    ///
    /// The command interface counts as enabled only when the mode name matches
    /// the offboard mode exactly (case-sensitive). Arming maps to in-air and
    /// running motors.
    ///
    /// # Returns
    ///
    /// A copy of the full status snapshot to publish, including fields last
    /// set by other sources such as the battery.
    pub fn update_status_from_state(&mut self, state: &State) -> Status {
        self.status.header = self.stamp();
        self.status.command_interface_enabled = state.mode == self.offboard_mode;
        self.status.in_air = state.armed;
        self.status.motor_status = if state.armed {
            MotorStatus::Running
        } else {
            MotorStatus::Stopped
        };

        debug!(
            "Status: mode={} armed={} interface_enabled={}",
            state.mode, state.armed, self.status.command_interface_enabled
        );

        self.status.clone()
    }

    /// Stores the battery voltage. Visible on the next status publish.
    pub fn update_battery(&mut self, battery: &BatteryState) {
        self.status.battery_voltage = battery.voltage;
    }

    /// Caches the yaw angle of an IMU orientation.
    pub fn update_cached_yaw(&mut self, imu: &Imu) {
        self.yaw.set(quaternion_get_yaw(&imu.orientation));
    }

    /// Accepts an altitude reading without using it.
    ///
    /// The first call logs a warning.
    pub fn discard_altitude(&mut self, _altitude: &Altitude) {
        if self.altitude_warning.fire() {
            warn!("Got altitude reading, not implemented");
        }
    }

    /// Current status snapshot.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Cached yaw, or `None` if no orientation reading arrived yet.
    #[must_use]
    pub fn cached_yaw(&self) -> Option<f64> {
        self.yaw.get()
    }

    /// Whether the rate-command warning has been emitted.
    #[must_use]
    pub fn rate_command_warned(&self) -> bool {
        self.rate_command_warning.has_fired()
    }

    /// Whether the altitude warning has been emitted.
    #[must_use]
    pub fn altitude_warned(&self) -> bool {
        self.altitude_warning.has_fired()
    }

    fn stamp(&self) -> Header {
        Header::stamped((self.clock)())
    }
}
