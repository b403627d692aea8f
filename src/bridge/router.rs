//! # Topic Router
//!
//! Explicit wiring between topic names and [`Bridge`] handlers.
//!
//! The table is built once from [`TopicConfig`] and [`QueueConfig`]. Each
//! inbound route decodes its payload into the record type its handler expects,
//! runs the handler and publishes the result (if any) on the matching
//! outbound topic.
//!
//! ## Default Wiring
//!
//! | Inbound topic | Depth | Outbound topic | Depth |
//! |---------------|-------|----------------|-------|
//! | `command/rate_thrust` | 5 | `/shafter3/mavros/setpoint_raw/attitude` | 10 |
//! | `/shafter3/command/roll_pitch_yawrate_thrust` | 5 | `/shafter3/mavros/setpoint_raw/attitude` | 10 |
//! | `/shafter3/mavros/rc/in` | 5 | `rc` | 1 |
//! | `/shafter3/mavros/state` | 5 | `status` | 1 |
//! | `/shafter3/mavros/battery` | 5 | none | |
//! | `/shafter3/mavros/altitude` | 5 | none | |
//! | `/shafter3/mavros/imu/data` | 5 | none | |

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::Bridge;
use crate::config::{QueueConfig, TopicConfig};
use crate::error::{BridgeError, Result};
use crate::msgs::controller::{Altitude, AttitudeTarget, BatteryState, Imu, RcIn, State};
use crate::msgs::generic::{Joy, RateThrust, RollPitchYawrateThrust, Status};
use crate::transport::Publisher;

/// Record produced by a handler, ready to publish.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    AttitudeTarget(AttitudeTarget),
    Status(Status),
    Joy(Joy),
}

impl Outbound {
    /// Kind of outbound record.
    #[must_use]
    pub fn kind(&self) -> OutboundKind {
        match self {
            Outbound::AttitudeTarget(_) => OutboundKind::AttitudeTarget,
            Outbound::Status(_) => OutboundKind::Status,
            Outbound::Joy(_) => OutboundKind::Joy,
        }
    }
}

/// Outbound record kinds, one outbound topic each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundKind {
    AttitudeTarget,
    Status,
    Joy,
}

/// Which handler an inbound route runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    ConvertRateCommand,
    ConvertAttitudeCommand,
    RelayRcChannels,
    UpdateStatusFromState,
    UpdateBattery,
    DiscardAltitude,
    UpdateCachedYaw,
}

impl Handler {
    /// Outbound record kind this handler emits, if any.
    #[must_use]
    pub fn emits(self) -> Option<OutboundKind> {
        match self {
            Handler::ConvertRateCommand | Handler::ConvertAttitudeCommand => {
                Some(OutboundKind::AttitudeTarget)
            }
            Handler::RelayRcChannels => Some(OutboundKind::Joy),
            Handler::UpdateStatusFromState => Some(OutboundKind::Status),
            Handler::UpdateBattery | Handler::DiscardAltitude | Handler::UpdateCachedYaw => None,
        }
    }

    /// Decodes `payload` and runs the handler on `bridge`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Decode`] if the payload does not match the
    /// handler's record shape. The handler itself never fails.
    pub fn invoke(
        self,
        bridge: &mut Bridge,
        payload: serde_json::Value,
    ) -> Result<Option<Outbound>> {
        let out = match self {
            Handler::ConvertRateCommand => {
                let cmd: RateThrust = decode(payload)?;
                Some(Outbound::AttitudeTarget(bridge.convert_rate_command(&cmd)))
            }
            Handler::ConvertAttitudeCommand => {
                let cmd: RollPitchYawrateThrust = decode(payload)?;
                Some(Outbound::AttitudeTarget(bridge.convert_attitude_command(&cmd)))
            }
            Handler::RelayRcChannels => {
                let rc: RcIn = decode(payload)?;
                Some(Outbound::Joy(bridge.relay_rc_channels(&rc)))
            }
            Handler::UpdateStatusFromState => {
                let state: State = decode(payload)?;
                Some(Outbound::Status(bridge.update_status_from_state(&state)))
            }
            Handler::UpdateBattery => {
                let battery: BatteryState = decode(payload)?;
                bridge.update_battery(&battery);
                None
            }
            Handler::DiscardAltitude => {
                let altitude: Altitude = decode(payload)?;
                bridge.discard_altitude(&altitude);
                None
            }
            Handler::UpdateCachedYaw => {
                let imu: Imu = decode(payload)?;
                bridge.update_cached_yaw(&imu);
                None
            }
        };

        Ok(out)
    }
}

/// An absent payload decodes like an empty object, so every field defaults.
fn decode<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T> {
    let payload = match payload {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        other => other,
    };
    Ok(serde_json::from_value(payload)?)
}

/// One inbound subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub topic: String,
    pub depth: usize,
    pub handler: Handler,
}

/// One outbound advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub topic: String,
    pub depth: usize,
    pub kind: OutboundKind,
}

/// Topic-to-handler table.
///
/// # Examples
///
/// ```
/// use px4_bridge::bridge::router::{Handler, Router};
/// use px4_bridge::config::{QueueConfig, TopicConfig};
///
/// let router = Router::new(&TopicConfig::default(), &QueueConfig::default());
/// let route = router.route("/shafter3/mavros/state").unwrap();
/// assert_eq!(route.handler, Handler::UpdateStatusFromState);
/// assert_eq!(route.depth, 5);
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
    outbound: Vec<Advertisement>,
}

impl Router {
    /// Builds the routing table.
    ///
    /// # Arguments
    ///
    /// * `topics` - Topic names for both interfaces
    /// * `queues` - Queue depths per topic group
    #[must_use]
    pub fn new(topics: &TopicConfig, queues: &QueueConfig) -> Self {
        let routes = vec![
            Route {
                topic: topics.rate_thrust.clone(),
                depth: queues.command_in,
                handler: Handler::ConvertRateCommand,
            },
            Route {
                topic: topics.roll_pitch_yawrate_thrust.clone(),
                depth: queues.command_in,
                handler: Handler::ConvertAttitudeCommand,
            },
            Route {
                topic: topics.rc_in.clone(),
                depth: queues.telemetry_in,
                handler: Handler::RelayRcChannels,
            },
            Route {
                topic: topics.state.clone(),
                depth: queues.telemetry_in,
                handler: Handler::UpdateStatusFromState,
            },
            Route {
                topic: topics.battery.clone(),
                depth: queues.telemetry_in,
                handler: Handler::UpdateBattery,
            },
            Route {
                topic: topics.altitude.clone(),
                depth: queues.telemetry_in,
                handler: Handler::DiscardAltitude,
            },
            Route {
                topic: topics.imu.clone(),
                depth: queues.telemetry_in,
                handler: Handler::UpdateCachedYaw,
            },
        ];

        let index = routes
            .iter()
            .enumerate()
            .map(|(i, route)| (route.topic.clone(), i))
            .collect();

        let outbound = vec![
            Advertisement {
                topic: topics.attitude_target.clone(),
                depth: queues.command_out,
                kind: OutboundKind::AttitudeTarget,
            },
            Advertisement {
                topic: topics.status.clone(),
                depth: queues.status_out,
                kind: OutboundKind::Status,
            },
            Advertisement {
                topic: topics.rc.clone(),
                depth: queues.rc_out,
                kind: OutboundKind::Joy,
            },
        ];

        Self {
            routes,
            index,
            outbound,
        }
    }

    /// Inbound routes in wiring order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Outbound advertisements.
    #[must_use]
    pub fn outbound(&self) -> &[Advertisement] {
        &self.outbound
    }

    /// Looks up the route for an inbound topic.
    #[must_use]
    pub fn route(&self, topic: &str) -> Option<&Route> {
        self.index.get(topic).map(|&i| &self.routes[i])
    }

    /// Outbound topic name for a record kind.
    #[must_use]
    pub fn outbound_topic(&self, kind: OutboundKind) -> &str {
        self.outbound
            .iter()
            .find(|ad| ad.kind == kind)
            .map(|ad| ad.topic.as_str())
            .unwrap_or_default()
    }

    /// Delivers one inbound record to its handler and publishes the result.
    ///
    /// # Arguments
    ///
    /// * `topic` - Inbound topic the record arrived on
    /// * `payload` - Record fields as JSON
    /// * `bridge` - Bridge state the handler runs against
    /// * `publisher` - Sink for the outbound record
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of records published (0 or 1)
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UnknownTopic`] if no route exists for `topic`
    /// - [`BridgeError::Decode`] if the payload does not match the record shape
    /// - Any error returned by the publisher
    pub fn dispatch<P: Publisher + ?Sized>(
        &self,
        topic: &str,
        payload: serde_json::Value,
        bridge: &mut Bridge,
        publisher: &mut P,
    ) -> Result<usize> {
        let route = self
            .route(topic)
            .ok_or_else(|| BridgeError::UnknownTopic(topic.to_string()))?;

        match route.handler.invoke(bridge, payload)? {
            Some(record) => {
                let out_topic = self.outbound_topic(record.kind());
                debug!("{} -> {} ({:?})", topic, out_topic, route.handler);
                publisher.publish(out_topic, &record)?;
                Ok(1)
            }
            None => {
                debug!("{} consumed by {:?}", topic, route.handler);
                Ok(0)
            }
        }
    }
}
