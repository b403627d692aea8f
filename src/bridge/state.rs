//! # Cached Bridge State
//!
//! Small pieces of state the bridge carries between handler calls.

/// Last heading observed from an orientation reading.
///
/// Holds `None` until the first reading arrives. There is no staleness
/// tracking: the value stays until overwritten.
///
/// # Examples
///
/// ```
/// use px4_bridge::bridge::state::LastKnownYaw;
///
/// let mut yaw = LastKnownYaw::default();
/// assert_eq!(yaw.get(), None);
/// assert_eq!(yaw.yaw_or_zero(), 0.0);
///
/// yaw.set(1.2);
/// assert_eq!(yaw.get(), Some(1.2));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LastKnownYaw {
    yaw: Option<f64>,
}

impl LastKnownYaw {
    /// Overwrites the cached heading (radians).
    pub fn set(&mut self, yaw: f64) {
        self.yaw = Some(yaw);
    }

    /// Cached heading, or `None` if nothing was observed yet.
    #[must_use]
    pub fn get(&self) -> Option<f64> {
        self.yaw
    }

    /// Cached heading, falling back to 0.0 when unset.
    #[must_use]
    pub fn yaw_or_zero(&self) -> f64 {
        self.yaw.unwrap_or(0.0)
    }
}

/// Flag that fires exactly once.
///
/// Used for advisory warnings that should appear in the log a single time
/// per bridge instance.
///
/// # Examples
///
/// ```
/// use px4_bridge::bridge::state::WarnOnce;
///
/// let mut flag = WarnOnce::default();
/// assert!(flag.fire());
/// assert!(!flag.fire());
/// assert!(flag.has_fired());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarnOnce {
    fired: bool,
}

impl WarnOnce {
    /// Returns `true` on the first call and `false` on every later call.
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    /// Whether [`fire`](Self::fire) has been called.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
