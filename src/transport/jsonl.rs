//! # JSON Lines Front-End
//!
//! One envelope per line, in both directions:
//!
//! ```text
//! {"topic": "/shafter3/mavros/state", "msg": {"mode": "OFFBOARD", "armed": true}}
//! ```
//!
//! An external shim bridges these lines to and from the real middleware.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::queue::TopicQueues;
use crate::bridge::router::Outbound;
use crate::error::{BridgeError, Result};

/// A record tagged with its topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    #[serde(default)]
    pub msg: serde_json::Value,
}

impl Envelope {
    /// Parses one line into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Decode`] if the line is not a JSON object with a
    /// `topic` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use px4_bridge::transport::Envelope;
    ///
    /// let env = Envelope::parse(r#"{"topic": "rc", "msg": {"axes": [1.0]}}"#)?;
    /// assert_eq!(env.topic, "rc");
    /// assert_eq!(env.msg["axes"][0], 1.0);
    /// # Ok::<(), px4_bridge::error::BridgeError>(())
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Encodes `msg` on `topic` as a single line (without the newline).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Decode`] if `msg` cannot be serialized.
    pub fn encode<T: Serialize>(topic: &str, msg: &T) -> Result<String> {
        let env = Envelope {
            topic: topic.to_string(),
            msg: serde_json::to_value(msg)?,
        };
        Ok(serde_json::to_string(&env)?)
    }
}

/// Reads envelopes from `reader` into the inbound queues until end of input.
///
/// Blocking; run it on its own thread. Blank lines are skipped. Malformed
/// lines (including invalid UTF-8) and envelopes for topics without a queue
/// are logged and skipped.
///
/// # Returns
///
/// * `Result<u64>` - Number of envelopes accepted
///
/// # Errors
///
/// Returns error if reading fails or the queues were closed.
pub fn read_envelopes<R: BufRead>(
    mut reader: R,
    queues: &TopicQueues<serde_json::Value>,
) -> Result<u64> {
    let mut accepted = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("Skipping line that is not valid UTF-8: {}", e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let env = match Envelope::parse(line) {
            Ok(env) => env,
            Err(e) => {
                warn!("Skipping malformed line: {}", e);
                continue;
            }
        };

        match queues.offer(&env.topic, env.msg) {
            Ok(_) => accepted += 1,
            Err(BridgeError::UnknownTopic(topic)) => {
                warn!("Skipping envelope for unrouted topic {}", topic);
            }
            Err(e) => return Err(e),
        }
    }

    debug!("Input closed after {} envelopes", accepted);
    Ok(accepted)
}

/// Drains the outbound queues to `writer` until they are closed and empty.
///
/// `on_written` sees every record after its line was written.
///
/// # Returns
///
/// * `Result<u64>` - Number of envelopes written
///
/// # Errors
///
/// Returns error if encoding or writing fails.
pub async fn write_envelopes<W, F>(
    writer: &mut W,
    queues: &TopicQueues<Outbound>,
    mut on_written: F,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
    F: FnMut(&str, &Outbound),
{
    let mut written = 0;

    while let Some((topic, record)) = queues.pop().await {
        let mut line = Envelope::encode(&topic, &record)?;
        line.push('\n');

        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;

        on_written(&topic, &record);
        written += 1;
    }

    Ok(written)
}
