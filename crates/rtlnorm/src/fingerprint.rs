//! Sensor fingerprints
//!
//! A fingerprint names one observation stream from one physical
//! sensor: `observation.sensor_id.decoder`, as in
//! `temperature.0064.AcuriteTowerPacket`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::record::{FieldMap, QualifiedRecord};
use crate::registry::Dispatched;

/// Sensor id used when the decoder could not find one
pub const DEFAULT_SENSOR_ID: &str = "0000";

/// Compound `observation.sensor_id.decoder` key
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint {
    observation: String,
    sensor_id: String,
    decoder: String,
}

/// A string which is not a fingerprint
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
#[error("fingerprint must have three non-empty dot-separated parts")]
pub struct FingerprintErr {}

impl Fingerprint {
    /// Fingerprint from parts
    pub fn new<O, S, D>(observation: O, sensor_id: S, decoder: D) -> Self
    where
        O: Into<String>,
        S: Into<String>,
        D: Into<String>,
    {
        Self {
            observation: observation.into(),
            sensor_id: sensor_id.into(),
            decoder: decoder.into(),
        }
    }

    /// Observation name, like `temperature`
    pub fn observation(&self) -> &str {
        &self.observation
    }

    /// Sensor instance id
    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    /// Decoder name
    pub fn decoder(&self) -> &str {
        &self.decoder
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.observation, self.sensor_id, self.decoder)
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(o), Some(s), Some(d), None) if !o.is_empty() && !s.is_empty() && !d.is_empty() => {
                Ok(Self::new(o, s, d))
            }
            _ => Err(FingerprintErr {}),
        }
    }
}

/// Rewrite every observation name to its fingerprint
///
/// The `dateTime` and `usUnits` fields are carried over
/// unqualified. A packet without a time of its own is stamped
/// with `received_at`. A packet without a sensor id is given
/// [`DEFAULT_SENSOR_ID`].
///
/// ```
/// use rtlnorm::{qualify, MessageBlock, Registry};
///
/// let block = MessageBlock::new([
///     r#"{"time" : "2020-01-01 00:00:00", "model" : "Acurite-Tower", "id" : 100, "temperature_C" : 10.0}"#,
/// ]);
/// let rec = qualify(Registry::default().dispatch(&block).unwrap(), 0);
/// assert!(rec.fields.contains_key("temperature.0064.AcuriteTowerPacket"));
/// assert_eq!(rec.date_time, 1577836800);
/// ```
pub fn qualify(dispatched: Dispatched, received_at: i64) -> QualifiedRecord {
    let Dispatched { decoder, decoded } = dispatched;
    let sensor_id = match decoded.sensor_id {
        Some(id) if !id.is_empty() => id,
        _ => DEFAULT_SENSOR_ID.to_owned(),
    };

    let date_time = decoded.packet.date_time.unwrap_or_else(|| {
        debug!("{}: no event time, using {}", decoder, received_at);
        received_at
    });

    let fields: FieldMap = decoded
        .packet
        .fields
        .into_iter()
        .map(|(name, value)| {
            (
                Fingerprint::new(name, sensor_id.as_str(), decoder).to_string(),
                value,
            )
        })
        .collect();

    QualifiedRecord {
        date_time,
        us_units: decoded.packet.us_units,
        fields,
    }
}
