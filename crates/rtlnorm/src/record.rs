//! Observation values and the records built from them
//!
//! Records move through the pipeline in three shapes:
//!
//! 1. [`Packet`]: what a decoder produces. Field names are
//!    decoder-local, like `temperature` or `rain_total`.
//!
//! 2. [`QualifiedRecord`]: every field name rewritten to its
//!    [fingerprint](crate::Fingerprint), like
//!    `temperature.25A6.AcuriteTowerPacket`.
//!
//! 3. [`OutputRecord`]: the caller's chosen field names, after the
//!    [sensor map](crate::SensorMap) has selected and renamed them.
//!
//! Every record carries two administrative fields which are never
//! qualified or renamed: the event time (`dateTime`) and the unit
//! system (`usUnits`).

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use strum::EnumMessage;

/// Name of the event time field in serialized records
pub const DATE_TIME: &str = "dateTime";

/// Name of the unit system field in serialized records
pub const US_UNITS: &str = "usUnits";

/// Observation fields, in a deterministic (sorted) key order
pub type FieldMap = BTreeMap<String, Value>;

/// A scalar observation value
///
/// rtl_433 emits numbers, strings, and the occasional boolean.
/// Anything else (arrays, objects, `null`) is not an observation
/// and never becomes a `Value`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Whole number
    Int(i64),

    /// Floating-point number
    Float(f64),

    /// Text, such as a channel letter
    Text(String),

    /// Boolean flag
    Bool(bool),
}

impl Value {
    /// Numeric value, if this is a number
    ///
    /// Only `Int` and `Float` are numeric. Text is never parsed
    /// here; decoders are responsible for conversions.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// True if this is an `Int` or a `Float`
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric difference `self − older`
    ///
    /// Two `Int` values subtract exactly. Any other numeric
    /// combination subtracts as `f64`. Returns `None` if either
    /// side is not numeric or if an integer subtraction would
    /// overflow.
    pub fn checked_sub(&self, older: &Value) -> Option<Value> {
        match (self, older) {
            (Value::Int(new), Value::Int(old)) => new.checked_sub(*old).map(Value::Int),
            _ => Some(Value::Float(self.as_f64()? - older.as_f64()?)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => i.fmt(f),
            Value::Float(v) => v.fmt(f),
            Value::Text(s) => s.fmt(f),
            Value::Bool(b) => b.fmt(f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

/// Unit system of a record
///
/// Identifies the units in which every observation of a record is
/// expressed. The numeric codes are the ones used by weather
/// databases and are what [`OutputRecord`] serializes.
///
/// ```
/// use rtlnorm::UnitSystem;
///
/// assert_eq!(16, UnitSystem::Metric.code());
/// assert_eq!("METRICWX", UnitSystem::MetricWx.as_str());
/// assert_eq!(Some(UnitSystem::Us), UnitSystem::from_code(1));
/// assert_eq!(Ok(UnitSystem::Metric), "METRIC".parse());
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage, strum_macros::EnumString,
)]
#[repr(u8)]
pub enum UnitSystem {
    /// US customary: °F, mph, inches, inHg
    #[strum(serialize = "US", detailed_message = "US customary")]
    Us = 1,

    /// Metric: °C, km/h, cm, mbar
    #[strum(serialize = "METRIC", detailed_message = "Metric")]
    Metric = 16,

    /// Metric with SI wind: °C, m/s, mm, mbar
    #[strum(serialize = "METRICWX", detailed_message = "Metric with m/s wind")]
    MetricWx = 17,
}

impl UnitSystem {
    /// Database code for this unit system
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Convert from database code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(UnitSystem::Us),
            16 => Some(UnitSystem::Metric),
            17 => Some(UnitSystem::MetricWx),
            _ => None,
        }
    }

    /// Short name, like "`METRIC`"
    pub fn as_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// Human-readable description
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().unwrap_or_else(|| self.as_str())
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl Serialize for UnitSystem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

/// Decoder output
///
/// Observation fields with decoder-local names. The `date_time`
/// may be absent if the decoder could not read one from the
/// message; the pipeline fills it in when the record is
/// qualified.
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    /// Event time, seconds since the UNIX epoch (UTC)
    pub date_time: Option<i64>,

    /// Units of every observation in `fields`
    pub us_units: UnitSystem,

    /// Observations
    pub fields: FieldMap,
}

impl Packet {
    /// Empty packet
    pub fn new(date_time: Option<i64>, us_units: UnitSystem) -> Self {
        Self {
            date_time,
            us_units,
            fields: FieldMap::new(),
        }
    }

    /// Set a field
    pub fn set<V>(&mut self, name: &str, value: V)
    where
        V: Into<Value>,
    {
        self.fields.insert(name.to_owned(), value.into());
    }

    /// Set a field if the value is present
    ///
    /// Absent values leave the field unset. They never
    /// overwrite a value which is already present.
    pub fn set_opt<V>(&mut self, name: &str, value: Option<V>)
    where
        V: Into<Value>,
    {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    /// Remove a field and return it
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Field value, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if there are no observations
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Observations keyed by fingerprint
///
/// Every key in `fields` has the form
/// `observation.sensor_id.decoder`. See
/// [`qualify()`](crate::qualify).
#[derive(Clone, Debug, PartialEq)]
pub struct QualifiedRecord {
    /// Event time, seconds since the UNIX epoch (UTC)
    pub date_time: i64,

    /// Units of every observation in `fields`
    pub us_units: UnitSystem,

    /// Fingerprinted observations
    pub fields: FieldMap,
}

impl QualifiedRecord {
    /// Iterate fingerprints in deterministic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}

impl fmt::Display for QualifiedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_record(f, self.date_time, self.us_units, &self.fields)
    }
}

impl Serialize for QualifiedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_record(serializer, self.date_time, self.us_units, &self.fields)
    }
}

/// A finished, database-ready record
///
/// Contains the caller's target field names, as selected by the
/// [`SensorMap`](crate::SensorMap), and possibly some delta
/// fields from the [`DeltaCalculator`](crate::DeltaCalculator).
/// An `OutputRecord` that leaves the pipeline always has at least
/// one observation.
///
/// Records serialize to a flat JSON object:
///
/// ```
/// use rtlnorm::{OutputRecord, UnitSystem};
///
/// let mut rec = OutputRecord::new(1577836800, UnitSystem::Metric);
/// rec.fields.insert("outTemp".to_owned(), 10.0.into());
/// assert_eq!(
///     serde_json::to_string(&rec).unwrap(),
///     r#"{"dateTime":1577836800,"usUnits":16,"outTemp":10.0}"#
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    /// Event time, seconds since the UNIX epoch (UTC)
    pub date_time: i64,

    /// Units of every observation in `fields`
    pub us_units: UnitSystem,

    /// Observations, by target name
    pub fields: FieldMap,
}

impl OutputRecord {
    /// Record with no observations yet
    pub fn new(date_time: i64, us_units: UnitSystem) -> Self {
        Self {
            date_time,
            us_units,
            fields: FieldMap::new(),
        }
    }

    /// Field value, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_record(f, self.date_time, self.us_units, &self.fields)
    }
}

impl Serialize for OutputRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_record(serializer, self.date_time, self.us_units, &self.fields)
    }
}

// administrative fields first, then observations
fn serialize_record<S>(
    serializer: S,
    date_time: i64,
    us_units: UnitSystem,
    fields: &FieldMap,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(fields.len() + 2))?;
    map.serialize_entry(DATE_TIME, &date_time)?;
    map.serialize_entry(US_UNITS, &us_units)?;
    for (k, v) in fields {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

fn fmt_record(
    f: &mut fmt::Formatter<'_>,
    date_time: i64,
    us_units: UnitSystem,
    fields: &FieldMap,
) -> fmt::Result {
    write!(f, "{}={}, {}={}", DATE_TIME, date_time, US_UNITS, us_units)?;
    for (k, v) in fields {
        write!(f, ", {}={}", k, v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_checked_sub() {
        assert_eq!(
            Value::Int(15).checked_sub(&Value::Int(10)),
            Some(Value::Int(5))
        );
        assert_eq!(
            Value::Float(1.5).checked_sub(&Value::Int(1)),
            Some(Value::Float(0.5))
        );
        assert_eq!(Value::Int(i64::MIN).checked_sub(&Value::Int(1)), None);
        assert_eq!(Value::from("A").checked_sub(&Value::Int(1)), None);
    }

    #[test]
    fn test_unit_system() {
        assert_eq!(UnitSystem::Us.code(), 1);
        assert_eq!(UnitSystem::MetricWx.code(), 17);
        assert_eq!(UnitSystem::from_code(2), None);
        assert_eq!(UnitSystem::try_from("US").unwrap(), UnitSystem::Us);
        assert!(UnitSystem::try_from("IMPERIAL").is_err());
        assert_eq!(format!("{}", UnitSystem::Metric), "METRIC");
        assert_eq!(UnitSystem::Us.as_display_str(), "US customary");
    }

    #[test]
    fn test_packet_set_opt() {
        let mut pkt = Packet::new(None, UnitSystem::Metric);
        pkt.set("humidity", 50i64);
        pkt.set_opt::<f64>("humidity", None);
        pkt.set_opt("temperature", Some(10.0));
        assert_eq!(pkt.get("humidity"), Some(&Value::Int(50)));
        assert_eq!(pkt.get("temperature"), Some(&Value::Float(10.0)));
        assert_eq!(pkt.take("humidity"), Some(Value::Int(50)));
        assert_eq!(pkt.len(), 1);
    }

    #[test]
    fn test_output_record_serialize() {
        let mut rec = OutputRecord::new(100, UnitSystem::Us);
        rec.fields.insert("rain".to_owned(), Value::Int(5));
        rec.fields.insert("channel".to_owned(), Value::from("A"));
        rec.fields.insert("battery_ok".to_owned(), Value::Bool(true));
        assert_eq!(
            serde_json::to_string(&rec).unwrap(),
            r#"{"dateTime":100,"usUnits":1,"battery_ok":true,"channel":"A","rain":5}"#
        );
        assert_eq!(
            format!("{}", rec),
            "dateTime=100, usUnits=US, battery_ok=true, channel=A, rain=5"
        );
    }
}
