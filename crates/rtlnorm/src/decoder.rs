//! Decoder contract and shared field helpers
//!
//! Each sensor family implements [`Decoder`]. A decoder declares an
//! [`Identifier`] which the [`Registry`](crate::Registry) searches
//! for in the rtl_433 `model` string (JSON) or in the header line
//! payload (text). The decoder then turns the message into a
//! [`Packet`] plus a sensor instance id.
//!
//! rtl_433 renames its output fields from release to release, and
//! any field may be missing or malformed. The helpers in this
//! module all return `Option`: a field which cannot be read is
//! simply left out of the packet.

use std::fmt;

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as Json;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::record::{Packet, Value};

/// A parsed JSON object from rtl_433
pub type JsonObject = serde_json::Map<String, Json>;

/// Miles per kilometre
pub const MILE_PER_KM: f64 = 0.621371;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static! {
    static ref TIMESTAMP: Regex =
        Regex::new(r"(\d{4}-\d\d-\d\d \d\d:\d\d:\d\d)").expect("bad timestamp regexp");
}

/// Format-specific message decoder
///
/// Implementations are stateless and shared among threads. Every
/// decoder handles JSON. Decoders for sensors which rtl_433 once
/// described in its text output also override
/// [`decode_text()`](#method.decode_text).
pub trait Decoder: Send + Sync {
    /// Decoder name, used as the last part of every fingerprint
    ///
    /// Must not be empty and must not contain a `.`.
    fn name(&self) -> &'static str;

    /// What to search for in the model string or text payload
    fn identifier(&self) -> Identifier;

    /// Decode a JSON object whose `model` matched
    fn decode_json(&self, obj: &JsonObject) -> Decoded;

    /// Decode a text stanza whose header payload matched
    ///
    /// `ts` is the header timestamp, `payload` is the header text
    /// after the timestamp, and `lines` are the stanza lines after
    /// the header. Returns the packet, if any, and how many of
    /// `lines` were used. The default implementation supports
    /// nothing and uses only the header.
    fn decode_text(&self, ts: i64, payload: &str, lines: &[String]) -> TextDecoded {
        let _ = (ts, lines);
        debug!("{}: no text support for \"{}\"", self.name(), payload);
        TextDecoded::header_only(None)
    }
}

/// Pattern which selects a decoder
///
/// Matching is always by containment, never equality, because
/// rtl_433 model strings drift in punctuation and case between
/// releases.
#[derive(Clone, Copy, Debug)]
pub enum Identifier {
    /// Literal substring
    Substring(&'static str),

    /// Regular expression, searched anywhere
    Pattern(&'static Regex),
}

impl Identifier {
    /// True if the identifier occurs anywhere in `haystack`
    pub fn is_found_in(&self, haystack: &str) -> bool {
        match self {
            Identifier::Substring(s) => haystack.contains(s),
            Identifier::Pattern(re) => re.is_match(haystack),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Substring(s) => write!(f, "\"{}\"", s),
            Identifier::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Decoder output: observations plus the sensor instance id
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    /// Observations with decoder-local names
    pub packet: Packet,

    /// Identifies one physical transmitter within the family
    ///
    /// `None` if the message did not say.
    pub sensor_id: Option<String>,
}

impl Decoded {
    /// Packet with a known sensor id
    pub fn new<S>(packet: Packet, sensor_id: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            packet,
            sensor_id: Some(sensor_id.into()),
        }
    }

    /// Packet without a sensor id
    pub fn anonymous(packet: Packet) -> Self {
        Self {
            packet,
            sensor_id: None,
        }
    }
}

/// Result of [`Decoder::decode_text()`]
#[derive(Clone, Debug, PartialEq)]
pub struct TextDecoded {
    /// Decoded packet, if the stanza was understood
    pub decoded: Option<Decoded>,

    /// Number of stanza lines used, after the header
    pub consumed: usize,
}

impl TextDecoded {
    /// Only the header line was used
    pub fn header_only(decoded: Option<Decoded>) -> Self {
        Self {
            decoded,
            consumed: 0,
        }
    }

    /// Every stanza line was used
    pub fn all(decoded: Option<Decoded>, lines: &[String]) -> Self {
        Self {
            decoded,
            consumed: lines.len(),
        }
    }
}

/// Search for a `YYYY-MM-DD HH:MM:SS` timestamp, in UTC
///
/// The timestamp may appear anywhere in `text`. Fractional seconds
/// and anything else around it are ignored.
///
/// ```
/// use rtlnorm::decoder::parse_time;
///
/// assert_eq!(Some(1577836800), parse_time("2020-01-01 00:00:00.123456"));
/// assert_eq!(None, parse_time("@0.084044s"));
/// ```
pub fn parse_time(text: &str) -> Option<i64> {
    let found = TIMESTAMP.captures(text)?;
    match NaiveDateTime::parse_from_str(&found[1], TIME_FORMAT) {
        Ok(dt) => Some(dt.and_utc().timestamp()),
        Err(e) => {
            debug!("bad timestamp \"{}\": {}", &found[1], e);
            None
        }
    }
}

/// Event time from the `time` field, if it has a usable timestamp
pub fn json_time(obj: &JsonObject) -> Option<i64> {
    get_str(obj, "time").and_then(parse_time)
}

/// Field as a float
///
/// Numbers convert directly. Strings are parsed.
pub fn get_float(obj: &JsonObject, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Field as an integer
///
/// Fractional numbers are truncated. Strings must contain an
/// integer.
pub fn get_int(obj: &JsonObject, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Field as a string slice, if it is a string
pub fn get_str<'a>(obj: &'a JsonObject, key: &str) -> Option<&'a str> {
    obj.get(key)?.as_str()
}

/// Field as whatever scalar it is
///
/// Arrays, objects, and `null` are not scalars.
pub fn get_scalar(obj: &JsonObject, key: &str) -> Option<Value> {
    json_scalar(obj.get(key)?)
}

/// Field rendered as identifier text
///
/// Integers render in decimal and strings render as-is. Used for
/// ids and channels, which rtl_433 sends as either.
pub fn get_id(obj: &JsonObject, key: &str) -> Option<String> {
    match obj.get(key)? {
        Json::Number(n) => Some(n.to_string()),
        Json::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Integer field rendered as upper-case hex, at least four digits
pub fn hex_id(obj: &JsonObject, key: &str) -> Option<String> {
    get_int(obj, key).map(|id| format!("{:04X}", id))
}

/// Composite `a:b` id
///
/// A missing part renders as `0`.
pub fn pair_id(first: Option<String>, second: Option<String>) -> String {
    format!(
        "{}:{}",
        first.as_deref().unwrap_or("0"),
        second.as_deref().unwrap_or("0")
    )
}

/// Battery low flag: `0` for OK, `1` for low
///
/// rtl_433 has reported battery state as `battery_ok` (1 is good),
/// `battery_low` (1 is bad), and `battery` (`"OK"` is good). The
/// first of these present wins. Returns `None` if the message says
/// nothing about the battery.
pub fn battery_low(obj: &JsonObject) -> Option<i64> {
    if let Some(ok) = obj.get("battery_ok") {
        return match ok {
            Json::Bool(b) => Some(!b as i64),
            _ => get_int(obj, "battery_ok").map(|ok| (ok == 0) as i64),
        };
    }
    if let Some(low) = obj.get("battery_low") {
        return match low {
            Json::Bool(b) => Some(*b as i64),
            _ => get_int(obj, "battery_low"),
        };
    }
    match obj.get("battery")? {
        Json::String(s) => Some(ok_flag(s)),
        Json::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// `0` if the text is `OK`, otherwise `1`
pub fn ok_flag(text: &str) -> i64 {
    (text.trim() != "OK") as i64
}

/// Degrees Celsius to Fahrenheit
pub fn c_to_f(c: f64) -> f64 {
    c * 1.8 + 32.0
}

/// Kilometres per hour to miles per hour
pub fn kph_to_mph(kph: f64) -> f64 {
    kph * MILE_PER_KM
}

/// Miles per hour to kilometres per hour
pub fn mph_to_kph(mph: f64) -> f64 {
    mph / MILE_PER_KM
}

/// Millimetres to inches
pub fn mm_to_in(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

fn json_scalar(v: &Json) -> Option<Value> {
    match v {
        Json::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Int(i)),
            None => n.as_f64().map(Value::Float),
        },
        Json::String(s) => Some(Value::Text(s.clone())),
        Json::Bool(b) => Some(Value::Bool(*b)),
        _ => None,
    }
}

/// Conversion applied to a stanza value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convert {
    /// Parse as a float
    Float,

    /// Parse as an integer
    Int,

    /// `0` if the value is `OK`, otherwise `1`
    OkFlag,

    /// Keep the text
    Text,
}

impl Convert {
    fn apply(&self, text: &str) -> Option<Value> {
        match self {
            Convert::Float => text.parse::<f64>().ok().map(Value::Float),
            Convert::Int => text.parse::<i64>().ok().map(Value::Int),
            Convert::OkFlag => Some(Value::Int(ok_flag(text))),
            Convert::Text => Some(Value::Text(text.to_owned())),
        }
    }
}

/// How to read one labelled line of a text stanza
///
/// ```
/// use lazy_static::lazy_static;
/// use regex::Regex;
/// use rtlnorm::decoder::{Convert, LineRule};
///
/// lazy_static! {
///     static ref CELSIUS: Regex = Regex::new(r"([\d.-]+) C").unwrap();
/// }
///
/// let rule = LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS);
/// assert_eq!(rule.label(), "Temperature");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LineRule {
    label: &'static str,
    field: &'static str,
    extract: Option<&'static Regex>,
    convert: Convert,
}

impl LineRule {
    /// Store the line labelled `label` into `field`
    pub const fn new(label: &'static str, field: &'static str, convert: Convert) -> Self {
        Self {
            label,
            field,
            extract: None,
            convert,
        }
    }

    /// Take the value from the first capture group of `re`
    ///
    /// If `re` does not match, the whole value is converted
    /// instead.
    pub const fn extract(mut self, re: &'static Regex) -> Self {
        self.extract = Some(re);
        self
    }

    /// Line label
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Output field name
    pub fn field(&self) -> &'static str {
        self.field
    }

    fn read(&self, value: &str) -> Option<Value> {
        let value = match self.extract {
            Some(re) => match re.captures(value).and_then(|c| c.get(1)) {
                Some(m) => m.as_str(),
                None => {
                    debug!("regex failed for {}: \"{}\"", self.label, value);
                    value
                }
            },
            None => value,
        };
        self.convert.apply(value.trim())
    }
}

/// Read `label: value` stanza lines into `pkt`
///
/// Only lines with exactly one `:` are considered. Lines whose
/// label has no rule are ignored. Values which fail to convert are
/// left out. Every line is consumed; returns the number of lines.
pub fn parse_lines(lines: &[String], rules: &[LineRule], pkt: &mut Packet) -> usize {
    for line in lines {
        let mut parts = line.split(':');
        let (name, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) => (name.trim(), value.trim()),
            _ => {
                debug!("skip line \"{}\"", line);
                continue;
            }
        };

        match rules.iter().find(|r| r.label == name) {
            Some(rule) => pkt.set_opt(rule.field, rule.read(value)),
            None => debug!("ignoring {}: {}", name, value),
        }
    }
    lines.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    use crate::record::UnitSystem;

    lazy_static! {
        static ref CELSIUS: Regex = Regex::new(r"([\d.-]+) C").expect("regex");
        static ref PERCENT: Regex = Regex::new(r"([\d.]+) %").expect("regex");
    }

    fn obj(text: &str) -> JsonObject {
        match serde_json::from_str(text).expect("json") {
            Json::Object(o) => o,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("2020-01-01 00:00:00"), Some(1577836800));
        assert_eq!(parse_time("time: 2019-07-29 07:44:23.005624"), Some(1564386263));
        assert_eq!(parse_time("2020-13-01 00:00:00"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_getters() {
        let o = obj(
            r#"{"a": 1, "b": 2.5, "c": "3.25", "d": "x", "e": null, "f": [1], "g": true, "id": 100}"#,
        );
        assert_eq!(get_int(&o, "a"), Some(1));
        assert_eq!(get_int(&o, "b"), Some(2));
        assert_eq!(get_int(&o, "c"), None);
        assert_approx_eq!(get_float(&o, "a").unwrap(), 1.0f64);
        assert_approx_eq!(get_float(&o, "c").unwrap(), 3.25f64);
        assert_eq!(get_float(&o, "d"), None);
        assert_eq!(get_float(&o, "e"), None);
        assert_eq!(get_float(&o, "missing"), None);
        assert_eq!(get_scalar(&o, "a"), Some(Value::Int(1)));
        assert_eq!(get_scalar(&o, "b"), Some(Value::Float(2.5)));
        assert_eq!(get_scalar(&o, "g"), Some(Value::Bool(true)));
        assert_eq!(get_scalar(&o, "f"), None);
        assert_eq!(get_id(&o, "d"), Some("x".to_owned()));
        assert_eq!(get_id(&o, "id"), Some("100".to_owned()));
        assert_eq!(hex_id(&o, "id"), Some("0064".to_owned()));
        assert_eq!(pair_id(get_id(&o, "a"), None), "1:0");
    }

    #[test]
    fn test_battery_low() {
        assert_eq!(battery_low(&obj(r#"{"battery_ok": 1}"#)), Some(0));
        assert_eq!(battery_low(&obj(r#"{"battery_ok": 0}"#)), Some(1));
        assert_eq!(battery_low(&obj(r#"{"battery_ok": true}"#)), Some(0));
        assert_eq!(battery_low(&obj(r#"{"battery_low": 1}"#)), Some(1));
        assert_eq!(battery_low(&obj(r#"{"battery": "OK"}"#)), Some(0));
        assert_eq!(battery_low(&obj(r#"{"battery": "LOW"}"#)), Some(1));
        assert_eq!(battery_low(&obj(r#"{"battery": 0}"#)), Some(0));
        assert_eq!(battery_low(&obj(r#"{"humidity": 50}"#)), None);
    }

    #[test]
    fn test_identifier() {
        lazy_static! {
            static ref TOWER: Regex = Regex::new(r"(?i)acurite[- ]tower").expect("regex");
        }

        let sub = Identifier::Substring("Nexus");
        assert!(sub.is_found_in("Nexus Temperature/Humidity"));
        assert!(!sub.is_found_in("nexus"));
        assert_eq!(format!("{}", sub), "\"Nexus\"");

        let pat = Identifier::Pattern(&TOWER);
        assert!(pat.is_found_in("Acurite tower sensor"));
        assert!(pat.is_found_in("Acurite-Tower"));
        assert!(!pat.is_found_in("Acurite-5n1"));
    }

    #[test]
    fn test_parse_lines() {
        let rules = [
            LineRule::new("ID", "station_id", Convert::Int),
            LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
            LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
            LineRule::new("Battery", "battery", Convert::OkFlag),
        ];
        let lines: Vec<String> = [
            "    ID:     239",
            "Temperature: 19.9 C",
            "Humidity: bogus",
            "Battery: LOW",
            "Pressure: 1007.9 hPa",
            "time : 2019-04-08 00:48:02",
            "no colon here",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut pkt = Packet::new(Some(0), UnitSystem::Metric);
        assert_eq!(parse_lines(&lines, &rules, &mut pkt), 7);
        assert_eq!(pkt.get("station_id"), Some(&Value::Int(239)));
        assert_eq!(pkt.get("temperature"), Some(&Value::Float(19.9)));
        assert_eq!(pkt.get("battery"), Some(&Value::Int(1)));
        assert_eq!(pkt.get("humidity"), None);
        assert_eq!(pkt.get("Pressure"), None);
        assert_eq!(pkt.len(), 3);
    }
}
