//! Select and rename fingerprinted observations

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;

#[cfg(not(test))]
use log::warn;

#[cfg(test)]
use std::println as warn;

use crate::record::{OutputRecord, QualifiedRecord};

/// Map from output field name to fingerprint pattern
///
/// Each target is filled from the first fingerprint which
/// matches its pattern. A pattern matches a fingerprint if:
///
/// 1. it is exactly equal to it; or
/// 2. it has three dot-separated parts, and each part
///    glob-matches the corresponding part of the fingerprint; or
/// 3. its first part is exactly equal to the key.
///
/// Glob parts support `*`, `?`, `[abc]`, `[a-z]`, and `[!abc]`.
/// Patterns which cannot be compiled never match anything but
/// themselves. They are not rejected.
///
/// ```
/// use rtlnorm::SensorMap;
///
/// let map: SensorMap = [("outTemp", "temperature.*.AcuriteTowerPacket")]
///     .into_iter()
///     .collect();
/// assert!(map.matches("outTemp", "temperature.25A6.AcuriteTowerPacket"));
/// assert!(!map.matches("outTemp", "temperature.25A6.Acurite5n1Packet"));
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct SensorMap {
    targets: BTreeMap<String, FieldPattern>,
}

impl SensorMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a target
    pub fn insert<T, P>(&mut self, target: T, pattern: P) -> &mut Self
    where
        T: Into<String>,
        P: AsRef<str>,
    {
        self.targets
            .insert(target.into(), FieldPattern::new(pattern.as_ref()));
        self
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if there are no targets
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets and their patterns, ordered by target
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.targets
            .iter()
            .map(|(t, p)| (t.as_str(), p.text.as_str()))
    }

    /// True if `target`'s pattern matches `key`
    ///
    /// Returns false if there is no such target.
    pub fn matches(&self, target: &str, key: &str) -> bool {
        self.targets
            .get(target)
            .map(|p| p.text == key || p.matches_key(key))
            .unwrap_or(false)
    }

    /// Project a qualified record onto the targets
    ///
    /// Targets with no matching fingerprint are left out. If no
    /// target matches, returns `None` rather than a record with
    /// only `dateTime` and `usUnits`.
    pub fn apply(&self, rec: &QualifiedRecord) -> Option<OutputRecord> {
        let mut out = OutputRecord::new(rec.date_time, rec.us_units);
        for (target, pattern) in &self.targets {
            if let Some(key) = pattern.find(rec) {
                out.fields.insert(target.clone(), rec.fields[key].clone());
            }
        }

        if out.fields.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

impl From<BTreeMap<String, String>> for SensorMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<T, P> FromIterator<(T, P)> for SensorMap
where
    T: Into<String>,
    P: AsRef<str>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (T, P)>,
    {
        let mut out = Self::new();
        for (target, pattern) in iter {
            out.insert(target, pattern);
        }
        out
    }
}

#[derive(Clone, Debug)]
struct FieldPattern {
    text: String,
    parts: Option<[Regex; 3]>,
}

impl FieldPattern {
    fn new(text: &str) -> Self {
        let split: Vec<&str> = text.split('.').collect();
        let parts = match split.as_slice() {
            [o, s, d] => match (glob_regex(o), glob_regex(s), glob_regex(d)) {
                (Ok(o), Ok(s), Ok(d)) => Some([o, s, d]),
                _ => {
                    warn!("sensor map: pattern \"{}\" is malformed", text);
                    None
                }
            },
            _ => None,
        };

        Self {
            text: text.to_owned(),
            parts,
        }
    }

    fn first_part(&self) -> &str {
        self.text.split('.').next().unwrap_or("")
    }

    fn matches_key(&self, key: &str) -> bool {
        if let Some(parts) = &self.parts {
            let mut kparts = key.split('.');
            let three = (kparts.next(), kparts.next(), kparts.next(), kparts.next());
            if let (Some(o), Some(s), Some(d), None) = three {
                if parts[0].is_match(o) && parts[1].is_match(s) && parts[2].is_match(d) {
                    return true;
                }
            }
        }
        self.first_part() == key
    }

    // first fingerprint, in the record's key order
    fn find<'r>(&self, rec: &'r QualifiedRecord) -> Option<&'r str> {
        if let Some((key, _)) = rec.fields.get_key_value(&self.text) {
            return Some(key.as_str());
        }
        rec.keys().find(|key| self.matches_key(key))
    }
}

/// Translate one glob part to an anchored regular expression
fn glob_regex(glob: &str) -> Result<Regex, regex::Error> {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, i + 1) {
                Some(end) => {
                    out.push('[');
                    let mut j = i + 1;
                    if chars[j] == '!' {
                        out.push('^');
                        j += 1;
                    }
                    for &c in &chars[j..end] {
                        if c != '-' && c.is_ascii_punctuation() {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
        i += 1;
    }

    out.push('$');
    Regex::new(&out)
}

// index of the `]` closing a class which opens before `start`
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars[j.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|p| j + p)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::{FieldMap, UnitSystem, Value};

    fn record(keys: &[(&str, Value)]) -> QualifiedRecord {
        let mut fields = FieldMap::new();
        for (k, v) in keys {
            fields.insert(k.to_string(), v.clone());
        }
        QualifiedRecord {
            date_time: 1577836800,
            us_units: UnitSystem::Metric,
            fields,
        }
    }

    #[test]
    fn test_glob_regex() {
        assert!(glob_regex("*").unwrap().is_match("anything"));
        assert!(glob_regex("25?6").unwrap().is_match("25A6"));
        assert!(!glob_regex("25?6").unwrap().is_match("25A"));
        assert!(glob_regex("[0-9]*").unwrap().is_match("1:80"));
        assert!(!glob_regex("[!0-9]*").unwrap().is_match("1:80"));
        assert!(glob_regex("a[").unwrap().is_match("a["));
        assert!(glob_regex("1:8(0)").unwrap().is_match("1:8(0)"));
        assert!(glob_regex("[]]").unwrap().is_match("]"));
        assert!(glob_regex("[z-a]").is_err());
    }

    #[test]
    fn test_three_part_match() {
        let map: SensorMap = [("outTemp", "temperature.*.AcuriteTowerPacket")]
            .into_iter()
            .collect();

        let out = map
            .apply(&record(&[
                ("temperature.25A6.Acurite5n1Packet", Value::Float(1.0)),
                ("temperature.25A6.AcuriteTowerPacket", Value::Float(2.0)),
            ]))
            .expect("matched");
        assert_eq!(out.get("outTemp"), Some(&Value::Float(2.0)));
        assert_eq!(out.date_time, 1577836800);
        assert_eq!(out.us_units, UnitSystem::Metric);
        assert_eq!(out.fields.len(), 1);

        assert!(map
            .apply(&record(&[(
                "temperature.25A6.Acurite5n1Packet",
                Value::Float(1.0)
            )]))
            .is_none());
    }

    #[test]
    fn test_first_key_wins() {
        let map: SensorMap = [("outTemp", "temperature.*.*")].into_iter().collect();
        let out = map
            .apply(&record(&[
                ("temperature.B.Dec", Value::Int(2)),
                ("temperature.A.Dec", Value::Int(1)),
            ]))
            .expect("matched");
        assert_eq!(out.get("outTemp"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_exact_and_bare() {
        let mut map = SensorMap::new();
        map.insert("inTemp", "temperature.1:80.Dec")
            .insert("unused", "humidity");
        assert_eq!(map.len(), 2);

        let out = map
            .apply(&record(&[
                ("temperature.1:80.Dec", Value::Float(20.5)),
                ("humidity.1:80.Dec", Value::Int(50)),
            ]))
            .expect("matched");
        assert_eq!(out.get("inTemp"), Some(&Value::Float(20.5)));
        assert_eq!(out.get("unused"), None);

        let out = map
            .apply(&record(&[("humidity", Value::Int(40))]))
            .expect("matched");
        assert_eq!(out.get("unused"), Some(&Value::Int(40)));
    }

    #[test]
    fn test_malformed_never_matches() {
        let map: SensorMap = [("bad", "temperature.[z-a].Dec")].into_iter().collect();
        assert!(map
            .apply(&record(&[("temperature.q.Dec", Value::Int(1))]))
            .is_none());
    }

    #[test]
    fn test_deserialize() {
        let map: SensorMap = toml::from_str(
            r#"
            outTemp = "temperature.*.AcuriteTowerPacket"
            rain = "rain_total.*.*"
            "#,
        )
        .expect("toml");
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            vec![
                ("outTemp", "temperature.*.AcuriteTowerPacket"),
                ("rain", "rain_total.*.*"),
            ]
        );
    }
}
