//! Rates from cumulative counters
//!
//! Rain gauges and lightning detectors report running totals.
//! The [`DeltaCalculator`] turns each total into the amount since
//! the previous report.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

#[cfg(not(test))]
use log::{debug, info};

#[cfg(test)]
use std::{println as debug, println as info};

use crate::record::{OutputRecord, Value};

/// Map from delta field name to counter field name
///
/// Both names are output field names, as chosen in the
/// [`SensorMap`](crate::SensorMap). The default derives `rain`
/// from `rain_total` and `strikes` from `strikes_total`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deltas(BTreeMap<String, String>);

impl Deltas {
    /// No deltas at all
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Derive `delta` from `counter`
    pub fn insert<D, C>(&mut self, delta: D, counter: C) -> &mut Self
    where
        D: Into<String>,
        C: Into<String>,
    {
        self.0.insert(delta.into(), counter.into());
        self
    }

    /// Delta and counter names, ordered by delta
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(d, c)| (d.as_str(), c.as_str()))
    }

    /// Number of deltas
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no deltas
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Deltas {
    fn default() -> Self {
        [("rain", "rain_total"), ("strikes", "strikes_total")]
            .into_iter()
            .collect()
    }
}

impl<D, C> FromIterator<(D, C)> for Deltas
where
    D: Into<String>,
    C: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (D, C)>,
    {
        Self(
            iter.into_iter()
                .map(|(d, c)| (d.into(), c.into()))
                .collect(),
        )
    }
}

/// Derives delta fields from cumulative counters
///
/// Remembers the last value of every counter it has seen. When a
/// counter increases or stays the same, the difference is added
/// to the record. When a counter decreases, it is assumed to have
/// been reset: no delta is added and the new value becomes the
/// baseline.
///
/// ```
/// use rtlnorm::{DeltaCalculator, Deltas, OutputRecord, UnitSystem};
///
/// let mut calc = DeltaCalculator::new(Deltas::default());
/// let mut deltas = vec![];
/// for total in [10, 15, 12, 20] {
///     let mut rec = OutputRecord::new(0, UnitSystem::Us);
///     rec.fields.insert("rain_total".to_owned(), total.into());
///     calc.apply(&mut rec);
///     deltas.push(rec.get("rain").map(|v| v.to_string()));
/// }
/// assert_eq!(deltas, [None, Some("5".to_owned()), None, Some("8".to_owned())]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DeltaCalculator {
    deltas: Deltas,
    last: HashMap<String, Value>,
}

impl DeltaCalculator {
    /// New calculator, with no counter history
    pub fn new(deltas: Deltas) -> Self {
        Self {
            deltas,
            last: HashMap::new(),
        }
    }

    /// Configured deltas
    pub fn deltas(&self) -> &Deltas {
        &self.deltas
    }

    /// Last value seen for `counter`
    pub fn baseline(&self, counter: &str) -> Option<&Value> {
        self.last.get(counter)
    }

    /// Forget every counter
    pub fn reset(&mut self) {
        self.last.clear();
    }

    /// Add delta fields to `rec`
    ///
    /// Counters which are absent from `rec`, or are not numbers,
    /// are ignored and keep their previous baseline.
    pub fn apply(&mut self, rec: &mut OutputRecord) {
        let mut seen: Vec<(String, Value)> = Vec::new();

        for (delta, counter) in self.deltas.iter() {
            let newer = match rec.get(counter) {
                Some(v) if v.is_numeric() => v.clone(),
                Some(v) => {
                    debug!("deltas: {} is not a number: {}", counter, v);
                    continue;
                }
                None => continue,
            };

            match self.last.get(counter) {
                None => debug!("deltas: {} baseline is {}", counter, newer),
                Some(older) => match newer.checked_sub(older) {
                    Some(diff) if diff.as_f64().map(|d| d >= 0.0).unwrap_or(false) => {
                        rec.fields.insert(delta.to_owned(), diff);
                    }
                    Some(_) => info!(
                        "deltas: {} decrement ignored: new={} old={}",
                        counter, newer, older
                    ),
                    None => info!("deltas: {} cannot subtract {} from {}", counter, older, newer),
                },
            }

            seen.push((counter.to_owned(), newer));
        }

        self.last.extend(seen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    use crate::record::UnitSystem;

    fn record(fields: &[(&str, Value)]) -> OutputRecord {
        let mut rec = OutputRecord::new(0, UnitSystem::Metric);
        for (k, v) in fields {
            rec.fields.insert(k.to_string(), v.clone());
        }
        rec
    }

    #[test]
    fn test_counter_reset() {
        let mut calc = DeltaCalculator::new(Deltas::default());
        let mut out = Vec::new();
        for total in [10, 15, 12, 20] {
            let mut rec = record(&[("rain_total", Value::Int(total))]);
            calc.apply(&mut rec);
            out.push(rec.get("rain").cloned());
        }
        assert_eq!(
            out,
            vec![None, Some(Value::Int(5)), None, Some(Value::Int(8))]
        );
        assert_eq!(calc.baseline("rain_total"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_float_and_unchanged() {
        let mut calc = DeltaCalculator::new(Deltas::default());
        calc.apply(&mut record(&[("rain_total", Value::Float(1.25))]));

        let mut rec = record(&[("rain_total", Value::Float(1.5))]);
        calc.apply(&mut rec);
        assert_approx_eq!(rec.get("rain").and_then(Value::as_f64).unwrap(), 0.25f64);

        let mut rec = record(&[("rain_total", Value::Float(1.5))]);
        calc.apply(&mut rec);
        assert_eq!(rec.get("rain"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn test_absent_and_text_counters() {
        let mut calc = DeltaCalculator::new(Deltas::default());
        calc.apply(&mut record(&[("strikes_total", Value::Int(3))]));

        let mut rec = record(&[("outTemp", Value::Float(20.0))]);
        calc.apply(&mut rec);
        assert_eq!(rec.fields.len(), 1);

        let mut rec = record(&[("strikes_total", Value::from("many"))]);
        calc.apply(&mut rec);
        assert_eq!(rec.get("strikes"), None);
        assert_eq!(calc.baseline("strikes_total"), Some(&Value::Int(3)));

        let mut rec = record(&[("strikes_total", Value::Int(7))]);
        calc.apply(&mut rec);
        assert_eq!(rec.get("strikes"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_shared_counter() {
        let mut deltas = Deltas::empty();
        deltas.insert("a", "total").insert("b", "total");
        let mut calc = DeltaCalculator::new(deltas);

        calc.apply(&mut record(&[("total", Value::Int(1))]));
        let mut rec = record(&[("total", Value::Int(4))]);
        calc.apply(&mut rec);
        assert_eq!(rec.get("a"), Some(&Value::Int(3)));
        assert_eq!(rec.get("b"), Some(&Value::Int(3)));

        calc.reset();
        assert_eq!(calc.baseline("total"), None);
    }

    #[test]
    fn test_deserialize() {
        let deltas: Deltas = toml::from_str(r#"rain = "rainTotal""#).expect("toml");
        assert_eq!(deltas.iter().collect::<Vec<_>>(), vec![("rain", "rainTotal")]);
        assert_eq!(Deltas::default().len(), 2);
    }
}
