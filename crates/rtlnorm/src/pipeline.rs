//! Normalization pipeline
//!
//! A [`Pipeline`] owns every stage between raw lines and finished
//! records:
//!
//! ```txt
//! lines ─→ Framer ─→ Registry ─→ qualify ─→ SensorMap ─→ DeltaCalculator ─→ DuplicateSuppressor ─→ records
//! ```
//!
//! Counter history and the last emitted record belong to the
//! pipeline. Each rtl_433 process should have its own.

use std::collections::VecDeque;

#[cfg(not(test))]
use log::{debug, info};

#[cfg(test)]
use std::{println as debug, println as info};

use crate::dedup::DuplicateSuppressor;
use crate::deltas::{DeltaCalculator, Deltas};
use crate::fingerprint::qualify;
use crate::framing::{Fetch, Framer, MessageBlock};
use crate::record::{OutputRecord, QualifiedRecord};
use crate::registry::{DecodeErr, Registry};
use crate::sensormap::SensorMap;

/// Current UTC time, in whole seconds since the UNIX epoch
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Builds a [`Pipeline`]
///
/// All you really need to provide is a [`SensorMap`]. Without
/// one, every record is dropped.
#[derive(Clone, Debug)]
pub struct PipelineBuilder {
    sensor_map: SensorMap,
    deltas: Deltas,
    log_unknown: bool,
    log_unmapped: bool,
    clock: fn() -> i64,
}

impl PipelineBuilder {
    /// New builder with an empty sensor map and default deltas
    pub fn new() -> Self {
        Self {
            sensor_map: SensorMap::new(),
            deltas: Deltas::default(),
            log_unknown: false,
            log_unmapped: false,
            clock: now,
        }
    }

    /// Build with the full decoder catalog
    pub fn build(&self) -> Pipeline {
        self.build_with_registry(Registry::default())
    }

    /// Build with a custom set of decoders
    pub fn build_with_registry(&self, registry: Registry) -> Pipeline {
        Pipeline {
            framer: Framer::new(),
            registry,
            sensor_map: self.sensor_map.clone(),
            deltas: DeltaCalculator::new(self.deltas.clone()),
            dedup: DuplicateSuppressor::new(),
            log_unknown: self.log_unknown,
            log_unmapped: self.log_unmapped,
            clock: self.clock,
        }
    }

    /// Output fields and the fingerprints which fill them
    pub fn with_sensor_map(&mut self, sensor_map: SensorMap) -> &mut Self {
        self.sensor_map = sensor_map;
        self
    }

    /// Delta fields and the counters they derive from
    ///
    /// Replaces the defaults.
    pub fn with_deltas(&mut self, deltas: Deltas) -> &mut Self {
        self.deltas = deltas;
        self
    }

    /// Log blocks which no decoder recognizes, at `info`
    pub fn with_log_unknown(&mut self, enable: bool) -> &mut Self {
        self.log_unknown = enable;
        self
    }

    /// Log decoded records which match no sensor map target, at `info`
    pub fn with_log_unmapped(&mut self, enable: bool) -> &mut Self {
        self.log_unmapped = enable;
        self
    }

    /// Source of the current time
    ///
    /// Used to stamp packets whose message carries no usable
    /// time. Defaults to the system clock.
    pub fn with_clock(&mut self, clock: fn() -> i64) -> &mut Self {
        self.clock = clock;
        self
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns rtl_433 output into database-ready records
///
/// Feed it lines with [`iter()`](#method.iter), or feed it
/// framed blocks with [`process()`](#method.process).
///
/// ```
/// use rtlnorm::{Fetch, PipelineBuilder, SensorMap, UnitSystem};
///
/// let map: SensorMap = [("outTemp", "temperature.*.AcuriteTowerPacket")]
///     .into_iter()
///     .collect();
/// let mut pipeline = PipelineBuilder::new().with_sensor_map(map).build();
///
/// let line = r#"{"time":"2020-01-01 00:00:00","model":"Acurite-Tower","id":100,"channel":"A","temperature_C":10.0,"humidity":50,"battery_low":0}"#;
/// let records: Vec<_> = pipeline.iter([Fetch::Line(line.into())]).collect();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].date_time, 1577836800);
/// assert_eq!(records[0].us_units, UnitSystem::Metric);
/// assert_eq!(records[0].get("outTemp"), Some(&10.0.into()));
/// ```
#[derive(Debug)]
pub struct Pipeline {
    framer: Framer,
    registry: Registry,
    sensor_map: SensorMap,
    deltas: DeltaCalculator,
    dedup: DuplicateSuppressor,
    log_unknown: bool,
    log_unmapped: bool,
    clock: fn() -> i64,
}

impl Pipeline {
    /// Decode and fingerprint one block
    ///
    /// Returns `None` if the block is empty, malformed, or not
    /// recognized by any decoder.
    pub fn decode(&self, block: &MessageBlock) -> Option<QualifiedRecord> {
        match self.registry.dispatch(block) {
            Ok(dispatched) => Some(qualify(dispatched, (self.clock)())),
            Err(DecodeErr::Empty) => None,
            Err(err @ DecodeErr::UnknownFormat { .. }) => {
                if self.log_unknown {
                    info!("unknown sensor: {}: {}", err, block);
                } else {
                    debug!("pipeline: {}", err);
                }
                None
            }
            Err(err) => {
                debug!("pipeline: dropped block: {}: {}", err, block);
                None
            }
        }
    }

    /// Run one block through every stage
    ///
    /// Returns a record if the block decoded, matched the sensor
    /// map, and was not a duplicate.
    pub fn process(&mut self, block: &MessageBlock) -> Option<OutputRecord> {
        let qualified = self.decode(block)?;
        self.finish(qualified)
    }

    /// Run a decoded record through the remaining stages
    pub fn finish(&mut self, qualified: QualifiedRecord) -> Option<OutputRecord> {
        let mut rec = match self.sensor_map.apply(&qualified) {
            Some(rec) => rec,
            None => {
                if self.log_unmapped {
                    info!("unmapped sensor: {}", qualified);
                }
                return None;
            }
        };

        self.deltas.apply(&mut rec);
        self.dedup.admit(rec)
    }

    /// Records from a source of read attempts
    ///
    /// The iterator ends when the source does, or on
    /// [`Fetch::Shutdown`]. A text stanza still pending when the
    /// source ends is processed; one pending at shutdown is
    /// dropped.
    pub fn iter<I>(&mut self, source: I) -> RecordIter<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Fetch>,
    {
        RecordIter {
            pipeline: self,
            source: source.into_iter(),
            ready: VecDeque::new(),
            done: false,
        }
    }

    /// Decoders in use
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Sensor map in use
    pub fn sensor_map(&self) -> &SensorMap {
        &self.sensor_map
    }

    /// Forget pending lines, counter history, and the last record
    pub fn reset(&mut self) {
        self.framer.reset();
        self.deltas.reset();
        self.dedup.reset();
    }
}

/// Iterator over finished records
///
/// Created by [`Pipeline::iter()`].
#[derive(Debug)]
pub struct RecordIter<'p, I>
where
    I: Iterator<Item = Fetch>,
{
    pipeline: &'p mut Pipeline,
    source: I,
    ready: VecDeque<OutputRecord>,
    done: bool,
}

impl<'p, I> Iterator for RecordIter<'p, I>
where
    I: Iterator<Item = Fetch>,
{
    type Item = OutputRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rec) = self.ready.pop_front() {
                return Some(rec);
            }
            if self.done {
                return None;
            }

            let blocks = match self.source.next() {
                Some(Fetch::Shutdown) => {
                    self.done = true;
                    self.pipeline.framer.push(Fetch::Shutdown);
                    continue;
                }
                Some(fetch) => self.pipeline.framer.push(fetch).into_iter().collect(),
                None => {
                    self.done = true;
                    self.pipeline.framer.flush().into_iter().collect::<Vec<_>>()
                }
            };

            for block in blocks {
                if let Some(rec) = self.pipeline.process(&block) {
                    self.ready.push_back(rec);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    use crate::record::{UnitSystem, Value};

    const TOWER: &str = r#"{"time":"2020-01-01 00:00:00","model":"Acurite-Tower","id":100,"channel":"A","temperature_C":10.0,"humidity":50,"battery_low":0}"#;

    fn fixed_clock() -> i64 {
        1600000000
    }

    fn pipeline(map: &[(&str, &str)]) -> Pipeline {
        let map: SensorMap = map.iter().copied().collect();
        PipelineBuilder::new()
            .with_sensor_map(map)
            .with_log_unknown(true)
            .with_log_unmapped(true)
            .with_clock(fixed_clock)
            .build()
    }

    fn lines(text: &[&str]) -> Vec<Fetch> {
        text.iter().map(|l| Fetch::Line(l.to_string())).collect()
    }

    #[test]
    fn test_end_to_end() {
        let mut pipe = pipeline(&[("outTemp", "temperature.*.AcuriteTowerPacket")]);
        let out = pipe
            .process(&MessageBlock::new([TOWER]))
            .expect("record");

        let mut expect = OutputRecord::new(1577836800, UnitSystem::Metric);
        expect.fields.insert("outTemp".to_owned(), Value::Float(10.0));
        assert_eq!(out, expect);
    }

    #[test]
    fn test_duplicates_dropped() {
        let mut pipe = pipeline(&[("outTemp", "temperature.*.AcuriteTowerPacket")]);
        let out: Vec<_> = pipe.iter(lines(&[TOWER, TOWER, TOWER])).collect();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_unmapped_and_unknown() {
        let mut pipe = pipeline(&[("outTemp", "temperature.*.Acurite5n1Packet")]);
        assert!(pipe.process(&MessageBlock::new([TOWER])).is_none());
        assert!(pipe
            .process(&MessageBlock::new([r#"{"model":"Mystery"}"#]))
            .is_none());
        assert!(pipe.process(&MessageBlock::default()).is_none());
    }

    #[test]
    fn test_rain_delta() {
        let mut pipe = pipeline(&[("rain_total", "rain_total.*.EcoWittWH40Packet")]);
        let out: Vec<_> = pipe
            .iter(lines(&[
                r#"{"time" : "2020-02-05 12:37:05", "model" : "EcoWitt-WH40", "id" : 52591, "rain_mm" : 0.800}"#,
                r#"{"time" : "2020-02-05 12:37:54", "model" : "EcoWitt-WH40", "id" : 52591, "rain_mm" : 1.000}"#,
                r#"{"time" : "2020-02-05 12:38:43", "model" : "EcoWitt-WH40", "id" : 52591, "rain_mm" : 0.100}"#,
            ]))
            .collect();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].get("rain"), None);
        assert_approx_eq!(out[1].get("rain").and_then(Value::as_f64).unwrap(), 0.2f64);
        assert_eq!(out[2].get("rain"), None);
        assert_eq!(out[2].us_units, UnitSystem::MetricWx);
    }

    #[test]
    fn test_text_stanzas() {
        let mut pipe = pipeline(&[("outHumidity", "humidity.*.NexusTemperaturePacket")]);
        let mut source = lines(&[
            "2017-01-15 14:49:03 :Nexus Temperature/Humidity",
            "    House Code:      180",
            "    Battery:         OK",
            "    Channel:         1",
            "    Temperature:     20.10 C",
            "    Humidity:        42 %",
        ]);
        source.push(Fetch::Idle);
        source.extend(lines(&[
            "2017-01-15 14:50:03 :Nexus Temperature/Humidity",
            "    House Code:      180",
            "    Channel:         1",
            "    Humidity:        43 %",
        ]));

        let out: Vec<_> = pipe.iter(source).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date_time, 1484491743);
        assert_eq!(out[0].get("outHumidity"), Some(&Value::Float(42.0)));
        assert_eq!(out[1].get("outHumidity"), Some(&Value::Float(43.0)));
    }

    #[test]
    fn test_shutdown_drops_pending() {
        let mut pipe = pipeline(&[("outHumidity", "humidity.*.NexusTemperaturePacket")]);
        let mut source = lines(&[
            "2017-01-15 14:49:03 :Nexus Temperature/Humidity",
            "    House Code:      180",
            "    Humidity:        42 %",
        ]);
        source.push(Fetch::Shutdown);
        source.extend(lines(&[TOWER]));
        assert_eq!(pipe.iter(source).count(), 0);
    }

    #[test]
    fn test_relative_time_uses_clock() {
        let mut pipe = pipeline(&[("outTemp", "temperature.*.AcuriteTowerPacket")]);
        let out = pipe
            .process(&MessageBlock::new([
                r#"{"time" : "@0.084044s", "model" : "Acurite-Tower", "id" : 100, "temperature_C" : 10.0}"#,
            ]))
            .expect("record");
        assert_eq!(out.date_time, fixed_clock());
    }
}
