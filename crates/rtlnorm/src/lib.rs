//! # rtlnorm: rtl_433 Output Normalization
//!
//! This crate turns the output of
//! [rtl_433](https://github.com/merbanan/rtl_433), a
//! software-defined radio decoder for consumer weather sensors,
//! into flat records suitable for a weather-station database.
//!
//! rtl_433 prints one JSON object per line (`-F json`) or, with
//! older versions and some formats, multi-line text stanzas. Every
//! sensor family uses its own field names and units. This crate
//!
//! 1. frames the line stream into message blocks;
//! 2. selects a decoder for each block and normalizes its fields;
//! 3. names every observation with a *fingerprint*,
//!    `observation.sensor_id.decoder`;
//! 4. keeps only the fingerprints you ask for, renamed to your
//!    database's field names;
//! 5. derives per-interval amounts from cumulative counters; and
//! 6. drops repeated transmissions.
//!
//! ## Example
//!
//! Tell the pipeline which fingerprints to keep with a
//! [`SensorMap`]. Fingerprint patterns are dot-separated globs.
//!
//! ```
//! use rtlnorm::{Fetch, PipelineBuilder, SensorMap, UnitSystem};
//!
//! let map: SensorMap = [
//!     ("outTemp", "temperature.*.AcuriteTowerPacket"),
//!     ("outHumidity", "humidity.*.AcuriteTowerPacket"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut pipeline = PipelineBuilder::new()
//!     .with_sensor_map(map)
//!     .with_log_unknown(true)
//!     .build();
//!
//! // let rtl_433_output be lines from rtl_433, perhaps from a
//! // LineReceiver bound to its stdout
//! let rtl_433_output = [
//!     r#"{"time":"2020-01-01 00:00:00","model":"Acurite-Tower","id":100,"channel":"A","temperature_C":10.0,"humidity":50,"battery_low":0}"#,
//!     r#"{"time":"2020-01-01 00:00:00","model":"Acurite-Tower","id":100,"channel":"A","temperature_C":10.0,"humidity":50,"battery_low":0}"#,
//! ];
//!
//! let source = rtl_433_output.into_iter().map(|l| Fetch::Line(l.to_owned()));
//! for rec in pipeline.iter(source) {
//!     // the repeat is suppressed, so this prints once
//!     println!("{}", serde_json::to_string(&rec).unwrap());
//!     assert_eq!(rec.date_time, 1577836800);
//!     assert_eq!(rec.us_units, UnitSystem::Metric);
//!     assert_eq!(rec.fields.len(), 2);
//! }
//! ```
//!
//! To see what your sensors report, map nothing and enable
//! `with_log_unmapped()`. Every decoded record is logged with
//! its fingerprints.
//!
//! ## Running rtl_433
//!
//! rtl_433 writes a stanza's lines in a burst and then waits for
//! the next transmission. A [`LineReader`] drains its output on a
//! background thread. The paired [`LineReceiver`] reports a quiet
//! period as [`Fetch::Idle`], which releases any pending text
//! stanza.
//!
//! ```no_run
//! use std::process::{Command, Stdio};
//! use rtlnorm::{Config, LineReader, DEFAULT_WAIT};
//!
//! let config = Config::from_file("rtlnorm.toml").expect("bad config");
//! let mut child = Command::new("rtl_433")
//!     .args(["-M", "utc", "-F", "json"])
//!     .stdout(Stdio::piped())
//!     .spawn()
//!     .expect("no rtl_433");
//!
//! let stdout = child.stdout.take().expect("no stdout");
//! let (_reader, lines) = LineReader::with_receiver("stdout-reader", stdout, DEFAULT_WAIT)
//!     .expect("no thread");
//!
//! let mut pipeline = config.pipeline_builder().build();
//! for rec in pipeline.iter(lines) {
//!     println!("{}", rec);
//! }
//! ```
//!
//! ## Decoders
//!
//! The [`decoders`] module holds the catalog of supported
//! sensors. Add your own by implementing [`decoder::Decoder`]
//! and [registering](Registry::register) it.

mod config;
mod dedup;
mod deltas;
mod fingerprint;
mod framing;
mod pipeline;
mod reader;
mod record;
mod registry;
mod sensormap;

pub mod decoder;
pub mod decoders;

pub use config::{Config, ConfigError, DEFAULT_CMD};
pub use dedup::DuplicateSuppressor;
pub use deltas::{DeltaCalculator, Deltas};
pub use fingerprint::{qualify, Fingerprint, FingerprintErr, DEFAULT_SENSOR_ID};
pub use framing::{Blocks, Fetch, Framer, MessageBlock};
pub use pipeline::{now, Pipeline, PipelineBuilder, RecordIter};
pub use reader::{LineReader, LineReceiver, DEFAULT_WAIT};
pub use record::{FieldMap, OutputRecord, Packet, QualifiedRecord, UnitSystem, Value};
pub use registry::{DecodeErr, Dispatched, Registry};
pub use sensormap::SensorMap;
