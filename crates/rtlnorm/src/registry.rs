//! Decoder selection and dispatch

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as Json;
use thiserror::Error;

#[cfg(not(test))]
use log::{debug, trace};

#[cfg(test)]
use std::{println as debug, println as trace};

use crate::decoder::{parse_time, Decoded, Decoder};
use crate::decoders::catalog;
use crate::framing::MessageBlock;

lazy_static! {
    static ref TEXT_HEADER: Regex =
        Regex::new(r"^(\d{4}-\d\d-\d\d \d\d:\d\d:\d\d)\s*:*\s*(.*)$").expect("bad header regexp");
}

/// Why a message block produced no packet
///
/// None of these are fatal. The block is dropped and the next
/// one is processed.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DecodeErr {
    /// The block has no lines
    #[error("empty block")]
    Empty,

    /// The block starts with `{` but is not a JSON object
    #[error("malformed JSON")]
    MalformedJson,

    /// The JSON object has no `model` string
    #[error("JSON object has no model")]
    MissingModel,

    /// The text block does not start with a valid timestamp
    #[error("text block has no leading timestamp")]
    NoTimestamp,

    /// No registered decoder recognizes the model or payload
    #[error("no decoder for \"{model}\"")]
    UnknownFormat {
        /// JSON `model` or text payload
        model: String,
    },

    /// A decoder was selected but could not make sense of the data
    #[error("decoder {0} did not recognize the data")]
    Unrecognized(&'static str),
}

/// A successfully decoded block
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatched {
    /// Name of the decoder which produced the packet
    pub decoder: &'static str,

    /// Packet and sensor id
    pub decoded: Decoded,
}

/// Ordered set of decoders
///
/// The registry tries each decoder's
/// [identifier](crate::decoder::Identifier) in registration
/// order. The first decoder whose identifier is found in the
/// JSON `model` or the text header wins, even if a later
/// decoder would match too.
///
/// ```
/// use rtlnorm::{MessageBlock, Registry};
///
/// let registry = Registry::default();
/// let block = MessageBlock::new([
///     r#"{"time" : "2020-01-01 00:00:00", "model" : "Acurite-Tower", "id" : 100, "temperature_C" : 10.0}"#,
/// ]);
/// let out = registry.dispatch(&block).unwrap();
/// assert_eq!(out.decoder, "AcuriteTowerPacket");
/// assert_eq!(out.decoded.sensor_id.as_deref(), Some("0064"));
/// ```
pub struct Registry {
    decoders: Vec<Box<dyn Decoder>>,
}

impl Registry {
    /// Registry with the full decoder catalog
    pub fn new() -> Self {
        Self {
            decoders: catalog(),
        }
    }

    /// Registry with no decoders
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Append a decoder
    ///
    /// It is tried after every decoder already registered.
    pub fn register<D>(&mut self, decoder: D) -> &mut Self
    where
        D: Decoder + 'static,
    {
        self.decoders.push(Box::new(decoder));
        self
    }

    /// Decoders in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Decoder> {
        self.decoders.iter().map(|d| d.as_ref())
    }

    /// Number of registered decoders
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// True if no decoders are registered
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// First decoder whose identifier occurs in `haystack`
    pub fn find(&self, haystack: &str) -> Option<&dyn Decoder> {
        self.iter().find(|d| d.identifier().is_found_in(haystack))
    }

    /// Decode a message block
    ///
    /// JSON blocks are matched on their `model`. Text blocks
    /// are matched on the header payload after the timestamp.
    /// Every line of the block is consumed, whether or not the
    /// decoder used it.
    pub fn dispatch(&self, block: &MessageBlock) -> Result<Dispatched, DecodeErr> {
        let first = block.first().ok_or(DecodeErr::Empty)?;
        if block.is_json() {
            self.dispatch_json(first)
        } else {
            self.dispatch_text(first, block.rest())
        }
    }

    fn dispatch_json(&self, line: &str) -> Result<Dispatched, DecodeErr> {
        let obj = match serde_json::from_str::<Json>(line) {
            Ok(Json::Object(obj)) => obj,
            _ => return Err(DecodeErr::MalformedJson),
        };

        let model = obj
            .get("model")
            .and_then(Json::as_str)
            .ok_or(DecodeErr::MissingModel)?;

        let decoder = self.find(model).ok_or_else(|| DecodeErr::UnknownFormat {
            model: model.to_owned(),
        })?;

        trace!("registry: \"{}\" → {}", model, decoder.name());
        Ok(Dispatched {
            decoder: decoder.name(),
            decoded: decoder.decode_json(&obj),
        })
    }

    fn dispatch_text(&self, header: &str, lines: &[String]) -> Result<Dispatched, DecodeErr> {
        let caps = TEXT_HEADER.captures(header).ok_or(DecodeErr::NoTimestamp)?;
        let ts = parse_time(&caps[1]).ok_or(DecodeErr::NoTimestamp)?;
        let payload = caps[2].trim();

        let decoder = match payload {
            "" => None,
            _ => self.find(payload),
        }
        .ok_or_else(|| DecodeErr::UnknownFormat {
            model: payload.to_owned(),
        })?;

        trace!("registry: \"{}\" → {}", payload, decoder.name());
        let out = decoder.decode_text(ts, payload, lines);
        if out.consumed < lines.len() {
            debug!(
                "registry: {} discarded {} unused line(s)",
                decoder.name(),
                lines.len() - out.consumed
            );
        }

        match out.decoded {
            Some(decoded) => Ok(Dispatched {
                decoder: decoder.name(),
                decoded,
            }),
            None => Err(DecodeErr::Unrecognized(decoder.name())),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|d| d.name())).finish()
    }
}
