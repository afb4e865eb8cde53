//! Decoder catalog
//!
//! One module per sensor family. Every decoder implements
//! [`Decoder`](crate::decoder::Decoder); [`catalog()`] lists them
//! in the order they are tried.

pub mod acurite;
pub mod alecto;
pub mod ambient;
pub mod fine_offset;
pub mod hideki;
pub mod lacrosse;
pub mod nexus;
pub mod oregon;
pub mod others;

use lazy_static::lazy_static;
use regex::Regex;

use crate::decoder::{json_time, Decoder, JsonObject};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    pub(crate) static ref CELSIUS: Regex = Regex::new(r"([\d.-]+) C").expect("bad regexp");
    pub(crate) static ref FAHRENHEIT: Regex = Regex::new(r"([\d.-]+) F").expect("bad regexp");
    pub(crate) static ref PERCENT: Regex = Regex::new(r"([\d.]+) %").expect("bad regexp");
}

/// Every known decoder, in registration order
///
/// Identifiers are matched by containment and the first match
/// wins, so a decoder whose identifier contains another's must be
/// listed first. `WH25` precedes `WH2`, and `THGR968` precedes
/// `RGR968`, for this reason.
pub fn catalog() -> Vec<Box<dyn Decoder>> {
    vec![
        Box::new(acurite::AcuriteAtlas),
        Box::new(acurite::AcuriteTower),
        Box::new(acurite::Acurite5n1),
        Box::new(acurite::Acurite606Tx),
        Box::new(acurite::AcuriteRain899),
        Box::new(acurite::Acurite986),
        Box::new(acurite::AcuriteLightning),
        Box::new(acurite::Acurite00275m),
        Box::new(acurite::AcuriteWt450),
        Box::new(fine_offset::FineOffsetWh1080),
        Box::new(fine_offset::FineOffsetWhx080),
        Box::new(fine_offset::FineOffsetWh3080),
        Box::new(fine_offset::FineOffsetWh24),
        Box::new(fine_offset::FineOffsetWh25),
        Box::new(fine_offset::FineOffsetWh2),
        Box::new(fine_offset::FineOffsetWh32b),
        Box::new(fine_offset::FineOffsetWh5),
        Box::new(fine_offset::FineOffsetWh65b),
        Box::new(fine_offset::FineOffsetWh0290),
        Box::new(ambient::AmbientF007th),
        Box::new(ambient::AmbientWh31e),
        Box::new(lacrosse::LaCrosseWs),
        Box::new(lacrosse::LaCrosseTx141thBv2),
        Box::new(lacrosse::LaCrosseTx),
        Box::new(alecto::AlectoV1Temperature),
        Box::new(alecto::AlectoV1Wind),
        Box::new(alecto::AlectoV1Rain),
        Box::new(hideki::HidekiTs04),
        Box::new(hideki::HidekiWind),
        Box::new(hideki::HidekiRain),
        Box::new(nexus::NexusTemperature),
        Box::new(oregon::OregonPcr800),
        Box::new(oregon::OregonBthr968),
        Box::new(oregon::OregonThgr122n),
        Box::new(oregon::OregonThgr810),
        Box::new(oregon::OregonWgr800),
        Box::new(oregon::OregonThr128),
        Box::new(oregon::OregonThr228n),
        Box::new(oregon::OregonUv800),
        Box::new(oregon::OregonUvr128),
        Box::new(oregon::OregonThn802),
        Box::new(oregon::OregonBthgn129),
        Box::new(oregon::OregonThgr968),
        Box::new(oregon::OregonRgr968),
        Box::new(others::Bresser5in1),
        Box::new(others::CalibeurRf104),
        Box::new(others::EcoWittWh40),
        Box::new(others::HolmanWs5029),
        Box::new(others::Prologue),
        Box::new(others::RubicsonTemp),
        Box::new(others::SpringfieldTm),
        Box::new(others::TfaTwinPlus),
        Box::new(others::TsFt002),
        Box::new(others::Wt0124),
    ]
}

/// Empty packet stamped with the object's `time`
pub(crate) fn json_packet(obj: &JsonObject, units: UnitSystem) -> Packet {
    Packet::new(json_time(obj), units)
}

/// Remove an id field parsed from a text stanza, as text
pub(crate) fn take_id(pkt: &mut Packet, field: &str) -> Option<String> {
    pkt.take(field).map(|v| v.to_string())
}
