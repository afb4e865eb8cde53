//! Oregon Scientific sensors
//!
//! Every Oregon Scientific sensor is identified by
//! `channel:house_code`. The house code is random and changes
//! whenever the batteries are replaced. JSON output carries the
//! house code as `id`.

use lazy_static::lazy_static;
use regex::Regex;

use super::{json_packet, take_id, CELSIUS, FAHRENHEIT, PERCENT};
use crate::decoder::{
    battery_low, get_float, get_id, pair_id, parse_lines, Convert, Decoded, Decoder, Identifier,
    JsonObject, LineRule, TextDecoded,
};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    static ref BTHR968_ID: Regex = Regex::new(r"B(?:HT|TH)R968").expect("bad regexp");

    static ref INCHES: Regex = Regex::new(r"([\d.]+) in").expect("bad regexp");
    static ref MBAR: Regex = Regex::new(r"([\d.]+) mbar").expect("bad regexp");
    static ref METRES: Regex = Regex::new(r"([\d.]+) m").expect("bad regexp");
    static ref DEGREES: Regex = Regex::new(r"([\d.]+) degrees").expect("bad regexp");
    // hPa, though some releases print mPa
    static ref PASCALS: Regex = Regex::new(r"([\d.]+) [hm]Pa").expect("bad regexp");

    static ref PCR800_LINES: [LineRule; 5] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Rain Rate", "rain_rate", Convert::Float).extract(&INCHES),
        LineRule::new("Total Rain", "rain_total", Convert::Float).extract(&INCHES),
    ];

    // rtl_433 has labelled the temperature both ways
    static ref BTHR968_LINES: [LineRule; 7] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Celcius", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
        LineRule::new("Pressure", "pressure", Convert::Float).extract(&MBAR),
    ];

    static ref THGR122N_LINES: [LineRule; 5] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
    ];

    static ref THGR810_LINES: [LineRule; 6] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Celcius", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Fahrenheit", "temperature_F", Convert::Float).extract(&FAHRENHEIT),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
    ];

    static ref WGR800_LINES: [LineRule; 6] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Gust", "wind_gust", Convert::Float).extract(&METRES),
        LineRule::new("Average", "wind_speed", Convert::Float).extract(&METRES),
        LineRule::new("Direction", "wind_dir", Convert::Float).extract(&DEGREES),
    ];

    static ref THERMO_LINES: [LineRule; 4] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
    ];

    static ref THN802_LINES: [LineRule; 4] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Celcius", "temperature", Convert::Float).extract(&CELSIUS),
    ];

    static ref UV800_LINES: [LineRule; 4] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("UV Index", "uv_index", Convert::Float),
    ];

    static ref UVR128_LINES: [LineRule; 3] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("UV Index", "uv_index", Convert::Float),
    ];

    static ref BTHGN129_LINES: [LineRule; 6] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Celcius", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
        LineRule::new("Pressure", "pressure", Convert::Float).extract(&PASCALS),
    ];
}

/// Oregon Scientific PCR800 rain gauge, in inches
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonPcr800;

impl Decoder for OregonPcr800 {
    fn name(&self) -> &'static str {
        "OSPCR800Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("PCR800")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Us);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("rain_rate", get_float(obj, "rain_rate_in_h"));
        pkt.set_opt("rain_total", get_float(obj, "rain_in"));
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Us, lines, &PCR800_LINES[..])
    }
}

/// Oregon Scientific BTHR968 indoor barometer
///
/// Some rtl_433 releases call it `BHTR968`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonBthr968;

impl Decoder for OregonBthr968 {
    fn name(&self) -> &'static str {
        "OSBTHR968Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Pattern(&BTHR968_ID)
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt(
            "pressure",
            get_float(obj, "pressure_hPa").or_else(|| get_float(obj, "pressure")),
        );
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &BTHR968_LINES[..])
    }
}

/// Oregon Scientific THGR122N thermo-hygrometer
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonThgr122n;

impl Decoder for OregonThgr122n {
    fn name(&self) -> &'static str {
        "OSTHGR122NPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("THGR122N")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &THGR122N_LINES[..])
    }
}

/// Oregon Scientific THGR810 thermo-hygrometer
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonThgr810;

impl Decoder for OregonThgr810 {
    fn name(&self) -> &'static str {
        "OSTHGR810Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("THGR810")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &THGR810_LINES[..])
    }
}

/// Oregon Scientific WGR800 anemometer, in m/s
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonWgr800;

impl Decoder for OregonWgr800 {
    fn name(&self) -> &'static str {
        "OSWGR800Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("WGR800")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("wind_gust", get_float(obj, "wind_max_m_s"));
        pkt.set_opt("wind_speed", get_float(obj, "wind_avg_m_s"));
        pkt.set_opt("wind_dir", get_float(obj, "wind_dir_deg"));
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::MetricWx, lines, &WGR800_LINES[..])
    }
}

/// Oregon Scientific THR128 and other version 1 thermometers
///
/// The house code arrives as `sid`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonThr128;

impl Decoder for OregonThr128 {
    fn name(&self) -> &'static str {
        "OSTHR128Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("OSv1 Temperature Sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        Decoded::new(pkt, pair_id(get_id(obj, "channel"), get_id(obj, "sid")))
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &THERMO_LINES[..])
    }
}

/// Oregon Scientific THR228N thermometer
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonThr228n;

impl Decoder for OregonThr228n {
    fn name(&self) -> &'static str {
        "OSTHR228NPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Thermo Sensor THR228N")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        temperature_only(obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &THERMO_LINES[..])
    }
}

/// Oregon Scientific UV800 UV sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonUv800;

impl Decoder for OregonUv800 {
    fn name(&self) -> &'static str {
        "OSUV800Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("UV800")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("uv_index", get_float(obj, "uv"));
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &UV800_LINES[..])
    }
}

/// Oregon Scientific UVR128 UV sensor
///
/// Has no channel switch, so the channel part of the id is
/// always `0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonUvr128;

impl Decoder for OregonUvr128 {
    fn name(&self) -> &'static str {
        "OSUVR128Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Oregon Scientific UVR128")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("uv_index", get_float(obj, "uv"));
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &UVR128_LINES[..])
    }
}

/// Oregon Scientific THN802 thermometer
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonThn802;

impl Decoder for OregonThn802 {
    fn name(&self) -> &'static str {
        "OSTHN802Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("THN802")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        temperature_only(obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &THN802_LINES[..])
    }
}

/// Oregon Scientific BTHGN129 barometer
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonBthgn129;

impl Decoder for OregonBthgn129 {
    fn name(&self) -> &'static str {
        "OSBTHGN129Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("BTHGN129")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("pressure", get_float(obj, "pressure_hPa"));
        with_house_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, UnitSystem::Metric, lines, &BTHGN129_LINES[..])
    }
}

/// Oregon Scientific THGR968 thermo-hygrometer
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonThgr968;

impl Decoder for OregonThgr968 {
    fn name(&self) -> &'static str {
        "OSTHGR968Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("THGR968")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        with_house_code(pkt, obj)
    }
}

/// Oregon Scientific RGR968 rain gauge, in mm
#[derive(Clone, Copy, Debug, Default)]
pub struct OregonRgr968;

impl Decoder for OregonRgr968 {
    fn name(&self) -> &'static str {
        "OSRGR968Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("RGR968")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt(
            "rain_rate",
            get_float(obj, "rain_rate_mm_h").or_else(|| get_float(obj, "rain_rate")),
        );
        pkt.set_opt(
            "rain_total",
            get_float(obj, "rain_mm").or_else(|| get_float(obj, "total_rain")),
        );
        with_house_code(pkt, obj)
    }
}

fn temperature_only(obj: &JsonObject) -> Decoded {
    let mut pkt = json_packet(obj, UnitSystem::Metric);
    pkt.set_opt("battery", battery_low(obj));
    pkt.set_opt("temperature", get_float(obj, "temperature_C"));
    with_house_code(pkt, obj)
}

fn with_house_code(pkt: Packet, obj: &JsonObject) -> Decoded {
    Decoded::new(pkt, pair_id(get_id(obj, "channel"), get_id(obj, "id")))
}

fn decode_lines(ts: i64, units: UnitSystem, lines: &[String], rules: &[LineRule]) -> TextDecoded {
    let mut pkt = Packet::new(Some(ts), units);
    let consumed = parse_lines(lines, rules, &mut pkt);
    let channel = take_id(&mut pkt, "channel");
    let house_code = take_id(&mut pkt, "house_code");
    TextDecoded {
        decoded: Some(Decoded::new(pkt, pair_id(channel, house_code))),
        consumed,
    }
}
