//! Acurite sensors
//!
//! Acurite hardware ids are rendered as four upper-case hex
//! digits. Older rtl_433 releases printed the id in hex in their
//! text output; JSON output carries it as an integer.

use lazy_static::lazy_static;
use regex::Regex;

use log::info;

use super::json_packet;
use crate::decoder::{
    battery_low, c_to_f, get_float, get_id, get_int, get_scalar, get_str, hex_id, kph_to_mph,
    mm_to_in, pair_id, Decoded, Decoder, Identifier, JsonObject, TextDecoded,
};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    static ref TOWER_ID: Regex = Regex::new(r"(?i)acurite[- ]tower").expect("bad regexp");
    static ref FIVE_IN_ONE_ID: Regex = Regex::new(r"(?i)acurite[- ]5n1").expect("bad regexp");
    static ref LIGHTNING_ID: Regex =
        Regex::new(r"(?i)acurite[- ](?:lightning|6045)").expect("bad regexp");

    static ref TOWER_TEXT: Regex =
        Regex::new(r"0x([0-9a-fA-F]+) Ch ([A-C]): ([\d.-]+) C ([\d.-]+) F ([\d]+) % RH")
            .expect("bad regexp");

    static ref FIVE_IN_ONE_TEXT: Regex =
        Regex::new(r"0x([0-9a-fA-F]+) Ch ([A-C]), (.*)").expect("bad regexp");
    static ref FIVE_IN_ONE_MSG: Regex = Regex::new(r"Msg (\d+), (.*)").expect("bad regexp");
    static ref FIVE_IN_ONE_31: Regex =
        Regex::new(r"Wind ([\d.]+) kmph / ([\d.]+) mph ([\d.]+).*rain gauge ([\d.]+) in")
            .expect("bad regexp");
    static ref FIVE_IN_ONE_38: Regex =
        Regex::new(r"Wind ([\d.]+) kmph / ([\d.]+) mph, ([\d.-]+) C ([\d.-]+) F ([\d.]+) % RH")
            .expect("bad regexp");
    static ref FIVE_IN_ONE_RAIN: Regex =
        Regex::new(r"Total rain fall since last reset: ([\d.]+)").expect("bad regexp");

    static ref A986_TEXT: Regex =
        Regex::new(r"0x([0-9a-fA-F]+) - (1R|2F): ([\d.-]+) C ([\d.-]+) F").expect("bad regexp");

    static ref LIGHTNING_TEXT: Regex = Regex::new(
        r"0x([0-9a-fA-F]+) Ch (.) Msg Type 0x([0-9a-fA-F]+): ([\d.-]+) ([CF]) ([\d.]+) % RH Strikes ([\d]+) Distance ([\d.]+)"
    )
    .expect("bad regexp");
}

/// Acurite Atlas 7-in-1
///
/// Three message types, each with a different subset of
/// observations. Wind speed is in every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcuriteAtlas;

impl Decoder for AcuriteAtlas {
    fn name(&self) -> &'static str {
        "AcuriteAtlasPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Acurite-Atlas")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Us);
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        pkt.set_opt("sequence_num", get_int(obj, "sequence_num"));
        pkt.set_opt("message_type", get_int(obj, "message_type"));
        pkt.set_opt("temperature", get_float(obj, "temperature_F"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("wind_speed", get_float(obj, "wind_avg_mi_h"));
        pkt.set_opt("wind_dir", get_float(obj, "wind_dir_deg"));
        pkt.set_opt("rain_total", get_float(obj, "rain_in"));
        pkt.set_opt("uv", get_int(obj, "uv"));
        pkt.set_opt("lux", get_int(obj, "lux"));
        pkt.set_opt("strikes_total", get_int(obj, "strike_count"));
        pkt.set_opt("distance", get_float(obj, "strike_distance"));
        pkt.set_opt("battery", battery_low(obj));
        with_hex_id(pkt, obj, "id")
    }
}

/// Acurite tower temperature/humidity sensor
///
/// rtl_433 has called this `Acurite tower sensor` and
/// `Acurite-Tower`, and has reported the battery three different
/// ways. Only the oldest single-line text format is supported.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcuriteTower;

impl Decoder for AcuriteTower {
    fn name(&self) -> &'static str {
        "AcuriteTowerPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Pattern(&TOWER_ID)
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("status", get_scalar(obj, "status"));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        set_radio_stats(&mut pkt, obj);
        with_hex_id(pkt, obj, "id")
    }

    fn decode_text(&self, ts: i64, payload: &str, _lines: &[String]) -> TextDecoded {
        let caps = match TOWER_TEXT.captures(payload) {
            Some(caps) => caps,
            None => {
                info!("{}: unrecognized data: \"{}\"", self.name(), payload);
                return TextDecoded::header_only(None);
            }
        };

        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        pkt.set("channel", &caps[2]);
        pkt.set_opt("temperature", caps[3].parse::<f64>().ok());
        pkt.set_opt("temperature_F", caps[4].parse::<f64>().ok());
        pkt.set_opt("humidity", caps[5].parse::<f64>().ok());
        TextDecoded::header_only(Some(Decoded::new(pkt, caps[1].to_uppercase())))
    }
}

/// Acurite 5-in-1 weather station
///
/// rtl_433 has changed the labels for wind speed, rain, and
/// message type several times. Every variant seen so far is
/// normalized to US units. Rain is a cumulative counter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Acurite5n1;

impl Acurite5n1 {
    fn wind_speed(obj: &JsonObject) -> Option<f64> {
        get_float(obj, "wind_speed_mph")
            .or_else(|| get_float(obj, "wind_speed_kph").map(kph_to_mph))
            .or_else(|| get_float(obj, "wind_avg_km_h").map(kph_to_mph))
            .or_else(|| get_float(obj, "wind_avg_mi_h"))
            .or_else(|| get_float(obj, "wind_speed"))
    }

    fn rain_total(obj: &JsonObject) -> Option<f64> {
        // each bucket tip is 0.01 inch
        get_int(obj, "raincounter_raw")
            .map(|tips| tips as f64 * 0.01)
            .or_else(|| get_float(obj, "rain_inch"))
            .or_else(|| get_float(obj, "rainfall_accumulation_inch"))
            .or_else(|| get_float(obj, "rain_in"))
            .or_else(|| get_float(obj, "rain_mm").map(mm_to_in))
    }

    fn temperature(obj: &JsonObject) -> Option<f64> {
        get_float(obj, "temperature_F").or_else(|| get_float(obj, "temperature_C").map(c_to_f))
    }
}

impl Decoder for Acurite5n1 {
    fn name(&self) -> &'static str {
        "Acurite5n1Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Pattern(&FIVE_IN_ONE_ID)
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Us);
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        pkt.set_opt("sequence_num", get_int(obj, "sequence_num"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("status", get_scalar(obj, "status"));
        pkt.set_opt(
            "msg_type",
            get_int(obj, "subtype").or_else(|| get_int(obj, "message_type")),
        );
        pkt.set_opt("wind_speed", Self::wind_speed(obj));
        pkt.set_opt("wind_dir", get_float(obj, "wind_dir_deg"));
        pkt.set_opt("rain_total", Self::rain_total(obj));
        pkt.set_opt("temperature", Self::temperature(obj));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        set_radio_stats(&mut pkt, obj);

        if obj.contains_key("sensor_id") {
            with_hex_id(pkt, obj, "sensor_id")
        } else {
            with_hex_id(pkt, obj, "id")
        }
    }

    fn decode_text(&self, ts: i64, payload: &str, _lines: &[String]) -> TextDecoded {
        let caps = match FIVE_IN_ONE_TEXT.captures(payload) {
            Some(caps) => caps,
            None => {
                info!("{}: unrecognized data: \"{}\"", self.name(), payload);
                return TextDecoded::header_only(None);
            }
        };

        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        pkt.set("channel", &caps[2]);
        let body = caps.get(3).map(|m| m.as_str()).unwrap_or("");

        if let Some(msg) = FIVE_IN_ONE_MSG.captures(body) {
            let detail = msg.get(2).map(|m| m.as_str()).unwrap_or("");
            match &msg[1] {
                "31" => match FIVE_IN_ONE_31.captures(detail) {
                    Some(m) => {
                        pkt.set_opt("wind_speed", m[1].parse::<f64>().ok());
                        pkt.set_opt("wind_speed_mph", m[2].parse::<f64>().ok());
                        pkt.set_opt("wind_dir", m[3].parse::<f64>().ok());
                        pkt.set_opt("rain_total", m[4].parse::<f64>().ok());
                    }
                    None => info!("{}: no match for type 31: \"{}\"", self.name(), detail),
                },
                "38" => match FIVE_IN_ONE_38.captures(detail) {
                    Some(m) => {
                        pkt.set_opt("wind_speed", m[1].parse::<f64>().ok());
                        pkt.set_opt("wind_speed_mph", m[2].parse::<f64>().ok());
                        pkt.set_opt("temperature", m[3].parse::<f64>().ok());
                        pkt.set_opt("temperature_F", m[4].parse::<f64>().ok());
                        pkt.set_opt("humidity", m[5].parse::<f64>().ok());
                    }
                    None => info!("{}: no match for type 38: \"{}\"", self.name(), detail),
                },
                other => info!("{}: unknown message type {}", self.name(), other),
            }
        } else if let Some(m) = FIVE_IN_ONE_RAIN.captures(body) {
            let total = m[1].parse::<f64>().ok();
            info!("{}: rain since reset: {:?}", self.name(), total);
            pkt.set_opt("rain_since_reset", total);
        } else {
            info!("{}: unknown message format: \"{}\"", self.name(), payload);
        }

        TextDecoded::header_only(Some(Decoded::new(pkt, caps[1].to_uppercase())))
    }
}

/// Acurite 606TX temperature sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct Acurite606Tx;

impl Decoder for Acurite606Tx {
    fn name(&self) -> &'static str {
        "Acurite606TXPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Acurite 606TX")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("battery", battery_low(obj));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Acurite 899 rain gauge
#[derive(Clone, Copy, Debug, Default)]
pub struct AcuriteRain899;

impl Decoder for AcuriteRain899 {
    fn name(&self) -> &'static str {
        "AcuriteRain899Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Acurite-Rain899")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Us);
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt(
            "rain_total",
            get_float(obj, "rain_mm")
                .map(mm_to_in)
                .or_else(|| get_float(obj, "rain_in")),
        );
        with_hex_id(pkt, obj, "id")
    }
}

/// Acurite 986 refrigerator/freezer thermometer
///
/// The hardware id of these sensors changes, so the channel
/// (`1R` or `2F`) is the more useful key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Acurite986;

impl Decoder for Acurite986 {
    fn name(&self) -> &'static str {
        "Acurite986Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Acurite 986")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = match get_float(obj, "temperature_F") {
            Some(temp_f) => {
                let mut pkt = json_packet(obj, UnitSystem::Us);
                pkt.set("temperature", temp_f);
                pkt
            }
            None => {
                let mut pkt = json_packet(obj, UnitSystem::Metric);
                pkt.set_opt("temperature", get_float(obj, "temperature_C"));
                pkt
            }
        };
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        pkt.set_opt("battery", battery_low(obj));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id").map(|id| id.to_uppercase()),
        }
    }

    fn decode_text(&self, ts: i64, payload: &str, _lines: &[String]) -> TextDecoded {
        let caps = match A986_TEXT.captures(payload) {
            Some(caps) => caps,
            None => {
                info!("{}: unrecognized data: \"{}\"", self.name(), payload);
                return TextDecoded::header_only(None);
            }
        };

        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        pkt.set("channel", &caps[2]);
        pkt.set_opt("temperature", caps[3].parse::<f64>().ok());
        pkt.set_opt("temperature_F", caps[4].parse::<f64>().ok());
        TextDecoded::header_only(Some(Decoded::new(pkt, caps[1].to_uppercase())))
    }
}

/// Acurite 6045M lightning detector
///
/// `strikes_total` is a cumulative counter.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcuriteLightning;

impl Decoder for AcuriteLightning {
    fn name(&self) -> &'static str {
        "AcuriteLightningPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Pattern(&LIGHTNING_ID)
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Us);
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        pkt.set_opt("temperature", get_float(obj, "temperature_F"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("strikes_total", get_int(obj, "strike_count"));
        pkt.set_opt("distance", get_float(obj, "storm_dist"));
        for flag in ["active", "rfi", "ussb1", "exception"] {
            pkt.set_opt(flag, get_scalar(obj, flag));
        }
        with_hex_id(pkt, obj, "id")
    }

    fn decode_text(&self, ts: i64, payload: &str, _lines: &[String]) -> TextDecoded {
        let caps = match LIGHTNING_TEXT.captures(payload) {
            Some(caps) => caps,
            None => {
                info!("{}: unrecognized data: \"{}\"", self.name(), payload);
                return TextDecoded::header_only(None);
            }
        };

        let units = match &caps[5] {
            "C" => UnitSystem::Metric,
            _ => UnitSystem::Us,
        };
        let mut pkt = Packet::new(Some(ts), units);
        pkt.set("channel", &caps[2]);
        pkt.set("msg_type", &caps[3]);
        pkt.set_opt("temperature", caps[4].parse::<f64>().ok());
        pkt.set_opt("humidity", caps[6].parse::<f64>().ok());
        pkt.set_opt("strikes_total", caps[7].parse::<i64>().ok());
        pkt.set_opt("distance", caps[8].parse::<f64>().ok());
        TextDecoded::header_only(Some(Decoded::new(pkt, caps[1].to_uppercase())))
    }
}

/// Acurite 00275rm temperature/humidity sensor with probe
#[derive(Clone, Copy, Debug, Default)]
pub struct Acurite00275m;

impl Decoder for Acurite00275m {
    fn name(&self) -> &'static str {
        "Acurite00275MPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("00275rm")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("probe", get_scalar(obj, "probe"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature_probe", get_float(obj, "ptemperature_C"));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        with_hex_id(pkt, obj, "id")
    }
}

/// WT450 temperature/humidity sensor
///
/// Identified by `id:channel`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcuriteWt450;

impl Decoder for AcuriteWt450 {
    fn name(&self) -> &'static str {
        "AcuriteWT450Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("WT450 sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        let sid = get_int(obj, "id");
        let channel = get_int(obj, "channel");
        pkt.set_opt("channel", channel);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        Decoded::new(
            pkt,
            pair_id(sid.map(|v| v.to_string()), channel.map(|v| v.to_string())),
        )
    }
}

fn with_hex_id(pkt: Packet, obj: &JsonObject, key: &str) -> Decoded {
    Decoded {
        packet: pkt,
        sensor_id: hex_id(obj, key),
    }
}

// diagnostics from newer rtl_433 releases
fn set_radio_stats(pkt: &mut Packet, obj: &JsonObject) {
    pkt.set_opt("mod", get_str(obj, "mod"));
    for stat in ["freq", "rssi", "snr", "noise"] {
        pkt.set_opt(stat, get_float(obj, stat));
    }
}
