//! Fine Offset sensors
//!
//! Fine Offset builds the sensor arrays sold under many brands,
//! including Ambient Weather, Ecowitt, and Froggit. Station ids are
//! decimal.

use lazy_static::lazy_static;
use regex::Regex;

use super::{json_packet, take_id, CELSIUS, PERCENT};
use crate::decoder::{
    battery_low, get_float, get_id, get_int, get_str, ok_flag, parse_lines, Convert, Decoded,
    Decoder, Identifier, JsonObject, LineRule, TextDecoded,
};
use crate::record::{Packet, UnitSystem, Value};

lazy_static! {
    static ref HPA: Regex = Regex::new(r"([\d.-]+) hPa").expect("bad regexp");

    static ref WH1080_LINES: [LineRule; 9] = [
        LineRule::new("StationID", "station_id", Convert::Text),
        LineRule::new("Station ID", "station_id", Convert::Text),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
        LineRule::new("Wind degrees", "wind_dir", Convert::Int),
        LineRule::new("Wind avg speed", "wind_speed", Convert::Float),
        LineRule::new("Wind gust", "wind_gust", Convert::Float),
        LineRule::new("Total rainfall", "rain_total", Convert::Float),
        LineRule::new("Battery", "battery", Convert::OkFlag),
    ];

    static ref WHX080_LINES: [LineRule; 9] = [
        LineRule::new("Station ID", "station_id", Convert::Text),
        LineRule::new("Msg type", "msg_type", Convert::Int),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
        LineRule::new("Wind degrees", "wind_dir", Convert::Int),
        LineRule::new("Wind Avg Speed", "wind_speed", Convert::Float),
        LineRule::new("Wind gust", "wind_gust", Convert::Float),
        LineRule::new("Total rainfall", "rain_total", Convert::Float),
        LineRule::new("Battery", "battery", Convert::OkFlag),
    ];

    static ref WH25_LINES: [LineRule; 9] = [
        LineRule::new("ID", "station_id", Convert::Int),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
        LineRule::new("Pressure", "pressure", Convert::Float).extract(&HPA),
        // key/value layout of late 2018
        LineRule::new("id", "station_id", Convert::Int),
        LineRule::new("temperature_C", "temperature", Convert::Float),
        LineRule::new("humidity", "humidity", Convert::Float),
        LineRule::new("pressure_hPa", "pressure", Convert::Float),
        LineRule::new("battery", "battery", Convert::OkFlag),
    ];

    static ref ID_TEMPERATURE_LINES: [LineRule; 2] = [
        LineRule::new("ID", "station_id", Convert::Int),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
    ];
}

/// Fine Offset WH1080 weather station
///
/// Rain is reported in mm and stored in cm.
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh1080;

impl Decoder for FineOffsetWh1080 {
    fn name(&self) -> &'static str {
        "FOWH1080Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset WH1080 weather station")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("msg_type", get_int(obj, "msg_type"));
        set_wh1080_weather(&mut pkt, obj);
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        let consumed = parse_lines(lines, &WH1080_LINES[..], &mut pkt);
        rain_mm_to_cm(&mut pkt);
        let sensor_id = take_id(&mut pkt, "station_id");
        TextDecoded {
            decoded: Some(Decoded {
                packet: pkt,
                sensor_id,
            }),
            consumed,
        }
    }
}

/// Fine Offset WH1080/WH3080 weather station, in later releases
///
/// Message type 0 carries weather; type 1 carries the radio
/// clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWhx080;

impl Decoder for FineOffsetWhx080 {
    fn name(&self) -> &'static str {
        "FOWHx080Packet"
    }

    fn identifier(&self) -> Identifier {
        // spacing around the "/" varies between releases
        Identifier::Substring("Fine Offset Electronics WH1080")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("msg_type", get_int(obj, "msg_type"));
        set_wh1080_weather(&mut pkt, obj);

        if let Some(signal) = get_str(obj, "signal_type") {
            pkt.set("signal_type", (signal == "WWVB / MSF") as i64);
        }
        for clock in ["hours", "minutes", "seconds", "year", "month", "day"] {
            pkt.set_opt(clock, get_int(obj, clock));
        }

        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id").or_else(|| get_id(obj, "station_id")),
        }
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        let consumed = parse_lines(lines, &WHX080_LINES[..], &mut pkt);
        rain_mm_to_cm(&mut pkt);
        let sensor_id = take_id(&mut pkt, "station_id");
        TextDecoded {
            decoded: Some(Decoded {
                packet: pkt,
                sensor_id,
            }),
            consumed,
        }
    }
}

/// Fine Offset WH3080 UV/light sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh3080;

impl Decoder for FineOffsetWh3080 {
    fn name(&self) -> &'static str {
        "FOWH3080Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset Electronics WH3080 Weather Station")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("msg_type", get_int(obj, "msg_type"));
        pkt.set_opt("uv_index", get_float(obj, "uv_index"));
        pkt.set_opt("luminosity", get_float(obj, "lux"));
        pkt.set_opt("radiation", get_float(obj, "wm"));
        pkt.set_opt("illumination", get_float(obj, "fc"));
        pkt.set_opt("uv_status", get_str(obj, "uv_status").map(ok_flag));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "uv_sensor_id"),
        }
    }
}

/// Fine Offset WH24 outdoor sensor array
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh24;

impl Decoder for FineOffsetWh24 {
    fn name(&self) -> &'static str {
        "FOWH24Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset WH24")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        set_array_weather(&mut pkt, obj);
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Fine Offset WH25 indoor temperature/humidity/pressure
///
/// Must be registered ahead of [`FineOffsetWh2`], whose
/// identifier is a prefix of this one.
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh25;

impl Decoder for FineOffsetWh25 {
    fn name(&self) -> &'static str {
        "FOWH25Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset Electronics, WH25")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt(
            "pressure",
            get_float(obj, "pressure_hPa").or_else(|| get_float(obj, "pressure")),
        );
        pkt.set_opt("battery", battery_low(obj));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_station_lines(ts, lines, &WH25_LINES[..])
    }
}

/// Fine Offset WH2 temperature sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh2;

impl Decoder for FineOffsetWh2 {
    fn name(&self) -> &'static str {
        "FOWH2Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset Electronics, WH2")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_station_lines(ts, lines, &ID_TEMPERATURE_LINES[..])
    }
}

/// Fine Offset WH32B indoor sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh32b;

impl Decoder for FineOffsetWh32b {
    fn name(&self) -> &'static str {
        "FOWH32BPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fineoffset-WH32B")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("pressure", get_float(obj, "pressure_hPa"));
        pkt.set_opt("battery", battery_low(obj));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Fine Offset WH5 temperature/humidity sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh5;

impl Decoder for FineOffsetWh5 {
    fn name(&self) -> &'static str {
        "FOWH5Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset WH5 sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_station_lines(ts, lines, &ID_TEMPERATURE_LINES[..])
    }
}

/// Fine Offset WH65B outdoor sensor array
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh65b;

impl Decoder for FineOffsetWh65b {
    fn name(&self) -> &'static str {
        "FOWH65BPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset WH65B")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        set_array_weather(&mut pkt, obj);
        pkt.set_opt("uv", get_float(obj, "uv"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Fine Offset WH0290 particulate monitor
///
/// This sensor reports only relative time, so its records are
/// stamped on arrival.
#[derive(Clone, Copy, Debug, Default)]
pub struct FineOffsetWh0290;

impl Decoder for FineOffsetWh0290 {
    fn name(&self) -> &'static str {
        "FOWH0290Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Fine Offset Electronics, WH0290")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("pm2_5_atm", get_float(obj, "pm2_5_ug_m3"));
        pkt.set_opt("pm10_0_atm", get_float(obj, "pm10_0_ug_m3"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

fn set_wh1080_weather(pkt: &mut Packet, obj: &JsonObject) {
    pkt.set_opt("temperature", get_float(obj, "temperature_C"));
    pkt.set_opt("humidity", get_float(obj, "humidity"));
    pkt.set_opt("wind_dir", get_float(obj, "direction_deg"));
    pkt.set_opt("wind_speed", get_float(obj, "speed"));
    pkt.set_opt("wind_gust", get_float(obj, "gust"));
    pkt.set_opt("rain_total", get_float(obj, "rain").map(|mm| mm / 10.0));
    pkt.set_opt("battery", battery_low(obj));
}

fn set_array_weather(pkt: &mut Packet, obj: &JsonObject) {
    pkt.set_opt("temperature", get_float(obj, "temperature_C"));
    pkt.set_opt("humidity", get_float(obj, "humidity"));
    pkt.set_opt("wind_dir", get_float(obj, "wind_dir_deg"));
    pkt.set_opt("wind_speed", get_float(obj, "wind_speed_ms"));
    pkt.set_opt("wind_gust", get_float(obj, "gust_speed_ms"));
    pkt.set_opt("rain_total", get_float(obj, "rainfall_mm"));
    pkt.set_opt("uv_index", get_float(obj, "uvi"));
    pkt.set_opt("light", get_float(obj, "light_lux"));
    pkt.set_opt("battery", battery_low(obj));
}

fn rain_mm_to_cm(pkt: &mut Packet) {
    if let Some(mm) = pkt.take("rain_total").and_then(|v| v.as_f64()) {
        pkt.set("rain_total", Value::Float(mm / 10.0));
    }
}

fn decode_station_lines(ts: i64, lines: &[String], rules: &[LineRule]) -> TextDecoded {
    let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
    let consumed = parse_lines(lines, rules, &mut pkt);
    let sensor_id = take_id(&mut pkt, "station_id");
    TextDecoded {
        decoded: Some(Decoded {
            packet: pkt,
            sensor_id,
        }),
        consumed,
    }
}
