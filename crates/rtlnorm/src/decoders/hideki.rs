//! Hideki sensors
//!
//! Identified by `channel:rolling_code`. The rolling code changes
//! whenever the batteries are replaced.

use lazy_static::lazy_static;
use regex::Regex;

use super::{json_packet, take_id, CELSIUS, PERCENT};
use crate::decoder::{
    battery_low, get_float, get_id, mph_to_kph, pair_id, parse_lines, Convert, Decoded, Decoder,
    Identifier, JsonObject, LineRule, TextDecoded,
};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    static ref KPH: Regex = Regex::new(r"([\d.]+) km/h").expect("bad regexp");
    static ref LEADING_NUMBER: Regex = Regex::new(r"([\d.]+) ").expect("bad regexp");

    static ref TS04_LINES: [LineRule; 5] = [
        LineRule::new("Rolling Code", "rolling_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
    ];

    static ref WIND_LINES: [LineRule; 6] = [
        LineRule::new("Rolling Code", "rolling_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Wind Strength", "wind_speed", Convert::Float).extract(&KPH),
        LineRule::new("Direction", "wind_dir", Convert::Float).extract(&LEADING_NUMBER),
    ];

    static ref RAIN_LINES: [LineRule; 4] = [
        LineRule::new("Rolling Code", "rolling_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Rain", "rain_total", Convert::Float).extract(&LEADING_NUMBER),
    ];
}

/// Hideki TS04 thermo-hygrometer
#[derive(Clone, Copy, Debug, Default)]
pub struct HidekiTs04;

impl Decoder for HidekiTs04 {
    fn name(&self) -> &'static str {
        "HidekiTS04Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("HIDEKI TS04 sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        with_rolling_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, lines, &TS04_LINES[..])
    }
}

/// Hideki anemometer
///
/// Wind speeds are stored in km/h. Later rtl_433 releases report
/// mph, which is converted.
#[derive(Clone, Copy, Debug, Default)]
pub struct HidekiWind;

impl Decoder for HidekiWind {
    fn name(&self) -> &'static str {
        "HidekiWindPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("HIDEKI Wind sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt(
            "wind_speed",
            get_float(obj, "wind_speed_mph")
                .map(mph_to_kph)
                .or_else(|| get_float(obj, "windstrength")),
        );
        pkt.set_opt(
            "wind_dir",
            get_float(obj, "wind_direction").or_else(|| get_float(obj, "winddirection")),
        );
        pkt.set_opt("wind_gust", get_float(obj, "gust_speed_mph").map(mph_to_kph));
        pkt.set_opt("battery", battery_low(obj));
        with_rolling_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, lines, &WIND_LINES[..])
    }
}

/// Hideki rain gauge
#[derive(Clone, Copy, Debug, Default)]
pub struct HidekiRain;

impl Decoder for HidekiRain {
    fn name(&self) -> &'static str {
        "HidekiRainPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("HIDEKI Rain sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt(
            "rain_total",
            get_float(obj, "rain_mm").or_else(|| get_float(obj, "rain")),
        );
        pkt.set_opt("battery", battery_low(obj));
        with_rolling_code(pkt, obj)
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        decode_lines(ts, lines, &RAIN_LINES[..])
    }
}

fn with_rolling_code(pkt: Packet, obj: &JsonObject) -> Decoded {
    Decoded::new(pkt, pair_id(get_id(obj, "channel"), get_id(obj, "rc")))
}

fn decode_lines(ts: i64, lines: &[String], rules: &[LineRule]) -> TextDecoded {
    let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
    let consumed = parse_lines(lines, rules, &mut pkt);
    let channel = take_id(&mut pkt, "channel");
    let code = take_id(&mut pkt, "rolling_code");
    TextDecoded {
        decoded: Some(Decoded::new(pkt, pair_id(channel, code))),
        consumed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    use crate::decoders::tests::{json, lines};
    use crate::record::Value;

    #[test]
    fn test_wind_mph_to_kph() {
        let dec = HidekiWind.decode_json(&json(
            r#"{"time" : "2019-11-24 19:13:41", "model" : "HIDEKI Wind sensor", "rc" : 3, "channel" : 4, "battery" : "OK", "temperature_C" : 11.000, "wind_speed_mph" : 0.621371, "gust_speed_mph" : 0.100, "wind_approach" : 1, "wind_direction" : 270.000, "mic" : "CRC"}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("4:3"));
        assert_approx_eq!(dec.packet.get("wind_speed").unwrap().as_f64().unwrap(), 1.0f64);
        assert_eq!(dec.packet.get("wind_dir"), Some(&Value::Float(270.0)));

        let dec = HidekiWind.decode_json(&json(
            r#"{"time" : "2017-01-16 04:38:39", "model" : "HIDEKI Wind sensor", "rc" : 0, "channel" : 4, "battery" : "OK", "temperature_C" : -4.400, "windstrength" : 2.897, "winddirection" : 292.500}"#,
        ));
        assert_eq!(dec.packet.get("wind_speed"), Some(&Value::Float(2.897)));
        assert!(dec.packet.get("wind_gust").is_none());
    }

    #[test]
    fn test_ts04_text() {
        let block = lines(&[
            "Rolling Code: 9",
            "Channel: 1",
            "Battery: OK",
            "Temperature: 27.30 C",
            "Humidity: 60 %",
        ]);
        let out = HidekiTs04.decode_text(0, "HIDEKI TS04 sensor", &block);
        assert_eq!(out.consumed, 5);
        let dec = out.decoded.expect("decoded");
        assert_eq!(dec.sensor_id.as_deref(), Some("1:9"));
        assert_eq!(dec.packet.get("temperature"), Some(&Value::Float(27.3)));
        assert_eq!(dec.packet.get("battery"), Some(&Value::Int(0)));
        assert!(dec.packet.get("channel").is_none());
    }

    #[test]
    fn test_rain_text_without_units() {
        let block = lines(&["Rolling Code: 0", "Channel: 4", "Battery: OK", "Rain: 2622.900"]);
        let dec = HidekiRain.decode_text(0, "", &block).decoded.expect("decoded");
        assert_eq!(dec.packet.get("rain_total"), Some(&Value::Float(2622.9)));
    }
}
