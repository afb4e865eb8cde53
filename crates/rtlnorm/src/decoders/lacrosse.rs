//! LaCrosse sensors

use lazy_static::lazy_static;
use regex::Regex;

use super::{json_packet, CELSIUS};
use crate::decoder::{
    battery_low, c_to_f, get_float, get_id, pair_id, parse_lines, Convert, Decoded, Decoder,
    Identifier, JsonObject, LineRule, TextDecoded,
};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    static ref METRES_PER_SEC: Regex = Regex::new(r"([\d.]+) m/s").expect("bad regexp");
    static ref MILLIMETRES: Regex = Regex::new(r"([\d.]+) mm").expect("bad regexp");

    static ref WS_LINES: [LineRule; 5] = [
        LineRule::new("Wind speed", "wind_speed", Convert::Float).extract(&METRES_PER_SEC),
        LineRule::new("Direction", "wind_dir", Convert::Float),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Int),
        LineRule::new("Rainfall", "rain_total", Convert::Float).extract(&MILLIMETRES),
    ];
}

/// LaCrosse WS-2310/WS-3600 weather station
///
/// Each message carries one observation. Identified by
/// `ws_id:hardware_id`; in text output both ids are in the header,
/// as in `LaCrosse WS :9 :202`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LaCrosseWs;

impl Decoder for LaCrosseWs {
    fn name(&self) -> &'static str {
        "LaCrosseWSPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("LaCrosse WS")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("wind_speed", get_float(obj, "wind_speed_ms"));
        pkt.set_opt("wind_dir", get_float(obj, "wind_direction"));
        pkt.set_opt("rain_total", get_float(obj, "rain"));
        Decoded::new(pkt, pair_id(get_id(obj, "ws_id"), get_id(obj, "id")))
    }

    fn decode_text(&self, ts: i64, payload: &str, lines: &[String]) -> TextDecoded {
        let mut pkt = Packet::new(Some(ts), UnitSystem::MetricWx);
        let consumed = parse_lines(lines, &WS_LINES[..], &mut pkt);

        let parts: Vec<&str> = payload.split(':').map(|p| p.trim()).collect();
        let sensor_id = match parts.as_slice() {
            [_, ws_id, hw_id] => pair_id(Some(ws_id.to_string()), Some(hw_id.to_string())),
            _ => pair_id(None, None),
        };

        TextDecoded {
            decoded: Some(Decoded::new(pkt, sensor_id)),
            consumed,
        }
    }
}

/// LaCrosse TX141TH-Bv2 thermo-hygrometer
///
/// Early releases sent an unlabelled Fahrenheit `temperature`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LaCrosseTx141thBv2;

impl Decoder for LaCrosseTx141thBv2 {
    fn name(&self) -> &'static str {
        "LaCrosseTX141THBv2Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("LaCrosse TX141TH-Bv2 sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Us);
        pkt.set_opt(
            "temperature",
            get_float(obj, "temperature")
                .or_else(|| get_float(obj, "temperature_F"))
                .or_else(|| get_float(obj, "temperature_C").map(c_to_f)),
        );
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// LaCrosse TX temperature/humidity sensor
///
/// Temperature and humidity arrive in separate messages.
#[derive(Clone, Copy, Debug, Default)]
pub struct LaCrosseTx;

impl Decoder for LaCrosseTx {
    fn name(&self) -> &'static str {
        "LaCrosseTXPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("LaCrosse TX Sensor")
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
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::decoders::tests::{json, lines};
    use crate::record::Value;

    #[test]
    fn test_ws_text_header_ids() {
        let block = lines(&["Wind speed: 0.8 m/s", "Direction: 67.500"]);
        let out = LaCrosseWs.decode_text(0, "LaCrosse WS :9 :202", &block);
        assert_eq!(out.consumed, 2);
        let dec = out.decoded.expect("decoded");
        assert_eq!(dec.sensor_id.as_deref(), Some("9:202"));
        assert_eq!(dec.packet.get("wind_speed"), Some(&Value::Float(0.8)));
        assert_eq!(dec.packet.get("wind_dir"), Some(&Value::Float(67.5)));
    }

    #[test]
    fn test_ws_json_single_observation() {
        let dec = LaCrosseWs.decode_json(&json(
            r#"{"time" : "2016-11-04 14:44:58", "model" : "LaCrosse WS", "ws_id" : 9, "id" : 202, "humidity" : 67}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("9:202"));
        assert_eq!(dec.packet.len(), 1);
    }

    #[test]
    fn test_tx141th_unlabelled_temperature() {
        let dec = LaCrosseTx141thBv2.decode_json(&json(
            r#"{"time" : "2017-01-16 15:24:43", "temperature" : 54.140, "humidity" : 34, "id" : 221, "model" : "LaCrosse TX141TH-Bv2 sensor", "battery" : "OK", "test" : "Yes"}"#,
        ));
        assert_eq!(dec.packet.get("temperature"), Some(&Value::Float(54.14)));
        assert_eq!(dec.sensor_id.as_deref(), Some("221"));
    }
}
