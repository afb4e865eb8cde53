//! Ambient Weather sensors

use lazy_static::lazy_static;
use regex::Regex;

use super::{json_packet, take_id, FAHRENHEIT, PERCENT};
use crate::decoder::{
    battery_low, get_float, get_id, get_int, pair_id, parse_lines, Convert, Decoded, Decoder,
    Identifier, JsonObject, LineRule, TextDecoded,
};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    static ref F007TH_ID: Regex =
        Regex::new(r"(?i)ambient ?weather[- ]F007TH").expect("bad regexp");

    static ref F007TH_LINES: [LineRule; 4] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&FAHRENHEIT),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
    ];
}

/// Ambient Weather F007TH thermo-hygrometer
///
/// Identified by `channel:house_code`. The house code changes
/// when the batteries are replaced. Temperatures are Fahrenheit
/// in both text and JSON output.
#[derive(Clone, Copy, Debug, Default)]
pub struct AmbientF007th;

impl Decoder for AmbientF007th {
    fn name(&self) -> &'static str {
        "AmbientF007THPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Pattern(&F007TH_ID)
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Us);
        pkt.set_opt("temperature", get_float(obj, "temperature_F"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        let house_code = get_id(obj, "device").or_else(|| get_id(obj, "id"));
        Decoded::new(pkt, pair_id(get_id(obj, "channel"), house_code))
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        let mut pkt = Packet::new(Some(ts), UnitSystem::Us);
        let consumed = parse_lines(lines, &F007TH_LINES[..], &mut pkt);
        let house_code = take_id(&mut pkt, "house_code");
        let channel = take_id(&mut pkt, "channel");
        TextDecoded {
            decoded: Some(Decoded::new(pkt, pair_id(channel, house_code))),
            consumed,
        }
    }
}

/// Ambient Weather WH31E thermo-hygrometer
#[derive(Clone, Copy, Debug, Default)]
pub struct AmbientWh31e;

impl Decoder for AmbientWh31e {
    fn name(&self) -> &'static str {
        "AmbientWH31EPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("AmbientWeather-WH31E")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("channel", get_int(obj, "channel"));
        pkt.set_opt("rssi", get_int(obj, "rssi"));
        pkt.set_opt("snr", get_float(obj, "snr"));
        pkt.set_opt("noise", get_float(obj, "noise"));
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
    fn test_f007th_versions() {
        let old = AmbientF007th.decode_json(&json(
            r#"{"time" : "2017-01-21 13:01:30", "model" : "Ambient Weather F007TH Thermo-Hygrometer", "device" : 80, "channel" : 1, "temperature_F" : 61.800, "humidity" : 10}"#,
        ));
        assert_eq!(old.sensor_id.as_deref(), Some("1:80"));
        assert_eq!(old.packet.get("battery"), None);

        let new = AmbientF007th.decode_json(&json(
            r#"{"time" : "2020-02-05 19:33:11", "model" : "Ambientweather-F007TH", "id" : 201, "channel" : 5, "battery_ok" : 1, "temperature_F" : 39.400, "humidity" : 60, "mic" : "CRC"}"#,
        ));
        assert_eq!(new.sensor_id.as_deref(), Some("5:201"));
        assert_eq!(new.packet.get("battery"), Some(&Value::Int(0)));

        assert!(F007TH_ID.is_match("Ambient Weather F007TH Thermo-Hygrometer"));
        assert!(F007TH_ID.is_match("Ambientweather-F007TH"));
    }

    #[test]
    fn test_f007th_text() {
        let block = lines(&["House Code: 80", "Channel: 1", "Temperature: 61.8", "Humidity: 13 %"]);
        let out = AmbientF007th.decode_text(0, "Ambient Weather F007TH Thermo-Hygrometer", &block);
        assert_eq!(out.consumed, 4);
        let dec = out.decoded.expect("decoded");
        assert_eq!(dec.sensor_id.as_deref(), Some("1:80"));
        assert_eq!(dec.packet.get("temperature"), Some(&Value::Float(61.8)));
        assert_eq!(dec.packet.len(), 2);
    }
}
