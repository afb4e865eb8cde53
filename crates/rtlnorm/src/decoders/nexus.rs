//! Nexus protocol sensors

use lazy_static::lazy_static;

use super::{json_packet, take_id, CELSIUS, PERCENT};
use crate::decoder::{
    battery_low, get_float, get_id, pair_id, parse_lines, Convert, Decoded, Decoder, Identifier,
    JsonObject, LineRule, TextDecoded,
};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    static ref NEXUS_LINES: [LineRule; 5] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
    ];
}

/// Nexus temperature and temperature/humidity sensors
///
/// Identified by `channel:house_code`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NexusTemperature;

impl Decoder for NexusTemperature {
    fn name(&self) -> &'static str {
        "NexusTemperaturePacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Nexus Temperature")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        Decoded::new(pkt, pair_id(get_id(obj, "channel"), get_id(obj, "id")))
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        let consumed = parse_lines(lines, &NEXUS_LINES[..], &mut pkt);
        let channel = take_id(&mut pkt, "channel");
        let house_code = take_id(&mut pkt, "house_code");
        TextDecoded {
            decoded: Some(Decoded::new(pkt, pair_id(channel, house_code))),
            consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::decoders::tests::lines;
    use crate::record::Value;

    #[test]
    fn test_nexus_text() {
        let block = lines(&[
            "    House Code:      180",
            "    Battery:         OK",
            "    Channel:         1",
            "    Temperature:     20.10 C",
            "    Humidity:        42 %",
        ]);
        let out = NexusTemperature.decode_text(0, "Nexus Temperature/Humidity", &block);
        assert_eq!(out.consumed, 5);
        let dec = out.decoded.expect("decoded");
        assert_eq!(dec.sensor_id.as_deref(), Some("1:180"));
        assert_eq!(dec.packet.get("humidity"), Some(&Value::Float(42.0)));
        assert_eq!(dec.packet.len(), 3);
    }
}
