//! Alecto V1 protocol sensors

use super::json_packet;
use crate::decoder::{
    battery_low, get_float, get_id, get_int, get_scalar, Decoded, Decoder, Identifier, JsonObject,
};
use crate::record::UnitSystem;

/// Alecto V1 temperature/humidity sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct AlectoV1Temperature;

impl Decoder for AlectoV1Temperature {
    fn name(&self) -> &'static str {
        "AlectoV1TemperaturePacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("AlectoV1 Temperature Sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Alecto V1 anemometer
#[derive(Clone, Copy, Debug, Default)]
pub struct AlectoV1Wind;

impl Decoder for AlectoV1Wind {
    fn name(&self) -> &'static str {
        "AlectoV1WindPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("AlectoV1 Wind Sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("wind_speed", get_float(obj, "wind_speed"));
        pkt.set_opt("wind_gust", get_float(obj, "wind_gust"));
        pkt.set_opt("wind_dir", get_int(obj, "wind_direction"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Alecto V1 rain gauge
#[derive(Clone, Copy, Debug, Default)]
pub struct AlectoV1Rain;

impl Decoder for AlectoV1Rain {
    fn name(&self) -> &'static str {
        "AlectoV1RainPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("AlectoV1 Rain Sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("rain_total", get_float(obj, "rain_total"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::decoders::tests::json;
    use crate::record::Value;

    #[test]
    fn test_alecto_wind() {
        let dec = AlectoV1Wind.decode_json(&json(
            r#"{"time" : "2019-01-20 11:14:00", "model" : "AlectoV1 Wind Sensor", "id" : 7, "channel" : 0, "battery" : "OK", "wind_speed" : 1.500, "wind_gust" : 2.000, "wind_direction" : 270, "mic" : "CHECKSUM"}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("7"));
        assert_eq!(dec.packet.get("wind_dir"), Some(&Value::Int(270)));
        assert_eq!(dec.packet.get("wind_gust"), Some(&Value::Float(2.0)));
        assert_eq!(dec.packet.get("battery"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_alecto_rain() {
        let dec = AlectoV1Rain.decode_json(&json(
            r#"{"time" : "2019-01-20 15:29:21", "model" : "AlectoV1 Rain Sensor", "id" : 13, "channel" : 0, "battery" : "OK", "rain_total" : 15.500, "mic" : "CHECKSUM"}"#,
        ));
        assert_eq!(dec.packet.get("rain_total"), Some(&Value::Float(15.5)));
        assert_eq!(dec.packet.get("channel"), Some(&Value::Int(0)));
    }
}
