//! Single-model families

use lazy_static::lazy_static;

use super::{json_packet, take_id, CELSIUS, PERCENT};
use crate::decoder::{
    battery_low, get_float, get_id, get_int, get_scalar, pair_id, parse_lines, Convert, Decoded,
    Decoder, Identifier, JsonObject, LineRule, TextDecoded,
};
use crate::record::{Packet, UnitSystem};

lazy_static! {
    static ref CALIBEUR_LINES: [LineRule; 3] = [
        LineRule::new("ID", "id", Convert::Int),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
    ];

    static ref RUBICSON_LINES: [LineRule; 4] = [
        LineRule::new("House Code", "house_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
    ];

    static ref TFA_LINES: [LineRule; 5] = [
        LineRule::new("Rolling Code", "rolling_code", Convert::Int),
        LineRule::new("Channel", "channel", Convert::Int),
        LineRule::new("Battery", "battery", Convert::OkFlag),
        LineRule::new("Temperature", "temperature", Convert::Float).extract(&CELSIUS),
        LineRule::new("Humidity", "humidity", Convert::Float).extract(&PERCENT),
    ];
}

/// Bresser 5-in-1 weather station
///
/// rtl_433 has renamed the wind and rain fields more than once.
/// The newest name present wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bresser5in1;

impl Decoder for Bresser5in1 {
    fn name(&self) -> &'static str {
        "Bresser5in1Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Bresser-5in1")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("wind_dir", get_float(obj, "wind_dir_deg"));
        pkt.set_opt("uv", get_float(obj, "uv"));
        pkt.set_opt("uv_index", get_float(obj, "uvi"));
        pkt.set_opt(
            "wind_speed",
            first_float(obj, &["wind_avg_m_s", "wind_speed_ms", "wind_speed"]),
        );
        pkt.set_opt(
            "gust_speed",
            first_float(obj, &["wind_max_m_s", "gust_speed_ms", "gust_speed", "wind_gust"]),
        );
        pkt.set_opt("rain_total", first_float(obj, &["rain_mm", "rainfall_mm"]));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Calibeur RF-104 thermo-hygrometer
#[derive(Clone, Copy, Debug, Default)]
pub struct CalibeurRf104;

impl Decoder for CalibeurRf104 {
    fn name(&self) -> &'static str {
        "CalibeurRF104Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Calibeur RF-104")
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
        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        let consumed = parse_lines(lines, &CALIBEUR_LINES[..], &mut pkt);
        let id = take_id(&mut pkt, "id").unwrap_or_else(|| "0".to_owned());
        TextDecoded {
            decoded: Some(Decoded::new(pkt, id)),
            consumed,
        }
    }
}

/// EcoWitt WH40 rain gauge
#[derive(Clone, Copy, Debug, Default)]
pub struct EcoWittWh40;

impl Decoder for EcoWittWh40 {
    fn name(&self) -> &'static str {
        "EcoWittWH40Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("EcoWitt-WH40")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        pkt.set_opt("rain_total", get_float(obj, "rain_mm"));
        pkt.set_opt("battery", battery_low(obj));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Holman Industries WS5029 weather station
///
/// Reports wind speed in km/h; stored in m/s.
#[derive(Clone, Copy, Debug, Default)]
pub struct HolmanWs5029;

impl Decoder for HolmanWs5029 {
    fn name(&self) -> &'static str {
        "HolmanWS5029Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Holman Industries WS5029 weather station")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::MetricWx);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("wind_dir", get_float(obj, "direction_deg"));
        pkt.set_opt("wind_speed", get_float(obj, "wind_avg_km_h").map(|k| k / 3.6));
        pkt.set_opt("rain_total", get_float(obj, "rain_mm"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// Prologue thermo-hygrometer
///
/// Identified by the random id `rid`, not the fixed model `id`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Prologue;

impl Decoder for Prologue {
    fn name(&self) -> &'static str {
        "ProloguePacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Prologue sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "rid"),
        }
    }
}

/// Rubicson temperature sensor
#[derive(Clone, Copy, Debug, Default)]
pub struct RubicsonTemp;

impl Decoder for RubicsonTemp {
    fn name(&self) -> &'static str {
        "RubicsonTempPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Rubicson Temperature Sensor")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("battery", battery_low(obj));
        Decoded::new(pkt, pair_id(get_id(obj, "channel"), get_id(obj, "id")))
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        let consumed = parse_lines(lines, &RUBICSON_LINES[..], &mut pkt);
        let channel = take_id(&mut pkt, "channel");
        let house_code = take_id(&mut pkt, "house_code");
        TextDecoded {
            decoded: Some(Decoded::new(pkt, pair_id(channel, house_code))),
            consumed,
        }
    }
}

/// Springfield soil temperature and moisture probe
#[derive(Clone, Copy, Debug, Default)]
pub struct SpringfieldTm;

impl Decoder for SpringfieldTm {
    fn name(&self) -> &'static str {
        "SpringfieldTMPacket"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("Springfield Temperature & Moisture")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("moisture", get_float(obj, "moisture"));
        pkt.set_opt("battery", battery_low(obj));
        pkt.set_opt("channel", get_scalar(obj, "channel"));
        pkt.set_opt("transmit", get_scalar(obj, "transmit"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "sid"),
        }
    }
}

/// TFA Twin Plus 30.3049 thermo-hygrometer
///
/// Identified by `channel:rolling_code`, like the Hideki sensors
/// it shares a protocol with.
#[derive(Clone, Copy, Debug, Default)]
pub struct TfaTwinPlus;

impl Decoder for TfaTwinPlus {
    fn name(&self) -> &'static str {
        "TFATwinPlus303049Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("TFA-Twin-Plus-30.3049")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("humidity", get_float(obj, "humidity"));
        pkt.set_opt("battery", battery_low(obj));
        let rolling_code = get_id(obj, "rc").or_else(|| get_id(obj, "id"));
        Decoded::new(pkt, pair_id(get_id(obj, "channel"), rolling_code))
    }

    fn decode_text(&self, ts: i64, _payload: &str, lines: &[String]) -> TextDecoded {
        let mut pkt = Packet::new(Some(ts), UnitSystem::Metric);
        let consumed = parse_lines(lines, &TFA_LINES[..], &mut pkt);
        let channel = take_id(&mut pkt, "channel");
        let rolling_code = take_id(&mut pkt, "rolling_code");
        TextDecoded {
            decoded: Some(Decoded::new(pkt, pair_id(channel, rolling_code))),
            consumed,
        }
    }
}

/// TS-FT002 tank level sensor
///
/// Depth is in cm and the transmit interval in seconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct TsFt002;

impl Decoder for TsFt002 {
    fn name(&self) -> &'static str {
        "TSFT002Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("TS-FT002")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        pkt.set_opt("depth", get_float(obj, "depth_cm"));
        pkt.set_opt("transmit", get_float(obj, "transmit_s"));
        pkt.set_opt("flags", get_int(obj, "flags"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "id"),
        }
    }
}

/// WT0124 pool thermometer
///
/// Identified by the random id `rid`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Wt0124;

impl Decoder for Wt0124 {
    fn name(&self) -> &'static str {
        "WT0124Packet"
    }

    fn identifier(&self) -> Identifier {
        Identifier::Substring("WT0124 Pool Thermometer")
    }

    fn decode_json(&self, obj: &JsonObject) -> Decoded {
        let mut pkt = json_packet(obj, UnitSystem::Metric);
        pkt.set_opt("temperature", get_float(obj, "temperature_C"));
        Decoded {
            packet: pkt,
            sensor_id: get_id(obj, "rid"),
        }
    }
}

fn first_float(obj: &JsonObject, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| get_float(obj, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    use crate::decoders::tests::{json, lines};
    use crate::record::Value;

    #[test]
    fn test_bresser_labels() {
        let dec = Bresser5in1.decode_json(&json(
            r#"{"time" : "2018-12-15 16:04:04", "model" : "Bresser-5in1", "id" : 118, "temperature_C" : 6.400, "humidity" : 87, "wind_gust" : 2.800, "wind_speed" : 2.900, "wind_dir_deg" : 315.000, "rain_mm" : 10.800, "mic" : "CHECKSUM"}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("118"));
        assert_eq!(dec.packet.get("wind_speed"), Some(&Value::Float(2.9)));
        assert_eq!(dec.packet.get("gust_speed"), Some(&Value::Float(2.8)));
        assert_eq!(dec.packet.get("rain_total"), Some(&Value::Float(10.8)));
        assert!(dec.packet.get("uv").is_none());
    }

    #[test]
    fn test_holman_wind_to_mps() {
        let dec = HolmanWs5029.decode_json(&json(
            r#"{"time" : "2019-08-07 10:35:07", "model" : "Holman Industries WS5029 weather station", "id" : 53761, "temperature_C" : 9.100, "humidity" : 102, "rain_mm" : 39.500, "wind_avg_km_h" : 36, "direction_deg" : 338}"#,
        ));
        let speed = dec.packet.get("wind_speed").and_then(Value::as_f64).unwrap();
        assert_approx_eq!(speed, 10.0f64);
        assert_eq!(dec.packet.us_units, UnitSystem::MetricWx);
    }

    #[test]
    fn test_prologue_rid() {
        let dec = Prologue.decode_json(&json(
            r#"{"time" : "2017-03-15 20:14:19", "model" : "Prologue sensor", "id" : 5, "rid" : 166, "channel" : 1, "battery" : "OK", "button" : 0, "temperature_C" : -0.700, "humidity" : 49}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("166"));
        assert_eq!(dec.packet.get("temperature"), Some(&Value::Float(-0.7)));
    }

    #[test]
    fn test_text_ids() {
        let block = lines(&["ID: 1", "Temperature: -2.2 C", "Humidity: 71 %"]);
        let dec = CalibeurRf104
            .decode_text(0, "Calibeur RF-104", &block)
            .decoded
            .expect("decoded");
        assert_eq!(dec.sensor_id.as_deref(), Some("1"));
        assert_eq!(dec.packet.get("temperature"), Some(&Value::Float(-2.2)));

        let block = lines(&[
            "House Code: 14",
            "Channel: 1",
            "Battery: OK",
            "Temperature: 4.5 C",
            "CRC: OK",
        ]);
        let out = RubicsonTemp.decode_text(0, "Rubicson Temperature Sensor", &block);
        assert_eq!(out.consumed, 5);
        let dec = out.decoded.expect("decoded");
        assert_eq!(dec.sensor_id.as_deref(), Some("1:14"));
        assert_eq!(dec.packet.len(), 2);
    }

    #[test]
    fn test_springfield() {
        let dec = SpringfieldTm.decode_json(&json(
            r#"{"time" : "2019-01-20 11:14:00", "model" : "Springfield Temperature & Moisture", "sid" : 224, "channel" : 3, "battery" : "OK", "transmit" : "MANUAL", "temperature_C" : 12.500, "moisture" : 4, "mic" : "CHECKSUM"}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("224"));
        assert_eq!(dec.packet.get("moisture"), Some(&Value::Float(4.0)));
        assert_eq!(
            dec.packet.get("transmit"),
            Some(&Value::Text("MANUAL".to_owned()))
        );
        assert_eq!(dec.packet.get("battery"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_tfa_twin_plus() {
        let dec = TfaTwinPlus.decode_json(&json(
            r#"{"time" : "2019-09-25 17:15:12", "model" : "TFA-Twin-Plus-30.3049", "id" : 13, "channel" : 1, "battery" : "OK", "temperature_C" : 8.400, "humidity" : 91, "mic" : "CHECKSUM"}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("1:13"));
        assert_eq!(dec.packet.get("humidity"), Some(&Value::Float(91.0)));

        let block = lines(&[
            "Rolling Code: 13",
            "Channel: 1",
            "Battery: OK",
            "Temperature: 8.40 C",
            "Humidity: 91 %",
        ]);
        let dec = TfaTwinPlus
            .decode_text(0, "TFA-Twin-Plus-30.3049", &block)
            .decoded
            .expect("decoded");
        assert_eq!(dec.sensor_id.as_deref(), Some("1:13"));
        assert_eq!(dec.packet.get("temperature"), Some(&Value::Float(8.4)));
    }

    #[test]
    fn test_tank_and_pool() {
        let dec = TsFt002.decode_json(&json(
            r#"{"time" : "2019-12-22 22:54:58", "model" : "TS-FT002", "id" : 127, "depth_cm" : 186, "temperature_C" : 20.700, "transmit_s" : 180, "flags" : 8, "mic" : "CHECKSUM"}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("127"));
        assert_eq!(dec.packet.get("depth"), Some(&Value::Float(186.0)));
        assert_eq!(dec.packet.get("flags"), Some(&Value::Int(8)));

        let dec = Wt0124.decode_json(&json(
            r#"{"time" : "2019-04-23 12:28:52", "model" : "WT0124 Pool Thermometer", "rid" : 122, "channel" : 1, "temperature_C" : 22.800, "mic" : "CHECKSUM", "data" : 172}"#,
        ));
        assert_eq!(dec.sensor_id.as_deref(), Some("122"));
        assert_eq!(dec.packet.len(), 1);
    }
}
