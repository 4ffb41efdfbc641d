use super::error::PayloadError;
use super::layout;
use super::reader::PayloadReader;
use crate::protocols::common::convert::scale_fixed_point;
use crate::registry::{DeviceDescriptor, DeviceType};
use crate::{MetricKey, MetricValue, SensorReading, TopicKind};

/// Decode a device payload into one or more readings.
///
/// Leak and smoke detectors yield two readings: the binary `SENS` state and a
/// separate `BATT` sensor reading. Unknown device types publish the raw
/// payload as hex under `UNDEFINED`.
pub fn decode_payload(
    descriptor: &DeviceDescriptor,
    payload: &[u8],
) -> Result<Vec<SensorReading>, PayloadError> {
    let reader = PayloadReader::new(payload);
    let name = descriptor.name.as_str();

    match descriptor.device_type {
        DeviceType::EnergySwitch => {
            reader.require_fixed_len(DeviceType::EnergySwitch)?;
            Ok(vec![decode_energy_switch(name, &reader)?])
        }
        DeviceType::Thermometer => {
            reader.require_fixed_len(DeviceType::Thermometer)?;
            Ok(vec![decode_thermometer(name, &reader)?])
        }
        device_type @ (DeviceType::LeakDetector | DeviceType::SmokeDetector) => {
            reader.require_fixed_len(device_type)?;
            decode_detector(name, &reader)
        }
        DeviceType::Unknown => Ok(vec![
            SensorReading::new(name, TopicKind::Sensor)
                .with_metric(MetricKey::Undefined, MetricValue::Text(reader.read_hex())),
        ]),
    }
}

fn decode_energy_switch(
    name: &str,
    reader: &PayloadReader<'_>,
) -> Result<SensorReading, PayloadError> {
    let voltage = reader.read_u8(layout::SWITCH_VOLTAGE_OFFSET)?;
    let milliamps = reader.read_u16_le(layout::SWITCH_AMPERAGE_RANGE)?;
    let wattage = reader.read_u16_le(layout::SWITCH_WATTAGE_RANGE)?;

    Ok(SensorReading::new(name, TopicKind::Sensor)
        .with_metric(MetricKey::Volt, MetricValue::Int(voltage.into()))
        .with_metric(
            MetricKey::Amp,
            MetricValue::Float(scale_fixed_point(milliamps.into(), layout::AMPERAGE_DECIMALS)),
        )
        .with_metric(MetricKey::Watt, MetricValue::Int(wattage.into())))
}

fn decode_thermometer(
    name: &str,
    reader: &PayloadReader<'_>,
) -> Result<SensorReading, PayloadError> {
    let battery_ok = reader.read_flag(layout::THERMO_FLAGS_OFFSET, layout::BATTERY_OK_BIT)?;
    let temperature = reader.read_i16_le(layout::THERMO_TEMPERATURE_RANGE)?;
    let humidity = reader.read_u8(layout::THERMO_HUMIDITY_OFFSET)?;
    let battery = if battery_ok {
        layout::BATTERY_LEVEL_OK
    } else {
        layout::BATTERY_LEVEL_LOW
    };

    Ok(SensorReading::new(name, TopicKind::Sensor)
        .with_metric(
            MetricKey::Temp,
            MetricValue::Float(scale_fixed_point(
                temperature.into(),
                layout::TEMPERATURE_DECIMALS,
            )),
        )
        .with_metric(MetricKey::Humid, MetricValue::Int(humidity.into()))
        .with_metric(MetricKey::Batt, MetricValue::Int(battery)))
}

fn decode_detector(
    name: &str,
    reader: &PayloadReader<'_>,
) -> Result<Vec<SensorReading>, PayloadError> {
    let tripped = reader.read_flag(layout::DETECTOR_FLAGS_OFFSET, layout::SENSOR_TRIPPED_BIT)?;
    let battery_ok = reader.read_flag(layout::DETECTOR_FLAGS_OFFSET, layout::BATTERY_OK_BIT)?;

    Ok(vec![
        SensorReading::new(name, TopicKind::BinarySensor)
            .with_metric(MetricKey::Sens, MetricValue::on_off(tripped)),
        // BATT "ON" means the battery is low.
        SensorReading::new(name, TopicKind::Sensor)
            .with_metric(MetricKey::Batt, MetricValue::on_off(!battery_ok)),
    ])
}

#[cfg(test)]
mod tests {
    use super::decode_payload;
    use crate::protocols::payload::error::PayloadError;
    use crate::registry::{DeviceDescriptor, DeviceType};
    use crate::{MetricKey, MetricValue, SensorReading, TopicKind};

    fn descriptor(device_type: DeviceType) -> DeviceDescriptor {
        DeviceDescriptor::new("dev", device_type)
    }

    #[test]
    fn thermometer_decodes_scaled_temperature() {
        let payload = [0, 0, 0x01, 0, 0xD7, 0x00, 0x2F, 0, 0, 0, 0, 0];
        let readings = decode_payload(&descriptor(DeviceType::Thermometer), &payload).unwrap();
        assert_eq!(
            readings,
            vec![
                SensorReading::new("dev", TopicKind::Sensor)
                    .with_metric(MetricKey::Temp, MetricValue::Float(21.5))
                    .with_metric(MetricKey::Humid, MetricValue::Int(47))
                    .with_metric(MetricKey::Batt, MetricValue::Int(100))
            ]
        );
    }

    #[test]
    fn thermometer_handles_negative_temperature_and_low_battery() {
        let raw = (-47i16).to_le_bytes();
        let payload = [0xAA, 0xBB, 0x00, 0xCC, raw[0], raw[1], 80, 1, 2, 3, 4, 5];
        let readings = decode_payload(&descriptor(DeviceType::Thermometer), &payload).unwrap();
        let reading = &readings[0];
        assert_eq!(reading.metric(MetricKey::Temp), Some(&MetricValue::Float(-4.7)));
        assert_eq!(reading.metric(MetricKey::Humid), Some(&MetricValue::Int(80)));
        assert_eq!(reading.metric(MetricKey::Batt), Some(&MetricValue::Int(0)));
    }

    #[test]
    fn energy_switch_decodes_voltage_amperage_wattage() {
        let mut payload = [0xEEu8; 12];
        payload[6] = 230;
        payload[7..9].copy_from_slice(&1234u16.to_le_bytes());
        payload[9..11].copy_from_slice(&284u16.to_le_bytes());

        let readings = decode_payload(&descriptor(DeviceType::EnergySwitch), &payload).unwrap();
        assert_eq!(
            readings,
            vec![
                SensorReading::new("dev", TopicKind::Sensor)
                    .with_metric(MetricKey::Volt, MetricValue::Int(230))
                    .with_metric(MetricKey::Amp, MetricValue::Float(1.234))
                    .with_metric(MetricKey::Watt, MetricValue::Int(284))
            ]
        );
    }

    #[test]
    fn leak_detector_tripped_with_low_battery() {
        let mut payload = [0u8; 12];
        payload[2] = 0b0000_0100;
        let readings = decode_payload(&descriptor(DeviceType::LeakDetector), &payload).unwrap();
        assert_eq!(
            readings,
            vec![
                SensorReading::new("dev", TopicKind::BinarySensor)
                    .with_metric(MetricKey::Sens, MetricValue::on_off(true)),
                SensorReading::new("dev", TopicKind::Sensor)
                    .with_metric(MetricKey::Batt, MetricValue::on_off(true)),
            ]
        );
    }

    #[test]
    fn smoke_detector_idle_with_good_battery() {
        let mut payload = [0xF0u8; 12];
        payload[2] = 0b0000_0001;
        let readings = decode_payload(&descriptor(DeviceType::SmokeDetector), &payload).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].topic_kind, TopicKind::BinarySensor);
        assert_eq!(readings[0].metric(MetricKey::Sens), Some(&MetricValue::on_off(false)));
        assert_eq!(readings[1].topic_kind, TopicKind::Sensor);
        assert_eq!(readings[1].metric(MetricKey::Batt), Some(&MetricValue::on_off(false)));
    }

    #[test]
    fn unknown_type_publishes_raw_hex() {
        let payload = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0xff];
        let readings = decode_payload(&descriptor(DeviceType::Unknown), &payload).unwrap();
        assert_eq!(
            readings[0].metric(MetricKey::Undefined),
            Some(&MetricValue::Text("000102030405060708090aff".to_string()))
        );
    }

    #[test]
    fn wrong_width_is_malformed_for_fixed_types() {
        for device_type in [
            DeviceType::EnergySwitch,
            DeviceType::Thermometer,
            DeviceType::LeakDetector,
            DeviceType::SmokeDetector,
        ] {
            let err = decode_payload(&descriptor(device_type), &[0u8; 13]).unwrap_err();
            assert_eq!(
                err,
                PayloadError::Malformed {
                    device_type,
                    expected: 12,
                    actual: 13,
                }
            );
        }
    }

    #[test]
    fn decoding_is_repeatable() {
        let payload = [0, 0, 0x05, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let desc = descriptor(DeviceType::LeakDetector);
        assert_eq!(
            decode_payload(&desc, &payload).unwrap(),
            decode_payload(&desc, &payload).unwrap()
        );
    }
}
