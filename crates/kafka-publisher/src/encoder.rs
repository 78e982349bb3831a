//! Wire encoding of simulated messages.
//!
//! Messages are published as UTF-8 JSON objects keyed by customer id, so every
//! message for one customer lands on the same partition and stays ordered.

use iccp_core::SimulatedMessage;

/// Encode a message as its JSON wire payload.
pub fn encode_message(message: &SimulatedMessage) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(message)
}

/// Partition key for a message.
pub fn message_key(message: &SimulatedMessage) -> &str {
    &message.customer_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use iccp_core::{
        EnvelopeMetadata, Location, MeasurementKind, MeasurementReading, MessageType, Payload,
        Quality, PROTOCOL_VERSION,
    };

    fn analog_message() -> SimulatedMessage {
        SimulatedMessage {
            message_type: MessageType::Measurement,
            customer_id: "MERIDIAN_ENERGY".to_string(),
            site_id: "MANAPOURI_POWER".to_string(),
            site_name: "Manapouri Power Station".to_string(),
            iccp_association: "MANAPOURI_POWER-MERIDIAN_ENERGY-01".to_string(),
            sequence_number: 12,
            severity: None,
            cleared: None,
            payload: Payload::Measurement(MeasurementReading {
                kind: MeasurementKind::AnalogValue,
                point_id: "MW_GEN_L1".to_string(),
                point_name: "Generation MW Line 1".to_string(),
                value: 321.5,
                quality: Quality::Good,
                units: Some("MW".to_string()),
                change_counter: None,
            }),
            location: Location {
                lat: -45.5361,
                lon: 167.1761,
                region: "MANAPOURI".to_string(),
            },
            metadata: EnvelopeMetadata {
                protocol_version: PROTOCOL_VERSION.to_string(),
                message_size: 256,
                association_active: true,
                roundtrip_time_ms: 9,
            },
            created_at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_payload_is_json_envelope() {
        let message = analog_message();
        let bytes = encode_message(&message).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["message_type"], "MEASUREMENT");
        assert_eq!(value["sequence_number"], 12);
        assert_eq!(value["customer_id"], "MERIDIAN_ENERGY");
        assert_eq!(value["payload"]["measurement"]["units"], "MW");
        assert_eq!(value["metadata"]["protocol_version"], PROTOCOL_VERSION);
        assert!(value.get("severity").is_none());
    }

    #[test]
    fn test_key_is_customer() {
        assert_eq!(message_key(&analog_message()), "MERIDIAN_ENERGY");
    }
}
