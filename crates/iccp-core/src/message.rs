//! Synthetic telecontrol message model.
//!
//! A [`SimulatedMessage`] is the unit the simulator produces and publishes.
//! The envelope mirrors what a real ICCP gateway would forward into the
//! pipeline (site, customer, association, location, protocol metadata) while
//! the [`Payload`] carries either a measurement reading or a protection event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version stamped on every envelope.
pub const PROTOCOL_VERSION: &str = "IEC60870-6-503";

// ============================================================================
// Enumerations
// ============================================================================

/// Top-level message category. Each category routes to its own topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Measurement,
    ProtectionEvent,
}

impl MessageType {
    pub const ALL: [MessageType; 2] = [MessageType::Measurement, MessageType::ProtectionEvent];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Measurement => "MEASUREMENT",
            MessageType::ProtectionEvent => "PROTECTION_EVENT",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a protection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::High,
        Severity::Critical,
    ];

    /// Whether an uncleared event of this severity warrants a warning.
    pub fn is_alarming(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data quality flag attached to a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    Good,
    Uncertain,
    Invalid,
}

/// Kind of measurement point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementKind {
    /// Circuit breaker open/closed status
    StatusPoint,
    /// Power measurement in MW
    AnalogValue,
}

/// Kind of protection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtectionEventType {
    Overcurrent,
    Undervoltage,
    FrequencyDeviation,
    LineFault,
}

impl ProtectionEventType {
    pub const ALL: [ProtectionEventType; 4] = [
        ProtectionEventType::Overcurrent,
        ProtectionEventType::Undervoltage,
        ProtectionEventType::FrequencyDeviation,
        ProtectionEventType::LineFault,
    ];
}

// ============================================================================
// Payloads
// ============================================================================

/// A single measurement point reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReading {
    pub kind: MeasurementKind,
    pub point_id: String,
    pub point_name: String,
    pub value: f64,
    pub quality: Quality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Status points only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_counter: Option<u32>,
}

/// Protection event descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionDetail {
    pub event_id: String,
    pub event_type: ProtectionEventType,
    pub equipment_affected: String,
    /// Sequence number of the alarm this event clears, for clearing events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clears_sequence: Option<u64>,
}

/// Opaque value block carried by a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Measurement(MeasurementReading),
    ProtectionEvent(ProtectionDetail),
}

/// Geographic location of the originating site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub region: String,
}

/// Link-level metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub protocol_version: String,
    pub message_size: u32,
    pub association_active: bool,
    pub roundtrip_time_ms: u32,
}

// ============================================================================
// Message
// ============================================================================

/// A generated domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedMessage {
    pub message_type: MessageType,
    pub customer_id: String,
    pub site_id: String,
    pub site_name: String,
    pub iccp_association: String,
    /// Process-wide monotonic sequence number, the downstream join key
    pub sequence_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<bool>,
    pub payload: Payload,
    pub location: Location,
    pub metadata: EnvelopeMetadata,
    pub created_at: DateTime<Utc>,
}

impl SimulatedMessage {
    /// Identity of the logical alarm this message raises or clears.
    ///
    /// Returns `None` for measurements. A raising event is identified by its
    /// own sequence number; a clearing event by the sequence it clears.
    pub fn alarm_identity(&self) -> Option<AlarmIdentity> {
        match &self.payload {
            Payload::ProtectionEvent(detail) => Some(AlarmIdentity {
                customer_id: self.customer_id.clone(),
                site_id: self.site_id.clone(),
                sequence_number: detail.clears_sequence.unwrap_or(self.sequence_number),
            }),
            Payload::Measurement(_) => None,
        }
    }

    /// Whether this message is a clearing event for an earlier alarm.
    pub fn is_clearing(&self) -> bool {
        self.cleared == Some(true)
    }
}

/// Identity of one logical protection alarm: customer, site and the sequence
/// number of the event that raised it.
///
/// Ordering follows the raising sequence number first, so the smallest
/// identity in a sorted collection is the oldest alarm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlarmIdentity {
    pub sequence_number: u64,
    pub customer_id: String,
    pub site_id: String,
}

impl AlarmIdentity {
    pub fn new(customer_id: impl Into<String>, site_id: impl Into<String>, sequence_number: u64) -> Self {
        Self {
            sequence_number,
            customer_id: customer_id.into(),
            site_id: site_id.into(),
        }
    }
}

impl fmt::Display for AlarmIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.site_id, self.customer_id, self.sequence_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protection_message(sequence_number: u64, clears: Option<u64>) -> SimulatedMessage {
        SimulatedMessage {
            message_type: MessageType::ProtectionEvent,
            customer_id: "GENESIS_ENERGY".to_string(),
            site_id: "HUNTLY_POWER".to_string(),
            site_name: "Huntly Power Station".to_string(),
            iccp_association: "HUNTLY_POWER-GENESIS_ENERGY-01".to_string(),
            sequence_number,
            severity: Some(Severity::Critical),
            cleared: Some(clears.is_some()),
            payload: Payload::ProtectionEvent(ProtectionDetail {
                event_id: "PROT_EVT_12345".to_string(),
                event_type: ProtectionEventType::LineFault,
                equipment_affected: "Line 2".to_string(),
                clears_sequence: clears,
            }),
            location: Location {
                lat: -37.5483,
                lon: 175.0681,
                region: "HUNTLY".to_string(),
            },
            metadata: EnvelopeMetadata {
                protocol_version: PROTOCOL_VERSION.to_string(),
                message_size: 300,
                association_active: true,
                roundtrip_time_ms: 12,
            },
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_alarm_identity_of_raising_and_clearing_events_match() {
        let raised = protection_message(4, None);
        let clearing = protection_message(9, Some(4));

        assert!(!raised.is_clearing());
        assert!(clearing.is_clearing());
        assert_eq!(raised.alarm_identity(), clearing.alarm_identity());
        assert_eq!(
            raised.alarm_identity().unwrap().to_string(),
            "HUNTLY_POWER/GENESIS_ENERGY#4"
        );
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(protection_message(1, None)).unwrap();
        assert_eq!(json["message_type"], "PROTECTION_EVENT");
        assert_eq!(json["severity"], "CRITICAL");
        assert_eq!(json["payload"]["protection_event"]["event_type"], "LINE_FAULT");
        assert!(json["payload"]["protection_event"].get("clears_sequence").is_none());
    }

    #[test]
    fn test_severity_alarming() {
        assert!(!Severity::Info.is_alarming());
        assert!(!Severity::Warning.is_alarming());
        assert!(Severity::High.is_alarming());
        assert!(Severity::Critical.is_alarming());
    }
}
