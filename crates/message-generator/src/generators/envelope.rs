//! Envelope metadata generator.

use iccp_core::{EnvelopeMetadata, MessageType, PROTOCOL_VERSION};
use rand::Rng;

/// Generate link-level metadata for a message of the given type.
///
/// Protection events are larger and slower than measurements, and only
/// status-point traffic ever reports an inactive association.
pub fn generate_metadata<R: Rng>(
    rng: &mut R,
    message_type: MessageType,
    may_drop_association: bool,
) -> EnvelopeMetadata {
    let (size_range, rtt_range) = match message_type {
        MessageType::Measurement => (128..=512, 5..=25),
        MessageType::ProtectionEvent => (200..=600, 8..=30),
    };
    EnvelopeMetadata {
        protocol_version: PROTOCOL_VERSION.to_string(),
        message_size: rng.gen_range(size_range),
        association_active: !may_drop_association || rng.gen_bool(0.98),
        roundtrip_time_ms: rng.gen_range(rtt_range),
    }
}
