//! Protection event descriptor generator.

use super::pick;
use iccp_core::{ProtectionDetail, ProtectionEventType};
use rand::Rng;

/// Generate a protection event descriptor.
///
/// `clears_sequence` links a clearing event to the alarm it clears.
pub fn generate_protection_detail<R: Rng>(
    rng: &mut R,
    clears_sequence: Option<u64>,
) -> ProtectionDetail {
    ProtectionDetail {
        event_id: format!("PROT_EVT_{}", rng.gen_range(10000..=99999)),
        event_type: *pick(rng, &ProtectionEventType::ALL),
        equipment_affected: format!("Line {}", rng.gen_range(1..=4)),
        clears_sequence,
    }
}
