//! Main generator producing synthetic telecontrol messages.

use crate::generators::envelope::generate_metadata;
use crate::generators::measurement::MeasurementSampler;
use crate::generators::pick;
use crate::generators::protection::generate_protection_detail;
use chrono::Utc;
use iccp_core::{
    AlarmIdentity, Location, MeasurementKind, MessageType, Payload, Severity, SimulatedMessage,
    SimulatorConfig, SiteProfile,
};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// A weighted distribution cannot be sampled
    #[error("Invalid {name} distribution: {source}")]
    InvalidDistribution {
        name: &'static str,
        #[source]
        source: WeightedError,
    },

    /// The configured site has no customers to attribute messages to
    #[error("Site '{0}' has no customers")]
    NoCustomers(String),

    /// The sequence number space is used up
    #[error("Sequence number exhausted after {0}")]
    SequenceExhausted(u64),
}

/// Generator that produces synthetic measurement and protection-event messages.
///
/// The generator uses a seeded random number generator to ensure
/// reproducible results across runs with the same seed and configuration.
/// It keeps no sequence state of its own: callers pass the previous sequence
/// number and get the next one assigned.
pub struct MessageGenerator {
    /// Site every message is attributed to
    site: &'static SiteProfile,
    /// Sequence number assigned when there is no previous message
    start_sequence: u64,
    message_types: Vec<MessageType>,
    message_distribution: WeightedIndex<f64>,
    severities: Vec<Severity>,
    severity_distribution: WeightedIndex<f64>,
    measurements: MeasurementSampler,
    /// Seeded random number generator for reproducibility
    rng: StdRng,
    seed: u64,
}

impl MessageGenerator {
    /// Create a generator from the simulator configuration and a seed.
    ///
    /// Fails when a distribution cannot be sampled or the site has no customers.
    pub fn new(config: &SimulatorConfig, seed: u64) -> Result<Self, GeneratorError> {
        let site = config.site_profile();
        if site.customers.is_empty() {
            return Err(GeneratorError::NoCustomers(site.name.to_string()));
        }

        let (message_types, message_weights): (Vec<_>, Vec<_>) =
            config.message_weights.entries().into_iter().unzip();
        let message_distribution = WeightedIndex::new(&message_weights).map_err(|source| {
            GeneratorError::InvalidDistribution {
                name: "message type",
                source,
            }
        })?;

        let (severities, severity_weights): (Vec<_>, Vec<_>) =
            config.severity_weights.entries().into_iter().unzip();
        let severity_distribution = WeightedIndex::new(&severity_weights).map_err(|source| {
            GeneratorError::InvalidDistribution {
                name: "severity",
                source,
            }
        })?;

        let measurements =
            MeasurementSampler::new().map_err(|source| GeneratorError::InvalidDistribution {
                name: "measurement",
                source,
            })?;

        Ok(Self {
            site,
            start_sequence: config.start_sequence,
            message_types,
            message_distribution,
            severities,
            severity_distribution,
            measurements,
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }

    /// Seed the generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Site profile messages are attributed to.
    pub fn site(&self) -> &'static SiteProfile {
        self.site
    }

    /// Sequence number following `previous`, or the start sequence for the
    /// first message.
    pub fn next_sequence(&self, previous: Option<u64>) -> Result<u64, GeneratorError> {
        match previous {
            None => Ok(self.start_sequence),
            Some(prev) => prev
                .checked_add(1)
                .ok_or(GeneratorError::SequenceExhausted(prev)),
        }
    }

    /// Generate the next message.
    ///
    /// Protection events are always generated uncleared; clearing is a
    /// separate event produced by [`MessageGenerator::generate_clearing`].
    pub fn generate(&mut self, previous: Option<u64>) -> Result<SimulatedMessage, GeneratorError> {
        let sequence_number = self.next_sequence(previous)?;
        let customer = pick(&mut self.rng, self.site.customers).to_string();
        let message_type = self.message_types[self.message_distribution.sample(&mut self.rng)];

        let message = match message_type {
            MessageType::Measurement => {
                let reading = self.measurements.generate(&mut self.rng);
                let may_drop = reading.kind == MeasurementKind::StatusPoint;
                self.envelope(
                    message_type,
                    customer,
                    sequence_number,
                    None,
                    None,
                    Payload::Measurement(reading),
                    may_drop,
                )
            }
            MessageType::ProtectionEvent => {
                let severity = self.severities[self.severity_distribution.sample(&mut self.rng)];
                let detail = generate_protection_detail(&mut self.rng, None);
                self.envelope(
                    message_type,
                    customer,
                    sequence_number,
                    Some(severity),
                    Some(false),
                    Payload::ProtectionEvent(detail),
                    false,
                )
            }
        };

        Ok(message)
    }

    /// Generate a clearing event for an outstanding alarm.
    ///
    /// The event carries the alarm's customer and severity, a fresh sequence
    /// number, and a reference to the sequence number that raised the alarm.
    pub fn generate_clearing(
        &mut self,
        previous: Option<u64>,
        alarm: &AlarmIdentity,
        severity: Severity,
    ) -> Result<SimulatedMessage, GeneratorError> {
        let sequence_number = self.next_sequence(previous)?;
        let detail = generate_protection_detail(&mut self.rng, Some(alarm.sequence_number));
        let mut message = self.envelope(
            MessageType::ProtectionEvent,
            alarm.customer_id.clone(),
            sequence_number,
            Some(severity),
            Some(true),
            Payload::ProtectionEvent(detail),
            false,
        );
        message.site_id = alarm.site_id.clone();
        Ok(message)
    }

    #[allow(clippy::too_many_arguments)]
    fn envelope(
        &mut self,
        message_type: MessageType,
        customer_id: String,
        sequence_number: u64,
        severity: Option<Severity>,
        cleared: Option<bool>,
        payload: Payload,
        may_drop_association: bool,
    ) -> SimulatedMessage {
        SimulatedMessage {
            message_type,
            iccp_association: self.site.association(&customer_id),
            customer_id,
            site_id: self.site.site_id.to_string(),
            site_name: self.site.display_name.to_string(),
            sequence_number,
            severity,
            cleared,
            payload,
            location: Location {
                lat: self.site.lat,
                lon: self.site.lon,
                region: self.site.region().to_string(),
            },
            metadata: generate_metadata(&mut self.rng, message_type, may_drop_association),
            created_at: Utc::now(),
        }
    }
}
