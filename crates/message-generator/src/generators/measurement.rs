//! Measurement reading generators.

use super::{pick, WeightedTable};
use iccp_core::{MeasurementKind, MeasurementReading, Quality};
use rand::distributions::WeightedError;
use rand::Rng;

/// Share of status points vs. analog values among measurements.
pub const KIND_WEIGHTS: [(MeasurementKind, u32); 2] = [
    (MeasurementKind::StatusPoint, 55),
    (MeasurementKind::AnalogValue, 30),
];

const STATUS_QUALITY: [(Quality, u32); 3] = [
    (Quality::Good, 92),
    (Quality::Uncertain, 6),
    (Quality::Invalid, 2),
];

const ANALOG_QUALITY: [(Quality, u32); 3] = [
    (Quality::Good, 94),
    (Quality::Uncertain, 5),
    (Quality::Invalid, 1),
];

const VOLTAGE_LEVELS: [&str; 3] = ["330", "220", "110"];

const ANALOG_POINTS: [(&str, &str); 3] = [
    ("GEN", "Generation"),
    ("LOAD", "Load"),
    ("FLOW", "Power Flow"),
];

/// Samples measurement kinds and reading quality from the weight tables above.
#[derive(Debug, Clone)]
pub struct MeasurementSampler {
    kinds: WeightedTable<MeasurementKind>,
    status_quality: WeightedTable<Quality>,
    analog_quality: WeightedTable<Quality>,
}

impl MeasurementSampler {
    pub fn new() -> Result<Self, WeightedError> {
        Ok(Self {
            kinds: WeightedTable::new(&KIND_WEIGHTS)?,
            status_quality: WeightedTable::new(&STATUS_QUALITY)?,
            analog_quality: WeightedTable::new(&ANALOG_QUALITY)?,
        })
    }

    /// Generate a reading of a randomly chosen kind.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> MeasurementReading {
        match self.kinds.sample(rng) {
            MeasurementKind::StatusPoint => self.status_point(rng),
            MeasurementKind::AnalogValue => self.analog_value(rng),
        }
    }

    /// Circuit breaker status (0 = open, 1 = closed).
    pub fn status_point<R: Rng>(&self, rng: &mut R) -> MeasurementReading {
        let voltage = pick(rng, &VOLTAGE_LEVELS);
        let line = rng.gen_range(1..=4);
        MeasurementReading {
            kind: MeasurementKind::StatusPoint,
            point_id: format!("CB_{voltage}_L{line}_STATUS"),
            point_name: format!("Circuit Breaker {voltage}kV Line {line}"),
            value: f64::from(rng.gen_range(0u8..=1)),
            quality: self.status_quality.sample(rng),
            units: None,
            change_counter: Some(rng.gen_range(1000..=9999)),
        }
    }

    /// Active power in MW, rounded to two decimals.
    pub fn analog_value<R: Rng>(&self, rng: &mut R) -> MeasurementReading {
        let (code, label) = *pick(rng, &ANALOG_POINTS);
        let line = rng.gen_range(1..=4);
        let megawatts: f64 = rng.gen_range(50.0..=500.0);
        MeasurementReading {
            kind: MeasurementKind::AnalogValue,
            point_id: format!("MW_{code}_L{line}"),
            point_name: format!("{label} MW Line {line}"),
            value: (megawatts * 100.0).round() / 100.0,
            quality: self.analog_quality.sample(rng),
            units: Some("MW".to_string()),
            change_counter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_status_point_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let sampler = MeasurementSampler::new().unwrap();

        for _ in 0..100 {
            let reading = sampler.status_point(&mut rng);
            assert!(reading.value == 0.0 || reading.value == 1.0);
            assert!(reading.point_id.starts_with("CB_"));
            assert!(reading.point_id.ends_with("_STATUS"));
            let counter = reading.change_counter.unwrap();
            assert!((1000..=9999).contains(&counter));
            assert!(reading.units.is_none());
        }
    }

    #[test]
    fn test_analog_value_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let sampler = MeasurementSampler::new().unwrap();

        for _ in 0..100 {
            let reading = sampler.analog_value(&mut rng);
            assert!((50.0..=500.0).contains(&reading.value));
            assert_eq!(reading.units.as_deref(), Some("MW"));
            assert!(reading.point_id.starts_with("MW_"));
            // two decimal places at most
            let scaled = reading.value * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_both_kinds_appear() {
        let mut rng = StdRng::seed_from_u64(3);
        let sampler = MeasurementSampler::new().unwrap();
        let kinds: Vec<_> = (0..200).map(|_| sampler.generate(&mut rng).kind).collect();

        assert!(kinds.contains(&MeasurementKind::StatusPoint));
        assert!(kinds.contains(&MeasurementKind::AnalogValue));
    }

    #[test]
    fn test_quality_is_mostly_good() {
        let mut rng = StdRng::seed_from_u64(11);
        let sampler = MeasurementSampler::new().unwrap();

        let good = (0..2_000)
            .filter(|_| sampler.analog_value(&mut rng).quality == Quality::Good)
            .count();
        assert!((1_800..2_000).contains(&good), "got {good}");
    }
}
