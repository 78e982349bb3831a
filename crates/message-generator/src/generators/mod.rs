//! Payload generators for the individual message kinds.
//!
//! Each submodule fills one part of a message: measurement readings,
//! protection event descriptors, and the link-level envelope metadata.

pub mod envelope;
pub mod measurement;
pub mod protection;

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;

/// Items sampled by integer weight.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    items: Vec<T>,
    index: WeightedIndex<u32>,
}

impl<T: Copy> WeightedTable<T> {
    /// Fails when the table is empty or every weight is zero.
    pub fn new(table: &[(T, u32)]) -> Result<Self, WeightedError> {
        let (items, weights): (Vec<T>, Vec<u32>) = table.iter().copied().unzip();
        Ok(Self {
            index: WeightedIndex::new(&weights)?,
            items,
        })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> T {
        self.items[self.index.sample(rng)]
    }
}

/// Pick one element uniformly from a non-empty slice.
pub fn pick<'a, R: Rng, T>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}
