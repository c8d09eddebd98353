use std::{fmt::Debug, ops::RangeInclusive};

use async_trait::async_trait;
use rand::Rng;

use crate::{
    error::Result,
    model::{Comic, ImagePayload},
};

pub mod softerworld;

pub use softerworld::SofterWorldSource;

/// A published comic archive addressable by number.
#[async_trait]
pub trait ComicSource: Send + Sync + Debug {
    /// The inclusive range of numbers that have been published.
    fn range(&self) -> RangeInclusive<u32>;

    /// Resolves `number` to its metadata. Numbers outside [`Self::range`]
    /// fail with `NotFound` without touching the network.
    async fn fetch_comic(&self, number: u32) -> Result<Comic>;

    /// Downloads the image referenced by `comic`.
    async fn fetch_image(&self, comic: &Comic) -> Result<ImagePayload>;
}

/// Picks a comic number uniformly over `range`.
pub fn pick_number<R: Rng + ?Sized>(range: &RangeInclusive<u32>, rng: &mut R) -> u32 {
    rng.gen_range(range.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn pick_number_covers_full_range() {
        let range = 1..=10;
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 10];

        for _ in 0..1_000 {
            let n = pick_number(&range, &mut rng);
            assert!(range.contains(&n));
            seen[(n - 1) as usize] = true;
        }

        assert!(seen.iter().all(|s| *s), "every number should be drawn: {seen:?}");
    }

    #[test]
    fn pick_number_is_deterministic_for_a_seed() {
        let range = 1..=1242;
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..5).map(|_| pick_number(&range, &mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(draw(42), draw(42));
    }

    #[test]
    fn pick_number_single_value_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_number(&(5..=5), &mut rng), 5);
    }
}
