//! SEO metrics stub.
//!
//! Produces plausible-looking numbers; no real analysis happens here.

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoMetrics {
    /// Percent, 1 to 6.
    pub keyword_density: u8,
    /// 50 to 100.
    pub readability: u8,
    /// Meta description length in chars, 150 to 199.
    pub meta_length: u16,
    pub backlinks: u16,
    /// 0 to 99.
    pub score: u8,
}

impl SeoMetrics {
    pub fn generate(rng: &dyn RandomSource) -> Self {
        Self {
            keyword_density: (rng.unit() * 5.0 + 1.0).round() as u8,
            readability: (rng.unit() * 50.0 + 50.0).round() as u8,
            meta_length: 150 + rng.below(50) as u16,
            backlinks: rng.below(20) as u16,
            score: rng.below(100) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedRandom, ThreadRandom};

    #[test]
    fn values_stay_in_documented_ranges() {
        for _ in 0..200 {
            let m = SeoMetrics::generate(&ThreadRandom);
            assert!((1..=6).contains(&m.keyword_density));
            assert!((50..=100).contains(&m.readability));
            assert!((150..200).contains(&m.meta_length));
            assert!(m.backlinks < 20);
            assert!(m.score < 100);
        }
    }

    #[test]
    fn injected_source_pins_values() {
        let rng = FixedRandom {
            fraction: 0.5,
            index: 10,
        };
        let m = SeoMetrics::generate(&rng);
        assert_eq!(m.keyword_density, 4);
        assert_eq!(m.readability, 75);
        assert_eq!(m.meta_length, 160);
        assert_eq!(m.backlinks, 10);
        assert_eq!(m.score, 10);
    }
}
