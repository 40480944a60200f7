//! Category-stratified sentence sampling
//!
//! Each request builds a fresh pool: for every category in the distribution,
//! `max(1, floor(percent / 100 * dataset_len))` rows are drawn without
//! replacement from that category's stratum. Pools from all categories are
//! concatenated (a multi-labeled row may appear once per stratum), shuffled,
//! and the response rows are drawn from the result.
//!
//! All randomness flows through an injected [`Rng`] so a seeded generator
//! reproduces the same sequence.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tacit_common::config::SamplingMode;
use tacit_common::CategoryDistribution;
use thiserror::Error;

use crate::dataset::{Dataset, Row};

/// Sampling failures reported to callers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    /// Every stratum was empty (or the dataset itself is empty)
    #[error("No data available")]
    NoDataAvailable,
}

/// Rows contributed by one category to a single pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratumDraw {
    pub category: String,
    pub stratum_size: usize,
    pub target_size: usize,
    pub drawn: usize,
}

/// Stateless sampler over an immutable dataset
#[derive(Debug, Clone)]
pub struct Sampler {
    mode: SamplingMode,
    distribution: CategoryDistribution,
}

impl Sampler {
    pub fn new(mode: SamplingMode, distribution: CategoryDistribution) -> Self {
        Self { mode, distribution }
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn distribution(&self) -> &CategoryDistribution {
        &self.distribution
    }

    /// Build one shuffled pool, reporting what each category contributed
    pub fn build_pool<'d, R>(
        &self,
        dataset: &'d Dataset,
        rng: &mut R,
    ) -> (Vec<&'d Row>, Vec<StratumDraw>)
    where
        R: Rng + ?Sized,
    {
        if self.mode == SamplingMode::Uniform {
            return (dataset.iter().collect(), Vec::new());
        }

        let total = dataset.len();
        let mut pool: Vec<&'d Row> = Vec::new();
        let mut draws = Vec::with_capacity(self.distribution.len());

        for target in self.distribution.iter() {
            let stratum: Vec<&'d Row> =
                dataset.iter().filter(|row| row.matches(target)).collect();
            let target_size = target.target_size(total);
            let take = target_size.min(stratum.len());

            pool.extend(stratum.choose_multiple(rng, take).copied());
            draws.push(StratumDraw {
                category: target.name.clone(),
                stratum_size: stratum.len(),
                target_size,
                drawn: take,
            });
        }

        pool.shuffle(rng);
        (pool, draws)
    }

    /// Draw up to `count` distinct pool entries
    ///
    /// Returns the whole pool when `count` exceeds it.
    pub fn sample<'d, R>(
        &self,
        dataset: &'d Dataset,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<&'d Row>, SampleError>
    where
        R: Rng + ?Sized,
    {
        let (pool, _) = self.build_pool(dataset, rng);
        if pool.is_empty() {
            return Err(SampleError::NoDataAvailable);
        }
        Ok(pool.choose_multiple(rng, count).copied().collect())
    }

    pub fn sample_one<'d, R>(
        &self,
        dataset: &'d Dataset,
        rng: &mut R,
    ) -> Result<&'d Row, SampleError>
    where
        R: Rng + ?Sized,
    {
        self.sample(dataset, 1, rng)?
            .into_iter()
            .next()
            .ok_or(SampleError::NoDataAvailable)
    }
}

/// Where request handlers get their randomness
///
/// `Entropy` seeds a fresh generator per request. `Seeded` shares one
/// generator so a whole session replays deterministically.
#[derive(Clone)]
pub enum RngSource {
    Entropy,
    Seeded(Arc<Mutex<StdRng>>),
}

impl RngSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => RngSource::Seeded(Arc::new(Mutex::new(StdRng::seed_from_u64(seed)))),
            None => RngSource::Entropy,
        }
    }

    /// Run `f` with a generator from this source
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        match self {
            RngSource::Entropy => f(&mut StdRng::from_entropy()),
            RngSource::Seeded(rng) => {
                let mut guard = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                f(&mut *guard)
            }
        }
    }
}

impl std::fmt::Debug for RngSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RngSource::Entropy => f.write_str("Entropy"),
            RngSource::Seeded(_) => f.write_str("Seeded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacit_common::SENTINEL_CATEGORY;

    fn row(sentence: &str, labels: &[&str]) -> Row {
        Row::new(
            sentence,
            labels.iter().map(|l| l.to_string()).collect(),
            None,
        )
    }

    fn family_dataset() -> Dataset {
        Dataset::from_rows(vec![
            row("I will make my family proud", &["Familial"]),
            row("No label example", &[]),
        ])
    }

    fn fifty_fifty() -> CategoryDistribution {
        CategoryDistribution::new([(SENTINEL_CATEGORY, 50.0), ("Familial", 50.0)]).unwrap()
    }

    #[test]
    fn test_pool_contains_both_row_types() {
        let dataset = family_dataset();
        let sampler = Sampler::new(SamplingMode::Stratified, fifty_fifty());
        let mut rng = StdRng::seed_from_u64(1);

        let (pool, _) = sampler.build_pool(&dataset, &mut rng);

        assert_eq!(pool.len(), 2);
        assert!(pool.iter().any(|r| r.sentence == "I will make my family proud"));
        assert!(pool.iter().any(|r| r.sentence == "No label example"));
    }

    #[test]
    fn test_rare_category_is_floor_guaranteed() {
        let mut rows: Vec<Row> = (0..20)
            .map(|i| row(&format!("social {i}"), &["Social"]))
            .collect();
        rows.push(row("we resisted", &["Resistance"]));
        let dataset = Dataset::from_rows(rows);
        let distribution =
            CategoryDistribution::new([("Social", 90.0), ("Resistance", 3.0)]).unwrap();
        let sampler = Sampler::new(SamplingMode::Stratified, distribution);
        let mut rng = StdRng::seed_from_u64(7);

        let (pool, draws) = sampler.build_pool(&dataset, &mut rng);

        // 3% of 21 rows is 0.63, still guaranteed one row
        assert_eq!(draws[1].target_size, 1);
        assert_eq!(draws[1].drawn, 1);
        assert!(pool.iter().any(|r| r.has_label("Resistance")));
        // 90% of 21 rows is 18.9
        assert_eq!(draws[0].drawn, 18);
        assert_eq!(pool.len(), 19);
    }

    #[test]
    fn test_multi_labeled_rows_are_not_deduplicated() {
        let dataset = Dataset::from_rows(vec![row("both", &["Familial", "Spiritual"])]);
        let distribution =
            CategoryDistribution::new([("Familial", 10.0), ("Spiritual", 10.0)]).unwrap();
        let sampler = Sampler::new(SamplingMode::Stratified, distribution);
        let mut rng = StdRng::seed_from_u64(3);

        let (pool, _) = sampler.build_pool(&dataset, &mut rng);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_empty_stratum_contributes_nothing() {
        let dataset = family_dataset();
        let distribution =
            CategoryDistribution::new([("Familial", 50.0), ("Navigational", 50.0)]).unwrap();
        let sampler = Sampler::new(SamplingMode::Stratified, distribution);
        let mut rng = StdRng::seed_from_u64(5);

        let (pool, draws) = sampler.build_pool(&dataset, &mut rng);
        assert_eq!(pool.len(), 1);
        assert_eq!(draws[1].stratum_size, 0);
        assert_eq!(draws[1].drawn, 0);
    }

    #[test]
    fn test_empty_dataset_reports_no_data() {
        let dataset = Dataset::default();
        let sampler = Sampler::new(SamplingMode::Stratified, CategoryDistribution::cct_default());
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            sampler.sample_one(&dataset, &mut rng),
            Err(SampleError::NoDataAvailable)
        );

        let uniform = Sampler::new(SamplingMode::Uniform, CategoryDistribution::cct_default());
        assert_eq!(
            uniform.sample_one(&dataset, &mut rng),
            Err(SampleError::NoDataAvailable)
        );
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let rows: Vec<Row> = (0..50)
            .map(|i| {
                if i % 3 == 0 {
                    row(&format!("sentence {i}"), &[])
                } else {
                    row(&format!("sentence {i}"), &["Social"])
                }
            })
            .collect();
        let dataset = Dataset::from_rows(rows);
        let sampler = Sampler::new(SamplingMode::Stratified, CategoryDistribution::cct_default());

        let run = |seed: u64| -> Vec<String> {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| sampler.sample_one(&dataset, &mut rng).unwrap().sentence.clone())
                .collect()
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_returned_rows_are_well_formed() {
        let dataset = family_dataset();
        let sampler = Sampler::new(SamplingMode::Stratified, fifty_fifty());
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let row = sampler.sample_one(&dataset, &mut rng).unwrap();
            assert!(!row.sentence.is_empty());
        }
    }

    #[test]
    fn test_sample_count_is_capped_by_pool() {
        let dataset = family_dataset();
        let sampler = Sampler::new(SamplingMode::Stratified, fifty_fifty());
        let mut rng = StdRng::seed_from_u64(9);

        let rows = sampler.sample(&dataset, 10, &mut rng).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_uniform_mode_ignores_distribution() {
        let dataset = Dataset::from_rows(vec![row("unlisted label", &["Linguistic"])]);
        let sampler = Sampler::new(SamplingMode::Uniform, fifty_fifty());
        let mut rng = StdRng::seed_from_u64(2);

        let row = sampler.sample_one(&dataset, &mut rng).unwrap();
        assert_eq!(row.sentence, "unlisted label");
    }

    #[test]
    fn test_seeded_source_replays_sequence() {
        let draw = |source: &RngSource| -> Vec<u32> {
            (0..5).map(|_| source.with_rng(|rng| rng.gen::<u32>())).collect()
        };

        let first = draw(&RngSource::from_seed(Some(99)));
        let second = draw(&RngSource::from_seed(Some(99)));
        assert_eq!(first, second);
    }
}
