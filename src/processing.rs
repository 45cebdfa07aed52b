use crate::config::GeneratorConfig;
use crate::data::REGIONS;
use crate::types::{Region, SampleRow};
use anyhow::{Context, Result, anyhow};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum Bound {
    Percent,
    NonNegative,
    Unbounded,
}

impl Bound {
    fn apply(self, value: f64) -> f64 {
        match self {
            Bound::Percent => value.clamp(0.0, 100.0),
            Bound::NonNegative => value.max(0.0),
            Bound::Unbounded => value,
        }
    }
}

struct MetricDist {
    dist: Normal<f64>,
    bound: Bound,
}

impl MetricDist {
    fn new(name: &str, mean: f64, std_dev: f64, bound: Bound) -> Result<Self> {
        let dist = Normal::new(mean, std_dev)
            .with_context(|| format!("Invalid distribution for {}", name))?;
        Ok(Self { dist, bound })
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        round2(self.bound.apply(self.dist.sample(rng)))
    }
}

/// Distributions shared by every region; health is centred on the region baseline.
struct Sampler {
    jitter: Normal<f64>,
    genetic_diversity: MetricDist,
    air_quality: MetricDist,
    water_quality: MetricDist,
    green_space: MetricDist,
    heart_disease: MetricDist,
    diabetes: MetricDist,
    respiratory: MetricDist,
    population_density: MetricDist,
    healthcare_access: MetricDist,
}

impl Sampler {
    fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            jitter: Normal::new(0.0, config.coordinate_jitter)
                .context("Invalid coordinate jitter")?,
            genetic_diversity: MetricDist::new("genetic_diversity", 70.0, 10.0, Bound::Percent)?,
            air_quality: MetricDist::new("air_quality_index", 75.0, 15.0, Bound::Percent)?,
            water_quality: MetricDist::new("water_quality_index", 80.0, 10.0, Bound::Percent)?,
            green_space: MetricDist::new("green_space_percent", 65.0, 20.0, Bound::Percent)?,
            heart_disease: MetricDist::new("heart_disease_rate", 200.0, 50.0, Bound::NonNegative)?,
            diabetes: MetricDist::new("diabetes_rate", 90.0, 20.0, Bound::NonNegative)?,
            respiratory: MetricDist::new("respiratory_disease_rate", 150.0, 40.0, Bound::NonNegative)?,
            population_density: MetricDist::new("population_density", 5000.0, 2000.0, Bound::Unbounded)?,
            healthcare_access: MetricDist::new("healthcare_access_score", 75.0, 15.0, Bound::Unbounded)?,
        })
    }
}

/// Generates the full dataset, sorted by region then measurement date.
///
/// Each region draws from its own RNG stream seeded from `config.seed` and the
/// region's table position, so the output only depends on the seed and `today`.
pub fn generate_samples(config: &GeneratorConfig, today: NaiveDate) -> Result<Vec<SampleRow>> {
    let sampler = Sampler::new(config)?;

    let per_region: Vec<Vec<SampleRow>> = REGIONS
        .par_iter()
        .enumerate()
        .map(|(index, region)| {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(index as u64));
            generate_region(config, &sampler, region, today, &mut rng)
        })
        .collect::<Result<_>>()?;

    let mut rows: Vec<SampleRow> = per_region.into_iter().flatten().collect();
    sort_rows(&mut rows);

    Ok(rows)
}

fn generate_region<R: Rng>(
    config: &GeneratorConfig,
    sampler: &Sampler,
    region: &Region,
    today: NaiveDate,
    rng: &mut R,
) -> Result<Vec<SampleRow>> {
    let count = rng.gen_range(config.min_rows..config.max_rows);
    debug!("Generating {} rows for {}", count, region.name);

    let health = MetricDist::new("health_metric", region.base_health, 5.0, Bound::Percent)?;
    let mut rows = Vec::with_capacity(count);

    for _ in 0..count {
        let lat_variation = sampler.jitter.sample(rng);
        let lon_variation = sampler.jitter.sample(rng);

        let health_metric = health.sample(rng);
        let genetic_diversity = sampler.genetic_diversity.sample(rng);
        let air_quality_index = sampler.air_quality.sample(rng);
        let water_quality_index = sampler.water_quality.sample(rng);
        let green_space_percent = sampler.green_space.sample(rng);
        let heart_disease_rate = sampler.heart_disease.sample(rng);
        let diabetes_rate = sampler.diabetes.sample(rng);
        let respiratory_disease_rate = sampler.respiratory.sample(rng);

        let days_back = rng.gen_range(0..config.lookback_days) as u64;
        let measurement_date = today
            .checked_sub_days(Days::new(days_back))
            .ok_or_else(|| anyhow!("Date {} minus {} days is out of range", today, days_back))?;

        rows.push(SampleRow {
            region: region.name.to_string(),
            latitude: region.lat + lat_variation,
            longitude: region.lon + lon_variation,
            measurement_date,
            health_metric,
            genetic_diversity,
            air_quality_index,
            water_quality_index,
            green_space_percent,
            heart_disease_rate,
            diabetes_rate,
            respiratory_disease_rate,
            population_density: sampler.population_density.sample(rng),
            healthcare_access_score: sampler.healthcare_access.sample(rng),
        });
    }

    Ok(rows)
}

/// Stable sort by region name, then by measurement date.
pub fn sort_rows(rows: &mut [SampleRow]) {
    rows.sort_by(|a, b| {
        a.region
            .cmp(&b.region)
            .then_with(|| a.measurement_date.cmp(&b.measurement_date))
    });
}

/// Rounds to two places. Adding `0.0` turns `-0.0` into `0.0` so tiny
/// negative draws are not written as `-0.00`.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}
