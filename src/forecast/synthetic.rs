use chrono::{Datelike, NaiveDate, Weekday};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{DemandForecaster, ForecastError};
use crate::allocation::{DemandEntry, EntityId};

/// Day of year at which seasonal demand peaks (mid-January heating load).
const PEAK_DAY_OF_YEAR: f64 = 15.0;

/// Demand multiplier applied on Saturdays and Sundays.
const WEEKEND_UPLIFT: f64 = 1.1;

/// Seed offset for per-date noise, keeping it uncorrelated with the
/// per-household scale draws.
const NOISE_SEED_OFFSET: u64 = 57;

/// Seeded synthetic neighbourhood of households.
///
/// Each household has a fixed size factor drawn once from the seed. Daily
/// demand follows a yearly cosine around `base_kwh` with amplitude
/// `seasonal_amp_kwh`, a weekend uplift, and Gaussian noise. The same seed
/// and date always produce the same forecast.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use energy_allocator::forecast::{DemandForecaster, SyntheticForecast};
///
/// let forecaster = SyntheticForecast::new(3, 10.0, 3.0, 0.5, 42);
/// let date = NaiveDate::from_ymd_opt(2013, 6, 15).unwrap();
/// let demands = forecaster.forecast(date).unwrap();
/// assert_eq!(demands.len(), 3);
/// assert_eq!(demands[0].entity_id.as_str(), "H0001");
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticForecast {
    /// Number of households.
    pub households: usize,
    /// Mean daily demand of an average household (kWh).
    pub base_kwh: f64,
    /// Seasonal swing around the mean (kWh).
    pub seasonal_amp_kwh: f64,
    /// Standard deviation of day-to-day noise (kWh).
    pub noise_std_kwh: f64,
    /// Master random seed.
    pub seed: u64,
    scales: Vec<f64>,
}

impl SyntheticForecast {
    pub fn new(
        households: usize,
        base_kwh: f64,
        seasonal_amp_kwh: f64,
        noise_std_kwh: f64,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let scales = (0..households)
            .map(|_| rng.random_range(0.6..1.4))
            .collect();
        Self {
            households,
            base_kwh: base_kwh.max(0.0),
            seasonal_amp_kwh,
            noise_std_kwh: noise_std_kwh.max(0.0),
            seed,
            scales,
        }
    }

    /// Expected demand of an average household on `date`, before noise.
    pub fn profile_kwh(&self, date: NaiveDate) -> f64 {
        let angle = 2.0 * std::f64::consts::PI * (f64::from(date.ordinal()) - PEAK_DAY_OF_YEAR)
            / 365.25;
        let seasonal = self.base_kwh + self.seasonal_amp_kwh * angle.cos();
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => seasonal * WEEKEND_UPLIFT,
            _ => seasonal,
        }
    }

    fn date_seed(&self, date: NaiveDate) -> u64 {
        self.seed
            .wrapping_add(NOISE_SEED_OFFSET)
            .wrapping_mul(1_000_003)
            .wrapping_add(date.num_days_from_ce() as u64)
    }
}

impl DemandForecaster for SyntheticForecast {
    fn forecast(&self, date: NaiveDate) -> Result<Vec<DemandEntry>, ForecastError> {
        let profile = self.profile_kwh(date);
        let mut rng = StdRng::seed_from_u64(self.date_seed(date));
        Ok(self
            .scales
            .iter()
            .enumerate()
            .map(|(i, scale)| {
                let noise = gaussian_noise(&mut rng, self.noise_std_kwh);
                let kwh = (scale * profile + noise).max(0.0);
                DemandEntry::new(EntityId::new(format!("H{:04}", i + 1)), kwh)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
