//! Seeded synthetic station, demand and session generator.
//!
//! Used when no real datasets are configured. The city list and operator
//! names are injected through [`SyntheticCatalog`] so tests can shrink the
//! generated world.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::records::{DemandCategory, DemandPoint, StationRecord, UsageRecord};
use crate::geo::GeoPoint;

/// Charger power levels (kW) and their sampling weights.
const POWER_LEVELS_KW: [(f64, f64); 6] = [
    (7.2, 0.20),
    (11.0, 0.20),
    (22.0, 0.30),
    (50.0, 0.20),
    (60.0, 0.05),
    (150.0, 0.05),
];

/// Relative likelihood of a session starting in each hour of the day.
/// Morning (9-11) and evening (17-20) peaks over a quiet night.
const HOUR_WEIGHTS: [f64; 24] = [
    0.02, 0.02, 0.02, 0.02, 0.02, 0.02, // 0-5
    0.05, 0.05, 0.05, // 6-8
    0.10, 0.10, 0.10, // 9-11
    0.05, 0.05, 0.05, 0.05, 0.05, // 12-16
    0.10, 0.10, 0.10, 0.10, // 17-20
    0.03, 0.03, 0.03, // 21-23
];

/// Chargers at or above this rating count as fast chargers.
const FAST_CHARGER_KW: f64 = 50.0;
/// Average delivered fraction of rated power over a session.
const CHARGE_EFFICIENCY: f64 = 0.8;
const MIN_SESSION_MINUTES: f64 = 10.0;

/// A named city centre around which points are scattered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }
}

/// The world the synthetic generator draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticCatalog {
    pub cities: Vec<City>,
    pub operators: Vec<String>,
}

impl Default for SyntheticCatalog {
    fn default() -> Self {
        Self {
            cities: vec![
                City::new("New Delhi", 28.6139, 77.2090),
                City::new("Mumbai", 19.0760, 72.8777),
                City::new("Bangalore", 12.9716, 77.5946),
                City::new("Chennai", 13.0827, 80.2707),
                City::new("Hyderabad", 17.3850, 78.4867),
                City::new("Pune", 18.5204, 73.8567),
                City::new("Ahmedabad", 23.0225, 72.5714),
                City::new("Kolkata", 22.5726, 88.3639),
            ],
            operators: ["TATA Power", "Ather", "Statiq", "ChargePoint", "Zeon Charging"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Deterministic generator: the same seed and catalog always produce the
/// same records.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    catalog: SyntheticCatalog,
    seed: u64,
    days: u32,
}

impl SyntheticSource {
    /// Creates a generator.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Cities and operators to draw from
    /// * `seed` - Base seed; each table uses its own offset from it
    /// * `days` - Number of days of sessions to simulate per station
    pub fn new(catalog: SyntheticCatalog, seed: u64, days: u32) -> Self {
        Self {
            catalog,
            seed,
            days,
        }
    }

    pub fn catalog(&self) -> &SyntheticCatalog {
        &self.catalog
    }

    /// Generates 5 to 9 stations per city.
    pub fn stations(&self) -> Vec<StationRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut stations = Vec::new();

        for city in &self.catalog.cities {
            let n = rng.random_range(5..10);
            for _ in 0..n {
                let latitude = city.latitude + gaussian_noise(&mut rng, 0.05);
                let longitude = city.longitude + gaussian_noise(&mut rng, 0.05);
                let operator = pick(&mut rng, &self.catalog.operators)
                    .cloned()
                    .unwrap_or_else(|| String::from("Unknown"));

                let mut station = StationRecord::new(
                    format!("SYN_{:04}", stations.len() + 1),
                    GeoPoint::new(latitude.clamp(-90.0, 90.0), longitude.clamp(-180.0, 180.0)),
                    weighted_power(&mut rng),
                );
                station.operator = operator;
                station
                    .attributes
                    .insert(String::from("city"), city.name.clone());
                stations.push(station);
            }
        }
        stations
    }

    /// Generates residential and commercial demand hotspots around each city.
    ///
    /// Residential points scatter widely with scores 1 to 9; commercial
    /// points hug the centre with scores 5 to 9.
    pub fn demand_points(&self) -> Vec<DemandPoint> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        let mut points = Vec::new();

        for city in &self.catalog.cities {
            let n_res = rng.random_range(20..40);
            for _ in 0..n_res {
                points.push(self.hotspot(&mut rng, city, 0.08, 1..10, DemandCategory::Residential));
            }
            let n_com = rng.random_range(10..20);
            for _ in 0..n_com {
                points.push(self.hotspot(&mut rng, city, 0.03, 5..10, DemandCategory::Commercial));
            }
        }
        points
    }

    fn hotspot(
        &self,
        rng: &mut StdRng,
        city: &City,
        spread: f64,
        scores: std::ops::Range<u32>,
        category: DemandCategory,
    ) -> DemandPoint {
        let latitude = city.latitude + gaussian_noise(rng, spread);
        let longitude = city.longitude + gaussian_noise(rng, spread);
        DemandPoint {
            location: GeoPoint::new(latitude.clamp(-90.0, 90.0), longitude.clamp(-180.0, 180.0)),
            demand_score: rng.random_range(scores),
            category,
        }
    }

    /// Simulates charging sessions for `stations` over the configured days.
    ///
    /// Daily session counts follow a Poisson rate that grows over the period
    /// and oscillates weekly. Start hours follow [`HOUR_WEIGHTS`]. Energy is
    /// rated power times efficiency times a Gaussian session duration.
    pub fn usage_records(&self, stations: &[StationRecord]) -> Vec<UsageRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(2));
        let mut records = Vec::new();
        let days = f64::from(self.days.max(1));

        for station in stations {
            let fast = station.power_kw >= FAST_CHARGER_KW;
            let base = poisson(&mut rng, if station.power_kw > 40.0 { 3.0 } else { 1.5 }) as f64;

            for day in 0..self.days {
                let day = f64::from(day);
                let growth = 0.8 + 0.4 * day / days;
                let seasonality = 1.0 + 0.2 * (day / 7.0).sin();
                let sessions = poisson(&mut rng, base * growth * seasonality);

                for _ in 0..sessions {
                    let hour = weighted_hour(&mut rng);
                    let minutes = if fast {
                        40.0 + gaussian_noise(&mut rng, 10.0)
                    } else {
                        120.0 + gaussian_noise(&mut rng, 30.0)
                    }
                    .max(MIN_SESSION_MINUTES);
                    let energy = station.power_kw * CHARGE_EFFICIENCY * minutes / 60.0;
                    records.push(UsageRecord {
                        hour_of_day: hour as i64,
                        load: (energy * 100.0).round() / 100.0,
                    });
                }
            }
        }
        records
    }
}

/// Zero-mean Gaussian sample via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Poisson sample by Knuth's multiplication method. Fine for the small rates
/// used here.
pub fn poisson(rng: &mut StdRng, lambda: f64) -> u32 {
    if lambda.is_nan() || lambda <= 0.0 {
        return 0;
    }
    let limit = (-lambda).exp();
    let mut k = 0;
    let mut p = 1.0;
    loop {
        p *= rng.random::<f64>();
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.random_range(0..items.len()))
    }
}

fn weighted_power(rng: &mut StdRng) -> f64 {
    let mut draw = rng.random::<f64>();
    for (kw, weight) in POWER_LEVELS_KW {
        if draw < weight {
            return kw;
        }
        draw -= weight;
    }
    POWER_LEVELS_KW[POWER_LEVELS_KW.len() - 1].0
}

fn weighted_hour(rng: &mut StdRng) -> usize {
    let total: f64 = HOUR_WEIGHTS.iter().sum();
    let mut draw = rng.random::<f64>() * total;
    for (hour, weight) in HOUR_WEIGHTS.iter().enumerate() {
        if draw < *weight {
            return hour;
        }
        draw -= weight;
    }
    HOUR_WEIGHTS.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_source(seed: u64) -> SyntheticSource {
        let catalog = SyntheticCatalog {
            cities: vec![City::new("Pune", 18.5204, 73.8567)],
            operators: vec![String::from("Statiq")],
        };
        SyntheticSource::new(catalog, seed, 7)
    }

    #[test]
    fn same_seed_same_world() {
        let a = small_source(9);
        let b = small_source(9);
        assert_eq!(a.stations(), b.stations());
        assert_eq!(a.demand_points(), b.demand_points());
        let stations = a.stations();
        assert_eq!(a.usage_records(&stations), b.usage_records(&stations));
    }

    #[test]
    fn station_counts_and_power_levels_in_range() {
        let stations = small_source(1).stations();
        assert!((5..10).contains(&stations.len()));
        for s in &stations {
            assert!(POWER_LEVELS_KW.iter().any(|(kw, _)| *kw == s.power_kw));
            assert_eq!(s.operator, "Statiq");
            assert!(s.location.validate(0).is_ok());
        }
        assert_eq!(stations[0].station_id, "SYN_0001");
    }

    #[test]
    fn demand_scores_follow_category() {
        let points = small_source(2).demand_points();
        assert!((30..58).contains(&points.len()));
        for p in &points {
            match p.category {
                DemandCategory::Residential => assert!((1..10).contains(&p.demand_score)),
                DemandCategory::Commercial => assert!((5..10).contains(&p.demand_score)),
                other => panic!("unexpected category {other}"),
            }
        }
    }

    #[test]
    fn sessions_have_valid_hours_and_positive_energy() {
        let source = small_source(3);
        let stations = source.stations();
        let usage = source.usage_records(&stations);
        assert!(!usage.is_empty());
        assert!(usage.iter().all(|u| (0..24).contains(&u.hour_of_day)));
        assert!(usage.iter().all(|u| u.load > 0.0));
    }

    #[test]
    fn poisson_mean_is_close_to_lambda() {
        let mut rng = StdRng::seed_from_u64(5);
        let n = 20_000;
        let total: u32 = (0..n).map(|_| poisson(&mut rng, 3.0)).sum();
        let mean = f64::from(total) / f64::from(n);
        assert!((mean - 3.0).abs() < 0.1, "mean was {mean}");
    }

    #[test]
    fn zero_std_noise_is_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
    }
}
