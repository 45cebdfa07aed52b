use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub base_health: f64,
}

/// One synthetic observation. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub measurement_date: NaiveDate,
    #[serde(serialize_with = "two_decimals")]
    pub health_metric: f64,
    #[serde(serialize_with = "two_decimals")]
    pub genetic_diversity: f64,
    #[serde(serialize_with = "two_decimals")]
    pub air_quality_index: f64,
    #[serde(serialize_with = "two_decimals")]
    pub water_quality_index: f64,
    #[serde(serialize_with = "two_decimals")]
    pub green_space_percent: f64,
    #[serde(serialize_with = "two_decimals")]
    pub heart_disease_rate: f64,
    #[serde(serialize_with = "two_decimals")]
    pub diabetes_rate: f64,
    #[serde(serialize_with = "two_decimals")]
    pub respiratory_disease_rate: f64,
    #[serde(serialize_with = "two_decimals")]
    pub population_density: f64,
    #[serde(serialize_with = "two_decimals")]
    pub healthcare_access_score: f64,
}

pub const COLUMNS: [&str; 14] = [
    "region",
    "latitude",
    "longitude",
    "measurement_date",
    "health_metric",
    "genetic_diversity",
    "air_quality_index",
    "water_quality_index",
    "green_space_percent",
    "heart_disease_rate",
    "diabetes_rate",
    "respiratory_disease_rate",
    "population_density",
    "healthcare_access_score",
];

pub const NUMERIC_COLUMNS: [&str; 12] = [
    "latitude",
    "longitude",
    "health_metric",
    "genetic_diversity",
    "air_quality_index",
    "water_quality_index",
    "green_space_percent",
    "heart_disease_rate",
    "diabetes_rate",
    "respiratory_disease_rate",
    "population_density",
    "healthcare_access_score",
];

impl SampleRow {
    /// Values in `NUMERIC_COLUMNS` order.
    pub fn numeric_values(&self) -> [f64; 12] {
        [
            self.latitude,
            self.longitude,
            self.health_metric,
            self.genetic_diversity,
            self.air_quality_index,
            self.water_quality_index,
            self.green_space_percent,
            self.heart_disease_rate,
            self.diabetes_rate,
            self.respiratory_disease_rate,
            self.population_density,
            self.healthcare_access_score,
        ]
    }
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // `+ 0.0` keeps values that round to zero from printing as `-0.00`
    let rounded = (value * 100.0).round() / 100.0 + 0.0;
    serializer.serialize_str(&format!("{:.2}", rounded))
}

/// Client-observed availability of the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceStatus {
    #[default]
    Checking,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ActiveTab {
    #[default]
    Map,
    Analysis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub value: u8, // percent
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub metrics: Vec<Metric>,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    /// Fixed summary shown after a successful upload. The remote API does not
    /// return analysis data, so nothing here is derived from the response.
    pub fn placeholder() -> Self {
        let metric = |name: &str, value| Metric { name: name.to_string(), value };
        Self {
            metrics: vec![
                metric("Health Score", 85),
                metric("Risk Level", 25),
                metric("Coverage", 92),
            ],
            findings: vec![
                "Population health metrics show positive trends".to_string(),
                "Healthcare access has improved by 15%".to_string(),
                "Preventive care adoption increased".to_string(),
            ],
            recommendations: vec![
                "Focus on expanding rural healthcare access".to_string(),
                "Implement targeted health education programs".to_string(),
                "Enhance preventive care services".to_string(),
            ],
        }
    }
}
