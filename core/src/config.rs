use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DashError, DashResult};

// ── Risk scoring ──────────────────────────────────────────────────

/// Weights of the four sub-scores in the integrated site score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubScoreWeights {
    pub land_change: f64,
    pub financial: f64,
    pub official: f64,
    pub transaction: f64,
}

impl Default for SubScoreWeights {
    fn default() -> Self {
        Self {
            land_change: 0.25,
            financial: 0.25,
            official: 0.25,
            transaction: 0.25,
        }
    }
}

impl SubScoreWeights {
    pub fn total(&self) -> f64 {
        self.land_change + self.financial + self.official + self.transaction
    }
}

/// Upper bounds (inclusive) of the low and medium buckets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    pub low_max: f64,
    pub medium_max: f64,
    pub weights: SubScoreWeights,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            low_max: 0.3,
            medium_max: 0.6,
            weights: SubScoreWeights::default(),
        }
    }
}

// ── Transactions ──────────────────────────────────────────────────

/// Blend of the three pattern strengths into the composite score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternWeights {
    pub structuring: f64,
    pub velocity: f64,
    pub layering: f64,
}

impl Default for PatternWeights {
    fn default() -> Self {
        Self {
            structuring: 0.40,
            velocity: 0.35,
            layering: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransactionConfig {
    pub pattern_weights: PatternWeights,
    /// Composite scores strictly above this are always suspicious.
    pub suspicious_threshold: f64,
    /// Independent chance of a suspicious flag regardless of score.
    pub random_flag_rate: f64,
    /// Chance that a given person transacts in a given week.
    pub weekly_probability: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_pareto_xmin: f64,
    pub amount_pareto_alpha: f64,
    /// Basic dashboard: amounts above this are flagged.
    pub basic_flag_amount: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            pattern_weights: PatternWeights::default(),
            suspicious_threshold: 0.6,
            random_flag_rate: 0.03,
            weekly_probability: 0.2,
            start_date: ymd(2022, 1, 1),
            end_date: ymd(2023, 12, 31),
            amount_pareto_xmin: 5_000.0,
            amount_pareto_alpha: 1.3,
            basic_flag_amount: 300_000,
        }
    }
}

/// Calendar date from literal parts.
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

// ── Population sizes ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    pub sites: usize,
    pub officials: usize,
    pub connections: usize,
    pub first_year: i32,
    pub last_year: i32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            sites: 10,
            officials: 16,
            connections: 32,
            first_year: 2019,
            last_year: 2023,
        }
    }
}

// ── Models ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 4,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IsolationConfig {
    pub n_trees: usize,
    pub sample_size: usize,
    /// Scores above this are reported as anomalies.
    pub threshold: f64,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            sample_size: 8,
            threshold: 0.6,
        }
    }
}

// ── Environment ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Tons of CO2 released per hectare of cleared forest.
    pub co2_tons_per_ha: f64,
    pub biodiversity_per_ha: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            co2_tons_per_ha: 300.0,
            biodiversity_per_ha: 0.05,
        }
    }
}

// ── Access ────────────────────────────────────────────────────────

/// The single account allowed into the regulator dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    /// Lowercase hex SHA-256 of the password.
    pub password_sha256: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "regulator".into(),
            password_sha256: "fd984df6a3941b26353c3fc8d84a78e7b913135a4eec08579dad6396c050187e"
                .into(),
        }
    }
}

// ── Top level ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub seed: u64,
    pub risk: RiskConfig,
    pub transactions: TransactionConfig,
    pub population: PopulationConfig,
    pub forest: ForestConfig,
    pub isolation: IsolationConfig,
    pub environment: EnvironmentConfig,
    pub auth: AuthConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            risk: RiskConfig::default(),
            transactions: TransactionConfig::default(),
            population: PopulationConfig::default(),
            forest: ForestConfig::default(),
            isolation: IsolationConfig::default(),
            environment: EnvironmentConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Smaller, fast config for tests.
    pub fn default_test() -> Self {
        Self {
            forest: ForestConfig {
                n_trees: 15,
                ..ForestConfig::default()
            },
            isolation: IsolationConfig {
                n_trees: 30,
                ..IsolationConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> DashResult<()> {
        let r = &self.risk;
        if !(0.0 < r.low_max && r.low_max < r.medium_max && r.medium_max < 1.0) {
            return Err(DashError::Config(format!(
                "risk thresholds must satisfy 0 < low_max < medium_max < 1, got {} / {}",
                r.low_max, r.medium_max
            )));
        }
        if (r.weights.total() - 1.0).abs() > 1e-9 {
            return Err(DashError::Config(format!(
                "sub-score weights must sum to 1, got {}",
                r.weights.total()
            )));
        }
        let p = &self.transactions.pattern_weights;
        if (p.structuring + p.velocity + p.layering - 1.0).abs() > 1e-9 {
            return Err(DashError::Config("pattern weights must sum to 1".into()));
        }
        if self.transactions.start_date > self.transactions.end_date {
            return Err(DashError::Config("transaction date range is inverted".into()));
        }
        if self.population.first_year >= self.population.last_year {
            return Err(DashError::Config("need at least two observed years".into()));
        }
        if self.population.sites == 0 || self.population.officials == 0 {
            return Err(DashError::Config("population sizes must be positive".into()));
        }
        if self.forest.n_trees == 0 || self.isolation.n_trees == 0 {
            return Err(DashError::Config("forests need at least one tree".into()));
        }
        Ok(())
    }
}
