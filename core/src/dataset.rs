//! Row types for every generated table.
//!
//! Tables are plain `Vec`s of flat records. They are produced once by a
//! `DataSource`, loaded into the `DashStore`, and never mutated after.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{
    ConnectionCategory, EntityId, LicenseType, NodeKind, TransactionFlag, TransactionType,
};

// ── Basic dashboard ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mine {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Hectares.
    pub area_2020: f64,
    pub area_2023: f64,
    pub company: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MineFinancials {
    pub mine: String,
    /// USD per hectare.
    pub revenue_per_ha: f64,
    pub cost_per_ha: f64,
    pub tax_paid_2022: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stakeholder {
    pub name: String,
    pub role: String,
    pub company: String,
    /// A mine name or "Multiple".
    pub connected_mine: String,
    pub suspicious_transactions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StakeholderTransaction {
    pub date: NaiveDate,
    pub person: String,
    pub amount: u64,
    pub txn_type: TransactionType,
    pub flag: TransactionFlag,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BasicDataset {
    pub mines: Vec<Mine>,
    pub financials: Vec<MineFinancials>,
    pub stakeholders: Vec<Stakeholder>,
    pub transactions: Vec<StakeholderTransaction>,
}

// ── Regulator dashboard ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AreaObservation {
    pub year: i32,
    pub area_ha: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub id: EntityId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub district: String,
    pub operator: String,
    pub license_type: LicenseType,
    pub commodity: String,
    /// Sorted by year, at least two observations.
    pub areas: Vec<AreaObservation>,
    /// Generator-supplied land-change anomaly in [0, 1].
    pub land_anomaly: f64,
}

impl Site {
    pub fn earliest(&self) -> Option<AreaObservation> {
        self.areas.first().copied()
    }

    pub fn latest(&self) -> Option<AreaObservation> {
        self.areas.last().copied()
    }

    pub fn area_in(&self, year: i32) -> Option<f64> {
        self.areas.iter().find(|a| a.year == year).map(|a| a.area_ha)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialRecord {
    pub site_id: EntityId,
    pub reported_revenue: f64,
    pub estimated_revenue: f64,
    pub tax_paid: f64,
    pub suspicion_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Official {
    pub id: EntityId,
    pub name: String,
    pub position: String,
    pub district: String,
    pub connected_site: Option<EntityId>,
    pub risk_score: f64,
}

/// Pattern strengths behind a transaction's composite score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PatternScores {
    /// Splitting amounts to stay under reporting limits.
    pub structuring: f64,
    /// Unusually frequent movement for the account holder.
    pub velocity: f64,
    /// Pass-through hops designed to obscure origin.
    pub layering: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: EntityId,
    pub date: NaiveDate,
    pub official_id: EntityId,
    pub amount: f64,
    pub txn_type: TransactionType,
    pub counterparty: String,
    pub patterns: PatternScores,
    pub composite_score: f64,
    pub flag: TransactionFlag,
}

/// Unordered link between two named entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub source: String,
    pub source_kind: NodeKind,
    pub target: String,
    pub target_kind: NodeKind,
    pub weight: f64,
    pub category: ConnectionCategory,
}

impl Connection {
    /// Order-independent key for duplicate detection. The kind is part
    /// of each end, so an official and a company sharing a name differ.
    pub fn pair_key(&self) -> (String, String) {
        let a = format!("{}:{}", self.source_kind.as_str(), self.source);
        let b = format!("{}:{}", self.target_kind.as_str(), self.target);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegulatorDataset {
    pub sites: Vec<Site>,
    pub financials: Vec<FinancialRecord>,
    pub officials: Vec<Official>,
    pub transactions: Vec<Transaction>,
    pub connections: Vec<Connection>,
}

/// Everything generated at process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub seed: u64,
    pub basic: BasicDataset,
    pub regulator: RegulatorDataset,
}
