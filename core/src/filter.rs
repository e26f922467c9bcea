//! Filter selections coming from page widgets.
//!
//! Every multi-select follows the same law: an empty selection means
//! "no constraint", so filtering with defaults returns the whole table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{Site, StakeholderTransaction, Transaction},
    error::{DashError, DashResult},
    types::{LicenseType, TransactionFlag, TransactionType},
};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DashResult<Self> {
        if start > end {
            return Err(DashError::InvalidInput(format!(
                "date range starts after it ends: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// True when the selection is empty or contains the value.
fn selected<T: PartialEq>(selection: &[T], value: &T) -> bool {
    selection.is_empty() || selection.contains(value)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StakeholderFilter {
    pub persons: Vec<String>,
    pub date_range: Option<DateRange>,
}

impl StakeholderFilter {
    pub fn matches(&self, t: &StakeholderTransaction) -> bool {
        selected(&self.persons, &t.person)
            && self.date_range.map_or(true, |r| r.contains(t.date))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteFilter {
    pub districts: Vec<String>,
    pub license_types: Vec<LicenseType>,
}

impl SiteFilter {
    pub fn matches(&self, s: &Site) -> bool {
        selected(&self.districts, &s.district) && selected(&self.license_types, &s.license_type)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransactionFilter {
    /// Official ids.
    pub officials: Vec<String>,
    pub types: Vec<TransactionType>,
    pub date_range: Option<DateRange>,
    pub suspicious_only: bool,
}

impl TransactionFilter {
    pub fn matches(&self, t: &Transaction) -> bool {
        selected(&self.officials, &t.official_id)
            && selected(&self.types, &t.txn_type)
            && self.date_range.map_or(true, |r| r.contains(t.date))
            && (!self.suspicious_only || t.flag == TransactionFlag::Suspicious)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkFilter {
    /// Edges lighter than this are dropped before analysis.
    pub min_weight: f64,
}
