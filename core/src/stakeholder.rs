//! Stakeholder analysis for the basic dashboard.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{Stakeholder, StakeholderTransaction},
    types::{TransactionFlag, TransactionType},
};

const POINTS_PER_SUSPICIOUS_TXN: u32 = 20;
const OFFICIAL_ROLE_PENALTY: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StakeholderRisk {
    pub name: String,
    pub role: String,
    pub company: String,
    pub risk_score: u32,
}

/// 20 points per suspicious transaction, plus 30 for anyone whose role
/// names them an official. Sorted highest first; ties keep input order.
pub fn stakeholder_risk(stakeholders: &[Stakeholder]) -> Vec<StakeholderRisk> {
    let mut rows: Vec<StakeholderRisk> = stakeholders
        .iter()
        .map(|s| {
            let mut score = s.suspicious_transactions * POINTS_PER_SUSPICIOUS_TXN;
            if s.role.contains("Official") {
                score += OFFICIAL_ROLE_PENALTY;
            }
            StakeholderRisk {
                name: s.name.clone(),
                role: s.role.clone(),
                company: s.company.clone(),
                risk_score: score,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    rows
}

/// Count of suspicious transactions per person, alphabetical.
pub fn suspicious_by_person(transactions: &[StakeholderTransaction]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.flag == TransactionFlag::Suspicious) {
        *counts.entry(t.person.as_str()).or_default() += 1;
    }
    counts.into_iter().map(|(p, n)| (p.to_string(), n)).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub person: String,
    pub amount: u64,
}

/// Amount summed per (date, person), in date order.
pub fn timeline(transactions: &[StakeholderTransaction]) -> Vec<TimelinePoint> {
    let mut sums: BTreeMap<(NaiveDate, &str), u64> = BTreeMap::new();
    for t in transactions {
        *sums.entry((t.date, t.person.as_str())).or_default() += t.amount;
    }
    sums.into_iter()
        .map(|((date, person), amount)| TimelinePoint {
            date,
            person: person.to_string(),
            amount,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeShare {
    pub txn_type: TransactionType,
    pub amount: u64,
    pub percent: f64,
}

/// Total amount per transaction type and its share of the whole.
pub fn type_distribution(transactions: &[StakeholderTransaction]) -> Vec<TypeShare> {
    let total: u64 = transactions.iter().map(|t| t.amount).sum();
    TransactionType::ALL
        .into_iter()
        .filter_map(|ty| {
            let amount: u64 = transactions
                .iter()
                .filter(|t| t.txn_type == ty)
                .map(|t| t.amount)
                .sum();
            (amount > 0).then(|| TypeShare {
                txn_type: ty,
                amount,
                percent: amount as f64 / total as f64 * 100.0,
            })
        })
        .collect()
}
