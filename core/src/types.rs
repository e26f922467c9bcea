//! Shared primitive types used across the dashboard.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, unique identifier for any generated entity.
pub type EntityId = String;

/// Ordinal risk bucket shared by the integrated score and the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// All categories in ordinal order. Class indices in the classifier
    /// follow this order.
    pub const ALL: [RiskCategory; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn index(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    BankTransfer,
    EWallet,
    CashDeposit,
    ForeignTransfer,
}

impl TransactionType {
    /// The three channels seen in the basic dashboard.
    pub const DOMESTIC: [TransactionType; 3] =
        [Self::BankTransfer, Self::EWallet, Self::CashDeposit];

    pub const ALL: [TransactionType; 4] = [
        Self::BankTransfer,
        Self::EWallet,
        Self::CashDeposit,
        Self::ForeignTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::EWallet => "e_wallet",
            Self::CashDeposit => "cash_deposit",
            Self::ForeignTransfer => "foreign_transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionFlag {
    Normal,
    Suspicious,
}

impl TransactionFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Suspicious => "suspicious",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "suspicious" => Some(Self::Suspicious),
            _ => None,
        }
    }
}

/// Mining permit classes issued under Indonesian mining law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseType {
    /// Izin Usaha Pertambangan.
    #[serde(rename = "IUP")]
    Iup,
    /// Special permit for state reserve areas.
    #[serde(rename = "IUPK")]
    Iupk,
    /// Kontrak Karya (contract of work).
    #[serde(rename = "KK")]
    Kk,
    /// Izin Pertambangan Rakyat (small-scale).
    #[serde(rename = "IPR")]
    Ipr,
}

impl LicenseType {
    pub const ALL: [LicenseType; 4] = [Self::Iup, Self::Iupk, Self::Kk, Self::Ipr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iup => "IUP",
            Self::Iupk => "IUPK",
            Self::Kk => "KK",
            Self::Ipr => "IPR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionCategory {
    Family,
    Business,
    Political,
    Financial,
}

impl ConnectionCategory {
    pub const ALL: [ConnectionCategory; 4] =
        [Self::Family, Self::Business, Self::Political, Self::Financial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Business => "business",
            Self::Political => "political",
            Self::Financial => "financial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Which kind of entity sits at each end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Official,
    Company,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Company => "company",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "official" => Some(Self::Official),
            "company" => Some(Self::Company),
            _ => None,
        }
    }
}
