//! The dashboard: one generated dataset, many page renders.
//!
//! RULES:
//!   - Generation happens once, in `Dashboard::new`. Renders only read.
//!   - Every render recomputes its derived tables from the store.
//!   - Login state arrives with each render as a `Session`; regulator
//!     pages refuse sessions that are not logged in.
//!   - A filter that selects nothing renders an Empty view, not an error.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::DashboardConfig,
    error::{DashError, DashResult},
    filter::SiteFilter,
    generator::{DataSource, SeededSource},
    risk::{compute_integrated_risk, IntegratedRisk},
    rng::{RngBank, StreamSlot, TableRng},
    session::Session,
    store::DashStore,
    view::{PageBody, PageView, Section},
};

mod basic;
mod regulator;

pub use basic::{FinancialFilters, MapFilters};
pub use regulator::PredictionFilters;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    MapAnalysis,
    FinancialEstimation,
    StakeholderAnalysis,
    RiskOverview,
    TransactionMonitor,
    NetworkAnalysis,
    RiskPrediction,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Self::MapAnalysis,
        Self::FinancialEstimation,
        Self::StakeholderAnalysis,
        Self::RiskOverview,
        Self::TransactionMonitor,
        Self::NetworkAnalysis,
        Self::RiskPrediction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MapAnalysis => "map_analysis",
            Self::FinancialEstimation => "financial_estimation",
            Self::StakeholderAnalysis => "stakeholder_analysis",
            Self::RiskOverview => "risk_overview",
            Self::TransactionMonitor => "transaction_monitor",
            Self::NetworkAnalysis => "network_analysis",
            Self::RiskPrediction => "risk_prediction",
        }
    }

    pub fn parse(s: &str) -> DashResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DashError::UnknownPage { name: s.to_string() })
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::MapAnalysis => "Mining Location Analysis",
            Self::FinancialEstimation => "Financial Impact Analysis",
            Self::StakeholderAnalysis => "Stakeholder and Financial Transaction Analysis",
            Self::RiskOverview => "Integrated Risk Overview",
            Self::TransactionMonitor => "Transaction Monitoring",
            Self::NetworkAnalysis => "Network Analysis",
            Self::RiskPrediction => "Risk Prediction",
        }
    }

    /// Regulator pages sit behind the login.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::RiskOverview | Self::TransactionMonitor | Self::NetworkAnalysis | Self::RiskPrediction
        )
    }
}

pub struct Dashboard {
    config: DashboardConfig,
    store: DashStore,
    rng_bank: RngBank,
}

impl Dashboard {
    /// Generate the dataset from `source` and load it into a fresh store.
    pub fn new(source: &mut dyn DataSource, config: DashboardConfig) -> DashResult<Self> {
        let dataset = source.generate(&config)?;
        let store = DashStore::with_dataset(&dataset)?;
        log::info!(
            "dashboard ready: source={} seed={}",
            source.name(),
            config.seed
        );
        Ok(Self {
            rng_bank: RngBank::new(config.seed),
            config,
            store,
        })
    }

    /// Seeded production build.
    pub fn build(config: DashboardConfig) -> DashResult<Self> {
        Self::new(&mut SeededSource, config)
    }

    /// Seeded build with the small test config.
    pub fn build_test(seed: u64) -> DashResult<Self> {
        Self::build(DashboardConfig::default_test().with_seed(seed))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn store(&self) -> &DashStore {
        &self.store
    }

    /// Pages the session may open, in menu order.
    pub fn pages(&self, session: &Session) -> Vec<Page> {
        Page::ALL
            .into_iter()
            .filter(|p| !p.requires_login() || session.is_authenticated())
            .collect()
    }

    /// Render by page name, as received from a front end.
    pub fn render_named(&self, session: &Session, name: &str, filters: Value) -> DashResult<PageView> {
        self.render(session, Page::parse(name)?, filters)
    }

    pub fn render(&self, session: &Session, page: Page, filters: Value) -> DashResult<PageView> {
        if page.requires_login() && !session.is_authenticated() {
            return Err(DashError::Unauthorized { page: page.as_str().to_string() });
        }

        let sections = match page {
            Page::MapAnalysis => basic::map_analysis(self, parse_filters(filters)?),
            Page::FinancialEstimation => basic::financial_estimation(self, parse_filters(filters)?),
            Page::StakeholderAnalysis => basic::stakeholder_analysis(self, parse_filters(filters)?),
            Page::RiskOverview => regulator::risk_overview(self, parse_filters(filters)?),
            Page::TransactionMonitor => regulator::transaction_monitor(self, parse_filters(filters)?),
            Page::NetworkAnalysis => regulator::network_analysis(self, parse_filters(filters)?),
            Page::RiskPrediction => regulator::risk_prediction(self, parse_filters(filters)?),
        };

        let body = match sections {
            Ok(sections) => PageBody::Content { sections },
            Err(DashError::NoDataForSelection { what }) => {
                log::debug!("render {}: empty selection ({what})", page.as_str());
                PageBody::Empty { message: what }
            }
            Err(e) => return Err(e),
        };

        Ok(PageView {
            page,
            title: page.title().to_string(),
            body,
        })
    }

    /// Integrated risk for the sites the filter selects.
    pub fn integrated_risk(&self, filter: &SiteFilter) -> DashResult<Vec<IntegratedRisk>> {
        let sites = self.store.sites(filter)?;
        compute_integrated_risk(
            &sites,
            &self.store.financial_records()?,
            &self.store.officials()?,
            &self.store.transactions(&Default::default())?,
            &self.config.risk,
        )
    }

    /// A fresh stream for a model fit. Same seed, same fit, every view.
    fn model_rng(&self, slot: StreamSlot) -> TableRng {
        self.rng_bank.for_slot(slot)
    }
}

/// Null means "all defaults"; anything else must match the page's shape.
fn parse_filters<T: DeserializeOwned + Default>(value: Value) -> DashResult<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| DashError::InvalidInput(format!("bad filters: {e}")))
}

/// Shared shape check for the four sub-scores and similar [0, 1] inputs.
fn check_unit(label: &str, value: f64) -> DashResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DashError::InvalidInput(format!("{label} must be within [0, 1], got {value}")));
    }
    Ok(())
}

/// Every page's sections, or the reason the selection is empty.
type Sections = DashResult<Vec<Section>>;
