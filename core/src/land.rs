//! Land-change metrics: area deltas, impact bands, year interpolation
//! and the environmental impact estimates.

use serde::{Deserialize, Serialize};

use crate::{
    config::EnvironmentConfig,
    dataset::{Mine, Site},
};

/// Change below this many hectares is low impact.
pub const LOW_IMPACT_HA: f64 = 100.0;
/// Change below this many hectares is medium impact.
pub const MEDIUM_IMPACT_HA: f64 = 200.0;

/// Percentage change from `earlier` to `later`.
/// Undefined (None) when the earlier area is not positive.
pub fn percent_change(earlier: f64, later: f64) -> Option<f64> {
    if earlier > 0.0 {
        Some((later - earlier) / earlier * 100.0)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImpactBand {
    Low,
    Medium,
    High,
}

impl ImpactBand {
    pub fn for_change(change_ha: f64) -> Self {
        if change_ha < LOW_IMPACT_HA {
            Self::Low
        } else if change_ha < MEDIUM_IMPACT_HA {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Map marker colour.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "#3498db",
            Self::Medium => "#f39c12",
            Self::High => "#e74c3c",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Impact (< 100 ha)",
            Self::Medium => "Medium Impact (100-200 ha)",
            Self::High => "High Impact (> 200 ha)",
        }
    }
}

/// Change summary for one location between two survey years.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandChange {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub from_year: i32,
    pub to_year: i32,
    pub area_from: f64,
    pub area_to: f64,
    pub change_ha: f64,
    pub percent_change: Option<f64>,
    pub impact: ImpactBand,
}

impl LandChange {
    pub fn new(
        name: &str,
        (lat, lon): (f64, f64),
        (from_year, area_from): (i32, f64),
        (to_year, area_to): (i32, f64),
    ) -> Self {
        let change_ha = area_to - area_from;
        Self {
            name: name.to_string(),
            lat,
            lon,
            from_year,
            to_year,
            area_from,
            area_to,
            change_ha,
            percent_change: percent_change(area_from, area_to),
            impact: ImpactBand::for_change(change_ha),
        }
    }

    pub fn from_mine(mine: &Mine) -> Self {
        Self::new(
            &mine.name,
            (mine.lat, mine.lon),
            (2020, mine.area_2020),
            (2023, mine.area_2023),
        )
    }

    /// First-to-last observation change. None for a site with fewer
    /// than two observations.
    pub fn from_site(site: &Site) -> Option<Self> {
        let first = site.earliest()?;
        let last = site.latest()?;
        if first.year == last.year {
            return None;
        }
        Some(Self::new(
            &site.name,
            (site.lat, site.lon),
            (first.year, first.area_ha),
            (last.year, last.area_ha),
        ))
    }

    /// Area at `year`, linearly interpolated between the two survey
    /// years and clamped to them outside the range.
    pub fn area_at(&self, year: i32) -> f64 {
        if year <= self.from_year {
            return self.area_from;
        }
        if year >= self.to_year {
            return self.area_to;
        }
        let span = (self.to_year - self.from_year) as f64;
        let progress = (year - self.from_year) as f64 / span;
        self.area_from + progress * self.change_ha
    }

    pub fn span_years(&self) -> f64 {
        (self.to_year - self.from_year).max(1) as f64
    }
}

/// Site area at a year: the observation if present, otherwise a linear
/// interpolation between the neighbouring observations.
pub fn site_area_at(site: &Site, year: i32) -> Option<f64> {
    if let Some(area) = site.area_in(year) {
        return Some(area);
    }
    let before = site.areas.iter().rev().find(|a| a.year < year)?;
    let after = site.areas.iter().find(|a| a.year > year)?;
    let progress = (year - before.year) as f64 / (after.year - before.year) as f64;
    Some(before.area_ha + progress * (after.area_ha - before.area_ha))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentalImpact {
    pub total_change_ha: f64,
    pub change_per_year_ha: f64,
    pub co2_tons: f64,
    pub co2_tons_per_year: f64,
    pub biodiversity_index: f64,
}

/// Aggregate impact over a set of changes sharing a survey span.
pub fn environmental_impact(changes: &[LandChange], env: &EnvironmentConfig) -> EnvironmentalImpact {
    let total: f64 = changes.iter().map(|c| c.change_ha).sum();
    let span = changes
        .iter()
        .map(LandChange::span_years)
        .fold(1.0_f64, f64::max);
    let co2 = total * env.co2_tons_per_ha;
    EnvironmentalImpact {
        total_change_ha: total,
        change_per_year_ha: total / span,
        co2_tons: co2,
        co2_tons_per_year: co2 / span,
        biodiversity_index: total * env.biodiversity_per_ha,
    }
}
