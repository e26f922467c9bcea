//! Page view models.
//!
//! A view is plain data: a front end draws the markers, series and
//! tables. Nothing here knows how the data was computed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dashboard::Page;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub body: PageBody,
}

impl PageView {
    pub fn is_empty(&self) -> bool {
        matches!(self.body, PageBody::Empty { .. })
    }

    pub fn sections(&self) -> &[Section] {
        match &self.body {
            PageBody::Content { sections } => sections,
            PageBody::Empty { .. } => &[],
        }
    }

    /// First section with the given title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections().iter().find(|s| s.title() == title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageBody {
    Content { sections: Vec<Section> },
    /// The filters selected nothing.
    Empty { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    pub delta: Option<String>,
}

impl MetricCard {
    pub fn new(label: &str, value: String) -> Self {
        Self { label: label.to_string(), value, delta: None }
    }

    pub fn with_delta(mut self, delta: String) -> Self {
        self.delta = Some(delta);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapMarker {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub color: String,
    pub radius: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    GroupedBar,
    Line,
    Pie,
    Scatter,
}

/// One named series of labelled values. For scatter charts `labels`
/// hold point names and `x` carries the horizontal coordinate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x: Vec<f64>,
}

impl Series {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNodeView {
    pub name: String,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub community: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdgeView {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    Metrics {
        title: String,
        cards: Vec<MetricCard>,
    },
    Map {
        title: String,
        markers: Vec<MapMarker>,
        legend: Vec<LegendEntry>,
    },
    Chart {
        title: String,
        chart: ChartKind,
        series: Vec<Series>,
    },
    Table {
        title: String,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Graph {
        title: String,
        nodes: Vec<GraphNodeView>,
        edges: Vec<GraphEdgeView>,
    },
    Notice {
        title: String,
        text: String,
    },
}

impl Section {
    pub fn title(&self) -> &str {
        match self {
            Self::Metrics { title, .. }
            | Self::Map { title, .. }
            | Self::Chart { title, .. }
            | Self::Table { title, .. }
            | Self::Graph { title, .. }
            | Self::Notice { title, .. } => title,
        }
    }

    pub fn metrics(title: &str, cards: Vec<MetricCard>) -> Self {
        Self::Metrics { title: title.to_string(), cards }
    }

    pub fn chart(title: &str, chart: ChartKind, series: Vec<Series>) -> Self {
        Self::Chart { title: title.to_string(), chart, series }
    }

    pub fn table(title: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self::Table {
            title: title.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn notice(title: &str, text: impl Into<String>) -> Self {
        Self::Notice { title: title.to_string(), text: text.into() }
    }

    pub fn row_count(&self) -> Option<usize> {
        match self {
            Self::Table { rows, .. } => Some(rows.len()),
            _ => None,
        }
    }
}

// ── Formatting ────────────────────────────────────────────────────

/// Whole dollars with thousands separators, e.g. `$1,234,567`.
pub fn usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(value.abs().round() as u64))
}

/// Integer with thousands separators.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_groups_thousands() {
        assert_eq!(usd(0.0), "$0");
        assert_eq!(usd(999.4), "$999");
        assert_eq!(usd(1_234_567.0), "$1,234,567");
        assert_eq!(usd(-25_000.0), "-$25,000");
    }
}
