//! Store methods for the regulator dashboard tables.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, types::Value, Transaction as SqlTransaction};

use crate::{
    dataset::{
        AreaObservation, Connection, FinancialRecord, Official, PatternScores, RegulatorDataset,
        Site, Transaction,
    },
    error::DashResult,
    filter::{NetworkFilter, SiteFilter, TransactionFilter},
    types::{ConnectionCategory, LicenseType, NodeKind, TransactionFlag, TransactionType},
};

use super::{parse_column, text, DashStore, WhereClause};

pub(super) fn insert_all(tx: &SqlTransaction<'_>, data: &RegulatorDataset) -> DashResult<()> {
    {
        let mut site_stmt = tx.prepare(
            "INSERT INTO site (site_id, name, lat, lon, district, operator, license_type,
                               commodity, land_anomaly)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        let mut area_stmt =
            tx.prepare("INSERT INTO site_area (site_id, year, area_ha) VALUES (?1, ?2, ?3)")?;
        for s in &data.sites {
            site_stmt.execute(params![
                s.id,
                s.name,
                s.lat,
                s.lon,
                s.district,
                s.operator,
                s.license_type.as_str(),
                s.commodity,
                s.land_anomaly
            ])?;
            for a in &s.areas {
                area_stmt.execute(params![s.id, a.year, a.area_ha])?;
            }
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO financial_record (site_id, reported_revenue, estimated_revenue,
                                           tax_paid, suspicion_score)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for f in &data.financials {
            stmt.execute(params![
                f.site_id,
                f.reported_revenue,
                f.estimated_revenue,
                f.tax_paid,
                f.suspicion_score
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO official (official_id, name, position, district, connected_site, risk_score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for o in &data.officials {
            stmt.execute(params![
                o.id,
                o.name,
                o.position,
                o.district,
                o.connected_site,
                o.risk_score
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO txn (txn_id, date, official_id, amount, txn_type, counterparty,
                              structuring, velocity, layering, composite_score, flag)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for t in &data.transactions {
            stmt.execute(params![
                t.id,
                t.date,
                t.official_id,
                t.amount,
                t.txn_type.as_str(),
                t.counterparty,
                t.patterns.structuring,
                t.patterns.velocity,
                t.patterns.layering,
                t.composite_score,
                t.flag.as_str()
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO connection (source, source_kind, target, target_kind, weight, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for c in &data.connections {
            stmt.execute(params![
                c.source,
                c.source_kind.as_str(),
                c.target,
                c.target_kind.as_str(),
                c.weight,
                c.category.as_str()
            ])?;
        }
    }
    Ok(())
}

impl DashStore {
    /// Sites matching the filter, with their area series, ordered by id.
    pub fn sites(&self, filter: &SiteFilter) -> DashResult<Vec<Site>> {
        let mut clause = WhereClause::default();
        clause.in_list("district", filter.districts.iter().map(|d| text(d)));
        clause.in_list(
            "license_type",
            filter.license_types.iter().map(|l| text(l.as_str())),
        );

        let mut areas = self.site_areas()?;

        let sql = format!(
            "SELECT site_id, name, lat, lon, district, operator, license_type, commodity,
                    land_anomaly
             FROM site{} ORDER BY site_id",
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(clause.params.iter()), |row| {
                Ok(Site {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    lat: row.get(2)?,
                    lon: row.get(3)?,
                    district: row.get(4)?,
                    operator: row.get(5)?,
                    license_type: parse_column(6, row.get(6)?, LicenseType::parse)?,
                    commodity: row.get(7)?,
                    areas: Vec::new(),
                    land_anomaly: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|mut s| {
                s.areas = areas.remove(&s.id).unwrap_or_default();
                s
            })
            .collect())
    }

    fn site_areas(&self) -> DashResult<HashMap<String, Vec<AreaObservation>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT site_id, year, area_ha FROM site_area ORDER BY site_id, year")?;
        let mut areas: HashMap<String, Vec<AreaObservation>> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                AreaObservation {
                    year: row.get(1)?,
                    area_ha: row.get(2)?,
                },
            ))
        })?;
        for row in rows {
            let (site_id, obs) = row?;
            areas.entry(site_id).or_default().push(obs);
        }
        Ok(areas)
    }

    pub fn financial_records(&self) -> DashResult<Vec<FinancialRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT site_id, reported_revenue, estimated_revenue, tax_paid, suspicion_score
             FROM financial_record ORDER BY site_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FinancialRecord {
                    site_id: row.get(0)?,
                    reported_revenue: row.get(1)?,
                    estimated_revenue: row.get(2)?,
                    tax_paid: row.get(3)?,
                    suspicion_score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn officials(&self) -> DashResult<Vec<Official>> {
        let mut stmt = self.conn.prepare(
            "SELECT official_id, name, position, district, connected_site, risk_score
             FROM official ORDER BY official_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Official {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    position: row.get(2)?,
                    district: row.get(3)?,
                    connected_site: row.get(4)?,
                    risk_score: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Transactions matching the filter, oldest first.
    pub fn transactions(&self, filter: &TransactionFilter) -> DashResult<Vec<Transaction>> {
        let mut clause = WhereClause::default();
        clause.in_list("official_id", filter.officials.iter().map(|o| text(o)));
        clause.in_list("txn_type", filter.types.iter().map(|t| text(t.as_str())));
        if let Some(range) = filter.date_range {
            clause.push(
                "date BETWEEN ? AND ?",
                [text(&range.start.to_string()), text(&range.end.to_string())],
            );
        }
        if filter.suspicious_only {
            clause.push("flag = ?", [text(TransactionFlag::Suspicious.as_str())]);
        }

        let sql = format!(
            "SELECT txn_id, date, official_id, amount, txn_type, counterparty,
                    structuring, velocity, layering, composite_score, flag
             FROM txn{} ORDER BY date ASC, txn_id ASC",
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(clause.params.iter()), |row| {
                Ok(Transaction {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    official_id: row.get(2)?,
                    amount: row.get(3)?,
                    txn_type: parse_column(4, row.get(4)?, TransactionType::parse)?,
                    counterparty: row.get(5)?,
                    patterns: PatternScores {
                        structuring: row.get(6)?,
                        velocity: row.get(7)?,
                        layering: row.get(8)?,
                    },
                    composite_score: row.get(9)?,
                    flag: parse_column(10, row.get(10)?, TransactionFlag::parse)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Connections at or above the filter's minimum weight.
    pub fn connections(&self, filter: &NetworkFilter) -> DashResult<Vec<Connection>> {
        let mut clause = WhereClause::default();
        if filter.min_weight > 0.0 {
            clause.push("weight >= ?", [Value::Real(filter.min_weight)]);
        }
        let sql = format!(
            "SELECT source, source_kind, target, target_kind, weight, category
             FROM connection{} ORDER BY id",
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(clause.params.iter()), |row| {
                Ok(Connection {
                    source: row.get(0)?,
                    source_kind: parse_column(1, row.get(1)?, NodeKind::parse)?,
                    target: row.get(2)?,
                    target_kind: parse_column(3, row.get(3)?, NodeKind::parse)?,
                    weight: row.get(4)?,
                    category: parse_column(5, row.get(5)?, ConnectionCategory::parse)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
