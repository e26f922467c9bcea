//! Store methods for the basic dashboard tables.

use rusqlite::{params, params_from_iter, Transaction};

use crate::{
    dataset::{BasicDataset, Mine, MineFinancials, Stakeholder, StakeholderTransaction},
    error::DashResult,
    filter::StakeholderFilter,
    types::{TransactionFlag, TransactionType},
};

use super::{parse_column, text, DashStore, WhereClause};

pub(super) fn insert_all(tx: &Transaction<'_>, data: &BasicDataset) -> DashResult<()> {
    {
        let mut stmt = tx.prepare(
            "INSERT INTO mine (name, lat, lon, area_2020, area_2023, company)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for m in &data.mines {
            stmt.execute(params![m.name, m.lat, m.lon, m.area_2020, m.area_2023, m.company])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO mine_financials (mine, revenue_per_ha, cost_per_ha, tax_paid_2022)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for f in &data.financials {
            stmt.execute(params![f.mine, f.revenue_per_ha, f.cost_per_ha, f.tax_paid_2022])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO stakeholder (name, role, company, connected_mine, suspicious_transactions)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for s in &data.stakeholders {
            stmt.execute(params![
                s.name,
                s.role,
                s.company,
                s.connected_mine,
                s.suspicious_transactions
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO stakeholder_txn (date, person, amount, txn_type, flag)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for t in &data.transactions {
            stmt.execute(params![
                t.date,
                t.person,
                t.amount as i64,
                t.txn_type.as_str(),
                t.flag.as_str()
            ])?;
        }
    }
    Ok(())
}

impl DashStore {
    pub fn mines(&self) -> DashResult<Vec<Mine>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, lat, lon, area_2020, area_2023, company FROM mine ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Mine {
                    name: row.get(0)?,
                    lat: row.get(1)?,
                    lon: row.get(2)?,
                    area_2020: row.get(3)?,
                    area_2023: row.get(4)?,
                    company: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn mine_financials(&self) -> DashResult<Vec<MineFinancials>> {
        let mut stmt = self.conn.prepare(
            "SELECT mine, revenue_per_ha, cost_per_ha, tax_paid_2022
             FROM mine_financials ORDER BY mine",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MineFinancials {
                    mine: row.get(0)?,
                    revenue_per_ha: row.get(1)?,
                    cost_per_ha: row.get(2)?,
                    tax_paid_2022: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn stakeholders(&self) -> DashResult<Vec<Stakeholder>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, role, company, connected_mine, suspicious_transactions
             FROM stakeholder ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Stakeholder {
                    name: row.get(0)?,
                    role: row.get(1)?,
                    company: row.get(2)?,
                    connected_mine: row.get(3)?,
                    suspicious_transactions: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Stakeholder transactions, newest first.
    pub fn stakeholder_transactions(
        &self,
        filter: &StakeholderFilter,
    ) -> DashResult<Vec<StakeholderTransaction>> {
        let mut clause = WhereClause::default();
        clause.in_list("person", filter.persons.iter().map(|p| text(p)));
        if let Some(range) = filter.date_range {
            clause.push(
                "date BETWEEN ? AND ?",
                [text(&range.start.to_string()), text(&range.end.to_string())],
            );
        }

        let sql = format!(
            "SELECT date, person, amount, txn_type, flag FROM stakeholder_txn{}
             ORDER BY date DESC, id ASC",
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(clause.params.iter()), |row| {
                Ok(StakeholderTransaction {
                    date: row.get(0)?,
                    person: row.get(1)?,
                    amount: row.get::<_, i64>(2)? as u64,
                    txn_type: parse_column(3, row.get(3)?, TransactionType::parse)?,
                    flag: parse_column(4, row.get(4)?, TransactionFlag::parse)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
