// ==========================================
// 施工日报系统 - 物料到货/消耗数据仓储
// ==========================================
// 对齐: product_arrival / product_consumption 表
// ==========================================

use crate::domain::movement::{ProductArrival, ProductConsumption};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct MovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MovementRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 到货行
    // ==========================================

    pub fn insert_arrivals_tx(conn: &Connection, arrivals: &[ProductArrival]) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO product_arrival (arrival_id, report_id, product_id, quantity, location_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        let mut count = 0;
        for a in arrivals {
            stmt.execute(params![a.arrival_id, a.report_id, a.product_id, a.quantity, a.location_id])?;
            count += 1;
        }
        Ok(count)
    }

    pub fn find_arrivals_tx(conn: &Connection, report_id: &str) -> RepositoryResult<Vec<ProductArrival>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT arrival_id, report_id, product_id, quantity, location_id
            FROM product_arrival
            WHERE report_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let arrivals = stmt
            .query_map(params![report_id], |row| {
                Ok(ProductArrival {
                    arrival_id: row.get(0)?,
                    report_id: row.get(1)?,
                    product_id: row.get(2)?,
                    quantity: row.get(3)?,
                    location_id: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(arrivals)
    }

    // ==========================================
    // 消耗行
    // ==========================================

    pub fn insert_consumptions_tx(
        conn: &Connection,
        consumptions: &[ProductConsumption],
    ) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO product_consumption (consumption_id, report_id, product_id, quantity, write_off)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        let mut count = 0;
        for c in consumptions {
            stmt.execute(params![c.consumption_id, c.report_id, c.product_id, c.quantity, c.write_off])?;
            count += 1;
        }
        Ok(count)
    }

    pub fn find_consumptions_tx(
        conn: &Connection,
        report_id: &str,
    ) -> RepositoryResult<Vec<ProductConsumption>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT consumption_id, report_id, product_id, quantity, write_off
            FROM product_consumption
            WHERE report_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let consumptions = stmt
            .query_map(params![report_id], |row| {
                Ok(ProductConsumption {
                    consumption_id: row.get(0)?,
                    report_id: row.get(1)?,
                    product_id: row.get(2)?,
                    quantity: row.get(3)?,
                    write_off: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(consumptions)
    }

    /// 回填核销数量
    pub fn update_write_offs_tx(conn: &Connection, write_offs: &[(String, f64)]) -> RepositoryResult<usize> {
        let mut stmt =
            conn.prepare("UPDATE product_consumption SET write_off = ?2 WHERE consumption_id = ?1")?;
        let mut count = 0;
        for (consumption_id, write_off) in write_offs {
            count += stmt.execute(params![consumption_id, write_off])?;
        }
        Ok(count)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_arrivals(&self, report_id: &str) -> RepositoryResult<Vec<ProductArrival>> {
        let conn = self.get_conn()?;
        Self::find_arrivals_tx(&conn, report_id)
    }

    pub fn find_consumptions(&self, report_id: &str) -> RepositoryResult<Vec<ProductConsumption>> {
        let conn = self.get_conn()?;
        Self::find_consumptions_tx(&conn, report_id)
    }
}
