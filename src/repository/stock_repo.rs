// ==========================================
// 施工日报系统 - 库存调拨数据仓储
// ==========================================
// 对齐: stock_location / stock_picking_type / stock_picking / stock_move 表
// 说明: SqliteStockLedger 是 StockLedger 的落库实现，在调用方事务内执行
// ==========================================

use crate::domain::stock::{PickingDraft, PickingType, StockLocation, StockMove, StockPicking};
use crate::domain::types::{LocationUsage, PickingState, PickingTypeCode};
use crate::engine::stock_posting::StockLedger;
use crate::repository::error::{enum_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// StockRepository - 库存查询仓储
// ==========================================
pub struct StockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_location(row: &Row<'_>) -> SqliteResult<StockLocation> {
        Ok(StockLocation {
            location_id: row.get(0)?,
            name: row.get(1)?,
            usage: enum_column(row, 2, LocationUsage::from_str)?,
        })
    }

    fn map_picking(row: &Row<'_>) -> SqliteResult<StockPicking> {
        Ok(StockPicking {
            picking_id: row.get(0)?,
            picking_type_id: row.get(1)?,
            report_id: row.get(2)?,
            location_id: row.get(3)?,
            location_dest_id: row.get(4)?,
            state: enum_column(row, 5, PickingState::from_str)?,
            transport: row.get(6)?,
            created_at: row.get(7)?,
            moves: Vec::new(),
        })
    }

    fn map_move(row: &Row<'_>) -> SqliteResult<StockMove> {
        Ok(StockMove {
            move_id: row.get(0)?,
            picking_id: row.get(1)?,
            product_id: row.get(2)?,
            product_uom_qty: row.get(3)?,
            quantity_done: row.get(4)?,
            location_id: row.get(5)?,
            location_dest_id: row.get(6)?,
            name: row.get(7)?,
            consumption_id: row.get(8)?,
        })
    }

    // ==========================================
    // 库位 / 调拨类型
    // ==========================================

    pub fn insert_location(&self, location: &StockLocation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO stock_location (location_id, name, usage) VALUES (?1, ?2, ?3)",
            params![location.location_id, location.name, location.usage.to_db_str()],
        )?;
        Ok(())
    }

    pub fn find_location(&self, location_id: &str) -> RepositoryResult<Option<StockLocation>> {
        let conn = self.get_conn()?;
        let location = conn
            .query_row(
                "SELECT location_id, name, usage FROM stock_location WHERE location_id = ?1",
                params![location_id],
                Self::map_location,
            )
            .optional()?;
        Ok(location)
    }

    pub fn list_locations(&self) -> RepositoryResult<Vec<StockLocation>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT location_id, name, usage FROM stock_location ORDER BY location_id")?;
        let locations = stmt
            .query_map([], Self::map_location)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(locations)
    }

    pub fn find_picking_type(&self, picking_type_id: &str) -> RepositoryResult<Option<PickingType>> {
        let conn = self.get_conn()?;
        let picking_type = conn
            .query_row(
                "SELECT picking_type_id, name, code FROM stock_picking_type WHERE picking_type_id = ?1",
                params![picking_type_id],
                |row| {
                    Ok(PickingType {
                        picking_type_id: row.get(0)?,
                        name: row.get(1)?,
                        code: enum_column(row, 2, PickingTypeCode::from_str)?,
                    })
                },
            )
            .optional()?;
        Ok(picking_type)
    }

    // ==========================================
    // 调拨单
    // ==========================================

    /// 查询日报关联的调拨单（含库存移动）
    pub fn find_pickings_by_report(&self, report_id: &str) -> RepositoryResult<Vec<StockPicking>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT picking_id, picking_type_id, report_id, location_id, location_dest_id,
                   state, transport, created_at
            FROM stock_picking
            WHERE report_id = ?1
            ORDER BY created_at, rowid
            "#,
        )?;
        let mut pickings = stmt
            .query_map(params![report_id], Self::map_picking)?
            .collect::<SqliteResult<Vec<_>>>()?;

        for picking in &mut pickings {
            picking.moves = Self::find_moves_tx(&conn, &picking.picking_id)?;
        }
        Ok(pickings)
    }

    /// 设置运输车辆
    pub fn set_transport(&self, picking_id: &str, transport: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE stock_picking SET transport = ?2 WHERE picking_id = ?1",
            params![picking_id, transport],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "StockPicking".to_string(),
                id: picking_id.to_string(),
            });
        }
        Ok(())
    }

    fn find_moves_tx(conn: &Connection, picking_id: &str) -> RepositoryResult<Vec<StockMove>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT move_id, picking_id, product_id, product_uom_qty, quantity_done,
                   location_id, location_dest_id, name, consumption_id
            FROM stock_move
            WHERE picking_id = ?1
            ORDER BY seq_no
            "#,
        )?;
        let moves = stmt
            .query_map(params![picking_id], Self::map_move)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(moves)
    }
}

// ==========================================
// SqliteStockLedger - 事务内落账
// ==========================================

/// 基于 SQLite 的库存落账实现
///
/// 流程: 创建草稿 -> 确认 -> 完成数量 = 需求数量（视为全部可用）-> 验证完成
pub struct SqliteStockLedger<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStockLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn create_draft(&self, draft: &PickingDraft) -> RepositoryResult<StockPicking> {
        let picking_id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Local::now().naive_local();

        self.conn.execute(
            r#"
            INSERT INTO stock_picking (
                picking_id, picking_type_id, report_id, location_id, location_dest_id,
                state, transport, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)
            "#,
            params![
                picking_id,
                draft.picking_type_id,
                draft.report_id,
                draft.location_id,
                draft.location_dest_id,
                PickingState::Draft.to_db_str(),
                created_at,
            ],
        )?;

        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO stock_move (
                move_id, picking_id, product_id, product_uom_qty, quantity_done,
                location_id, location_dest_id, name, consumption_id, seq_no
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9)
            "#,
        )?;

        let mut moves = Vec::with_capacity(draft.moves.len());
        for (seq, m) in draft.moves.iter().enumerate() {
            let move_id = uuid::Uuid::new_v4().to_string();
            stmt.execute(params![
                move_id,
                picking_id,
                m.product_id,
                m.product_uom_qty,
                m.location_id,
                m.location_dest_id,
                m.name,
                m.consumption_id,
                seq as i64,
            ])?;
            moves.push(StockMove {
                move_id,
                picking_id: picking_id.clone(),
                product_id: m.product_id.clone(),
                product_uom_qty: m.product_uom_qty,
                quantity_done: 0.0,
                location_id: m.location_id.clone(),
                location_dest_id: m.location_dest_id.clone(),
                name: m.name.clone(),
                consumption_id: m.consumption_id.clone(),
            });
        }

        Ok(StockPicking {
            picking_id,
            picking_type_id: draft.picking_type_id.clone(),
            report_id: Some(draft.report_id.clone()),
            location_id: draft.location_id.clone(),
            location_dest_id: draft.location_dest_id.clone(),
            state: PickingState::Draft,
            transport: None,
            created_at,
            moves,
        })
    }

    fn set_state(&self, picking: &mut StockPicking, state: PickingState) -> RepositoryResult<()> {
        self.conn.execute(
            "UPDATE stock_picking SET state = ?2 WHERE picking_id = ?1",
            params![picking.picking_id, state.to_db_str()],
        )?;
        picking.state = state;
        Ok(())
    }

    fn fill_quantity_done(&self, picking: &mut StockPicking) -> RepositoryResult<()> {
        self.conn.execute(
            "UPDATE stock_move SET quantity_done = product_uom_qty WHERE picking_id = ?1",
            params![picking.picking_id],
        )?;
        for m in &mut picking.moves {
            m.quantity_done = m.product_uom_qty;
        }
        Ok(())
    }
}

impl StockLedger for SqliteStockLedger<'_> {
    fn post_picking(&self, draft: &PickingDraft) -> RepositoryResult<StockPicking> {
        let mut picking = self.create_draft(draft)?;
        self.set_state(&mut picking, PickingState::Confirmed)?;
        self.fill_quantity_done(&mut picking)?;
        self.set_state(&mut picking, PickingState::Done)?;
        tracing::debug!(
            picking_id = %picking.picking_id,
            moves = picking.moves.len(),
            "调拨单已完成"
        );
        Ok(picking)
    }
}
