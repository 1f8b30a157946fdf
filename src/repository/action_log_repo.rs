// ==========================================
// 施工日报系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 所有写入必须记录
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 在调用方事务内插入操作日志
    ///
    /// # 参数
    /// - `conn`: 已开启事务的连接
    /// - `log`: 操作日志实体
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    pub fn insert_tx(conn: &Connection, log: &ActionLog) -> RepositoryResult<String> {
        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, report_id, action_type, action_ts, actor, payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.action_id,
                log.report_id,
                log.action_type,
                log.action_ts,
                log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;
        Ok(log.action_id.clone())
    }

    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, log)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询日报的操作日志（按时间升序）
    pub fn find_by_report(&self, report_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, report_id, action_type, action_ts, actor, payload_json, detail
            FROM action_log
            WHERE report_id = ?1
            ORDER BY action_ts, rowid
            "#,
        )?;
        let logs = stmt
            .query_map(params![report_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, report_id, action_type, action_ts, actor, payload_json, detail
            FROM action_log
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;
        let logs = stmt
            .query_map(params![limit as i64], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
        let payload_json_str: Option<String> = row.get(5)?;
        Ok(ActionLog {
            action_id: row.get(0)?,
            report_id: row.get(1)?,
            action_type: row.get(2)?,
            action_ts: row.get(3)?,
            actor: row.get(4)?,
            // 无法解析的 JSON 视为缺失
            payload_json: payload_json_str.and_then(|s| serde_json::from_str(&s).ok()),
            detail: row.get(6)?,
        })
    }
}
