// ==========================================
// 施工日报系统 - API 层事务辅助
// ==========================================
// 约定: 跨仓储写入在同一连接、同一事务内完成
//       事务未提交即被 drop 时自动回滚
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use rusqlite::{Connection, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

/// 获取共享连接
pub(crate) fn lock(conn: &Arc<Mutex<Connection>>) -> ApiResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))
}

/// 开启事务
pub(crate) fn begin(conn: &Connection) -> ApiResult<Transaction<'_>> {
    conn.unchecked_transaction()
        .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))
}

/// 提交事务
pub(crate) fn commit(tx: Transaction<'_>) -> ApiResult<()> {
    tx.commit()
        .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))
}
