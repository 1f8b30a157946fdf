// ==========================================
// 施工日报系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::{
    open_sqlite_connection, CONSTRUCTION_LOCATION_ID, STOCK_LOCATION_ID,
    WRITE_OFF_PICKING_TYPE_ID,
};
use crate::engine::stock_posting::StockPostingSettings;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 全局作用域
const GLOBAL_SCOPE: &str = "global";

/// 库存移动默认名称
pub const DEFAULT_MOVE_NAME: &str = "construction_report";

/// 默认界面语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 从 config_kv 表读取配置值，带默认值（空白值视为未配置）
    pub fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        if key.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "key".to_string(),
                message: "配置键不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    // ===== 审批过账配置 =====

    /// 读取审批过账参数
    ///
    /// 未配置的键回退到建表时预置的库位/调拨类型
    pub fn stock_posting_settings(&self) -> RepositoryResult<StockPostingSettings> {
        Ok(StockPostingSettings {
            source_location_id: self
                .get_config_or_default(config_keys::STOCK_SOURCE_LOCATION_ID, STOCK_LOCATION_ID)?,
            construction_location_id: self.get_config_or_default(
                config_keys::STOCK_CONSTRUCTION_LOCATION_ID,
                CONSTRUCTION_LOCATION_ID,
            )?,
            picking_type_id: self.get_config_or_default(
                config_keys::STOCK_WRITE_OFF_PICKING_TYPE_ID,
                WRITE_OFF_PICKING_TYPE_ID,
            )?,
            move_name: self.get_config_or_default(config_keys::STOCK_MOVE_NAME, DEFAULT_MOVE_NAME)?,
        })
    }

    // ===== 界面配置 =====

    pub fn default_locale(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::UI_DEFAULT_LOCALE, DEFAULT_LOCALE)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 审批过账
    pub const STOCK_SOURCE_LOCATION_ID: &str = "stock.source_location_id";
    pub const STOCK_CONSTRUCTION_LOCATION_ID: &str = "stock.construction_location_id";
    pub const STOCK_WRITE_OFF_PICKING_TYPE_ID: &str = "stock.write_off_picking_type_id";
    pub const STOCK_MOVE_NAME: &str = "stock.move_name";

    // 界面
    pub const UI_DEFAULT_LOCALE: &str = "ui.default_locale";
}
