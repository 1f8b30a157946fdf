// ==========================================
// 施工日报系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表 + 预置库位/调拨类型
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 预置库位: 仓库
pub const STOCK_LOCATION_ID: &str = "WH-STOCK";
/// 预置库位: 施工现场
pub const CONSTRUCTION_LOCATION_ID: &str = "CONSTRUCTION-SITE";
/// 预置库位: 供应商
pub const VENDOR_LOCATION_ID: &str = "PARTNER-VENDORS";
/// 预置调拨类型: 施工核销
pub const WRITE_OFF_PICKING_TYPE_ID: &str = "CONSTRUCTION-WRITE-OFF";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）并写入预置数据
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO stock_location (location_id, name, usage) VALUES (?1, ?2, ?3)",
        (STOCK_LOCATION_ID, "Warehouse Stock", "INTERNAL"),
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO stock_location (location_id, name, usage) VALUES (?1, ?2, ?3)",
        (CONSTRUCTION_LOCATION_ID, "Construction Site", "CONSTRUCTION"),
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO stock_location (location_id, name, usage) VALUES (?1, ?2, ?3)",
        (VENDOR_LOCATION_ID, "Vendors", "SUPPLIER"),
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO stock_picking_type (picking_type_id, name, code) VALUES (?1, ?2, ?3)",
        (WRITE_OFF_PICKING_TYPE_ID, "Construction Write-Off", "CONSTRUCTION"),
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    match read_schema_version(conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                "数据库 schema_version={} 高于当前代码版本 {}",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
        _ => {}
    }

    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS construction_category (
    category_id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS construction_work (
    work_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    category_id TEXT REFERENCES construction_category(category_id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS construction_object (
    object_id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS construction_report (
    report_id TEXT PRIMARY KEY,
    report_date TEXT NOT NULL,
    responsible_user TEXT NOT NULL,
    weather TEXT,
    customer TEXT,
    construction_object_id TEXT REFERENCES construction_object(object_id),
    stage TEXT NOT NULL DEFAULT 'NEW',
    time_total_hours REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS construction_report_line (
    line_id TEXT PRIMARY KEY,
    report_id TEXT NOT NULL REFERENCES construction_report(report_id) ON DELETE CASCADE,
    work_id TEXT NOT NULL REFERENCES construction_work(work_id),
    work_category_id TEXT,
    time_from REAL NOT NULL,
    time_to REAL NOT NULL,
    time_total REAL NOT NULL,
    seq_no INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_report_line_report
    ON construction_report_line(report_id, seq_no);

CREATE TABLE IF NOT EXISTS stock_location (
    location_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    usage TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stock_picking_type (
    picking_type_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product_arrival (
    arrival_id TEXT PRIMARY KEY,
    report_id TEXT NOT NULL REFERENCES construction_report(report_id) ON DELETE CASCADE,
    product_id TEXT NOT NULL,
    quantity REAL NOT NULL,
    location_id TEXT NOT NULL REFERENCES stock_location(location_id)
);

CREATE TABLE IF NOT EXISTS product_consumption (
    consumption_id TEXT PRIMARY KEY,
    report_id TEXT NOT NULL REFERENCES construction_report(report_id) ON DELETE CASCADE,
    product_id TEXT NOT NULL,
    quantity REAL NOT NULL,
    write_off REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS stock_picking (
    picking_id TEXT PRIMARY KEY,
    picking_type_id TEXT NOT NULL REFERENCES stock_picking_type(picking_type_id),
    report_id TEXT REFERENCES construction_report(report_id),
    location_id TEXT NOT NULL REFERENCES stock_location(location_id),
    location_dest_id TEXT NOT NULL REFERENCES stock_location(location_id),
    state TEXT NOT NULL,
    transport TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stock_move (
    move_id TEXT PRIMARY KEY,
    picking_id TEXT NOT NULL REFERENCES stock_picking(picking_id) ON DELETE CASCADE,
    product_id TEXT NOT NULL,
    product_uom_qty REAL NOT NULL,
    quantity_done REAL NOT NULL DEFAULT 0,
    location_id TEXT NOT NULL,
    location_dest_id TEXT NOT NULL,
    name TEXT NOT NULL,
    consumption_id TEXT REFERENCES product_consumption(consumption_id),
    seq_no INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    report_id TEXT,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_action_log_report_ts
    ON action_log(report_id, action_ts);
"#;
