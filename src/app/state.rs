// ==========================================
// 施工日报系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, MovementApi, ReportApi};
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::repository::{
    ActionLogRepository, CatalogRepository, MovementRepository, ReportRepository, StockRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CONSTRUCTION_REPORT_DB_PATH";

/// 应用状态
///
/// 所有仓储与 API 共用同一个连接，保证跨仓储写入可在单事务内完成
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 施工日报API
    pub report_api: Arc<ReportApi>,

    /// 工作目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 物料行API
    pub movement_api: Arc<MovementApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    /// 4. 应用配置中的默认语言
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let report_repo = Arc::new(ReportRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let movement_repo = Arc::new(MovementRepository::new(conn.clone()));
        let stock_repo = Arc::new(StockRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let report_api = Arc::new(ReportApi::new(
            conn.clone(),
            report_repo,
            config_manager.clone(),
        ));
        let catalog_api = Arc::new(CatalogApi::new(catalog_repo, action_log_repo.clone()));
        let movement_api = Arc::new(MovementApi::new(
            conn,
            movement_repo,
            stock_repo,
            action_log_repo.clone(),
        ));

        match config_manager.default_locale() {
            Ok(locale) => {
                if !crate::i18n::set_locale(&locale) {
                    tracing::warn!("配置的默认语言无效: {}", locale);
                }
            }
            Err(e) => tracing::warn!("读取默认语言失败(将使用内置默认): {}", e),
        }

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            report_api,
            catalog_api,
            movement_api,
            config_manager,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 CONSTRUCTION_REPORT_DB_PATH，否则放在用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./construction_report.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("construction-report");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("construction_report.db");
        }
    }

    path.to_string_lossy().to_string()
}
