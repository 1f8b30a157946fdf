// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use construction_report::api::{CatalogApi, MovementApi, ReportApi};
use construction_report::config::ConfigManager;
use construction_report::db::open_sqlite_connection;
use construction_report::repository::{
    ActionLogRepository, CatalogRepository, MovementRepository, ReportRepository, StockRepository,
};

use crate::test_helpers;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 与 AppState 的组装方式一致，但不改动全局语言设置
pub struct ApiTestEnv {
    pub db_path: String,
    pub report_api: Arc<ReportApi>,
    pub catalog_api: Arc<CatalogApi>,
    pub movement_api: Arc<MovementApi>,
    pub config_manager: Arc<ConfigManager>,

    // Repository层（用于测试数据准备与断言）
    pub report_repo: Arc<ReportRepository>,
    pub movement_repo: Arc<MovementRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) = test_helpers::create_test_db()
            .map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let report_repo = Arc::new(ReportRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let movement_repo = Arc::new(MovementRepository::new(conn.clone()));
        let stock_repo = Arc::new(StockRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let report_api = Arc::new(ReportApi::new(
            conn.clone(),
            report_repo.clone(),
            config_manager.clone(),
        ));
        let catalog_api = Arc::new(CatalogApi::new(catalog_repo, action_log_repo.clone()));
        let movement_api = Arc::new(MovementApi::new(
            conn,
            movement_repo.clone(),
            stock_repo,
            action_log_repo.clone(),
        ));

        Ok(Self {
            db_path,
            report_api,
            catalog_api,
            movement_api,
            config_manager,
            report_repo,
            movement_repo,
            action_log_repo,
            _temp_file: temp_file,
        })
    }

    /// 准备一个分类及其下的工作项，返回 work_id
    pub fn seed_work(&self, name: &str) -> String {
        let category = self
            .catalog_api
            .create_category("土方工程", "tester")
            .expect("创建分类失败");
        self.catalog_api
            .create_work(name, None, Some(&category.category_id), "tester")
            .expect("创建工作项失败")
            .work_id
    }
}
