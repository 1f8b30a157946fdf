// ==========================================
// 施工日报系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: `*_tx` 静态方法接收调用方持有的连接,用于跨仓储事务
// ==========================================

pub mod action_log_repo;
pub mod catalog_repo;
pub mod error;
pub mod movement_repo;
pub mod report_repo;
pub mod stock_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use catalog_repo::{CatalogRepository, CategoryWorkCount};
pub use error::{RepositoryError, RepositoryResult};
pub use movement_repo::MovementRepository;
pub use report_repo::ReportRepository;
pub use stock_repo::{SqliteStockLedger, StockRepository};
