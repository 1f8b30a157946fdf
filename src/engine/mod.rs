// ==========================================
// 施工日报系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 所有规则必须输出 reason
// ==========================================

pub mod coverage;
pub mod stage;
pub mod stock_posting;

// 重导出核心引擎
pub use coverage::{CoverageError, CoverageErrorKind, DailyCoverageValidator, MINUTES_PER_DAY};
pub use stage::{StageAction, StageTransitionError, StageWorkflow};
pub use stock_posting::{PostingOutcome, StockLedger, StockPostingPlanner, StockPostingSettings};
