// ==========================================
// 施工日报系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod catalog;
pub mod interval;
pub mod movement;
pub mod report;
pub mod stock;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use catalog::{ConstructionObject, ConstructionWork, WorkCategory};
pub use interval::{WorkInterval, HOURS_PER_DAY};
pub use movement::{ProductArrival, ProductConsumption};
pub use report::{Report, ReportLine};
pub use stock::{MoveDraft, PickingDraft, PickingType, StockLocation, StockMove, StockPicking};
pub use types::{LocationUsage, PickingState, PickingTypeCode, ReportStage, WeatherCondition};
