// ==========================================
// 施工日报系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,编排仓储与引擎
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod movement_api;
pub mod report_api;
mod tx;

// 重导出核心类型
pub use catalog_api::{CatalogApi, CategoryWorks};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use movement_api::{ArrivalDraft, ConsumptionDraft, MovementApi};
pub use report_api::{
    ApprovalResult, ReportApi, ReportDetail, ReportDraft, ReportHeaderUpdate, ReportLineView,
    WorkLineDraft,
};
