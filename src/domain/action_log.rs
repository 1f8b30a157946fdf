// ==========================================
// 施工日报系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录（含阶段变更追踪）
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub report_id: Option<String>, // 关联日报 (目录维护等操作为None)
    pub action_type: String,       // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,
    pub actor: String,

    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateReport,       // 创建日报
    UpdateReportHeader, // 修改表头
    ChangeWorkLines,    // 工作行变更
    ChangeMovements,    // 到货/消耗行变更
    StageChange,        // 阶段变更
    PostPicking,        // 审批过账
    MaintainCatalog,    // 目录维护
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateReport => "CreateReport",
            ActionType::UpdateReportHeader => "UpdateReportHeader",
            ActionType::ChangeWorkLines => "ChangeWorkLines",
            ActionType::ChangeMovements => "ChangeMovements",
            ActionType::StageChange => "StageChange",
            ActionType::PostPicking => "PostPicking",
            ActionType::MaintainCatalog => "MaintainCatalog",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreateReport" => Some(ActionType::CreateReport),
            "UpdateReportHeader" => Some(ActionType::UpdateReportHeader),
            "ChangeWorkLines" => Some(ActionType::ChangeWorkLines),
            "ChangeMovements" => Some(ActionType::ChangeMovements),
            "StageChange" => Some(ActionType::StageChange),
            "PostPicking" => Some(ActionType::PostPicking),
            "MaintainCatalog" => Some(ActionType::MaintainCatalog),
            _ => None,
        }
    }
}

impl ActionLog {
    /// 创建新的操作日志
    pub fn new(report_id: Option<String>, action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            report_id,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
