// ==========================================
// 施工日报系统 - 日报阶段流转引擎
// ==========================================
// 流转: New -> Review -> Approved（线性，仅允许前进）
// 重复提交审批（Review -> Review）为幂等操作
// ==========================================

use crate::domain::types::ReportStage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 阶段流转动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageAction {
    SubmitForApproval, // 提交审批
    Approve,           // 审批通过
}

impl StageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageAction::SubmitForApproval => "SUBMIT_FOR_APPROVAL",
            StageAction::Approve => "APPROVE",
        }
    }

    /// 动作的目标阶段
    pub fn target(&self) -> ReportStage {
        match self {
            StageAction::SubmitForApproval => ReportStage::Review,
            StageAction::Approve => ReportStage::Approved,
        }
    }
}

/// 阶段流转被拒绝
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的阶段流转: {act} from={from} to={to}", act = .action.as_str())]
pub struct StageTransitionError {
    pub action: StageAction,
    pub from: ReportStage,
    pub to: ReportStage,
}

// 转换表: (当前阶段, 动作) -> 目标阶段
const TRANSITIONS: &[(ReportStage, StageAction, ReportStage)] = &[
    (ReportStage::New, StageAction::SubmitForApproval, ReportStage::Review),
    (ReportStage::New, StageAction::Approve, ReportStage::Approved),
    (ReportStage::Review, StageAction::SubmitForApproval, ReportStage::Review),
    (ReportStage::Review, StageAction::Approve, ReportStage::Approved),
];

// ==========================================
// StageWorkflow - 阶段流转
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct StageWorkflow;

impl StageWorkflow {
    pub fn new() -> Self {
        Self
    }

    /// 计算流转后的阶段
    ///
    /// # 返回
    /// - Ok(ReportStage): 目标阶段
    /// - Err(StageTransitionError): 转换表中不存在该流转（回退或重复审批）
    pub fn transition(
        &self,
        from: ReportStage,
        action: StageAction,
    ) -> Result<ReportStage, StageTransitionError> {
        TRANSITIONS
            .iter()
            .find(|(stage, act, _)| *stage == from && *act == action)
            .map(|(_, _, to)| *to)
            .ok_or(StageTransitionError {
                action,
                from,
                to: action.target(),
            })
    }

    /// 当前阶段可执行的动作（不含不改变阶段的幂等动作）
    pub fn available_actions(&self, from: ReportStage) -> Vec<StageAction> {
        TRANSITIONS
            .iter()
            .filter(|(stage, _, to)| *stage == from && *to != from)
            .map(|(_, action, _)| *action)
            .collect()
    }
}
