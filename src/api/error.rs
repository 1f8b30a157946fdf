// ==========================================
// 施工日报系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/引擎错误为用户友好的错误消息
// ==========================================

use crate::engine::coverage::{CoverageError, CoverageErrorKind};
use crate::engine::stage::StageTransitionError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    /// 工作时段未通过 24 小时覆盖校验（message 为当前语言的提示）
    #[error("{message}")]
    CoverageViolation {
        kind: CoverageErrorKind,
        message: String,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定的错误代码（供调用方分支判断）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ApiError::CoverageViolation { .. } => "COVERAGE_VIOLATION",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 转换为对外错误响应
    pub fn to_response(&self) -> ErrorResponse {
        let (message, details) = match self {
            ApiError::CoverageViolation { kind, message } => (
                message.clone(),
                Some(serde_json::json!({ "kind": kind.as_str() })),
            ),
            ApiError::InvalidStateTransition { from, to } => (
                self.to_string(),
                Some(serde_json::json!({ "from": from, "to": to })),
            ),
            _ => (self.to_string(), None),
        };
        ErrorResponse {
            code: self.code().to_string(),
            message,
            details,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<CoverageError> for ApiError {
    fn from(err: CoverageError) -> Self {
        tracing::debug!(error = %err, "工时覆盖校验失败");
        ApiError::CoverageViolation {
            kind: err.kind(),
            message: err.localized_message(),
        }
    }
}

impl From<StageTransitionError> for ApiError {
    fn from(err: StageTransitionError) -> Self {
        ApiError::InvalidStateTransition {
            from: err.from.to_db_str().to_string(),
            to: err.to.to_db_str().to_string(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ReportStage;
    use crate::engine::stage::StageAction;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Report".to_string(),
            id: "R001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Report"));
                assert!(msg.contains("R001"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::ForeignKeyViolation("x".to_string()).into();
        assert_eq!(api_err.code(), "BUSINESS_RULE_VIOLATION");
    }

    #[test]
    fn test_stage_error_conversion() {
        let err = StageTransitionError {
            action: StageAction::Approve,
            from: ReportStage::Approved,
            to: ReportStage::Approved,
        };
        let api_err: ApiError = err.into();
        let response = api_err.to_response();
        assert_eq!(response.code, "INVALID_STATE_TRANSITION");
        assert_eq!(response.details.unwrap()["from"], "APPROVED");
    }

    #[test]
    fn test_coverage_error_conversion_keeps_kind() {
        let api_err: ApiError = CoverageError::IncompleteCoverage {
            total_minutes: 1380.0,
        }
        .into();
        match &api_err {
            ApiError::CoverageViolation { kind, .. } => {
                assert_eq!(*kind, CoverageErrorKind::IncompleteCoverage)
            }
            _ => panic!("Expected CoverageViolation"),
        }
        assert_eq!(api_err.to_string(), api_err.to_response().message);
        let response = api_err.to_response();
        assert_eq!(response.code, "COVERAGE_VIOLATION");
        assert_eq!(response.details.unwrap()["kind"], "INCOMPLETE_COVERAGE");
    }
}
