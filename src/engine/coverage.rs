// ==========================================
// 施工日报系统 - 日工时覆盖校验引擎
// ==========================================
// 红线: 工作行必须互不重叠，且恰好覆盖完整 24 小时
// ==========================================
// 职责: 对一份日报的全部工作时段做纯函数校验
// 输入: 工作时段快照（无序）
// 输出: Ok(()) 或 CoverageError（四类原因之一）
// 粒度: 1 分钟，共 1440 个时间槽
// ==========================================

use crate::domain::interval::{WorkInterval, HOURS_PER_DAY};
use crate::domain::report::ReportLine;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::instrument;

/// 每小时分钟数
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// 一天的分钟槽数量
pub const MINUTES_PER_DAY: usize = 24 * 60;

// ==========================================
// 校验错误
// ==========================================

/// 覆盖校验失败原因分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageErrorKind {
    OutOfRange,
    InvertedInterval,
    OverlapDetected,
    IncompleteCoverage,
}

impl CoverageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageErrorKind::OutOfRange => "OUT_OF_RANGE",
            CoverageErrorKind::InvertedInterval => "INVERTED_INTERVAL",
            CoverageErrorKind::OverlapDetected => "OVERLAP_DETECTED",
            CoverageErrorKind::IncompleteCoverage => "INCOMPLETE_COVERAGE",
        }
    }
}

impl fmt::Display for CoverageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 覆盖校验错误
///
/// `index` 为时段在输入序列中的下标
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoverageError {
    #[error("工作时段超出范围: 第{index}行 [{start_hour}, {end_hour})，须在 0.0 ~ 24.0 之间")]
    OutOfRange {
        index: usize,
        start_hour: f64,
        end_hour: f64,
    },

    #[error("工作开始时间必须早于结束时间: 第{index}行 [{start_hour}, {end_hour})")]
    InvertedInterval {
        index: usize,
        start_hour: f64,
        end_hour: f64,
    },

    #[error("工作时段重叠: 第{index}行在第{minute}分钟与已有时段冲突")]
    OverlapDetected { index: usize, minute: usize },

    #[error("工作总时长必须为24小时: 实际{total_minutes}分钟")]
    IncompleteCoverage { total_minutes: f64 },
}

impl CoverageError {
    /// 稳定的分类标签
    pub fn kind(&self) -> CoverageErrorKind {
        match self {
            CoverageError::OutOfRange { .. } => CoverageErrorKind::OutOfRange,
            CoverageError::InvertedInterval { .. } => CoverageErrorKind::InvertedInterval,
            CoverageError::OverlapDetected { .. } => CoverageErrorKind::OverlapDetected,
            CoverageError::IncompleteCoverage { .. } => CoverageErrorKind::IncompleteCoverage,
        }
    }

    /// 按当前语言生成面向用户的提示
    pub fn localized_message(&self) -> String {
        match self {
            CoverageError::OutOfRange { .. } => crate::i18n::t("coverage.out_of_range"),
            CoverageError::InvertedInterval { .. } => crate::i18n::t("coverage.inverted_interval"),
            CoverageError::OverlapDetected { minute, .. } => {
                let time = format_minute(*minute);
                crate::i18n::t_with_args("coverage.overlap_detected", &[("time", time.as_str())])
            }
            CoverageError::IncompleteCoverage { total_minutes } => {
                let hours = format!("{:.2}", total_minutes / MINUTES_PER_HOUR);
                crate::i18n::t_with_args(
                    "coverage.incomplete_coverage",
                    &[("hours", hours.as_str())],
                )
            }
        }
    }
}

/// 分钟槽格式化为 HH:MM
fn format_minute(minute: usize) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// 小时换算为分钟槽下标（先乘 60 再向下取整）
fn minute_slot(hour: f64) -> usize {
    ((hour * MINUTES_PER_HOUR).floor() as usize).min(MINUTES_PER_DAY)
}

// ==========================================
// DailyCoverageValidator - 日工时覆盖校验器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyCoverageValidator;

impl DailyCoverageValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验工作时段集合
    ///
    /// 规则（顺序执行，命中即返回）:
    /// 1) 每个时段: start < 0.0 或 end > 24.0 → OutOfRange
    /// 2) 每个时段: start >= end → InvertedInterval
    /// 3) 每个时段: 逐分钟占用槽位，已占用 → OverlapDetected
    /// 4) 全部时段: 浮点时长之和 * 60 != 1440 → IncompleteCoverage
    ///
    /// 边界处理:
    /// - 空集合 → IncompleteCoverage（0 != 1440）
    /// - NaN / 无穷值 → OutOfRange
    #[instrument(skip(self, intervals), fields(count = intervals.len()))]
    pub fn validate(&self, intervals: &[WorkInterval]) -> Result<(), CoverageError> {
        let mut slots = [false; MINUTES_PER_DAY];
        let mut total_minutes = 0.0_f64;

        for (index, interval) in intervals.iter().enumerate() {
            let start_hour = interval.start_hour;
            let end_hour = interval.end_hour;

            if !start_hour.is_finite()
                || !end_hour.is_finite()
                || start_hour < 0.0
                || end_hour > HOURS_PER_DAY
            {
                return Err(CoverageError::OutOfRange {
                    index,
                    start_hour,
                    end_hour,
                });
            }

            if start_hour >= end_hour {
                return Err(CoverageError::InvertedInterval {
                    index,
                    start_hour,
                    end_hour,
                });
            }

            let start_slot = minute_slot(start_hour);
            let end_slot = minute_slot(end_hour);
            for minute in start_slot..end_slot {
                if slots[minute] {
                    tracing::debug!(index, minute, "时间槽已被占用");
                    return Err(CoverageError::OverlapDetected { index, minute });
                }
                slots[minute] = true;
            }

            // 使用原始浮点时长累计，而非槽位计数
            total_minutes += (end_hour - start_hour) * MINUTES_PER_HOUR;
        }

        if total_minutes != MINUTES_PER_DAY as f64 {
            return Err(CoverageError::IncompleteCoverage { total_minutes });
        }

        Ok(())
    }

    /// 校验日报工作行
    pub fn validate_lines(&self, lines: &[ReportLine]) -> Result<(), CoverageError> {
        let intervals: Vec<WorkInterval> = lines.iter().map(ReportLine::interval).collect();
        self.validate(&intervals)
    }
}
