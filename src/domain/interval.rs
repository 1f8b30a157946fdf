// ==========================================
// 施工日报系统 - 工作时段值对象
// ==========================================
// 职责: 日报工作行的时间区间快照（小时制，0.0 ~ 24.0）
// 说明: 仅作为校验器输入存在，不落库
// ==========================================

use serde::{Deserialize, Serialize};

/// 一天的小时数
pub const HOURS_PER_DAY: f64 = 24.0;

/// 工作时段 [start_hour, end_hour)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkInterval {
    pub start_hour: f64,
    pub end_hour: f64,
}

impl WorkInterval {
    pub fn new(start_hour: f64, end_hour: f64) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// 时长（小时）
    pub fn duration(&self) -> f64 {
        self.end_hour - self.start_hour
    }
}

impl From<(f64, f64)> for WorkInterval {
    fn from((start_hour, end_hour): (f64, f64)) -> Self {
        Self::new(start_hour, end_hour)
    }
}
