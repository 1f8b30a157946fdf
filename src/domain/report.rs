// ==========================================
// 施工日报系统 - 日报领域模型
// ==========================================
// 对齐: construction_report / construction_report_line 表
// 红线: 工作行集合必须覆盖完整 24 小时且互不重叠（由校验器保证）
// ==========================================

use crate::domain::interval::WorkInterval;
use crate::domain::types::{ReportStage, WeatherCondition};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Report - 施工日报
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    // ===== 主键 =====
    pub report_id: String,

    // ===== 表头 =====
    pub report_date: NaiveDate,                 // 报告日期
    pub responsible_user: String,               // 负责人
    pub weather: Option<WeatherCondition>,      // 天气
    pub customer: Option<String>,               // 客户
    pub construction_object_id: Option<String>, // 施工对象

    // ===== 流转 =====
    pub stage: ReportStage,

    // ===== 汇总 (落库的计算字段) =====
    pub time_total_hours: f64,

    // ===== 审计字段 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Report {
    /// 创建新日报（阶段为 New，工时汇总为 0）
    pub fn new(report_id: String, report_date: NaiveDate, responsible_user: String) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            report_id,
            report_date,
            responsible_user,
            weather: None,
            customer: None,
            construction_object_id: None,
            stage: ReportStage::New,
            time_total_hours: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 汇总工作行工时
    pub fn sum_line_hours(lines: &[ReportLine]) -> f64 {
        lines.iter().map(|l| l.time_total).sum()
    }

    /// 显示名称
    ///
    /// 格式: "Report for (2024-01-01) (New)"，按当前语言本地化
    pub fn display_name(&self) -> String {
        let date = self.report_date.format("%Y-%m-%d").to_string();
        let stage = self.stage.display_name();
        crate::i18n::t_with_args(
            "report.display_name",
            &[("date", date.as_str()), ("stage", stage.as_str())],
        )
    }
}

// ==========================================
// ReportLine - 日报工作行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLine {
    pub line_id: String,
    pub report_id: String,
    pub work_id: String,                  // 工作项（必填）
    pub work_category_id: Option<String>, // 工作项所属分类（冗余存储）
    pub time_from: f64,                   // 开始时间（小时）
    pub time_to: f64,                     // 结束时间（小时）
    pub time_total: f64,                  // time_to - time_from
    pub seq_no: i32,                      // 行号
}

impl ReportLine {
    pub fn new(
        line_id: String,
        report_id: String,
        work_id: String,
        work_category_id: Option<String>,
        time_from: f64,
        time_to: f64,
        seq_no: i32,
    ) -> Self {
        Self {
            line_id,
            report_id,
            work_id,
            work_category_id,
            time_from,
            time_to,
            time_total: time_to - time_from,
            seq_no,
        }
    }

    /// 转换为校验器输入
    pub fn interval(&self) -> WorkInterval {
        WorkInterval::new(self.time_from, self.time_to)
    }
}
