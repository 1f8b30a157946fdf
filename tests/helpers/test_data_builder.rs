// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use construction_report::api::{ArrivalDraft, ConsumptionDraft, ReportDraft, WorkLineDraft};

/// 按 (开始, 结束) 生成工作行
pub fn lines(work_id: &str, spans: &[(f64, f64)]) -> Vec<WorkLineDraft> {
    spans
        .iter()
        .map(|(from, to)| WorkLineDraft::new(work_id, *from, *to))
        .collect()
}

/// 三班倒覆盖全天
pub fn full_day_lines(work_id: &str) -> Vec<WorkLineDraft> {
    lines(work_id, &[(0.0, 8.0), (8.0, 16.0), (16.0, 24.0)])
}

// ==========================================
// ReportDraft 构建器
// ==========================================

pub struct ReportDraftBuilder {
    draft: ReportDraft,
}

impl ReportDraftBuilder {
    pub fn new(work_id: &str) -> Self {
        Self {
            draft: ReportDraft {
                report_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                responsible_user: "foreman".to_string(),
                work_lines: full_day_lines(work_id),
                ..Default::default()
            },
        }
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.draft.report_date = Some(date);
        self
    }

    pub fn work_lines(mut self, lines: Vec<WorkLineDraft>) -> Self {
        self.draft.work_lines = lines;
        self
    }

    pub fn arrival(mut self, product_id: &str, quantity: f64, location_id: &str) -> Self {
        self.draft.arrivals.push(ArrivalDraft {
            product_id: product_id.to_string(),
            quantity,
            location_id: location_id.to_string(),
        });
        self
    }

    pub fn consumption(mut self, product_id: &str, quantity: f64) -> Self {
        self.draft.consumptions.push(ConsumptionDraft {
            product_id: product_id.to_string(),
            quantity,
        });
        self
    }

    pub fn build(self) -> ReportDraft {
        self.draft
    }
}
