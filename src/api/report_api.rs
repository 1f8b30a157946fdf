// ==========================================
// 施工日报系统 - 施工日报 API
// ==========================================
// 职责: 日报创建、工作行维护、表头维护、阶段流转、审批过账
// 红线: 每次工作行变更都在同一事务内对全部工作行做 24 小时覆盖校验，
//       校验失败则整体回滚
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::movement_api::{load_editable_report, ArrivalDraft, ConsumptionDraft};
use crate::api::tx;
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::movement::{ProductArrival, ProductConsumption};
use crate::domain::report::{Report, ReportLine};
use crate::domain::types::{ReportStage, WeatherCondition};
use crate::engine::coverage::DailyCoverageValidator;
use crate::engine::stage::{StageAction, StageWorkflow};
use crate::engine::stock_posting::{PostingOutcome, StockPostingPlanner};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::movement_repo::MovementRepository;
use crate::repository::report_repo::ReportRepository;
use crate::repository::stock_repo::SqliteStockLedger;

// ==========================================
// 请求 / 响应结构
// ==========================================

/// 工作行草稿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkLineDraft {
    pub work_id: String,
    pub time_from: f64,
    pub time_to: f64,
}

impl WorkLineDraft {
    pub fn new(work_id: impl Into<String>, time_from: f64, time_to: f64) -> Self {
        Self {
            work_id: work_id.into(),
            time_from,
            time_to,
        }
    }
}

/// 新建日报请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportDraft {
    /// 报告日期（缺省为调用当天）
    pub report_date: Option<NaiveDate>,
    pub responsible_user: String,
    pub weather: Option<WeatherCondition>,
    pub customer: Option<String>,
    pub construction_object_id: Option<String>,
    pub work_lines: Vec<WorkLineDraft>,
    pub arrivals: Vec<ArrivalDraft>,
    pub consumptions: Vec<ConsumptionDraft>,
}

/// 表头修改请求（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportHeaderUpdate {
    pub report_date: Option<NaiveDate>,
    pub responsible_user: Option<String>,
    pub weather: Option<WeatherCondition>,
    pub customer: Option<String>,
    pub construction_object_id: Option<String>,
}

/// 工作行视图（附带日报日期）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLineView {
    #[serde(flatten)]
    pub line: ReportLine,
    pub date: NaiveDate,
}

/// 日报详情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetail {
    pub report: Report,
    pub display_name: String,
    pub lines: Vec<ReportLineView>,
    pub arrivals: Vec<ProductArrival>,
    pub consumptions: Vec<ProductConsumption>,
    pub available_actions: Vec<StageAction>,
}

/// 审批结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResult {
    pub report: Report,
    pub posting: PostingOutcome,
}

// ==========================================
// ReportApi - 施工日报 API
// ==========================================

/// 施工日报API
///
/// 职责：
/// 1. 日报创建（表头 + 工作行 + 物料行，单事务）
/// 2. 工作行增删改（事务内覆盖校验）
/// 3. 阶段流转（提交审批、审批）
/// 4. 审批过账（生成调拨单，回填核销数量）
/// 5. ActionLog记录
pub struct ReportApi {
    conn: Arc<Mutex<Connection>>,
    report_repo: Arc<ReportRepository>,
    config_manager: Arc<ConfigManager>,
    validator: DailyCoverageValidator,
    workflow: StageWorkflow,
}

impl ReportApi {
    /// 创建新的ReportApi实例
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        report_repo: Arc<ReportRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            report_repo,
            config_manager,
            validator: DailyCoverageValidator::new(),
            workflow: StageWorkflow::new(),
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询日报详情
    pub fn get_report(&self, report_id: &str) -> ApiResult<ReportDetail> {
        let conn = tx::lock(&self.conn)?;
        self.load_detail(&conn, report_id)
    }

    /// 查询全部日报（按日期倒序）
    pub fn list_reports(&self) -> ApiResult<Vec<Report>> {
        Ok(self.report_repo.list_all()?)
    }

    /// 按阶段查询日报
    pub fn list_reports_by_stage(&self, stage: ReportStage) -> ApiResult<Vec<Report>> {
        Ok(self.report_repo.find_by_stage(stage)?)
    }

    /// 日报显示名称（按当前语言）
    pub fn display_name(&self, report_id: &str) -> ApiResult<String> {
        let report = self
            .report_repo
            .find_by_id(report_id)?
            .ok_or_else(|| ApiError::NotFound(format!("日报(id={})不存在", report_id)))?;
        Ok(report.display_name())
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建日报
    ///
    /// # 参数
    /// - draft: 日报草稿（有工作行时必须恰好覆盖 24 小时）
    /// - actor: 操作人
    ///
    /// # 返回
    /// - Ok(ReportDetail): 创建后的日报
    /// - Err(ApiError::CoverageViolation): 工作行未通过覆盖校验，不落库（无工作行时不校验）
    pub fn create_report(&self, draft: ReportDraft, actor: &str) -> ApiResult<ReportDetail> {
        if draft.responsible_user.trim().is_empty() {
            return Err(ApiError::InvalidInput("负责人不能为空".to_string()));
        }

        let report_id = uuid::Uuid::new_v4().to_string();
        let report_date = draft
            .report_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let arrivals = draft
            .arrivals
            .into_iter()
            .map(|a| a.into_arrival(&report_id))
            .collect::<ApiResult<Vec<_>>>()?;
        let consumptions = draft
            .consumptions
            .into_iter()
            .map(|c| c.into_consumption(&report_id))
            .collect::<ApiResult<Vec<_>>>()?;

        let mut report = Report::new(
            report_id.clone(),
            report_date,
            draft.responsible_user.trim().to_string(),
        );
        report.weather = draft.weather;
        report.customer = non_blank(draft.customer);
        report.construction_object_id = non_blank(draft.construction_object_id);

        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;

        ReportRepository::insert_report_tx(&tx, &report)?;
        let lines = draft
            .work_lines
            .iter()
            .enumerate()
            .map(|(idx, line)| build_line(&tx, &report_id, line, idx as i32 + 1))
            .collect::<ApiResult<Vec<_>>>()?;
        ReportRepository::insert_lines_tx(&tx, &lines)?;
        MovementRepository::insert_arrivals_tx(&tx, &arrivals)?;
        MovementRepository::insert_consumptions_tx(&tx, &consumptions)?;

        let total = self.check_written_lines(&tx, &report_id)?;

        let log = ActionLog::new(Some(report_id.clone()), ActionType::CreateReport, actor)
            .with_payload(&serde_json::json!({
                "report_date": report_date,
                "lines": lines.len(),
                "arrivals": arrivals.len(),
                "consumptions": consumptions.len(),
                "time_total_hours": total,
            }))
            .with_detail("创建日报");
        ActionLogRepository::insert_tx(&tx, &log)?;

        let detail = self.load_detail(&tx, &report_id)?;
        tx::commit(tx)?;

        tracing::info!(report_id = %report_id, lines = lines.len(), "日报已创建");
        Ok(detail)
    }

    // ==========================================
    // 工作行维护
    // ==========================================

    /// 添加工作行
    pub fn add_work_line(
        &self,
        report_id: &str,
        line: WorkLineDraft,
        actor: &str,
    ) -> ApiResult<ReportDetail> {
        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        load_editable_report(&tx, report_id)?;

        let seq_no = ReportRepository::max_seq_no_tx(&tx, report_id)? + 1;
        let new_line = build_line(&tx, report_id, &line, seq_no)?;
        ReportRepository::insert_lines_tx(&tx, std::slice::from_ref(&new_line))?;

        let total = self.check_written_lines(&tx, report_id)?;
        self.log_line_change(&tx, report_id, actor, "添加工作行", total)?;

        let detail = self.load_detail(&tx, report_id)?;
        tx::commit(tx)?;

        tracing::info!(report_id, line_id = %new_line.line_id, "工作行已添加");
        Ok(detail)
    }

    /// 删除工作行
    pub fn remove_work_line(
        &self,
        report_id: &str,
        line_id: &str,
        actor: &str,
    ) -> ApiResult<ReportDetail> {
        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        load_editable_report(&tx, report_id)?;

        ReportRepository::delete_line_tx(&tx, report_id, line_id)?;

        let total = self.check_written_lines(&tx, report_id)?;
        self.log_line_change(&tx, report_id, actor, "删除工作行", total)?;

        let detail = self.load_detail(&tx, report_id)?;
        tx::commit(tx)?;

        tracing::info!(report_id, line_id, "工作行已删除");
        Ok(detail)
    }

    /// 整体替换工作行
    ///
    /// 新集合未通过覆盖校验时原工作行保持不变
    pub fn replace_work_lines(
        &self,
        report_id: &str,
        lines: Vec<WorkLineDraft>,
        actor: &str,
    ) -> ApiResult<ReportDetail> {
        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        load_editable_report(&tx, report_id)?;

        ReportRepository::delete_lines_tx(&tx, report_id)?;
        let new_lines = lines
            .iter()
            .enumerate()
            .map(|(idx, line)| build_line(&tx, report_id, line, idx as i32 + 1))
            .collect::<ApiResult<Vec<_>>>()?;
        ReportRepository::insert_lines_tx(&tx, &new_lines)?;

        let total = self.check_written_lines(&tx, report_id)?;
        self.log_line_change(&tx, report_id, actor, "替换工作行", total)?;

        let detail = self.load_detail(&tx, report_id)?;
        tx::commit(tx)?;

        tracing::info!(report_id, lines = new_lines.len(), "工作行已替换");
        Ok(detail)
    }

    // ==========================================
    // 表头维护
    // ==========================================

    /// 修改日报表头
    pub fn update_report_header(
        &self,
        report_id: &str,
        update: ReportHeaderUpdate,
        actor: &str,
    ) -> ApiResult<Report> {
        if let Some(user) = &update.responsible_user {
            if user.trim().is_empty() {
                return Err(ApiError::InvalidInput("负责人不能为空".to_string()));
            }
        }

        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        let mut report = load_editable_report(&tx, report_id)?;

        if let Some(date) = update.report_date {
            report.report_date = date;
        }
        if let Some(user) = &update.responsible_user {
            report.responsible_user = user.trim().to_string();
        }
        if update.weather.is_some() {
            report.weather = update.weather;
        }
        if update.customer.is_some() {
            report.customer = non_blank(update.customer.clone());
        }
        if update.construction_object_id.is_some() {
            report.construction_object_id = non_blank(update.construction_object_id.clone());
        }
        report.updated_at = chrono::Local::now().naive_local();

        ReportRepository::update_header_tx(&tx, &report)?;
        let log = ActionLog::new(Some(report_id.to_string()), ActionType::UpdateReportHeader, actor)
            .with_payload(&update)
            .with_detail("修改表头");
        ActionLogRepository::insert_tx(&tx, &log)?;
        tx::commit(tx)?;

        tracing::info!(report_id, "日报表头已修改");
        Ok(report)
    }

    // ==========================================
    // 阶段流转
    // ==========================================

    /// 提交审批（New -> Review；已在 Review 时为幂等操作）
    pub fn submit_for_approval(&self, report_id: &str, actor: &str) -> ApiResult<Report> {
        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        let mut report = self.load_report(&tx, report_id)?;

        let next = self
            .workflow
            .transition(report.stage, StageAction::SubmitForApproval)?;
        if next == report.stage {
            tracing::info!(report_id, "日报已在审核中，重复提交不做变更");
            return Ok(report);
        }
        // 提交审批要求工时已完整填报（空工作行同样拒绝）
        self.check_coverage(&tx, report_id)?;

        let now = chrono::Local::now().naive_local();
        ReportRepository::update_stage_tx(&tx, report_id, next, now)?;
        self.log_stage_change(&tx, &report, next, actor)?;
        tx::commit(tx)?;

        tracing::info!(report_id, from = %report.stage, to = %next, "日报已提交审批");
        report.stage = next;
        report.updated_at = now;
        Ok(report)
    }

    /// 审批通过
    ///
    /// 同一事务内: 消耗行/到货行生成调拨单并落账 -> 回填核销数量 -> 阶段置为 Approved
    pub fn approve(&self, report_id: &str, actor: &str) -> ApiResult<ApprovalResult> {
        // 配置与日报共用连接，必须在加锁前读取
        let settings = self.config_manager.stock_posting_settings()?;
        let planner = StockPostingPlanner::new(settings);

        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        let mut report = self.load_report(&tx, report_id)?;

        let next = self.workflow.transition(report.stage, StageAction::Approve)?;

        let consumptions = MovementRepository::find_consumptions_tx(&tx, report_id)?;
        let arrivals = MovementRepository::find_arrivals_tx(&tx, report_id)?;

        let ledger = SqliteStockLedger::new(&tx);
        let posting = planner.post_report(&ledger, report_id, &consumptions, &arrivals)?;
        MovementRepository::update_write_offs_tx(&tx, &posting.write_offs)?;

        let now = chrono::Local::now().naive_local();
        ReportRepository::update_stage_tx(&tx, report_id, next, now)?;

        let picking_ids: Vec<&str> = posting
            .consumption_picking
            .iter()
            .chain(posting.arrival_pickings.iter())
            .map(|p| p.picking_id.as_str())
            .collect();
        let log = ActionLog::new(Some(report_id.to_string()), ActionType::PostPicking, actor)
            .with_payload(&serde_json::json!({
                "picking_ids": picking_ids,
                "write_offs": posting.write_offs.len(),
            }))
            .with_detail("审批过账");
        ActionLogRepository::insert_tx(&tx, &log)?;
        self.log_stage_change(&tx, &report, next, actor)?;
        tx::commit(tx)?;

        tracing::info!(
            report_id,
            pickings = posting.picking_count(),
            "日报已审批"
        );
        report.stage = next;
        report.updated_at = now;
        Ok(ApprovalResult { report, posting })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load_report(&self, conn: &Connection, report_id: &str) -> ApiResult<Report> {
        ReportRepository::find_by_id_tx(conn, report_id)?
            .ok_or_else(|| ApiError::NotFound(format!("日报(id={})不存在", report_id)))
    }

    fn load_detail(&self, conn: &Connection, report_id: &str) -> ApiResult<ReportDetail> {
        let report = self.load_report(conn, report_id)?;
        let lines = ReportRepository::find_lines_tx(conn, report_id)?
            .into_iter()
            .map(|line| ReportLineView {
                line,
                date: report.report_date,
            })
            .collect();

        Ok(ReportDetail {
            display_name: report.display_name(),
            available_actions: self.workflow.available_actions(report.stage),
            arrivals: MovementRepository::find_arrivals_tx(conn, report_id)?,
            consumptions: MovementRepository::find_consumptions_tx(conn, report_id)?,
            lines,
            report,
        })
    }

    /// 工作行写入后的覆盖校验
    ///
    /// 工作行为空视为尚未填报工时，不做校验；否则必须恰好覆盖 24 小时
    fn check_written_lines(&self, conn: &Connection, report_id: &str) -> ApiResult<f64> {
        if ReportRepository::find_lines_tx(conn, report_id)?.is_empty() {
            ReportRepository::update_time_total_tx(
                conn,
                report_id,
                0.0,
                chrono::Local::now().naive_local(),
            )?;
            tracing::debug!(report_id, "日报暂无工作行，跳过覆盖校验");
            return Ok(0.0);
        }
        self.check_coverage(conn, report_id)
    }

    /// 对日报当前全部工作行做覆盖校验，通过后回写工时汇总
    fn check_coverage(&self, conn: &Connection, report_id: &str) -> ApiResult<f64> {
        let lines = ReportRepository::find_lines_tx(conn, report_id)?;
        if let Err(e) = self.validator.validate_lines(&lines) {
            tracing::warn!(report_id, kind = %e.kind(), error = %e, "工作行未通过覆盖校验");
            return Err(e.into());
        }

        let total = Report::sum_line_hours(&lines);
        ReportRepository::update_time_total_tx(
            conn,
            report_id,
            total,
            chrono::Local::now().naive_local(),
        )?;
        Ok(total)
    }

    fn log_line_change(
        &self,
        conn: &Connection,
        report_id: &str,
        actor: &str,
        detail: &str,
        total: f64,
    ) -> ApiResult<()> {
        let log = ActionLog::new(Some(report_id.to_string()), ActionType::ChangeWorkLines, actor)
            .with_payload(&serde_json::json!({ "time_total_hours": total }))
            .with_detail(detail);
        ActionLogRepository::insert_tx(conn, &log)?;
        Ok(())
    }

    fn log_stage_change(
        &self,
        conn: &Connection,
        report: &Report,
        next: ReportStage,
        actor: &str,
    ) -> ApiResult<()> {
        let log = ActionLog::new(Some(report.report_id.clone()), ActionType::StageChange, actor)
            .with_payload(&serde_json::json!({
                "from": report.stage.to_db_str(),
                "to": next.to_db_str(),
            }))
            .with_detail(format!("{} -> {}", report.stage, next));
        ActionLogRepository::insert_tx(conn, &log)?;
        Ok(())
    }
}

/// 构造工作行（工作项所属分类冗余写入行）
fn build_line(
    conn: &Connection,
    report_id: &str,
    draft: &WorkLineDraft,
    seq_no: i32,
) -> ApiResult<ReportLine> {
    if draft.work_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("工作项不能为空".to_string()));
    }
    let work = CatalogRepository::find_work_tx(conn, &draft.work_id)?
        .ok_or_else(|| ApiError::NotFound(format!("工作项(id={})不存在", draft.work_id)))?;

    Ok(ReportLine::new(
        uuid::Uuid::new_v4().to_string(),
        report_id.to_string(),
        work.work_id,
        work.category_id,
        draft.time_from,
        draft.time_to,
        seq_no,
    ))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
