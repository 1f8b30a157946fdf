// ==========================================
// 施工日报系统 - 物料到货/消耗 API
// ==========================================
// 职责: 到货行、消耗行维护；库位维护；调拨单查询
// 红线: 已批准日报不允许再变更物料行（库存已落账）
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::tx;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::movement::{ProductArrival, ProductConsumption};
use crate::domain::report::Report;
use crate::domain::stock::{StockLocation, StockPicking};
use crate::domain::types::{LocationUsage, ReportStage};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::movement_repo::MovementRepository;
use crate::repository::report_repo::ReportRepository;
use crate::repository::stock_repo::StockRepository;

// ==========================================
// 请求结构
// ==========================================

/// 到货行草稿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalDraft {
    pub product_id: String,
    pub quantity: f64,
    pub location_id: String, // 发货库位
}

/// 消耗行草稿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionDraft {
    pub product_id: String,
    pub quantity: f64,
}

fn validate_quantity(quantity: f64) -> ApiResult<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(ApiError::InvalidInput(format!("数量无效: {}", quantity)));
    }
    Ok(())
}

impl ArrivalDraft {
    pub(crate) fn into_arrival(self, report_id: &str) -> ApiResult<ProductArrival> {
        if self.product_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品ID不能为空".to_string()));
        }
        if self.location_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("发货库位不能为空".to_string()));
        }
        validate_quantity(self.quantity)?;

        Ok(ProductArrival {
            arrival_id: uuid::Uuid::new_v4().to_string(),
            report_id: report_id.to_string(),
            product_id: self.product_id,
            quantity: self.quantity,
            location_id: self.location_id,
        })
    }
}

impl ConsumptionDraft {
    pub(crate) fn into_consumption(self, report_id: &str) -> ApiResult<ProductConsumption> {
        if self.product_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品ID不能为空".to_string()));
        }
        validate_quantity(self.quantity)?;

        Ok(ProductConsumption {
            consumption_id: uuid::Uuid::new_v4().to_string(),
            report_id: report_id.to_string(),
            product_id: self.product_id,
            quantity: self.quantity,
            write_off: 0.0,
        })
    }
}

/// 读取日报并确认仍可编辑
pub(crate) fn load_editable_report(conn: &Connection, report_id: &str) -> ApiResult<Report> {
    let report = ReportRepository::find_by_id_tx(conn, report_id)?
        .ok_or_else(|| ApiError::NotFound(format!("日报(id={})不存在", report_id)))?;
    if report.stage == ReportStage::Approved {
        return Err(ApiError::BusinessRuleViolation(format!(
            "日报(id={})已批准，不允许修改",
            report_id
        )));
    }
    Ok(report)
}

// ==========================================
// MovementApi - 物料行 API
// ==========================================
pub struct MovementApi {
    conn: Arc<Mutex<Connection>>,
    movement_repo: Arc<MovementRepository>,
    stock_repo: Arc<StockRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl MovementApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        movement_repo: Arc<MovementRepository>,
        stock_repo: Arc<StockRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            conn,
            movement_repo,
            stock_repo,
            action_log_repo,
        }
    }

    /// 添加到货行
    ///
    /// # 返回
    /// - Ok(ProductArrival): 新建的到货行
    /// - Err(ApiError::BusinessRuleViolation): 日报已批准或发货库位不存在
    pub fn add_arrival(
        &self,
        report_id: &str,
        draft: ArrivalDraft,
        actor: &str,
    ) -> ApiResult<ProductArrival> {
        let arrival = draft.into_arrival(report_id)?;

        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        load_editable_report(&tx, report_id)?;

        MovementRepository::insert_arrivals_tx(&tx, std::slice::from_ref(&arrival))?;
        let log = ActionLog::new(Some(report_id.to_string()), ActionType::ChangeMovements, actor)
            .with_payload(&arrival)
            .with_detail("添加到货行");
        ActionLogRepository::insert_tx(&tx, &log)?;
        tx::commit(tx)?;

        tracing::info!(report_id, arrival_id = %arrival.arrival_id, "到货行已添加");
        Ok(arrival)
    }

    /// 添加消耗行
    pub fn add_consumption(
        &self,
        report_id: &str,
        draft: ConsumptionDraft,
        actor: &str,
    ) -> ApiResult<ProductConsumption> {
        let consumption = draft.into_consumption(report_id)?;

        let conn = tx::lock(&self.conn)?;
        let tx = tx::begin(&conn)?;
        load_editable_report(&tx, report_id)?;

        MovementRepository::insert_consumptions_tx(&tx, std::slice::from_ref(&consumption))?;
        let log = ActionLog::new(Some(report_id.to_string()), ActionType::ChangeMovements, actor)
            .with_payload(&consumption)
            .with_detail("添加消耗行");
        ActionLogRepository::insert_tx(&tx, &log)?;
        tx::commit(tx)?;

        tracing::info!(report_id, consumption_id = %consumption.consumption_id, "消耗行已添加");
        Ok(consumption)
    }

    pub fn list_arrivals(&self, report_id: &str) -> ApiResult<Vec<ProductArrival>> {
        Ok(self.movement_repo.find_arrivals(report_id)?)
    }

    pub fn list_consumptions(&self, report_id: &str) -> ApiResult<Vec<ProductConsumption>> {
        Ok(self.movement_repo.find_consumptions(report_id)?)
    }

    /// 查询日报审批时生成的调拨单
    pub fn list_pickings(&self, report_id: &str) -> ApiResult<Vec<StockPicking>> {
        Ok(self.stock_repo.find_pickings_by_report(report_id)?)
    }

    /// 设置调拨单运输车辆
    pub fn set_picking_transport(
        &self,
        picking_id: &str,
        transport: Option<&str>,
        actor: &str,
    ) -> ApiResult<()> {
        let transport = transport.map(str::trim).filter(|t| !t.is_empty());
        self.stock_repo.set_transport(picking_id, transport)?;

        let log = ActionLog::new(None, ActionType::ChangeMovements, actor)
            .with_payload(&serde_json::json!({ "picking_id": picking_id, "transport": transport }))
            .with_detail("设置运输车辆");
        self.action_log_repo.insert(&log)?;
        Ok(())
    }

    // ==========================================
    // 库位
    // ==========================================

    pub fn list_locations(&self) -> ApiResult<Vec<StockLocation>> {
        Ok(self.stock_repo.list_locations()?)
    }

    /// 新建库位
    pub fn create_location(
        &self,
        location_id: &str,
        name: &str,
        usage: LocationUsage,
        actor: &str,
    ) -> ApiResult<StockLocation> {
        if location_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("库位ID不能为空".to_string()));
        }
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("库位名称不能为空".to_string()));
        }

        let location = StockLocation {
            location_id: location_id.trim().to_string(),
            name: name.trim().to_string(),
            usage,
        };
        self.stock_repo.insert_location(&location)?;

        let log = ActionLog::new(None, ActionType::MaintainCatalog, actor)
            .with_payload(&location)
            .with_detail("新建库位");
        self.action_log_repo.insert(&log)?;

        tracing::info!(location_id = %location.location_id, "库位已创建");
        Ok(location)
    }
}
