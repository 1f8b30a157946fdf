// ==========================================
// 施工日报系统 - 库存调拨领域模型
// ==========================================
// 对齐: stock_location / stock_picking_type / stock_picking / stock_move 表
// 说明: 仅记录审批过账结果，不实现预留、计价等库存引擎能力
// ==========================================

use crate::domain::types::{LocationUsage, PickingState, PickingTypeCode};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 库位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLocation {
    pub location_id: String,
    pub name: String,
    pub usage: LocationUsage,
}

/// 调拨类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickingType {
    pub picking_type_id: String,
    pub name: String,
    pub code: PickingTypeCode,
}

/// 调拨单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPicking {
    pub picking_id: String,
    pub picking_type_id: String,
    pub report_id: Option<String>,
    pub location_id: String,
    pub location_dest_id: String,
    pub state: PickingState,
    pub transport: Option<String>, // 运输车辆
    pub created_at: NaiveDateTime,
    pub moves: Vec<StockMove>,
}

/// 库存移动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMove {
    pub move_id: String,
    pub picking_id: String,
    pub product_id: String,
    pub product_uom_qty: f64, // 需求数量
    pub quantity_done: f64,   // 完成数量
    pub location_id: String,
    pub location_dest_id: String,
    pub name: String,
    pub consumption_id: Option<String>, // 来源消耗行
}

// ==========================================
// 过账草稿（由过账规划器生成，交由 StockLedger 落账）
// ==========================================

/// 调拨单草稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickingDraft {
    pub picking_type_id: String,
    pub report_id: String,
    pub location_id: String,
    pub location_dest_id: String,
    pub moves: Vec<MoveDraft>,
}

/// 库存移动草稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDraft {
    pub product_id: String,
    pub product_uom_qty: f64,
    pub location_id: String,
    pub location_dest_id: String,
    pub name: String,
    pub consumption_id: Option<String>,
}
