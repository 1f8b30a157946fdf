// ==========================================
// 施工日报系统 - 物料到货/消耗领域模型
// ==========================================
// 对齐: product_arrival / product_consumption 表
// 说明: product_id 引用外部产品目录，本系统不维护产品主数据
// ==========================================

use serde::{Deserialize, Serialize};

/// 物料到货行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductArrival {
    pub arrival_id: String,
    pub report_id: String,
    pub product_id: String,
    pub quantity: f64,       // 到货数量
    pub location_id: String, // 发货库位
}

/// 物料消耗行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConsumption {
    pub consumption_id: String,
    pub report_id: String,
    pub product_id: String,
    pub quantity: f64,  // 消耗数量
    pub write_off: f64, // 已核销数量（审批过账后回填）
}

impl ProductArrival {
    /// 是否参与过账（数量非零且产品已指定）
    pub fn is_postable(&self) -> bool {
        self.quantity != 0.0 && !self.product_id.trim().is_empty()
    }
}

impl ProductConsumption {
    /// 是否参与过账（数量非零且产品已指定）
    pub fn is_postable(&self) -> bool {
        self.quantity != 0.0 && !self.product_id.trim().is_empty()
    }
}
