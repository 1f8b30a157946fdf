// ==========================================
// 施工日报系统 - 审批过账引擎
// ==========================================
// 职责: 日报审批时，将物料消耗/到货行转换为调拨单并落账
// 说明: 库存子系统是外部协作方，通过 StockLedger trait 接入
// ==========================================
// 消耗: 仓库库位 -> 施工现场库位，一张调拨单
// 到货: 发货库位 -> 仓库库位，按发货库位分单
// ==========================================

use crate::domain::movement::{ProductArrival, ProductConsumption};
use crate::domain::stock::{MoveDraft, PickingDraft, StockPicking};
use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

// ==========================================
// StockLedger - 库存落账接口
// ==========================================

/// 库存落账接口
///
/// 实现方负责创建调拨单、确认、回填完成数量并验证完成
pub trait StockLedger {
    fn post_picking(&self, draft: &PickingDraft) -> RepositoryResult<StockPicking>;
}

/// 过账参数（来自配置）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPostingSettings {
    pub source_location_id: String,       // 仓库库位
    pub construction_location_id: String, // 施工现场库位
    pub picking_type_id: String,          // 核销调拨类型
    pub move_name: String,                // 库存移动名称
}

/// 过账结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingOutcome {
    pub consumption_picking: Option<StockPicking>,
    pub arrival_pickings: Vec<StockPicking>,
    /// (consumption_id, write_off)
    pub write_offs: Vec<(String, f64)>,
}

impl PostingOutcome {
    pub fn picking_count(&self) -> usize {
        self.arrival_pickings.len() + usize::from(self.consumption_picking.is_some())
    }
}

// ==========================================
// StockPostingPlanner - 过账规划器
// ==========================================
pub struct StockPostingPlanner {
    settings: StockPostingSettings,
}

impl StockPostingPlanner {
    pub fn new(settings: StockPostingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &StockPostingSettings {
        &self.settings
    }

    /// 规划消耗调拨单
    ///
    /// 没有可过账的消耗行时返回 None
    pub fn plan_consumption(
        &self,
        report_id: &str,
        consumptions: &[ProductConsumption],
    ) -> Option<PickingDraft> {
        let moves: Vec<MoveDraft> = consumptions
            .iter()
            .filter(|c| c.is_postable())
            .map(|c| MoveDraft {
                product_id: c.product_id.clone(),
                product_uom_qty: c.quantity,
                location_id: self.settings.source_location_id.clone(),
                location_dest_id: self.settings.construction_location_id.clone(),
                name: self.settings.move_name.clone(),
                consumption_id: Some(c.consumption_id.clone()),
            })
            .collect();

        if moves.is_empty() {
            return None;
        }

        Some(PickingDraft {
            picking_type_id: self.settings.picking_type_id.clone(),
            report_id: report_id.to_string(),
            location_id: self.settings.source_location_id.clone(),
            location_dest_id: self.settings.construction_location_id.clone(),
            moves,
        })
    }

    /// 规划到货调拨单（按发货库位分单，保持首次出现顺序）
    pub fn plan_arrivals(&self, report_id: &str, arrivals: &[ProductArrival]) -> Vec<PickingDraft> {
        let mut drafts: Vec<PickingDraft> = Vec::new();
        let mut by_location: HashMap<&str, usize> = HashMap::new();

        for arrival in arrivals.iter().filter(|a| a.is_postable()) {
            let idx = *by_location
                .entry(arrival.location_id.as_str())
                .or_insert_with(|| {
                    drafts.push(PickingDraft {
                        picking_type_id: self.settings.picking_type_id.clone(),
                        report_id: report_id.to_string(),
                        location_id: arrival.location_id.clone(),
                        location_dest_id: self.settings.source_location_id.clone(),
                        moves: Vec::new(),
                    });
                    drafts.len() - 1
                });

            drafts[idx].moves.push(MoveDraft {
                product_id: arrival.product_id.clone(),
                product_uom_qty: arrival.quantity,
                location_id: arrival.location_id.clone(),
                location_dest_id: self.settings.source_location_id.clone(),
                name: self.settings.move_name.clone(),
                consumption_id: None,
            });
        }

        drafts
    }

    /// 计算消耗行核销数量
    ///
    /// 核销数量 = 对应库存移动的需求数量；无对应移动的行为 0
    pub fn write_offs(
        consumptions: &[ProductConsumption],
        picking: Option<&StockPicking>,
    ) -> Vec<(String, f64)> {
        let qty_by_consumption: HashMap<&str, f64> = picking
            .map(|p| {
                p.moves
                    .iter()
                    .filter_map(|m| m.consumption_id.as_deref().map(|id| (id, m.product_uom_qty)))
                    .collect()
            })
            .unwrap_or_default();

        consumptions
            .iter()
            .map(|c| {
                let qty = qty_by_consumption
                    .get(c.consumption_id.as_str())
                    .copied()
                    .unwrap_or(0.0);
                (c.consumption_id.clone(), qty)
            })
            .collect()
    }

    /// 执行审批过账：先消耗，后到货
    #[instrument(skip(self, ledger, consumptions, arrivals), fields(
        consumptions = consumptions.len(),
        arrivals = arrivals.len()
    ))]
    pub fn post_report(
        &self,
        ledger: &dyn StockLedger,
        report_id: &str,
        consumptions: &[ProductConsumption],
        arrivals: &[ProductArrival],
    ) -> RepositoryResult<PostingOutcome> {
        let consumption_picking = match self.plan_consumption(report_id, consumptions) {
            Some(draft) => Some(ledger.post_picking(&draft)?),
            None => None,
        };

        let write_offs = Self::write_offs(consumptions, consumption_picking.as_ref());

        let mut arrival_pickings = Vec::new();
        for draft in self.plan_arrivals(report_id, arrivals) {
            arrival_pickings.push(ledger.post_picking(&draft)?);
        }

        let outcome = PostingOutcome {
            consumption_picking,
            arrival_pickings,
            write_offs,
        };
        tracing::info!(report_id, pickings = outcome.picking_count(), "审批过账完成");
        Ok(outcome)
    }
}
