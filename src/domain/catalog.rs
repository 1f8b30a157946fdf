// ==========================================
// 施工日报系统 - 工作目录领域模型
// ==========================================
// 对齐: construction_category / construction_work / construction_object 表
// ==========================================

use serde::{Deserialize, Serialize};

/// 工作分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCategory {
    pub category_id: String,
    pub name: String,
}

/// 工作项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionWork {
    pub work_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
}

/// 施工对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionObject {
    pub object_id: String,
    pub name: String,
}
