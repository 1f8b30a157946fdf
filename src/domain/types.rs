// ==========================================
// 施工日报系统 - 领域类型定义
// ==========================================
// 职责: 报告阶段、天气、库位用途、调拨类型等封闭枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 报告阶段 (Report Stage)
// ==========================================
// 顺序: New < Review < Approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStage {
    New,      // 新建
    Review,   // 待审批
    Approved, // 已审批
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReportStage {
    /// 全部阶段（按看板顺序）
    pub const ALL: [ReportStage; 3] = [ReportStage::New, ReportStage::Review, ReportStage::Approved];

    /// 从字符串解析阶段
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NEW" => Some(ReportStage::New),
            "REVIEW" => Some(ReportStage::Review),
            "APPROVED" => Some(ReportStage::Approved),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReportStage::New => "NEW",
            ReportStage::Review => "REVIEW",
            ReportStage::Approved => "APPROVED",
        }
    }

    /// 看板排序号
    pub fn sequence(&self) -> i32 {
        match self {
            ReportStage::New => 1,
            ReportStage::Review => 2,
            ReportStage::Approved => 3,
        }
    }

    /// 看板中是否折叠（已审批列默认折叠）
    pub fn is_folded(&self) -> bool {
        matches!(self, ReportStage::Approved)
    }

    /// 本地化阶段名称
    pub fn display_name(&self) -> String {
        let key = match self {
            ReportStage::New => "stage.new",
            ReportStage::Review => "stage.review",
            ReportStage::Approved => "stage.approved",
        };
        crate::i18n::t(key)
    }
}

// ==========================================
// 天气状况 (Weather Conditions)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCondition {
    Sunny,        // 晴
    PartlyCloudy, // 多云
    Rain,         // 雨
    Snow,         // 雪
    Fog,          // 雾
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl WeatherCondition {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SUNNY" => Some(WeatherCondition::Sunny),
            "PARTLY_CLOUDY" => Some(WeatherCondition::PartlyCloudy),
            "RAIN" => Some(WeatherCondition::Rain),
            "SNOW" => Some(WeatherCondition::Snow),
            "FOG" => Some(WeatherCondition::Fog),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            WeatherCondition::Sunny => "SUNNY",
            WeatherCondition::PartlyCloudy => "PARTLY_CLOUDY",
            WeatherCondition::Rain => "RAIN",
            WeatherCondition::Snow => "SNOW",
            WeatherCondition::Fog => "FOG",
        }
    }

    pub fn display_name(&self) -> String {
        let key = match self {
            WeatherCondition::Sunny => "weather.sunny",
            WeatherCondition::PartlyCloudy => "weather.partly_cloudy",
            WeatherCondition::Rain => "weather.rain",
            WeatherCondition::Snow => "weather.snow",
            WeatherCondition::Fog => "weather.fog",
        };
        crate::i18n::t(key)
    }
}

// ==========================================
// 库位用途 (Location Usage)
// ==========================================
// Construction 为施工现场库位（本模块新增的用途）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationUsage {
    Supplier,     // 供应商
    Internal,     // 内部库位
    Customer,     // 客户
    Transit,      // 在途
    Construction, // 施工现场
}

impl fmt::Display for LocationUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl LocationUsage {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SUPPLIER" => Some(LocationUsage::Supplier),
            "INTERNAL" => Some(LocationUsage::Internal),
            "CUSTOMER" => Some(LocationUsage::Customer),
            "TRANSIT" => Some(LocationUsage::Transit),
            "CONSTRUCTION" => Some(LocationUsage::Construction),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LocationUsage::Supplier => "SUPPLIER",
            LocationUsage::Internal => "INTERNAL",
            LocationUsage::Customer => "CUSTOMER",
            LocationUsage::Transit => "TRANSIT",
            LocationUsage::Construction => "CONSTRUCTION",
        }
    }
}

// ==========================================
// 调拨类型代码 (Picking Type Code)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickingTypeCode {
    Incoming,     // 入库
    Outgoing,     // 出库
    Internal,     // 内部调拨
    Construction, // 施工核销
}

impl PickingTypeCode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INCOMING" => Some(PickingTypeCode::Incoming),
            "OUTGOING" => Some(PickingTypeCode::Outgoing),
            "INTERNAL" => Some(PickingTypeCode::Internal),
            "CONSTRUCTION" => Some(PickingTypeCode::Construction),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PickingTypeCode::Incoming => "INCOMING",
            PickingTypeCode::Outgoing => "OUTGOING",
            PickingTypeCode::Internal => "INTERNAL",
            PickingTypeCode::Construction => "CONSTRUCTION",
        }
    }
}

// ==========================================
// 调拨单状态 (Picking State)
// ==========================================
// 流转: Draft -> Confirmed -> Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickingState {
    Draft,     // 草稿
    Confirmed, // 已确认
    Done,      // 已完成
}

impl fmt::Display for PickingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PickingState {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Some(PickingState::Draft),
            "CONFIRMED" => Some(PickingState::Confirmed),
            "DONE" => Some(PickingState::Done),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PickingState::Draft => "DRAFT",
            PickingState::Confirmed => "CONFIRMED",
            PickingState::Done => "DONE",
        }
    }
}
