// ==========================================
// 施工日报系统 - 工作目录 API
// ==========================================
// 职责: 工作分类、工作项、施工对象的维护与查询
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::catalog::{ConstructionObject, ConstructionWork, WorkCategory};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::catalog_repo::{CatalogRepository, CategoryWorkCount};

/// 分类下的工作项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWorks {
    pub category: WorkCategory,
    pub works: Vec<ConstructionWork>,
    /// 在该视图中新建工作项时默认使用的分类
    pub default_category_id: String,
}

// ==========================================
// CatalogApi - 工作目录 API
// ==========================================
pub struct CatalogApi {
    catalog_repo: Arc<CatalogRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl CatalogApi {
    pub fn new(
        catalog_repo: Arc<CatalogRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            catalog_repo,
            action_log_repo,
        }
    }

    // ==========================================
    // 工作分类
    // ==========================================

    /// 新建工作分类
    pub fn create_category(&self, name: &str, actor: &str) -> ApiResult<WorkCategory> {
        let name = required(name, "分类名称")?;
        let category = WorkCategory {
            category_id: uuid::Uuid::new_v4().to_string(),
            name,
        };
        self.catalog_repo.insert_category(&category)?;
        self.log(actor, &category, "新建工作分类")?;

        tracing::info!(category_id = %category.category_id, "工作分类已创建");
        Ok(category)
    }

    /// 查询全部分类及工作项数量
    pub fn list_categories(&self) -> ApiResult<Vec<CategoryWorkCount>> {
        Ok(self.catalog_repo.list_categories_with_count()?)
    }

    /// 打开分类下的工作项
    ///
    /// # 返回
    /// - Ok(CategoryWorks): 工作项列表，以及新建工作项时的默认分类
    /// - Err(ApiError::NotFound): 分类不存在
    pub fn list_works_in_category(&self, category_id: &str) -> ApiResult<CategoryWorks> {
        let category = self
            .catalog_repo
            .find_category(category_id)?
            .ok_or_else(|| ApiError::NotFound(format!("工作分类(id={})不存在", category_id)))?;
        let works = self.catalog_repo.find_works_by_category(category_id)?;

        Ok(CategoryWorks {
            default_category_id: category.category_id.clone(),
            category,
            works,
        })
    }

    // ==========================================
    // 工作项
    // ==========================================

    /// 新建工作项
    pub fn create_work(
        &self,
        name: &str,
        description: Option<&str>,
        category_id: Option<&str>,
        actor: &str,
    ) -> ApiResult<ConstructionWork> {
        let name = required(name, "工作项名称")?;

        let category_id = category_id.map(str::trim).filter(|c| !c.is_empty());
        if let Some(id) = category_id {
            if self.catalog_repo.find_category(id)?.is_none() {
                return Err(ApiError::NotFound(format!("工作分类(id={})不存在", id)));
            }
        }

        let work = ConstructionWork {
            work_id: uuid::Uuid::new_v4().to_string(),
            name,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            category_id: category_id.map(str::to_string),
        };
        self.catalog_repo.insert_work(&work)?;
        self.log(actor, &work, "新建工作项")?;

        tracing::info!(work_id = %work.work_id, "工作项已创建");
        Ok(work)
    }

    pub fn get_work(&self, work_id: &str) -> ApiResult<ConstructionWork> {
        self.catalog_repo
            .find_work(work_id)?
            .ok_or_else(|| ApiError::NotFound(format!("工作项(id={})不存在", work_id)))
    }

    pub fn list_works(&self) -> ApiResult<Vec<ConstructionWork>> {
        Ok(self.catalog_repo.list_works()?)
    }

    // ==========================================
    // 施工对象
    // ==========================================

    pub fn create_object(&self, name: &str, actor: &str) -> ApiResult<ConstructionObject> {
        let name = required(name, "施工对象名称")?;
        let object = ConstructionObject {
            object_id: uuid::Uuid::new_v4().to_string(),
            name,
        };
        self.catalog_repo.insert_object(&object)?;
        self.log(actor, &object, "新建施工对象")?;
        Ok(object)
    }

    pub fn list_objects(&self) -> ApiResult<Vec<ConstructionObject>> {
        Ok(self.catalog_repo.list_objects()?)
    }

    fn log<T: Serialize>(&self, actor: &str, payload: &T, detail: &str) -> ApiResult<()> {
        let log = ActionLog::new(None, ActionType::MaintainCatalog, actor)
            .with_payload(payload)
            .with_detail(detail);
        self.action_log_repo.insert(&log)?;
        Ok(())
    }
}

fn required(value: &str, field: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(trimmed.to_string())
}
