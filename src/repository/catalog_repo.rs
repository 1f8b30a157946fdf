// ==========================================
// 施工日报系统 - 工作目录数据仓储
// ==========================================
// 对齐: construction_category / construction_work / construction_object 表
// ==========================================

use crate::domain::catalog::{ConstructionObject, ConstructionWork, WorkCategory};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 分类及其工作项数量
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWorkCount {
    pub category: WorkCategory,
    pub works_count: i64,
}

// ==========================================
// CatalogRepository - 工作目录仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_work(row: &Row<'_>) -> SqliteResult<ConstructionWork> {
        Ok(ConstructionWork {
            work_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category_id: row.get(3)?,
        })
    }

    // ==========================================
    // 工作分类
    // ==========================================

    pub fn insert_category(&self, category: &WorkCategory) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO construction_category (category_id, name) VALUES (?1, ?2)",
            params![category.category_id, category.name],
        )?;
        Ok(())
    }

    pub fn find_category(&self, category_id: &str) -> RepositoryResult<Option<WorkCategory>> {
        let conn = self.get_conn()?;
        let category = conn
            .query_row(
                "SELECT category_id, name FROM construction_category WHERE category_id = ?1",
                params![category_id],
                |row| {
                    Ok(WorkCategory {
                        category_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    /// 查询全部分类及其工作项数量
    pub fn list_categories_with_count(&self) -> RepositoryResult<Vec<CategoryWorkCount>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.category_id, c.name, COUNT(w.work_id)
            FROM construction_category c
            LEFT JOIN construction_work w ON w.category_id = c.category_id
            GROUP BY c.category_id, c.name
            ORDER BY c.name
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryWorkCount {
                    category: WorkCategory {
                        category_id: row.get(0)?,
                        name: row.get(1)?,
                    },
                    works_count: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 工作项
    // ==========================================

    pub fn insert_work(&self, work: &ConstructionWork) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO construction_work (work_id, name, description, category_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![work.work_id, work.name, work.description, work.category_id],
        )?;
        Ok(())
    }

    /// 事务内查询工作项（工作行写入时回填分类）
    pub fn find_work_tx(conn: &Connection, work_id: &str) -> RepositoryResult<Option<ConstructionWork>> {
        let work = conn
            .query_row(
                "SELECT work_id, name, description, category_id FROM construction_work WHERE work_id = ?1",
                params![work_id],
                Self::map_work,
            )
            .optional()?;
        Ok(work)
    }

    pub fn find_work(&self, work_id: &str) -> RepositoryResult<Option<ConstructionWork>> {
        let conn = self.get_conn()?;
        Self::find_work_tx(&conn, work_id)
    }

    pub fn list_works(&self) -> RepositoryResult<Vec<ConstructionWork>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT work_id, name, description, category_id FROM construction_work ORDER BY name",
        )?;
        let works = stmt
            .query_map([], Self::map_work)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(works)
    }

    pub fn find_works_by_category(&self, category_id: &str) -> RepositoryResult<Vec<ConstructionWork>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT work_id, name, description, category_id
            FROM construction_work
            WHERE category_id = ?1
            ORDER BY name
            "#,
        )?;
        let works = stmt
            .query_map(params![category_id], Self::map_work)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(works)
    }

    // ==========================================
    // 施工对象
    // ==========================================

    pub fn insert_object(&self, object: &ConstructionObject) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO construction_object (object_id, name) VALUES (?1, ?2)",
            params![object.object_id, object.name],
        )?;
        Ok(())
    }

    pub fn list_objects(&self) -> RepositoryResult<Vec<ConstructionObject>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT object_id, name FROM construction_object ORDER BY name")?;
        let objects = stmt
            .query_map([], |row| {
                Ok(ConstructionObject {
                    object_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(objects)
    }
}
