// ==========================================
// 施工日报系统 - 日报数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（覆盖校验由 API 层在事务内调用引擎完成）
// 对齐: construction_report / construction_report_line 表
// ==========================================

use crate::domain::report::{Report, ReportLine};
use crate::domain::types::{ReportStage, WeatherCondition};
use crate::repository::error::{enum_column, RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const REPORT_COLUMNS: &str = r#"
    report_id, report_date, responsible_user, weather, customer,
    construction_object_id, stage, time_total_hours, created_at, updated_at
"#;

const LINE_COLUMNS: &str = r#"
    line_id, report_id, work_id, work_category_id,
    time_from, time_to, time_total, seq_no
"#;

// ==========================================
// ReportRepository - 日报仓储
// ==========================================
pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_report(row: &Row<'_>) -> SqliteResult<Report> {
        let weather: Option<String> = row.get(3)?;
        Ok(Report {
            report_id: row.get(0)?,
            report_date: row.get(1)?,
            responsible_user: row.get(2)?,
            weather: weather.as_deref().and_then(WeatherCondition::from_str),
            customer: row.get(4)?,
            construction_object_id: row.get(5)?,
            stage: enum_column(row, 6, ReportStage::from_str)?,
            time_total_hours: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn map_line(row: &Row<'_>) -> SqliteResult<ReportLine> {
        Ok(ReportLine {
            line_id: row.get(0)?,
            report_id: row.get(1)?,
            work_id: row.get(2)?,
            work_category_id: row.get(3)?,
            time_from: row.get(4)?,
            time_to: row.get(5)?,
            time_total: row.get(6)?,
            seq_no: row.get(7)?,
        })
    }

    // ==========================================
    // 事务内操作（由 API 层编排）
    // ==========================================

    /// 插入日报表头
    pub fn insert_report_tx(conn: &Connection, report: &Report) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO construction_report (
                report_id, report_date, responsible_user, weather, customer,
                construction_object_id, stage, time_total_hours, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                report.report_id,
                report.report_date,
                report.responsible_user,
                report.weather.map(|w| w.to_db_str()),
                report.customer,
                report.construction_object_id,
                report.stage.to_db_str(),
                report.time_total_hours,
                report.created_at,
                report.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 更新日报表头（日期、负责人、天气、客户、施工对象）
    pub fn update_header_tx(conn: &Connection, report: &Report) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE construction_report
            SET report_date = ?2, responsible_user = ?3, weather = ?4, customer = ?5,
                construction_object_id = ?6, updated_at = ?7
            WHERE report_id = ?1
            "#,
            params![
                report.report_id,
                report.report_date,
                report.responsible_user,
                report.weather.map(|w| w.to_db_str()),
                report.customer,
                report.construction_object_id,
                report.updated_at,
            ],
        )?;
        Self::ensure_affected(affected, &report.report_id)
    }

    /// 更新阶段
    pub fn update_stage_tx(
        conn: &Connection,
        report_id: &str,
        stage: ReportStage,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE construction_report SET stage = ?2, updated_at = ?3 WHERE report_id = ?1",
            params![report_id, stage.to_db_str(), updated_at],
        )?;
        Self::ensure_affected(affected, report_id)
    }

    /// 更新工时汇总
    pub fn update_time_total_tx(
        conn: &Connection,
        report_id: &str,
        time_total_hours: f64,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE construction_report SET time_total_hours = ?2, updated_at = ?3 WHERE report_id = ?1",
            params![report_id, time_total_hours, updated_at],
        )?;
        Self::ensure_affected(affected, report_id)
    }

    /// 查询日报表头
    pub fn find_by_id_tx(conn: &Connection, report_id: &str) -> RepositoryResult<Option<Report>> {
        let sql = format!(
            "SELECT {} FROM construction_report WHERE report_id = ?1",
            REPORT_COLUMNS
        );
        let report = conn
            .query_row(&sql, params![report_id], Self::map_report)
            .optional()?;
        Ok(report)
    }

    /// 批量插入工作行
    pub fn insert_lines_tx(conn: &Connection, lines: &[ReportLine]) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO construction_report_line (
                line_id, report_id, work_id, work_category_id,
                time_from, time_to, time_total, seq_no
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;

        let mut count = 0;
        for line in lines {
            stmt.execute(params![
                line.line_id,
                line.report_id,
                line.work_id,
                line.work_category_id,
                line.time_from,
                line.time_to,
                line.time_total,
                line.seq_no,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    /// 删除单条工作行
    pub fn delete_line_tx(conn: &Connection, report_id: &str, line_id: &str) -> RepositoryResult<()> {
        let affected = conn.execute(
            "DELETE FROM construction_report_line WHERE report_id = ?1 AND line_id = ?2",
            params![report_id, line_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ReportLine".to_string(),
                id: line_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除日报全部工作行
    pub fn delete_lines_tx(conn: &Connection, report_id: &str) -> RepositoryResult<usize> {
        let affected = conn.execute(
            "DELETE FROM construction_report_line WHERE report_id = ?1",
            params![report_id],
        )?;
        Ok(affected)
    }

    /// 查询日报全部工作行（按行号）
    pub fn find_lines_tx(conn: &Connection, report_id: &str) -> RepositoryResult<Vec<ReportLine>> {
        let sql = format!(
            "SELECT {} FROM construction_report_line WHERE report_id = ?1 ORDER BY seq_no, line_id",
            LINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let lines = stmt
            .query_map(params![report_id], Self::map_line)?
            .collect::<SqliteResult<Vec<ReportLine>>>()?;
        Ok(lines)
    }

    /// 当前最大行号
    pub fn max_seq_no_tx(conn: &Connection, report_id: &str) -> RepositoryResult<i32> {
        let max: Option<i32> = conn.query_row(
            "SELECT MAX(seq_no) FROM construction_report_line WHERE report_id = ?1",
            params![report_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    fn ensure_affected(affected: usize, report_id: &str) -> RepositoryResult<()> {
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Report".to_string(),
                id: report_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询日报
    pub fn find_by_id(&self, report_id: &str) -> RepositoryResult<Option<Report>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, report_id)
    }

    /// 查询日报工作行
    pub fn find_lines(&self, report_id: &str) -> RepositoryResult<Vec<ReportLine>> {
        let conn = self.get_conn()?;
        Self::find_lines_tx(&conn, report_id)
    }

    /// 查询全部日报（按日期倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Report>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM construction_report ORDER BY report_date DESC, created_at DESC",
            REPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let reports = stmt
            .query_map([], Self::map_report)?
            .collect::<SqliteResult<Vec<Report>>>()?;
        Ok(reports)
    }

    /// 按阶段查询日报
    pub fn find_by_stage(&self, stage: ReportStage) -> RepositoryResult<Vec<Report>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM construction_report WHERE stage = ?1 ORDER BY report_date DESC",
            REPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let reports = stmt
            .query_map(params![stage.to_db_str()], Self::map_report)?
            .collect::<SqliteResult<Vec<Report>>>()?;
        Ok(reports)
    }
}
