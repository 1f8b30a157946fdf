// ==========================================
// 施工日报系统 - 主入口
// ==========================================
// 职责: 初始化日志、数据库与应用状态
// ==========================================

use anyhow::{anyhow, Context};
use construction_report::app::{get_default_db_path, AppState};
use construction_report::domain::ReportStage;

fn main() -> anyhow::Result<()> {
    construction_report::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", construction_report::APP_NAME);
    tracing::info!("系统版本: {}", construction_report::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let config = state
        .config_manager
        .get_config_snapshot()
        .context("读取配置快照失败")?;
    tracing::info!("当前配置: {}", config);

    for stage in ReportStage::ALL {
        let count = state
            .report_api
            .list_reports_by_stage(stage)
            .with_context(|| format!("查询日报失败: stage={}", stage))?
            .len();
        tracing::info!("{} ({}): {}", stage.display_name(), stage, count);
    }

    Ok(())
}
