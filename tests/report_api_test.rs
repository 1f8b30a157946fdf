// ==========================================
// ReportApi 集成测试
// ==========================================
// 测试范围:
// 1. 日报创建: 覆盖校验通过/失败（失败不落库）
// 2. 工作行维护: 添加、删除、整体替换（失败保留原行）
// 3. 阶段流转: 提交审批、审批、回退拒绝
// 4. 审批过账: 调拨单、核销数量、配置库位
// ==========================================

mod helpers;

use chrono::NaiveDate;
use construction_report::api::{ApiError, ArrivalDraft, ConsumptionDraft, ReportHeaderUpdate};
use construction_report::config::config_keys;
use construction_report::db::{CONSTRUCTION_LOCATION_ID, STOCK_LOCATION_ID, VENDOR_LOCATION_ID};
use construction_report::domain::types::{
    LocationUsage, PickingState, ReportStage, WeatherCondition,
};
use construction_report::engine::{CoverageErrorKind, StageAction};
use helpers::api_test_helper::*;
use helpers::test_data_builder::*;

fn coverage_kind(err: ApiError) -> CoverageErrorKind {
    match err {
        ApiError::CoverageViolation { kind, .. } => kind,
        other => panic!("Expected CoverageViolation, got {:?}", other),
    }
}

// ==========================================
// 日报创建
// ==========================================

#[test]
fn test_create_report_成功() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let detail = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败");

    assert_eq!(detail.report.stage, ReportStage::New);
    assert_eq!(detail.report.time_total_hours, 24.0);
    assert_eq!(detail.lines.len(), 3);
    assert_eq!(
        detail.lines.iter().map(|l| l.line.seq_no).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(detail.lines.iter().all(|l| l.line.work_category_id.is_some()));
    assert!(detail
        .lines
        .iter()
        .all(|l| l.date == NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    assert!(detail.display_name.contains("2024-01-01"));
    assert_eq!(
        detail.available_actions,
        vec![StageAction::SubmitForApproval, StageAction::Approve]
    );

    let logs = env
        .action_log_repo
        .find_by_report(&detail.report.report_id)
        .expect("查询失败");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, "CreateReport");
}

#[test]
fn test_create_report_工时汇总等于各行之和() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("浇筑");

    let detail = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id)
                .work_lines(lines(&work_id, &[(0.0, 12.5), (12.5, 24.0)]))
                .build(),
            "admin",
        )
        .expect("创建失败");

    let sum: f64 = detail.lines.iter().map(|l| l.line.time_total).sum();
    assert_eq!(detail.report.time_total_hours, sum);
    assert_eq!(detail.lines[0].line.time_total, 12.5);
    assert_eq!(detail.lines[1].line.time_total, 11.5);
}

#[test]
fn test_create_report_覆盖不足_不落库() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let err = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id)
                .work_lines(lines(&work_id, &[(0.0, 3.0), (3.0, 23.0)]))
                .consumption("CEMENT", 2.0)
                .build(),
            "admin",
        )
        .unwrap_err();

    assert_eq!(coverage_kind(err), CoverageErrorKind::IncompleteCoverage);
    assert!(env.report_api.list_reports().expect("查询失败").is_empty());
    assert_eq!(test_helpers::count_rows(&env.db_path, "construction_report_line"), 0);
    assert_eq!(test_helpers::count_rows(&env.db_path, "product_consumption"), 0);
    assert_eq!(test_helpers::count_rows(&env.db_path, "action_log WHERE report_id IS NOT NULL"), 0);
}

#[test]
fn test_create_report_时段重叠() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let err = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id)
                .work_lines(lines(&work_id, &[(0.0, 5.0), (4.0, 24.0)]))
                .build(),
            "admin",
        )
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::OverlapDetected);
}

#[test]
fn test_create_report_时段倒置与越界() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let err = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id)
                .work_lines(lines(&work_id, &[(24.0, 0.0)]))
                .build(),
            "admin",
        )
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::InvertedInterval);

    let err = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id)
                .work_lines(lines(&work_id, &[(-1.0, 25.0)]))
                .build(),
            "admin",
        )
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::OutOfRange);
}

#[test]
fn test_create_report_无工作行_成功() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let detail = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id).work_lines(Vec::new()).build(),
            "admin",
        )
        .expect("创建失败");
    assert!(detail.lines.is_empty());
    assert_eq!(detail.report.time_total_hours, 0.0);
    assert_eq!(detail.report.stage, ReportStage::New);

    // 未填报工时不可提交审批
    let err = env
        .report_api
        .submit_for_approval(&detail.report.report_id, "foreman")
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::IncompleteCoverage);
    let stored = env
        .report_api
        .get_report(&detail.report.report_id)
        .expect("查询失败");
    assert_eq!(stored.report.stage, ReportStage::New);
}

#[test]
fn test_create_report_输入校验() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let mut draft = ReportDraftBuilder::new(&work_id).build();
    draft.responsible_user = "  ".to_string();
    assert!(matches!(
        env.report_api.create_report(draft, "admin"),
        Err(ApiError::InvalidInput(_))
    ));

    let draft = ReportDraftBuilder::new("MISSING-WORK").build();
    assert!(matches!(
        env.report_api.create_report(draft, "admin"),
        Err(ApiError::NotFound(_))
    ));
    assert!(env.report_api.list_reports().expect("查询失败").is_empty());
}

#[test]
fn test_create_report_默认日期为当天() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let mut draft = ReportDraftBuilder::new(&work_id).build();
    draft.report_date = None;
    let before = chrono::Local::now().date_naive();
    let detail = env.report_api.create_report(draft, "admin").expect("创建失败");
    let after = chrono::Local::now().date_naive();

    assert!(detail.report.report_date >= before && detail.report.report_date <= after);
}

// ==========================================
// 工作行维护
// ==========================================

#[test]
fn test_replace_work_lines_成功() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let report_id = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败")
        .report
        .report_id;

    let detail = env
        .report_api
        .replace_work_lines(&report_id, lines(&work_id, &[(0.0, 12.0), (12.0, 24.0)]), "admin")
        .expect("替换失败");

    assert_eq!(detail.lines.len(), 2);
    assert_eq!(detail.report.time_total_hours, 24.0);
}

#[test]
fn test_replace_work_lines_无效_保留原行() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let created = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败");
    let report_id = created.report.report_id.clone();

    let err = env
        .report_api
        .replace_work_lines(&report_id, lines(&work_id, &[(0.0, 12.4), (12.5, 24.0)]), "admin")
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::IncompleteCoverage);

    let after = env.report_api.get_report(&report_id).expect("查询失败");
    let before_ids: Vec<_> = created.lines.iter().map(|l| l.line.line_id.clone()).collect();
    let after_ids: Vec<_> = after.lines.iter().map(|l| l.line.line_id.clone()).collect();
    assert_eq!(before_ids, after_ids);
    assert_eq!(after.report.time_total_hours, 24.0);
}

#[test]
fn test_add_remove_work_line_成功() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let report_id = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id).work_lines(Vec::new()).build(),
            "admin",
        )
        .expect("创建失败")
        .report
        .report_id;

    // 空日报上添加不完整时段仍需满足覆盖
    let err = env
        .report_api
        .add_work_line(
            &report_id,
            construction_report::api::WorkLineDraft::new(&work_id, 0.0, 12.0),
            "admin",
        )
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::IncompleteCoverage);

    let detail = env
        .report_api
        .add_work_line(
            &report_id,
            construction_report::api::WorkLineDraft::new(&work_id, 0.0, 24.0),
            "admin",
        )
        .expect("添加失败");
    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.lines[0].line.seq_no, 1);
    assert_eq!(detail.report.time_total_hours, 24.0);

    let detail = env
        .report_api
        .remove_work_line(&report_id, &detail.lines[0].line.line_id, "admin")
        .expect("删除失败");
    assert!(detail.lines.is_empty());
    assert_eq!(detail.report.time_total_hours, 0.0);

    let line_logs = env
        .action_log_repo
        .find_by_report(&report_id)
        .expect("查询失败")
        .into_iter()
        .filter(|l| l.action_type == "ChangeWorkLines")
        .count();
    assert_eq!(line_logs, 2);
}

#[test]
fn test_add_work_line_重叠_拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let report_id = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败")
        .report
        .report_id;

    let err = env
        .report_api
        .add_work_line(
            &report_id,
            construction_report::api::WorkLineDraft::new(&work_id, 7.0, 9.0),
            "admin",
        )
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::OverlapDetected);
    assert_eq!(env.report_repo.find_lines(&report_id).expect("查询失败").len(), 3);
}

#[test]
fn test_remove_work_line_覆盖不足_拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let detail = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败");
    let report_id = detail.report.report_id.clone();

    let err = env
        .report_api
        .remove_work_line(&report_id, &detail.lines[1].line.line_id, "admin")
        .unwrap_err();
    assert_eq!(coverage_kind(err), CoverageErrorKind::IncompleteCoverage);
    assert_eq!(env.report_repo.find_lines(&report_id).expect("查询失败").len(), 3);

    let err = env
        .report_api
        .remove_work_line(&report_id, "MISSING-LINE", "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 表头维护
// ==========================================

#[test]
fn test_update_report_header() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let report_id = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败")
        .report
        .report_id;
    let object = env.catalog_api.create_object("3号楼", "admin").expect("创建失败");

    let report = env
        .report_api
        .update_report_header(
            &report_id,
            ReportHeaderUpdate {
                weather: Some(WeatherCondition::Rain),
                customer: Some("城建集团".to_string()),
                construction_object_id: Some(object.object_id.clone()),
                ..Default::default()
            },
            "admin",
        )
        .expect("修改失败");
    assert_eq!(report.weather, Some(WeatherCondition::Rain));

    let stored = env.report_api.get_report(&report_id).expect("查询失败").report;
    assert_eq!(stored.customer.as_deref(), Some("城建集团"));
    assert_eq!(stored.construction_object_id, Some(object.object_id));
    assert_eq!(stored.responsible_user, "foreman");

    let err = env
        .report_api
        .update_report_header(
            &report_id,
            ReportHeaderUpdate {
                responsible_user: Some(" ".to_string()),
                ..Default::default()
            },
            "admin",
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// 阶段流转
// ==========================================

#[test]
fn test_stage_flow_提交后审批() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let report_id = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败")
        .report
        .report_id;

    let report = env
        .report_api
        .submit_for_approval(&report_id, "foreman")
        .expect("提交失败");
    assert_eq!(report.stage, ReportStage::Review);

    // 审核中重复提交为幂等操作
    let report = env
        .report_api
        .submit_for_approval(&report_id, "foreman")
        .expect("重复提交失败");
    assert_eq!(report.stage, ReportStage::Review);

    let result = env.report_api.approve(&report_id, "manager").expect("审批失败");
    assert_eq!(result.report.stage, ReportStage::Approved);
    assert_eq!(result.posting.picking_count(), 0);

    // 已批准不可回退，也不可重复审批
    let err = env
        .report_api
        .submit_for_approval(&report_id, "foreman")
        .unwrap_err();
    match err {
        ApiError::InvalidStateTransition { from, to } => {
            assert_eq!(from, "APPROVED");
            assert_eq!(to, "REVIEW");
        }
        other => panic!("Expected InvalidStateTransition, got {:?}", other),
    }
    assert!(matches!(
        env.report_api.approve(&report_id, "manager"),
        Err(ApiError::InvalidStateTransition { .. })
    ));

    let stored = env.report_api.get_report(&report_id).expect("查询失败");
    assert_eq!(stored.report.stage, ReportStage::Approved);
    assert!(stored.available_actions.is_empty());

    let stage_logs = env
        .action_log_repo
        .find_by_report(&report_id)
        .expect("查询失败")
        .into_iter()
        .filter(|l| l.action_type == "StageChange")
        .count();
    assert_eq!(stage_logs, 2);
}

#[test]
fn test_approve_已批准日报不可编辑() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let report_id = env
        .report_api
        .create_report(ReportDraftBuilder::new(&work_id).build(), "admin")
        .expect("创建失败")
        .report
        .report_id;
    env.report_api.approve(&report_id, "manager").expect("审批失败");

    let err = env
        .report_api
        .replace_work_lines(&report_id, lines(&work_id, &[(0.0, 24.0)]), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    let err = env
        .movement_api
        .add_consumption(
            &report_id,
            ConsumptionDraft {
                product_id: "CEMENT".to_string(),
                quantity: 1.0,
            },
            "admin",
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
}

// ==========================================
// 审批过账
// ==========================================

#[test]
fn test_approve_生成调拨单并回填核销数量() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    env.movement_api
        .create_location("YARD-2", "二号料场", LocationUsage::Internal, "admin")
        .expect("创建库位失败");

    let report_id = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id)
                .consumption("CEMENT", 5.0)
                .consumption("SAND", 0.0)
                .arrival("REBAR", 2.0, VENDOR_LOCATION_ID)
                .arrival("BRICK", 100.0, VENDOR_LOCATION_ID)
                .arrival("GRAVEL", 3.0, "YARD-2")
                .build(),
            "admin",
        )
        .expect("创建失败")
        .report
        .report_id;

    // 审批前可追加物料行
    env.movement_api
        .add_arrival(
            &report_id,
            ArrivalDraft {
                product_id: "PIPE".to_string(),
                quantity: 0.0,
                location_id: VENDOR_LOCATION_ID.to_string(),
            },
            "admin",
        )
        .expect("添加失败");

    let result = env.report_api.approve(&report_id, "manager").expect("审批失败");
    assert_eq!(result.report.stage, ReportStage::Approved);

    // 消耗: 一张调拨单，仅含非零数量的行
    let consumption = result.posting.consumption_picking.as_ref().expect("应生成消耗调拨单");
    assert_eq!(consumption.location_id, STOCK_LOCATION_ID);
    assert_eq!(consumption.location_dest_id, CONSTRUCTION_LOCATION_ID);
    assert_eq!(consumption.moves.len(), 1);
    assert_eq!(consumption.moves[0].product_id, "CEMENT");
    assert_eq!(consumption.state, PickingState::Done);

    // 到货: 按发货库位分单
    assert_eq!(result.posting.arrival_pickings.len(), 2);
    let vendor = &result.posting.arrival_pickings[0];
    assert_eq!(vendor.location_id, VENDOR_LOCATION_ID);
    assert_eq!(vendor.location_dest_id, STOCK_LOCATION_ID);
    assert_eq!(vendor.moves.len(), 2);
    assert_eq!(result.posting.arrival_pickings[1].location_id, "YARD-2");

    // 核销数量回填
    let consumptions = env.movement_api.list_consumptions(&report_id).expect("查询失败");
    let write_off = |product: &str| {
        consumptions
            .iter()
            .find(|c| c.product_id == product)
            .map(|c| c.write_off)
            .expect("消耗行不存在")
    };
    assert_eq!(write_off("CEMENT"), 5.0);
    assert_eq!(write_off("SAND"), 0.0);

    // 落库的调拨单均已完成，完成数量 = 需求数量
    let pickings = env.movement_api.list_pickings(&report_id).expect("查询失败");
    assert_eq!(pickings.len(), 3);
    assert!(pickings.iter().all(|p| p.state == PickingState::Done));
    assert!(pickings
        .iter()
        .flat_map(|p| p.moves.iter())
        .all(|m| m.quantity_done == m.product_uom_qty && m.name == "construction_report"));
}

#[test]
fn test_approve_无可过账行_不生成调拨单() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    let report_id = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id)
                .consumption("SAND", 0.0)
                .arrival("PIPE", 0.0, VENDOR_LOCATION_ID)
                .build(),
            "admin",
        )
        .expect("创建失败")
        .report
        .report_id;

    let result = env.report_api.approve(&report_id, "manager").expect("审批失败");
    assert!(result.posting.consumption_picking.is_none());
    assert!(result.posting.arrival_pickings.is_empty());
    assert!(env.movement_api.list_pickings(&report_id).expect("查询失败").is_empty());
}

#[test]
fn test_approve_使用配置的库位() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    env.movement_api
        .create_location("WH-NORTH", "北区仓库", LocationUsage::Internal, "admin")
        .expect("创建库位失败");
    env.config_manager
        .set_config_value(config_keys::STOCK_SOURCE_LOCATION_ID, "WH-NORTH")
        .expect("配置失败");
    env.config_manager
        .set_config_value(config_keys::STOCK_MOVE_NAME, "site_write_off")
        .expect("配置失败");

    let report_id = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id).consumption("CEMENT", 1.5).build(),
            "admin",
        )
        .expect("创建失败")
        .report
        .report_id;

    let result = env.report_api.approve(&report_id, "manager").expect("审批失败");
    let picking = result.posting.consumption_picking.expect("应生成消耗调拨单");
    assert_eq!(picking.location_id, "WH-NORTH");
    assert_eq!(picking.moves[0].name, "site_write_off");
}

#[test]
fn test_approve_库位不存在_整体回滚() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");
    env.config_manager
        .set_config_value(config_keys::STOCK_SOURCE_LOCATION_ID, "NO-SUCH-LOCATION")
        .expect("配置失败");

    let report_id = env
        .report_api
        .create_report(
            ReportDraftBuilder::new(&work_id).consumption("CEMENT", 1.0).build(),
            "admin",
        )
        .expect("创建失败")
        .report
        .report_id;

    let err = env.report_api.approve(&report_id, "manager").unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    let stored = env.report_api.get_report(&report_id).expect("查询失败");
    assert_eq!(stored.report.stage, ReportStage::New);
    assert_eq!(stored.consumptions[0].write_off, 0.0);
    assert_eq!(test_helpers::count_rows(&env.db_path, "stock_picking"), 0);
}

#[test]
fn test_get_report_不存在() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    assert!(matches!(
        env.report_api.get_report("MISSING"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        env.report_api.approve("MISSING", "manager"),
        Err(ApiError::NotFound(_))
    ));
}
