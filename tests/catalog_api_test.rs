// ==========================================
// CatalogApi 集成测试
// ==========================================

mod helpers;

use construction_report::api::ApiError;
use helpers::api_test_helper::*;

#[test]
fn test_list_categories_统计工作项数量() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let earth = env.catalog_api.create_category("土方工程", "admin").expect("创建失败");
    let concrete = env.catalog_api.create_category("混凝土工程", "admin").expect("创建失败");

    for name in ["挖掘", "回填"] {
        env.catalog_api
            .create_work(name, None, Some(&earth.category_id), "admin")
            .expect("创建失败");
    }

    let categories = env.catalog_api.list_categories().expect("查询失败");
    assert_eq!(categories.len(), 2);
    let count_of = |id: &str| {
        categories
            .iter()
            .find(|c| c.category.category_id == id)
            .map(|c| c.works_count)
            .expect("分类不存在")
    };
    assert_eq!(count_of(&earth.category_id), 2);
    assert_eq!(count_of(&concrete.category_id), 0);
}

#[test]
fn test_list_works_in_category_默认分类() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let category = env.catalog_api.create_category("土方工程", "admin").expect("创建失败");
    let work = env
        .catalog_api
        .create_work("挖掘", Some("机械挖掘"), Some(&category.category_id), "admin")
        .expect("创建失败");
    env.catalog_api
        .create_work("临时工作", None, None, "admin")
        .expect("创建失败");

    let view = env
        .catalog_api
        .list_works_in_category(&category.category_id)
        .expect("查询失败");
    assert_eq!(view.default_category_id, category.category_id);
    assert_eq!(view.works.len(), 1);
    assert_eq!(view.works[0].work_id, work.work_id);
    assert_eq!(view.works[0].description.as_deref(), Some("机械挖掘"));

    assert_eq!(env.catalog_api.list_works().expect("查询失败").len(), 2);

    let err = env.catalog_api.list_works_in_category("MISSING").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_create_work_校验() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env.catalog_api.create_work("  ", None, None, "admin").unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = env
        .catalog_api
        .create_work("挖掘", None, Some("MISSING"), "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = env.catalog_api.create_category("", "admin").unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    assert!(env.catalog_api.list_works().expect("查询失败").is_empty());
}

#[test]
fn test_get_work() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let work_id = env.seed_work("挖掘");

    let work = env.catalog_api.get_work(&work_id).expect("查询失败");
    assert_eq!(work.name, "挖掘");
    assert!(work.category_id.is_some());

    assert!(matches!(
        env.catalog_api.get_work("MISSING"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_construction_objects() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let object = env.catalog_api.create_object(" 3号楼 ", "admin").expect("创建失败");
    assert_eq!(object.name, "3号楼");

    let objects = env.catalog_api.list_objects().expect("查询失败");
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].object_id, object.object_id);

    let logs = env.action_log_repo.list_recent(10).expect("查询失败");
    assert!(logs.iter().all(|l| l.action_type == "MaintainCatalog"));
    assert_eq!(logs.len(), 1);
}
