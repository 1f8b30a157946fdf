// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）、英文、俄文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 3] = ["zh-CN", "en", "ru"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// 不支持的语言代码会被忽略并返回 false
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale = locale, "不支持的语言，保持当前设置");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use construction_report::i18n::t;
/// let msg = t("stage.review");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use construction_report::i18n::t_with_args;
/// let msg = t_with_args("coverage.overlap_detected", &[("time", "08:30")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
// 为避免测试互相干扰，凡是切换语言的单元测试都需持有该锁。
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert!(set_locale("ru"));
        assert_eq!(current_locale(), "ru");

        assert!(!set_locale("fr"));
        assert_eq!(current_locale(), "ru");

        set_locale("zh-CN");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        assert_eq!(t("common.success"), "操作成功");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");
        assert_eq!(t("stage.review"), "Review");

        set_locale("ru");
        assert_eq!(t("stage.approved"), "Утверждено");

        set_locale("zh-CN");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        let msg = t_with_args("coverage.overlap_detected", &[("time", "08:30")]);
        assert_eq!(msg, "Crossing time slots is not allowed (08:30)");

        set_locale("ru");
        let msg = t_with_args("coverage.overlap_detected", &[("time", "08:30")]);
        assert!(msg.contains("08:30"));
        assert!(!msg.contains("Crossing"));

        set_locale("zh-CN");
    }
}
