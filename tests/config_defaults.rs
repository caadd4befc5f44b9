use parasuite::config::Config;

#[test]
fn test_default_config_values() {
    let config = Config::default();

    assert_eq!(config.general.parallelism, "auto");
    assert_eq!(config.general.timeout_ms, 10_000);
    assert_eq!(config.general.timeout_grace_ms, 500);
    assert_eq!(config.general.attempts, 1);
    assert_eq!(config.general.slow_threshold_ms, 1_000);
    assert_eq!(config.general.extensions, vec!["js"]);
    assert!(config.command.list.is_empty());
    assert!(config.command.run.is_empty());
    assert_eq!(config.report.reporters, vec!["spec", "summary", "errors"]);
    assert!(config.report.color);
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let config = Config::parse("[report]\ncolor = false\n").unwrap();

    assert!(!config.report.color);
    assert_eq!(config.report.reporters, vec!["spec", "summary", "errors"]);
    assert_eq!(config.general, Config::default().general);
}
