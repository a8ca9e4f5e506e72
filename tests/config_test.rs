use std::collections::HashMap;

use workq::config::Config;
use workq::{EqualTaskAction, Error};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

#[test]
fn config_from_lookup_uses_defaults() {
    let config = Config::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.log_level, "info");
    assert_eq!(config.equal_task_action, EqualTaskAction::KeepBoth);
    assert!(config.otel_endpoint.is_none());
}

#[test]
fn config_from_lookup_reads_all_fields() {
    let config = Config::from_lookup(lookup(&[
        ("LOG_LEVEL", "workq=debug"),
        ("OTEL_ENDPOINT", "http://localhost:4317"),
        ("WORKQ_EQUAL_TASK_ACTION", "KEEP_NEW"),
    ]))
    .unwrap();

    assert_eq!(config.log_level, "workq=debug");
    assert_eq!(config.otel_endpoint.as_deref(), Some("http://localhost:4317"));
    assert_eq!(config.equal_task_action, EqualTaskAction::KeepNew);
}

#[test]
fn config_from_lookup_rejects_unknown_action() {
    let result = Config::from_lookup(lookup(&[("WORKQ_EQUAL_TASK_ACTION", "keep-all")]));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn empty_otel_endpoint_is_ignored() {
    let config = Config::from_lookup(lookup(&[("OTEL_ENDPOINT", "")])).unwrap();
    assert!(config.otel_endpoint.is_none());
}

#[test]
fn config_from_toml_fills_missing_keys() {
    let config = Config::from_toml_str(r#"equal_task_action = "keep-old""#).unwrap();
    assert_eq!(config.equal_task_action, EqualTaskAction::KeepOld);
    assert_eq!(config.log_level, "info");
}

#[test]
fn config_from_toml_rejects_unknown_keys() {
    assert!(Config::from_toml_str("workers = 4").is_err());
}

#[test]
fn config_builds_queue_options() {
    let config = Config {
        equal_task_action: EqualTaskAction::KeepNew,
        ..Config::default()
    };
    let queue: workq::WorkQueue<u8, u8, ()> =
        workq::WorkQueue::with_options(config.queue_options());
    assert_eq!(queue.equal_task_action(), EqualTaskAction::KeepNew);
}

#[test]
fn equal_task_action_parses_common_spellings() {
    for raw in ["keep-new", "keep_new", "KEEP_NEW", " Keep-New "] {
        assert_eq!(raw.parse::<EqualTaskAction>().unwrap(), EqualTaskAction::KeepNew);
    }
    assert_eq!(EqualTaskAction::KeepOld.to_string(), "keep-old");
    assert!(matches!(
        "newest".parse::<EqualTaskAction>(),
        Err(Error::InvalidAction(_))
    ));
}
