//! Environment-driven configuration tests.
//!
//! These mutate process environment, so they run serially.

use serial_test::serial;
use tweet_tracker::config::Config;

const VARS: &[&str] = &[
    "DATABASE_PATH",
    "EXPORT_PATH",
    "SITE_ORIGIN",
    "THREAD_MIN_SIBLINGS",
    "THREAD_MAX_SIBLINGS",
    "THREAD_MAX_DEPTH",
    "DEBUG_TYPE_DETECTION",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();
    let config = Config::from_env().unwrap();
    config.validate().unwrap();

    assert_eq!(config.database_path.to_str(), Some("./data/tweets.sqlite"));
    assert!(config.export_path.is_none());
    assert_eq!(config.site_origin.as_str(), "https://x.com/");

    let classifier = config.classifier();
    assert_eq!(classifier.thread_siblings, 2..=4);
    assert_eq!(classifier.thread_max_depth, 25);
    assert!(!classifier.debug_signals);
}

#[test]
#[serial]
fn test_overrides() {
    clear_env();
    std::env::set_var("SITE_ORIGIN", "https://twitter.com");
    std::env::set_var("THREAD_MAX_SIBLINGS", "6");
    std::env::set_var("DEBUG_TYPE_DETECTION", "true");
    std::env::set_var("EXPORT_PATH", "/tmp/exports");

    let config = Config::from_env().unwrap();
    clear_env();
    config.validate().unwrap();

    assert_eq!(config.site_origin.host_str(), Some("twitter.com"));
    assert_eq!(config.classifier().thread_siblings, 2..=6);
    assert!(config.debug_type_detection);
    assert_eq!(
        config.export_path.as_deref().and_then(|p| p.to_str()),
        Some("/tmp/exports")
    );
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    clear_env();
    std::env::set_var("THREAD_MAX_DEPTH", "deep");
    assert!(Config::from_env().is_err());

    clear_env();
    std::env::set_var("THREAD_MIN_SIBLINGS", "5");
    let config = Config::from_env().unwrap();
    clear_env();
    assert!(config.validate().is_err());
}
