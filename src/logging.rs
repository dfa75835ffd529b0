use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, registry, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV_VAR: &str = "JOBBOARD_LOG";

const DEFAULT_LOG_FILTERS: &[&str] = &[
    "hyper_util=info",
    "reqwest=info",
    "rustls=info",
    "mio=info",
];

fn env_filter() -> Result<EnvFilter> {
    filter_from_rules(&std::env::var(LOG_ENV_VAR).unwrap_or_default())
}

/// Default noise filters apply only to targets the user's rules leave alone.
fn filter_from_rules(rules: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(rules);
    for rule in DEFAULT_LOG_FILTERS {
        let target = rule.split('=').next().unwrap_or_default();
        if mentions_target(rules, target) {
            continue;
        }
        filter = filter.add_directive(rule.parse().context("DEFAULT_LOG_FILTERS misconfiguration")?);
    }
    Ok(filter)
}

fn mentions_target(rules: &str, target: &str) -> bool {
    rules.split(',').any(|directive| {
        let name = directive.trim().split(['=', '[']).next().unwrap_or("");
        name == target || name.starts_with(&format!("{}::", target))
    })
}

/// CLI commands log to stderr.
pub fn init_stderr() -> Result<()> {
    registry()
        .with(env_filter()?)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// The terminal UI owns the screen, so its log goes to a file instead.
pub fn init_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    registry()
        .with(env_filter()?)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rule_beats_default_for_same_target() {
        let filter = filter_from_rules("reqwest=debug").unwrap().to_string().to_lowercase();
        assert!(filter.contains("reqwest=debug"));
        assert!(!filter.contains("reqwest=info"));
        assert!(filter.contains("hyper_util=info"));
    }

    #[test]
    fn test_defaults_apply_without_user_rules() {
        let filter = filter_from_rules("").unwrap().to_string().to_lowercase();
        for rule in DEFAULT_LOG_FILTERS {
            assert!(filter.contains(rule), "{} missing from {}", rule, filter);
        }
    }

    #[test]
    fn test_mentions_target_matches_submodules_only() {
        assert!(mentions_target("jobboard=debug,reqwest::connect=trace", "reqwest"));
        assert!(mentions_target(" mio ", "mio"));
        assert!(!mentions_target("reqwest_middleware=debug", "reqwest"));
        assert!(!mentions_target("debug", "reqwest"));
    }
}
