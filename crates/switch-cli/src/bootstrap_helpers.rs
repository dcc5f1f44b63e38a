use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding `switch-rs` log directives, e.g. `switch_policy=debug`.
pub(crate) const SWITCH_LOG_ENV: &str = "SWITCH_LOG";

fn switch_log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Logs go to stderr so stdout carries only command output.
pub(crate) fn init_tracing() {
    let directives = std::env::var(SWITCH_LOG_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(switch_log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
