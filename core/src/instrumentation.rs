use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Log filter read first; `RUST_LOG` is consulted when it is unset or blank.
pub const LOG_FILTER_ENV: &str = "KONGRESS_LOG";

static INSTALLED: OnceLock<bool> = OnceLock::new();

fn select_directives(
    kongress_log: Option<String>,
    rust_log: Option<String>,
    default_directives: &str,
) -> String {
    kongress_log
        .filter(|directives| !directives.trim().is_empty())
        .or_else(|| rust_log.filter(|directives| !directives.trim().is_empty()))
        .unwrap_or_else(|| default_directives.to_string())
}

/// Builds the translation log filter, falling back to `default_directives` when the
/// environment holds nothing usable.
pub fn log_filter(default_directives: &str) -> EnvFilter {
    let directives = select_directives(
        std::env::var(LOG_FILTER_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        default_directives,
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Installs the process-wide fmt subscriber on first call.
///
/// Returns whether this crate owns the global subscriber; an embedding controller that
/// installed its own keeps it.
pub fn init_instrumentation(default_directives: &str) -> bool {
    *INSTALLED.get_or_init(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(log_filter(default_directives))
            .finish();

        let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
        if !installed {
            tracing::debug!("Global tracing subscriber already set, keeping it");
        }
        installed
    })
}
