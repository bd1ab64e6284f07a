//! Logging setup.
//!
//! Everything in the crate logs through the `log` facade with a bracketed
//! component prefix (`[EXPORT]`, `[CAMERA]`, ...). Hosts that bring their own
//! logger can skip `init_logging` entirely.

use chrono::Local;
use std::io::Write;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "zoomreel=info";

/// Install an `env_logger` backend honouring `RUST_LOG`.
///
/// Returns `false` if a logger was already installed (second call is a no-op).
pub fn init_logging() -> bool {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER);

    let installed = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .is_ok();

    if installed {
        log::info!("ZoomReel v{} logging initialized", env!("CARGO_PKG_VERSION"));
    }
    installed
}
