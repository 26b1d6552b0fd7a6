//! ZRO Claimer
//!
//! Entry point for the zro-claimer binary. Loads the configuration, sets up
//! logging and runs one interactive claim session.

use tracing::{info, warn};
use zro_claimer::logging::init_logging;
use zro_claimer::{load_config, run_claimer, VERSION};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = load_config(None)?;
    init_logging(config.paths.log_file.as_deref())?;

    info!("[Main] zro-claimer v{}", VERSION);

    match run_claimer(&config).await? {
        Some(summary) => info!(
            "[Main] Launched {} accounts: {} completed, {} abandoned, {} out of retries",
            summary.launched.len(),
            summary.completed,
            summary.abandoned,
            summary.retries_exhausted
        ),
        None => warn!("[Main] No accounts were dispatched"),
    }

    Ok(())
}
