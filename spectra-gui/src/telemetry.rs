//! Tracing setup for the viewer.

use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

/// Log targets of this workspace at `info`; everything else stays quiet.
const DEFAULT_FILTER: &str = "spectra_core=info,spectra_gui=info";

static SUBSCRIBER: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber once. `RUST_LOG` replaces
/// [`DEFAULT_FILTER`] when set.
pub fn init() {
    SUBSCRIBER.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));

        let installed = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_names(true)
            .compact()
            .try_init();
        if let Err(err) = installed {
            eprintln!("spectra: tracing already initialised: {err}");
        }
    });
}
