use tracing_subscriber::EnvFilter;

use crate::Error;

/// Install the stderr subscriber. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) -> Result<(), Error> {
    let default = if verbose {
        "info,goalhub_core=debug,goalhub_client=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
