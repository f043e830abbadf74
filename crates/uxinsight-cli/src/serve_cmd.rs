//! `uxinsight serve`: run the proxy until Ctrl-C.

use crate::cli::ServeArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::output;
use tracing::info;

pub fn run_serve(args: ServeArgs, silent: bool) -> Result<()> {
    let config = config::resolve(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async move {
        let handle = uxinsight_proxy::start(config).await?;
        output::print_listening(handle.addr(), silent);

        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, shutting down");
        handle.shutdown();
        output::print_stopped(silent);
        Ok(())
    })
}
