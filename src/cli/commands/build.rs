//! Build command - cross compile one package

use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::CrossgoResult;
use crate::logging::TracingLogger;
use crate::orchestration::start_build_with_cancel;
use tokio::sync::watch;
use tracing::debug;

/// Execute the build command, stopping the build on Ctrl-C
pub async fn execute(args: BuildArgs, config: &Config) -> CrossgoResult<()> {
    let request = args.into_request();
    debug!("Build request: {:?}", request);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling build");
            let _ = cancel_tx.send(true);
        }
    });

    let result = start_build_with_cancel(request, config, &TracingLogger, cancel_rx).await;
    interrupt.abort();
    result
}
