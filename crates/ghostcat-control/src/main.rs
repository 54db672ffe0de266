//! Head controller binary.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ghostcat_control::{ControlResult, HeadConfig, Orchestrator};
use ghostcat_motion::{ServoDriver, TracingDriver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("ghostcat=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting ghostcat-control");

    let config = HeadConfig::from_env();
    info!("Head config: {:?}", config);

    // Inbound queue. The transport client owns the producer side and
    // pushes raw topic payloads here as they arrive; dropping it is not
    // fatal to the consumer loop.
    let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    // The physical board driver attaches here. Without hardware present
    // every write is logged instead of pulsed.
    let factory = || -> ControlResult<Arc<dyn ServoDriver>> { Ok(Arc::new(TracingDriver)) };

    Orchestrator::new(config).run(factory, inbound_rx).await?;

    info!("Controller shutdown complete");
    Ok(())
}
