//! # Heffalump Demo
//!
//! Starts a [`HeffalumpSystem`] and walks one adapter through create, read,
//! update, query, an outage and delete.
//!
//! ```bash
//! RUST_LOG=info cargo run -p heffalump-service                    # default endpoint
//! RUST_LOG=debug cargo run -p heffalump-service -- adapter.json  # config from file
//! ```

use heffalump_service::error::ServiceError;
use heffalump_service::lifecycle::{default_config, HeffalumpSystem};
use soap_adapter::logging::setup_tracing;
use soap_adapter::{AdapterConfig, Condition, Query, Resource, Value};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    setup_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => AdapterConfig::from_json_file(&path)?,
        None => default_config(),
    };
    info!(endpoint = %config.endpoint, "Starting heffalump system");
    let system = HeffalumpSystem::with_config(config)?;
    let adapter = &system.adapter;
    let heffalump = &system.heffalump;

    let mut herd = vec![
        Resource::new(heffalump.clone()).with("color", "red")?,
        Resource::new(heffalump.clone()).with("num_spots", 2)?,
        Resource::new(heffalump.clone()).with("num_spots", 5)?,
    ];
    let span = tracing::info_span!("herd_creation");
    adapter.create(&mut herd).instrument(span).await?;
    for h in &herd {
        info!(key = ?h.key(), "Heffalump created");
    }

    adapter
        .update(&[("color", Value::from("violet"))], &mut herd[..1])
        .await?;
    if let Some(found) = adapter.find(heffalump, &[Value::from(1)]).await? {
        info!(color = %found.get("color").cloned().unwrap_or_default(), "Heffalump 1 after update");
    }

    let spotted = Query::all(heffalump.clone()).filter(Condition::range("num_spots", 1, 5));
    let span = tracing::info_span!("spotted_query");
    let found = adapter.read(&spotted).instrument(span).await?;
    info!(count = found.len(), "Heffalumps with 1..=5 spots");

    system.client.set_available(false).await?;
    match adapter.read(&Query::all(heffalump.clone())).await {
        Err(e) if e.is_server_unavailable() => info!("Service down, retry later"),
        Err(e) => error!(error = %e, "Unexpected failure"),
        Ok(_) => error!("Service answered while down"),
    }
    system.client.set_available(true).await?;

    let mut bad = vec![Resource::new(heffalump.clone()).with("num_spots", -1)?];
    if let Err(e) = adapter.create(&mut bad).await {
        if let Some(fault) = e.domain_fault() {
            info!(detail = %fault.result_message(), "Heffalump rejected");
        }
    }

    let removed = adapter.delete(&herd).await?;
    info!(removed, "Herd deleted");

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
