//! # Observability & Tracing
//!
//! The crate logs through `tracing` with structured fields. Each
//! [`Adapter`](crate::Adapter) owns a span named `soap_adapter` carrying its
//! repository name; every operation and every remote call is recorded under it:
//!
//! ```text
//! INFO soap_adapter{repository="default"}:create{count=1}: Connecting endpoint=http://localhost/HeffalumpsWS
//! INFO soap_adapter{repository="default"}:create{count=1}: Created model="Heffalump" key=[Integer(2)]
//! ```
//!
//! Payloads are logged at `debug`. Setting `logging_level` to `debug` in the
//! [`AdapterConfig`](crate::AdapterConfig) additionally logs the full message and
//! raw response body of every remote call.
//!
//! ```bash
//! RUST_LOG=info cargo run -p heffalump-service
//! RUST_LOG=soap_adapter=debug cargo run -p heffalump-service
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once, from a binary. Libraries and tests should not install subscribers.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
