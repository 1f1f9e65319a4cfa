//! # Observability
//!
//! Every actor logs its lifecycle and each request with an `entity_type` field, so the
//! module path adds nothing; the subscriber below drops it and prints spans inline.
//!
//! ```bash
//! RUST_LOG=info cargo run -p delivery-tracking
//! RUST_LOG=delivery_tracking=debug,actor_framework=info cargo run -p delivery-tracking
//! ```

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG`.
///
/// Safe to call more than once: later calls leave the first subscriber in place.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
