//! Opt-in tracing setup for hosts embedding `variant-stack`.
//!
//! The pipeline only emits `tracing` events. Hosts that already install a
//! subscriber need nothing from here.

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "variant_stack=info";

/// Installs a compact `tracing-subscriber` fmt subscriber (feature `telemetry`).
///
/// `RUST_LOG` wins over `fallback_filter`. Returns `false` when the feature is
/// disabled or a global subscriber is already set.
#[must_use]
pub fn init_tracing(fallback_filter: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_filter));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_filter;
        false
    }
}

/// [`init_tracing`] with [`DEFAULT_FILTER`].
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_FILTER)
}
