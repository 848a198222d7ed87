//! Logging setup for binaries embedding the booking core.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with the ROOM_BOOKING_LOG environment variable.
///
/// Defaults to "info" level if ROOM_BOOKING_LOG is not set. Calling it twice
/// is harmless; the second registration is ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("ROOM_BOOKING_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
