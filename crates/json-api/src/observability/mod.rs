//! Logs, traces, metrics and profiles for the JSON API.
//!
//! [`Observability::init`] installs everything once at startup; the
//! [`request_logging`] hoop ties each request into all four.

use thiserror::Error;

mod init;
mod logging;
mod metrics;
mod otel;
mod profiling;
mod request;
mod settings;

pub(crate) use init::Observability;
pub(crate) use metrics::{metrics_handler, observe_cart_error};
pub(crate) use request::request_logging;

#[derive(Debug, Error)]
pub(crate) enum ObservabilityError {
    #[error("OTLP exporter could not be built: {0}")]
    OtlpExporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("a global tracing subscriber is already installed: {0}")]
    TracingSubscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("pyroscope agent failed: {0}")]
    Pyroscope(#[from] pyroscope::PyroscopeError),
}
