//! Logging, tracing, metrics and profiling config

use clap::Args;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// One line per event, for terminals.
    Compact,

    /// One JSON object per event, for log shippers.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not a full filter
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Trace export, profiling and slow request settings.
#[derive(Debug, Args)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent boolean feature toggles from CLI/env."
)]
pub struct ObservabilityConfig {
    /// Export spans over OTLP.
    #[arg(long, env = "OTEL_ENABLED", default_value_t = false)]
    pub otel_enabled: bool,

    /// Continue traces started by the caller (`traceparent` header).
    #[arg(long, env = "OTEL_PARENT_PROPAGATION_ENABLED", default_value_t = false)]
    pub otel_parent_propagation_enabled: bool,

    /// OTLP gRPC collector endpoint.
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_exporter_otlp_endpoint: String,

    /// OTLP export timeout in seconds.
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_TIMEOUT_SECONDS",
        default_value_t = 3u64
    )]
    pub otel_exporter_otlp_timeout_seconds: u64,

    /// Service name reported on spans and profiles.
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "trolley-json")]
    pub otel_service_name: String,

    /// Service version reported on spans and profiles.
    #[arg(
        long,
        env = "OTEL_SERVICE_VERSION",
        default_value = env!("CARGO_PKG_VERSION")
    )]
    pub otel_service_version: String,

    /// Deployment environment reported on spans and profiles.
    #[arg(
        long,
        env = "OTEL_DEPLOYMENT_ENVIRONMENT",
        default_value = "development"
    )]
    pub otel_deployment_environment: String,

    /// Share of root traces kept, clamped to [0.0, 1.0].
    #[arg(long, env = "OTEL_TRACE_SAMPLE_RATIO", default_value_t = 1.0_f64)]
    pub otel_trace_sample_ratio: f64,

    /// Push CPU profiles to Pyroscope.
    #[arg(long, env = "PYROSCOPE_ENABLED", default_value_t = false)]
    pub pyroscope_enabled: bool,

    /// Pyroscope server address.
    #[arg(
        long,
        env = "PYROSCOPE_SERVER_ADDRESS",
        default_value = "http://localhost:4040"
    )]
    pub pyroscope_server_address: String,

    /// Profiler sample rate in Hertz.
    #[arg(long, env = "PYROSCOPE_SAMPLE_RATE", default_value_t = 100_u32)]
    pub pyroscope_sample_rate: u32,

    /// Tag profile samples with the request method and route.
    #[arg(long, env = "PYROSCOPE_REQUEST_TAGS_ENABLED", default_value_t = false)]
    pub pyroscope_request_tags_enabled: bool,

    /// Requests slower than this are logged as warnings, in milliseconds.
    #[arg(long, env = "SLOW_REQUEST_THRESHOLD_MS", default_value_t = 500_u64)]
    pub slow_request_threshold_ms: u64,
}
