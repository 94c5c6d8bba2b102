//! Telemetry lifecycle: subscriber, trace export and profiling.

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider};
use tracing::{error, info};

use crate::config::ServerConfig;

use super::{ObservabilityError, logging, otel, profiling::Profiling, settings};

/// Running telemetry pipelines, flushed by [`Observability::shutdown`].
pub(crate) struct Observability {
    tracer_provider: Option<SdkTracerProvider>,
    profiling: Profiling,
}

impl Observability {
    /// Install the global subscriber and start the optional exporters.
    pub(crate) fn init(config: &ServerConfig) -> Result<Self, ObservabilityError> {
        settings::apply_runtime_config(config);

        let tracer_provider = if config.observability.otel_enabled {
            global::set_text_map_propagator(TraceContextPropagator::new());

            Some(otel::build_tracer_provider(config)?)
        } else {
            None
        };

        logging::init_subscriber(config, tracer_provider.as_ref())?;

        let profiling = Profiling::init(config)?;

        info!(
            otel = config.observability.otel_enabled,
            pyroscope = config.observability.pyroscope_enabled,
            "observability initialised"
        );

        Ok(Self {
            tracer_provider,
            profiling,
        })
    }

    /// Flush and stop everything started by [`Observability::init`].
    pub(crate) fn shutdown(self) {
        self.profiling.shutdown();

        let Some(provider) = self.tracer_provider else {
            return;
        };

        if let Err(source) = provider.shutdown() {
            error!("failed to shutdown tracer provider: {source}");
        }
    }
}
