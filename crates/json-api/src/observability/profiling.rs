//! Pyroscope agent lifecycle and per-request profile tags.

use std::sync::{Arc, Mutex, OnceLock};

use pyroscope::{
    PyroscopeError, Result as PyroscopeResult, ThreadId,
    backend::{BackendConfig, PprofConfig, Tag, ThreadTag, pprof_backend},
    pyroscope::{PyroscopeAgent, PyroscopeAgentBuilder, PyroscopeAgentRunning},
};
use tracing::error;

use crate::config::ServerConfig;

use super::ObservabilityError;

type TagFn = dyn Fn(ThreadTag) -> PyroscopeResult<()> + Send + Sync + 'static;

#[derive(Clone)]
struct RequestTagger {
    add: Arc<TagFn>,
    remove: Arc<TagFn>,
}

static REQUEST_TAGGER: Mutex<Option<RequestTagger>> = Mutex::new(None);
static REQUEST_TAGS_ENABLED: OnceLock<bool> = OnceLock::new();

pub(super) struct Profiling {
    agent: Option<PyroscopeAgent<PyroscopeAgentRunning>>,
}

impl Profiling {
    pub(super) fn init(config: &ServerConfig) -> Result<Self, ObservabilityError> {
        let observability = &config.observability;

        _ = REQUEST_TAGS_ENABLED.set(observability.pyroscope_request_tags_enabled);

        if !observability.pyroscope_enabled {
            set_tagger(None);

            return Ok(Self { agent: None });
        }

        let agent = start_agent(config)?;

        set_tagger(request_tags_enabled().then(|| tagger_for(&agent)));

        Ok(Self { agent: Some(agent) })
    }

    pub(super) fn shutdown(self) {
        set_tagger(None);

        let Some(running) = self.agent else {
            return;
        };

        match running.stop() {
            Ok(ready) => ready.shutdown(),
            Err(source) => error!("failed to stop pyroscope agent: {source}"),
        }
    }
}

/// Tag samples taken on this thread with the request method and route.
pub(super) fn add_request_tags(
    thread_id: ThreadId,
    method: &str,
    route: &str,
) -> PyroscopeResult<()> {
    with_tagger(|tagger| {
        for tag in request_tags(thread_id, method, route) {
            (tagger.add)(tag)?;
        }

        Ok(())
    })
}

/// Undo [`add_request_tags`].
pub(super) fn remove_request_tags(
    thread_id: ThreadId,
    method: &str,
    route: &str,
) -> PyroscopeResult<()> {
    with_tagger(|tagger| {
        for tag in request_tags(thread_id, method, route) {
            (tagger.remove)(tag)?;
        }

        Ok(())
    })
}

fn request_tags(thread_id: ThreadId, method: &str, route: &str) -> [ThreadTag; 2] {
    [
        ThreadTag::new(
            thread_id.clone(),
            Tag::new("http.method".to_owned(), method.to_owned()),
        ),
        ThreadTag::new(
            thread_id,
            Tag::new("http.route".to_owned(), route.to_owned()),
        ),
    ]
}

fn with_tagger(
    apply: impl FnOnce(&RequestTagger) -> PyroscopeResult<()>,
) -> PyroscopeResult<()> {
    if !request_tags_enabled() {
        return Ok(());
    }

    let tagger = REQUEST_TAGGER
        .lock()
        .map_err(|_err| PyroscopeError::new("failed to lock pyroscope tagger"))?
        .clone();

    match tagger {
        Some(tagger) => apply(&tagger),
        None => Ok(()),
    }
}

fn start_agent(
    config: &ServerConfig,
) -> Result<PyroscopeAgent<PyroscopeAgentRunning>, ObservabilityError> {
    let observability = &config.observability;
    let service_name = observability.otel_service_name.as_str();
    let service_version = observability.otel_service_version.as_str();

    let backend = pprof_backend(
        PprofConfig {
            sample_rate: observability.pyroscope_sample_rate,
        },
        BackendConfig::default(),
    );

    let agent = PyroscopeAgentBuilder::new(
        observability.pyroscope_server_address.as_str(),
        service_name,
        observability.pyroscope_sample_rate,
        "pyroscope-rs",
        service_version,
        backend,
    )
    .tags(vec![
        ("service.name", service_name),
        ("service.version", service_version),
        (
            "deployment.environment.name",
            observability.otel_deployment_environment.as_str(),
        ),
    ])
    .build()?;

    Ok(agent.start()?)
}

fn tagger_for(agent: &PyroscopeAgent<PyroscopeAgentRunning>) -> RequestTagger {
    let add_backend = agent.backend.backend.clone();
    let remove_backend = agent.backend.backend.clone();

    RequestTagger {
        add: Arc::new(move |tag: ThreadTag| -> PyroscopeResult<()> {
            let backend = add_backend.lock()?;

            backend
                .as_ref()
                .ok_or(PyroscopeError::BackendImpl)?
                .add_tag(tag)?;

            Ok(())
        }),
        remove: Arc::new(move |tag: ThreadTag| -> PyroscopeResult<()> {
            let backend = remove_backend.lock()?;

            backend
                .as_ref()
                .ok_or(PyroscopeError::BackendImpl)?
                .remove_tag(tag)?;

            Ok(())
        }),
    }
}

fn set_tagger(tagger: Option<RequestTagger>) {
    if let Ok(mut state) = REQUEST_TAGGER.lock() {
        *state = tagger;
    }
}

fn request_tags_enabled() -> bool {
    REQUEST_TAGS_ENABLED.get().copied().unwrap_or(false)
}
