//! Chatform HTTP server.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatform::adapters::ai::{MockAIProvider, OpenAIConfig, OpenAIProvider};
use chatform::adapters::http::{interview_router, InterviewAppState};
use chatform::adapters::storage::{
    FileSessionRepository, InMemoryFormRepository, InMemoryRecordSink, InMemorySessionRepository,
    JsonlRecordSink,
};
use chatform::application::Interviewer;
use chatform::config::{
    AiConfig, AiProvider, AppConfig, ServerConfig, StorageBackend, StorageConfig, ValidationError,
};
use chatform::domain::interview::{
    ElicitationConfig, ElicitationEngine, ExtractionConfig, ExtractionEngine,
};
use chatform::ports::{AIProvider, RecordSink, SessionRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    info!(
        environment = ?config.server.environment,
        provider = ?config.ai.provider,
        storage = ?config.storage.backend,
        "starting chatform"
    );

    let interviewer = build_interviewer(&config)?;
    let app = build_router(&config.server, interviewer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, Box<dyn Error>> {
    let provider: Arc<dyn AIProvider> = match config.provider {
        AiProvider::Mock => {
            warn!("using mock AI provider; replies are canned");
            Arc::new(MockAIProvider::new())
        }
        AiProvider::OpenAI => {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or(ValidationError::MissingRequired("OPENAI_API_KEY"))?;
            let openai = OpenAIConfig::from_secret(api_key)
                .with_model(config.model.as_str())
                .with_base_url(config.base_url.as_str())
                .with_timeout(config.timeout());
            Arc::new(OpenAIProvider::new(openai)?)
        }
    };

    let info = provider.provider_info();
    info!(
        provider = %info.name,
        model = %info.model,
        streaming = info.supports_streaming,
        candidates = info.supports_candidates,
        "AI provider ready"
    );
    if config.candidates > 1 && !info.supports_candidates {
        warn!(requested = config.candidates, "provider returns a single candidate per call");
    }
    Ok(provider)
}

fn build_stores(config: &StorageConfig) -> (Arc<dyn SessionRepository>, Arc<dyn RecordSink>) {
    match config.backend {
        StorageBackend::Memory => {
            let sessions: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
            let records: Arc<dyn RecordSink> = Arc::new(InMemoryRecordSink::new());
            (sessions, records)
        }
        StorageBackend::File => {
            info!(
                data_dir = %config.data_dir.display(),
                records = %config.records_path.display(),
                "using file storage"
            );
            let sessions: Arc<dyn SessionRepository> =
                Arc::new(FileSessionRepository::new(&config.data_dir));
            let records: Arc<dyn RecordSink> = Arc::new(JsonlRecordSink::new(&config.records_path));
            (sessions, records)
        }
    }
}

fn build_interviewer(config: &AppConfig) -> Result<Interviewer, Box<dyn Error>> {
    let provider = build_provider(&config.ai)?;
    let (sessions, records) = build_stores(&config.storage);

    let elicitation = ElicitationEngine::new(
        provider.clone(),
        ElicitationConfig {
            temperature: config.ai.elicitation_temperature,
            max_tokens: config.ai.max_output_tokens,
            candidates: config.ai.candidates,
        },
    );
    let extraction = ExtractionEngine::new(
        provider,
        ExtractionConfig {
            temperature: config.ai.extraction_temperature,
            max_tokens: config.ai.max_output_tokens,
        },
    );

    Ok(Interviewer::new(
        Arc::new(InMemoryFormRepository::new()),
        sessions,
        records,
        elicitation,
        extraction,
    ))
}

fn build_router(config: &ServerConfig, interviewer: Interviewer) -> Router {
    let origins = config.cors_origins_list();
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let cors = if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(allowed))
    };

    interview_router()
        .with_state(InterviewAppState::new(Arc::new(interviewer)))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
