//! Compliance Server
//!
//! Serves contract compliance checks against Indian-law rules over HTTP:
//!
//! - `POST /check_compliance` - evaluate `{ "text": ... }`
//! - `GET /health` - liveness and active strategy
//!
//! The keyword strategy needs no model. The question strategy loads an
//! extractive QA model once at startup and shares it across requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use compliance_engine::{ComplianceEngine, EngineConfig, RuleTable, Serialized, Strategy};
use qa_model::{BertQaModel, QaModelConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_check_compliance, handle_health};

/// Command-line arguments for the compliance server
#[derive(Parser, Debug)]
#[command(name = "compliance-server")]
#[command(about = "Contract compliance checks against Indian law")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Rule strategy: "keyword" or "question"
    #[arg(long, default_value = "keyword")]
    strategy: Strategy,

    /// Local QA model directory (question strategy; overrides QA_MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ComplianceEngine>,
    pub strategy: Strategy,
}

impl AppState {
    pub fn new(engine: ComplianceEngine, strategy: Strategy) -> Self {
        Self {
            engine: Arc::new(engine),
            strategy,
        }
    }
}

/// Build the engine for the selected strategy
fn build_engine(args: &Args) -> anyhow::Result<ComplianceEngine> {
    let config = EngineConfig::from_env()?;

    let rules = match args.strategy {
        Strategy::Keyword => RuleTable::keywords(),
        Strategy::Question => RuleTable::questions(),
    };
    let mut engine = ComplianceEngine::new(rules, config);

    if engine.rules().requires_answerer() {
        let mut qa_config = QaModelConfig::from_env()?;
        if let Some(dir) = &args.model_dir {
            qa_config.model_dir = Some(dir.clone());
        }
        info!("Loading QA model {}", qa_config.model_id);
        let model = BertQaModel::load(&qa_config)?;
        engine = engine.with_answerer(Arc::new(Serialized::new(model)));
    }

    Ok(engine)
}

pub fn build_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/check_compliance", post(handle_check_compliance))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting compliance server on {}:{}", args.host, args.port);

    let engine = build_engine(&args)?;
    info!(
        "Strategy: {} ({} rules, {:?} highlighting)",
        args.strategy,
        engine.rules().len(),
        engine.config().highlight_mode
    );

    let app = build_router(AppState::new(engine, args.strategy));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
