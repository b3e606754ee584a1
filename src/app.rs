use crate::config::Config;
use crate::hamsa::{HamsaClientBuilder, VoiceProvider};
use crate::handler::middleware::request_log::log_requests;
use crate::llm::{build_provider, CompletionProvider};
use anyhow::Result;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub voice: Arc<dyn VoiceProvider>,
    pub llm: Arc<dyn CompletionProvider>,
    pub token: CancellationToken,
}

pub type AppState = Arc<AppStateInner>;

#[derive(Default)]
pub struct AppStateBuilder {
    pub config: Option<Config>,
    pub voice: Option<Arc<dyn VoiceProvider>>,
    pub llm: Option<Arc<dyn CompletionProvider>>,
    pub token: Option<CancellationToken>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_voice_provider(mut self, voice: Arc<dyn VoiceProvider>) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn with_completion_provider(mut self, llm: Arc<dyn CompletionProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Providers not injected are built from the config; a missing api key
    /// fails here rather than on the first request.
    pub fn build(self) -> Result<AppState> {
        let config = Arc::new(self.config.unwrap_or_default());

        let voice = match self.voice {
            Some(voice) => voice,
            None => Arc::new(HamsaClientBuilder::from_config(&config.hamsa).build()?),
        };
        let llm = match self.llm {
            Some(llm) => llm,
            None => build_provider(&config.llm)?,
        };
        info!(
            completion = llm.name(),
            hamsa = %config.hamsa.base_url,
            "application state ready"
        );

        Ok(Arc::new(AppStateInner {
            config,
            voice,
            llm,
            token: self.token.unwrap_or_default(),
        }))
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
        ]);

    let skip_paths = Arc::new(state.config.access_log_skip_paths.clone());

    crate::handler::router()
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn_with_state(skip_paths, log_requests))
}

pub async fn run(state: AppState) -> Result<()> {
    let token = state.token.clone();
    let addr: SocketAddr = state.config.http_addr.parse()?;
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            return Err(anyhow::anyhow!("Failed to bind to {}: {}", addr, e));
        }
    };
    info!("listening on http://{}", addr);

    let app = create_router(state);
    let http_task = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    select! {
        http_result = http_task => {
            match http_result {
                Ok(_) => info!("Server shut down gracefully"),
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    return Err(anyhow::anyhow!("Server error: {}", e));
                }
            }
        }
        _ = token.cancelled() => {
            info!("Application shutting down due to cancellation");
        }
    }
    token.cancel();
    Ok(())
}
