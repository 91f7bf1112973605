use std::{future::IntoFuture, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::net::TcpListener;

use crate::{
    ai::GeminiClient,
    categories::CategoryStore,
    config::AppConfig,
    http::{AppState, http_router},
    infrastructure::{
        directories::ResolvedPaths,
        shutdown::{Shutdown, ShutdownReason},
    },
    relay::{RelayService, SessionLimits, SessionRegistry},
};

pub struct RelayApp {
    state: Arc<AppState>,
    listener: TcpListener,
    shutdown: Shutdown,
}

impl RelayApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(format!("feedlens/{}", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.gemini.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let gemini = Arc::new(GeminiClient::new(http_client, config.gemini.clone())?);
        let sessions = SessionRegistry::new(SessionLimits {
            max_sessions: config.relay.max_sessions,
            idle_ttl: config.relay.session_idle_ttl,
        });
        let relay = RelayService::new(gemini, Arc::new(sessions), config.relay.mark_policy);
        let categories = CategoryStore::open(&paths.categories_path).await;

        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        tracing::info!(
            addr = %addr,
            model = %config.gemini.model,
            mark_policy = ?config.relay.mark_policy,
            max_sessions = config.relay.max_sessions,
            "relay initialized"
        );

        Ok(Self {
            state: Arc::new(AppState { relay, categories }),
            listener,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let RelayApp {
            state,
            listener,
            shutdown,
        } = self;

        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "ready to receive POST requests to /recommend");

        let router = http_router(state.clone());
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.subscribe().wait());

        let mut shutdown_listener = shutdown.subscribe();
        let shutdown_timeout = Duration::from_secs(5);
        let mut server_future = Box::pin(server.into_future());

        let reason = tokio::select! {
            res = &mut server_future => {
                shutdown.trigger(ShutdownReason::ServerExited);
                res.context("http server stopped unexpectedly")?;
                tracing::info!("http server stopped");
                return Ok(());
            }
            reason = shutdown_listener.notified() => reason,
        };
        tracing::info!(%reason, "draining in-flight requests");

        match tokio::time::timeout(shutdown_timeout, &mut server_future).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(?err, "http server shutdown failed"),
            Err(_) => tracing::warn!(
                target: "http",
                "in-flight requests did not finish within {:?}; forcing exit",
                shutdown_timeout
            ),
        }

        tracing::info!(
            %reason,
            sessions = state.relay.sessions().session_count(),
            "relay stopped"
        );
        Ok(())
    }
}
