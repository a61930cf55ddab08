//! # Taskboard Poller
//!
//! Watches a board from the command line the way the web viewer does:
//! every scope is refetched on its poll interval so changes made by other
//! collaborators show up without a reload.
//!
//! ## Usage
//!
//! ```bash
//! POLLER_USER_ID='idp|alice' POLLER_PROJECT_IDS=<uuid> cargo run -p taskboard-poller
//! ```

use taskboard_poller::client::HttpBoardClient;
use taskboard_poller::config::PollerConfig;
use taskboard_poller::viewer::BoardViewer;
use taskboard_poller::{board_scopes, dashboard_scopes};
use taskboard_shared::sync::SyncPolicy;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PollerConfig::from_env()?;

    // Initialize tracing
    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_poller=info".into()),
        )
        .init();

    tracing::info!(
        "Taskboard Poller v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    tracing::debug!(?config, "Loaded configuration");

    let client = HttpBoardClient::new(config.api_url.clone(), config.token.clone())?;
    let policy = SyncPolicy::uniform(config.poll_interval);
    let shutdown = CancellationToken::new();

    let mut viewers = Vec::new();

    let mut dashboard = BoardViewer::new(client.clone(), policy.clone())
        .with_shutdown_token(shutdown.child_token());
    for key in dashboard_scopes(&config.user_id) {
        dashboard.track(key);
    }
    viewers.push(tokio::spawn(async move { dashboard.run().await }));

    for project_id in &config.project_ids {
        let mut board = BoardViewer::new(client.clone(), policy.clone())
            .with_shutdown_token(shutdown.child_token());
        for key in board_scopes(*project_id) {
            board.track(key);
        }
        viewers.push(tokio::spawn(async move { board.run().await }));
    }

    tracing::info!(
        user_id = %config.user_id,
        boards = config.project_ids.len(),
        "Watching board"
    );

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received, stopping viewers..."),
            Err(e) => tracing::error!(error = %e, "Failed to listen for ctrl-c"),
        }
        signal_token.cancel();
    });

    let results = futures::future::join_all(viewers).await;
    for result in results {
        if let Err(e) = result {
            tracing::error!(error = %e, "Viewer task failed");
        }
    }

    Ok(())
}
