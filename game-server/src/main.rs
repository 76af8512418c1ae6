use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use game_core::{BoardLayout, GameRules, LetterSet, WordList};
use game_persistence::{RoomRepository, UserRepository, connect_and_migrate};
use game_server::{
    auth::AuthService, config::Config, create_routes, game_manager::GameSessionManager,
    websocket::RateLimits,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_rules(config: &Config) -> anyhow::Result<GameRules> {
    let letters = match &config.letters_file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading letter distribution {path}"))?;
            LetterSet::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => LetterSet::english(),
    };
    info!(
        letters = letters.len(),
        tiles = letters.total_initial_quantity(),
        "letter distribution loaded"
    );
    Ok(GameRules::new(letters, BoardLayout::standard()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting word rooms server...");

    let config = Config::from_env().context("reading configuration")?;

    let words = WordList::from_path(&config.words_path).with_context(|| {
        format!(
            "loading words from '{}'; set WORDS_PATH to a word list file or directory",
            config.words_path
        )
    })?;
    let rules = load_rules(&config)?;

    let db = connect_and_migrate(&config.database_url)
        .await
        .context("connecting to database and running migrations")?;
    let rooms = Arc::new(RoomRepository::new(db.clone()));
    let users = Arc::new(UserRepository::new(db));

    let manager = Arc::new(GameSessionManager::new(
        rooms,
        users,
        Arc::new(words),
        Arc::new(rules),
        config.store_timeout,
    ));

    let auth_service = if config.auth_dev_mode {
        info!("Starting in development authentication mode - tokens are player ids");
        Arc::new(AuthService::new_dev_mode())
    } else {
        let secret = config.auth_secret.as_deref().unwrap_or_default();
        Arc::new(AuthService::new(secret))
    };

    let limits = RateLimits {
        burst: config.rate_limit_burst,
        per_second: config.rate_limit_per_second,
    };
    let routes = create_routes(manager.clone(), auth_service, limits);

    let sweep_manager = manager.clone();
    let sweep_interval = config.lock_sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let pruned = sweep_manager.prune_idle_locks();
            if pruned > 0 {
                tracing::debug!(pruned, "pruned idle room locks");
            }
        }
    });

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("invalid HOST {}", config.host))?;
    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown((ip, config.port), shutdown_signal())
        .context("binding server address")?;

    info!("Server started successfully on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Server shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (Ok(mut sigint), Ok(mut sigterm)) = (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) else {
            tracing::error!("Failed to install signal handlers");
            return std::future::pending().await;
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }
}
