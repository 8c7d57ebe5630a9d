//! HTTP surface for article comment threads.

mod handlers;
mod routes;
mod state;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use howto_shared::{
    config::SupabaseConfig,
    logging::{init_tracing, LogConfig},
    supabase_store::SupabaseCommentStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_dir = env::var("LOG_DIR").ok().map(PathBuf::from);
    let _log_guard = init_tracing(LogConfig::new("howto-backend").with_log_dir(log_dir))?;

    // Load environment variables
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());

    let supabase = SupabaseConfig::from_env().context("invalid Supabase configuration")?;
    tracing::info!("Starting HowTo Naija comments backend");
    tracing::info!("Supabase project: {}", supabase.url);
    tracing::info!("Comments table: {}", supabase.comments_table);

    let store = Arc::new(SupabaseCommentStore::new(supabase)?);
    let app_state = state::AppState::new(store.clone(), store);
    let app = routes::create_router(app_state);

    let addr = format!("{}:{}", bind_addr, port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
