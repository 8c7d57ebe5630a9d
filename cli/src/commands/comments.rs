use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use hn_cli::render;
use howto_shared::{
    comment_tree::count_nodes, comments_store::TokenSession, config::SupabaseConfig,
    supabase_store::SupabaseCommentStore, CommentDraft, CommentManager, CommentNode,
};
use serde::Serialize;

use crate::cli::{CommentCommands, TreeOutputFormat};

#[derive(Serialize)]
struct TreeResponse<'a> {
    comments: &'a [CommentNode],
    total: usize,
}

#[derive(Serialize)]
struct DeleteResponse<'a> {
    deleted: &'a str,
}

pub async fn run(command: CommentCommands) -> Result<()> {
    match command {
        CommentCommands::List {
            article_id,
            format,
        } => {
            let forest = manager(None)?.list_approved(&article_id).await?;
            print_forest(&forest, format)
        },
        CommentCommands::Post {
            article_id,
            content,
            parent_id,
            author_name,
            author_email,
            access_token,
        } => {
            let draft = CommentDraft {
                article_id,
                content,
                author_name,
                author_email,
                parent_id,
            };
            let created = manager(access_token)?.post(draft).await?;
            tracing::info!("comment {} is pending moderation", created.id);
            print_json(&created)
        },
        CommentCommands::Edit {
            id,
            content,
            access_token,
        } => {
            let updated = manager(Some(access_token))?.update(&id, &content).await?;
            print_json(&updated)
        },
        CommentCommands::Delete {
            id,
            access_token,
        } => {
            manager(Some(access_token))?.delete(&id).await?;
            print_json(&DeleteResponse {
                deleted: &id,
            })
        },
        CommentCommands::Tree {
            file,
            format,
        } => run_tree(&file, format),
    }
}

fn run_tree(file: &Path, format: TreeOutputFormat) -> Result<()> {
    let rows = render::load_rows(file)?;
    let forest = render::build_approved_forest(rows);
    print_forest(&forest, format)
}

fn manager(access_token: Option<String>) -> Result<CommentManager> {
    let config = SupabaseConfig::from_env().context("invalid Supabase configuration")?;
    let store = Arc::new(SupabaseCommentStore::new(config)?);
    let session = Arc::new(TokenSession::new(store.clone(), access_token));
    Ok(CommentManager::new(store, session))
}

fn print_forest(forest: &[CommentNode], format: TreeOutputFormat) -> Result<()> {
    match format {
        TreeOutputFormat::Json => print_json(&TreeResponse {
            comments: forest,
            total: count_nodes(forest),
        }),
        TreeOutputFormat::Text => {
            print!("{}", render::render_text(forest));
            Ok(())
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
