use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::AuthService;
use application::blog_service::BlogService;
use application::group_service::GroupService;
use data::repositories::postgres::group_repository::PostgresGroupRepository;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use domain::group::NewGroupRequest;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::session_token::SessionTokens;
use infrastructure::settings::Settings;
use presentation::AppState;

#[derive(Debug, Parser)]
#[command(name = "yatube-server", version, about = "Yatube blog server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the web site (default).
    Serve,
    /// Create a community group.
    CreateGroup {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a group; its posts stay, without a group.
    DeleteGroup {
        #[arg(long)]
        slug: String,
    },
    /// Print all groups.
    ListGroups,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database_url, settings.database_max_connections).await?;
    run_migrations(&pool).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&settings, pool).await,
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = group_service(pool)
                .create_group(NewGroupRequest {
                    title,
                    slug,
                    description,
                })
                .await
                .context("failed to create group")?;
            println!("created group {} ({})", group.slug, group.title);
            Ok(())
        }
        Command::DeleteGroup { slug } => {
            group_service(pool)
                .delete_group(&slug)
                .await
                .context("failed to delete group")?;
            println!("deleted group {slug}");
            Ok(())
        }
        Command::ListGroups => {
            let groups = group_service(pool)
                .list_groups()
                .await
                .context("failed to list groups")?;
            for group in groups {
                println!("{}\t{}\t{}", group.id, group.slug, group.title);
            }
            Ok(())
        }
    }
}

async fn serve(settings: &Settings, pool: PgPool) -> Result<()> {
    presentation::templates::ensure_loaded()?;

    let sessions = Arc::new(SessionTokens::new(
        &settings.session_secret,
        settings.session_ttl_seconds,
    ));
    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let groups = Arc::new(PostgresGroupRepository::new(pool.clone()));
    let posts = Arc::new(PostgresPostRepository::new(pool));

    let auth_service = Arc::new(AuthService::new(users.clone(), Arc::clone(&sessions)));
    let blog_service = Arc::new(BlogService::new(
        posts,
        groups,
        users,
        settings.posts_per_page,
    ));

    let state = AppState::new(
        auth_service,
        blog_service,
        sessions,
        settings.session_cookie_secure,
    );

    info!(posts_per_page = settings.posts_per_page, "starting yatube");
    server::run_http(settings, state).await
}

fn group_service(pool: PgPool) -> GroupService {
    GroupService::new(Arc::new(PostgresGroupRepository::new(pool)))
}
