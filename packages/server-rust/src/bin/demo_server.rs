//! Demo server: a users grid over fixture rows, with in-memory configuration
//! and session stores and the layout endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use gridshape_core::{
    ColumnDefinition, ColumnType, CompareOp, GridResponse, IconRule, LayoutDefinition, QueryPlan,
    SortDirection,
};
use gridshape_server::network::{build_http_layers, HttpConfig};
use gridshape_server::storage::{
    FixtureDataSource, MemoryConfigurationStore, MemorySessionStore, SignedUrlStorage,
};
use gridshape_server::telemetry::init_tracing;
use gridshape_server::{
    layout_routes, DataGrid, GridError, GridParams, GridServices, IconSpec,
};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "gridshape-demo", about = "Serves a demo users grid over fixture rows")]
struct Args {
    #[arg(long, env = "GRIDSHAPE_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "GRIDSHAPE_PORT", default_value_t = 8080)]
    port: u16,

    /// Emit logs as JSON lines.
    #[arg(long, env = "GRIDSHAPE_JSON_LOGS", default_value_t = false)]
    json_logs: bool,

    /// Hex-encoded 32-byte key for signing attachment URLs.
    #[arg(long, env = "GRIDSHAPE_SIGNING_KEY")]
    signing_key: Option<String>,

    #[arg(long, env = "GRIDSHAPE_FILES_URL", default_value = "http://127.0.0.1:8080/files")]
    files_url: String,

    #[arg(long, env = "GRIDSHAPE_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

fn fixture_rows() -> FixtureDataSource {
    FixtureDataSource::from_json([
        json!({"id": 1, "name": "Ann Lee", "email": "ann@example.com", "status": "1", "score": 14,
               "created_at": "2024-03-01 09:12:00", "name_file_key": "ann.png",
               "name_file_disk": "local", "name_file_base_url": null}),
        json!({"id": 2, "name": "Bob Ray", "email": "bob@example.com", "status": "2", "score": 3,
               "created_at": "2024-03-04 16:40:00", "name_file_key": null,
               "name_file_disk": null, "name_file_base_url": null}),
        json!({"id": 3, "name": "Cy Park", "email": "cy@example.com", "status": "1", "score": 11,
               "created_at": "2024-04-11 08:05:00", "name_file_key": "cy.jpg",
               "name_file_disk": "s3", "name_file_base_url": "https://cdn.example.com"}),
    ])
}

async fn users_grid(
    State(services): State<GridServices>,
    params: GridParams,
) -> Result<Json<GridResponse>, GridError> {
    let base = QueryPlan::table("users u").order_by("u.id", SortDirection::Asc);
    let grid = DataGrid::for_query(params.context, params.request, base)
        .add_column("u.id", "Id", ColumnType::Number)
        .add_advanced_column(
            ColumnDefinition::builder("name", "u.name")
                .label("Name")
                .subtitle("email", "u.email")
                .avatar("u.avatar_id")
                .build(),
        )
        .add_advanced_column(
            ColumnDefinition::builder("status", "u.status")
                .label("Status")
                .kind(ColumnType::Enum)
                .enumerators([("1", "Active"), ("2", "Suspended")])
                .build(),
        )
        .add_icon_column(
            "u.score",
            "Trend",
            IconSpec::Rules(vec![
                IconRule::when(CompareOp::Gt, "10", "mdi-trending-up").color("green"),
                IconRule::fallback("mdi-trending-neutral"),
            ]),
        )
        .add_column("u.created_at", "Created", ColumnType::Timestamp)
        .add_custom_column("actions", "Actions")
        .views([
            LayoutDefinition::builder("Everything")
                .column("id")
                .column("name")
                .column("status")
                .column("score")
                .column("created_at")
                .column("actions")
                .as_default()
                .build(),
            LayoutDefinition::builder("Recent")
                .column("name")
                .column("created_at")
                .sort("u.created_at", SortDirection::Desc)
                .build(),
        ])
        .hyperlinks()
        .map(|mut row| {
            let id = row.get("id").cloned().unwrap_or_default();
            row.insert("actions".to_string(), json!({"edit": format!("/users/{id}/edit")}));
            row
        })
        .build(&services)
        .await?;
    Ok(Json(grid.get().await?))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let attachments = match &args.signing_key {
        Some(key) => SignedUrlStorage::from_hex_key(key, &args.files_url)?,
        None => {
            tracing::warn!("no signing key configured, using a fixed demo key");
            SignedUrlStorage::new(
                blake3::derive_key("gridshape demo attachment signing", b"demo"),
                &args.files_url,
            )
        }
    };

    let services = GridServices::new(
        Arc::new(fixture_rows()),
        Arc::new(MemoryConfigurationStore::new()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(attachments),
    );

    let config = HttpConfig {
        host: args.host,
        port: args.port,
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        ..HttpConfig::default()
    };

    let routes = Router::new()
        .route("/users", get(users_grid))
        .merge(layout_routes());
    let router = build_http_layers(routes, &config).with_state(services);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "gridshape demo listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
