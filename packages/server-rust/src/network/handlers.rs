//! Layout management endpoints.
//!
//! Grid endpoints themselves are declared by the application, since each one
//! defines its own columns; see [`crate::grid::DataGrid`]. These routes let a
//! client save, select and delete layouts for any grid. The grid is named by
//! the `ref` query parameter and scoped to the principal in request
//! extensions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Extension, Json, Router};
use gridshape_core::{ConfigKey, GridContext, LayoutDefinition, Principal};
use serde::Deserialize;

use crate::error::GridError;
use crate::service::GridServices;

/// Identifies the grid a layout request applies to.
#[derive(Debug, Deserialize)]
pub struct LayoutTarget {
    #[serde(rename = "ref")]
    pub table_ref: String,
}

impl LayoutTarget {
    fn key(&self, principal: Option<Extension<Principal>>) -> ConfigKey {
        GridContext::from_path(&self.table_ref, principal.map(|Extension(p)| p)).config_key()
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveLayout {
    pub layout: LayoutDefinition,
    /// Make the saved layout current.
    #[serde(default)]
    pub select: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectLayout {
    pub id: String,
}

/// Routes under `/layouts`, to be nested or merged into the application router.
pub fn layout_routes() -> Router<GridServices> {
    Router::new()
        .route("/layouts", post(save_layout_handler))
        .route(
            "/layouts/current",
            post(select_layout_handler).delete(reset_layout_handler),
        )
        .route("/layouts/{id}", delete(delete_layout_handler))
}

/// Saves a custom layout and returns it with its generated id.
pub async fn save_layout_handler(
    State(services): State<GridServices>,
    Query(target): Query<LayoutTarget>,
    principal: Option<Extension<Principal>>,
    Json(body): Json<SaveLayout>,
) -> Result<Json<LayoutDefinition>, GridError> {
    let saved = services
        .layouts()
        .save_layout(&target.key(principal), body.layout, body.select)
        .await?;
    Ok(Json(saved))
}

pub async fn select_layout_handler(
    State(services): State<GridServices>,
    Query(target): Query<LayoutTarget>,
    principal: Option<Extension<Principal>>,
    Json(body): Json<SelectLayout>,
) -> Result<StatusCode, GridError> {
    services
        .layouts()
        .select_layout(&target.key(principal), &body.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_layout_handler(
    State(services): State<GridServices>,
    Query(target): Query<LayoutTarget>,
    principal: Option<Extension<Principal>>,
) -> Result<StatusCode, GridError> {
    services.layouts().reset_layout(&target.key(principal)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_layout_handler(
    State(services): State<GridServices>,
    Path(id): Path<String>,
    Query(target): Query<LayoutTarget>,
    principal: Option<Extension<Principal>>,
) -> Result<StatusCode, GridError> {
    services
        .layouts()
        .delete_layout(&target.key(principal), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum::routing::get;
    use gridshape_core::{ColumnType, GridResponse, QueryPlan};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::grid::DataGrid;
    use crate::network::extract::encode_state;
    use crate::network::GridParams;
    use crate::storage::{
        FixtureDataSource, MemoryConfigurationStore, MemorySessionStore, SignedUrlStorage,
    };
    use crate::traits::ConfigurationGateway;

    async fn users_grid(
        State(services): State<GridServices>,
        params: GridParams,
    ) -> Result<Json<GridResponse>, GridError> {
        let grid = DataGrid::for_query(params.context, params.request, QueryPlan::table("users u"))
            .add_column("u.name", "Name", ColumnType::Plain)
            .views([LayoutDefinition::builder("Default").column("name").as_default().build()])
            .build(&services)
            .await?;
        Ok(Json(grid.get().await?))
    }

    fn app() -> (Router, Arc<MemoryConfigurationStore>) {
        let configuration = Arc::new(MemoryConfigurationStore::new());
        let services = GridServices::new(
            Arc::new(FixtureDataSource::from_json([
                json!({"name": "Ann"}),
                json!({"name": "Bob"}),
            ])),
            Arc::clone(&configuration) as _,
            Arc::new(MemorySessionStore::new()),
            Arc::new(SignedUrlStorage::new([3; 32], "https://files.example.com")),
        );
        let router = Router::new()
            .route("/admin/users", get(users_grid))
            .merge(layout_routes())
            .with_state(services);
        (router, configuration)
    }

    fn principal() -> Principal {
        Principal {
            id: "9".to_string(),
            roles: Vec::new(),
        }
    }

    fn key() -> ConfigKey {
        ConfigKey {
            table_ref: "admin/users".to_string(),
            identity: Some("9".to_string()),
        }
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .extension(principal());
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn grid_endpoint_serves_a_page() {
        let (router, _) = app();
        let state: gridshape_core::GridRequest =
            serde_json::from_value(json!({"itemsPerPage": 1, "page": 2})).unwrap();
        let uri = format!("/admin/users?q={}", encode_state(&state).unwrap());
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([{"name": "Bob"}]));
        assert_eq!(body["metaData"]["tableRef"], json!("admin/users"));
        assert_eq!(body["metaData"]["totalPages"], json!(2));
        assert_eq!(body["metaData"]["layouts"][0]["id"], json!("predefined_0"));
    }

    #[tokio::test]
    async fn saved_layout_becomes_current_for_the_grid() {
        let (router, configuration) = app();
        let (status, saved) = send(
            &router,
            Method::POST,
            "/layouts?ref=admin/users",
            Some(json!({"layout": {"label": "Mine", "columns": [{"value": "name"}]}, "select": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = saved["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("custom_"));

        let stored = configuration.get_configuration(&key()).await.unwrap();
        assert_eq!(stored.current_layout.as_deref(), Some(id.as_str()));

        let (_, body) = send(&router, Method::GET, "/admin/users", None).await;
        assert_eq!(body["metaData"]["currentLayout"], json!(id));
        assert_eq!(body["metaData"]["layouts"][1]["current"], json!(true));
    }

    #[tokio::test]
    async fn select_and_reset_current_layout() {
        let (router, configuration) = app();
        let (status, _) = send(
            &router,
            Method::POST,
            "/layouts/current?ref=admin/users",
            Some(json!({"id": "predefined_0"})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let stored = configuration.get_configuration(&key()).await.unwrap();
        assert_eq!(stored.current_layout.as_deref(), Some("predefined_0"));

        let (status, _) =
            send(&router, Method::DELETE, "/layouts/current?ref=admin/users", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let stored = configuration.get_configuration(&key()).await.unwrap();
        assert!(stored.current_layout.is_none());
    }

    #[tokio::test]
    async fn unknown_layouts_are_not_found() {
        let (router, _) = app();
        let (status, body) =
            send(&router, Method::DELETE, "/layouts/custom_nope?ref=admin/users", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "unknown layout: custom_nope"}));

        let (status, _) = send(
            &router,
            Method::POST,
            "/layouts/current?ref=admin/users",
            Some(json!({"id": "custom_nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn layout_requests_name_the_grid_in_the_query() {
        let (router, configuration) = app();
        let (status, _) = send(
            &router,
            Method::POST,
            "/layouts/current",
            Some(json!({"id": "predefined_0", "ref": "admin/users"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!configuration.has_configuration(&key()).await.unwrap());

        let (status, _) = send(&router, Method::DELETE, "/layouts/current", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_grid_declaration_is_unprocessable() {
        async fn broken(
            State(services): State<GridServices>,
            params: GridParams,
        ) -> Result<Json<GridResponse>, GridError> {
            let grid = DataGrid::for_query(params.context, params.request, QueryPlan::table("t"))
                .add_column("t.a", "A", ColumnType::Plain)
                .views(Vec::new())
                .build(&services)
                .await?;
            Ok(Json(grid.get().await?))
        }
        let (_, configuration) = app();
        let services = GridServices::new(
            Arc::new(FixtureDataSource::new(Vec::new())),
            configuration,
            Arc::new(MemorySessionStore::new()),
            Arc::new(SignedUrlStorage::new([3; 32], "https://files.example.com")),
        );
        let router = Router::new().route("/broken", get(broken)).with_state(services);
        let (status, body) = send(&router, Method::GET, "/broken", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("at least one layout"));
    }
}
