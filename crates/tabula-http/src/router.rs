//! Router assembly and serving.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{MethodRouter, get};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use tabula_core::EntityService;

use crate::handlers::{
    ResourceState, create_record, delete_record, get_record, list_records, method_not_allowed,
    route_not_found, update_record,
};

/// Whether server faults echo their detail to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

/// Builder for the HTTP application.
///
/// ```no_run
/// # use tabula_core::{EntityService, Schema, FieldSpec, DocumentRepository, MemoryStore};
/// # use tabula_http::{Api, RunMode};
/// let schema = Schema::new("tarefas", "Task").field(FieldSpec::text("titulo").required());
/// let service = EntityService::new(schema, DocumentRepository::new(MemoryStore::new()));
/// let app = Api::new(RunMode::Production).resource(service).router();
/// ```
#[derive(Debug)]
pub struct Api {
    mode: RunMode,
    services: Vec<EntityService>,
}

impl Api {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            services: Vec::new(),
        }
    }

    /// Mount a resource at `/<resource>`.
    pub fn resource(mut self, service: EntityService) -> Self {
        self.services.push(service);
        self
    }

    /// Method and path of every mounted resource route.
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints = Vec::new();
        for service in &self.services {
            let resource = service.schema().resource();
            endpoints.push(format!("GET /{resource}"));
            endpoints.push(format!("GET /{resource}/:id"));
            if !service.schema().is_read_only() {
                endpoints.push(format!("POST /{resource}"));
                endpoints.push(format!("PUT /{resource}/:id"));
                endpoints.push(format!("DELETE /{resource}/:id"));
            }
        }
        endpoints
    }

    /// Build the router with CORS and request tracing.
    pub fn router(self) -> Router {
        let banner = json!({
            "name": "tabula",
            "version": env!("CARGO_PKG_VERSION"),
            "message": "tabula is running",
            "endpoints": self.endpoints(),
        });

        let mut app = Router::new()
            .route("/", get(move || index(banner.clone())))
            .route("/health", get(health));

        for service in self.services {
            app = app.merge(resource_routes(service, self.mode));
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        app.fallback(route_not_found)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }
}

fn resource_routes(service: EntityService, mode: RunMode) -> Router {
    let resource = service.schema().resource().to_string();
    let read_only = service.schema().is_read_only();
    let state = Arc::new(ResourceState { service, mode });

    let mut collection: MethodRouter<Arc<ResourceState>> = get(list_records);
    let mut item: MethodRouter<Arc<ResourceState>> = get(get_record);
    if !read_only {
        collection = collection.post(create_record);
        item = item.put(update_record).delete(delete_record);
    }

    Router::new()
        .route(
            &format!("/{resource}"),
            collection.fallback(method_not_allowed),
        )
        .route(
            &format!("/{resource}/:id"),
            item.fallback(method_not_allowed),
        )
        .with_state(state)
}

async fn index(banner: Value) -> axum::Json<Value> {
    axum::Json(banner)
}

async fn health() -> axum::Json<Value> {
    axum::Json(json!({ "ok": true }))
}

/// Serve the application on an already bound listener until `shutdown`
/// resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
