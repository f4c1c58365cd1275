//! Widget CRUD API on the in-memory adapters
//!
//! Run with:
//! ```bash
//! cargo run --example widget-api
//! ```
//!
//! Then:
//! ```bash
//! curl -X POST localhost:8080/api/widget -d '{"name":"sprocket","stock":3}'
//! curl localhost:8080/api/widget/1
//! curl -X POST localhost:8080/api/widget/page -d '{"page":1,"pageSize":10}'
//! curl -X PATCH localhost:8080/api/widget/1 -d '{"stock":7}'
//! curl -X DELETE localhost:8080/api/widget/1/remove
//! ```

use resource_service::prelude::*;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Widget {
    id: u64,
    name: String,
    stock: i64,
}

impl Resource for Widget {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Advertises the operations a widget RPC endpoint would expose
struct WidgetRpc;

impl RpcHandler for WidgetRpc {
    fn actions(&self, _scope: &str) -> Result<Vec<RpcAction>> {
        Ok(vec![
            RpcAction::new("Count", "Empty", "CountReply"),
            RpcAction::new("Restock", "RestockRequest", "Widget"),
        ])
    }
}

fn hooks() -> Hooks<Widget> {
    Hooks::new()
        .before_create(|widget: Widget, _| {
            if widget.name.trim().is_empty() {
                return Err(ApiError::vetoed("name is required"));
            }
            Ok(widget)
        })
        .before_delete(|widget: &Widget, _| {
            if widget.stock > 0 {
                return Err(ApiError::conflict("widget still has stock"));
            }
            Ok(())
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let service = Arc::new(
        ResourceService::new(
            ModelDescriptor::<Widget>::new("widget", "widgets"),
            Arc::new(InMemoryRepository::new()),
        )
        .with_cache(Arc::new(InMemoryCache::new()))
        .with_hooks(hooks())
        .with_settings(ResourceSettings::from(&config)),
    );

    let base = format!("{}/widget", config.service.base_path.trim_end_matches('/'));
    let app = service
        .router(&base, resolve_actions(["all"])?)?
        .layer(TraceLayer::new_for_http());

    let mut registry = RpcRegistry::new();
    registry.register(WidgetRpc);
    let catalog = registry.start(&mut InProcessTransport::new())?;
    tracing::info!(handlers = catalog.len(), "RPC handlers bound");

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.service.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
