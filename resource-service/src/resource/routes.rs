//! Route binder: mounts a service's actions on an axum router

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    http::Method,
    routing::{delete, get, patch, post, put, MethodRouter},
    Router,
};
use tracing::debug;

use super::descriptor::Resource;
use super::handlers;
use super::service::ResourceService;
use crate::action::Action;
use crate::error::{Error, Result};
use crate::repository::ResourceRepository;

/// One action bound to its method, sub-path and handler
pub struct ActionRoute {
    pub action: Action,
    pub method: Method,
    /// Sub-path relative to the resource's base path
    pub path: &'static str,
    pub handler: MethodRouter,
}

impl std::fmt::Debug for ActionRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRoute")
            .field("action", &self.action)
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<M, R> ResourceService<M, R>
where
    M: Resource,
    R: ResourceRepository<M>,
{
    /// Resolve one action to its route
    ///
    /// Fails with [`Error::UnsupportedAction`] when the model cannot serve
    /// the action, e.g. Remove or Restore on a model without soft delete.
    pub fn route(self: &Arc<Self>, action: Action) -> Result<ActionRoute> {
        if !self.supports(action) {
            return Err(Error::unsupported_action(format!(
                "{} (model {} does not support it)",
                action,
                self.descriptor().type_name()
            )));
        }

        let state = Arc::clone(self);
        let handler = match action {
            Action::GetById => get(handlers::get_by_id::<M, R>).with_state(state),
            Action::First => post(handlers::first::<M, R>).with_state(state),
            Action::List => post(handlers::list::<M, R>).with_state(state),
            Action::Page => post(handlers::page::<M, R>).with_state(state),
            Action::Create => post(handlers::store::<M, R>).with_state(state),
            Action::Update => put(handlers::update::<M, R>).with_state(state),
            Action::UpdateFields => patch(handlers::update_fields::<M, R>).with_state(state),
            Action::Remove => delete(handlers::remove::<M, R>).with_state(state),
            Action::Restore => delete(handlers::restore::<M, R>).with_state(state),
            Action::Destroy => delete(handlers::destroy::<M, R>).with_state(state),
        };

        Ok(ActionRoute {
            action,
            method: action.method(),
            path: action.path(),
            handler,
        })
    }

    /// Build a router serving `actions` under `base`
    ///
    /// `base` gains a leading slash and loses any trailing one. Create is
    /// mounted on `base` itself. Asking for an action twice fails with
    /// [`Error::DuplicateRoute`].
    pub fn router<I>(self: &Arc<Self>, base: &str, actions: I) -> Result<Router>
    where
        I: IntoIterator<Item = Action>,
    {
        let base = normalize_base(base);
        let mut seen = HashSet::new();
        let mut router = Router::new();

        for action in actions {
            if !seen.insert(action) {
                return Err(Error::DuplicateRoute {
                    action: action.to_string(),
                });
            }

            let route = self.route(action)?;
            let path = join_path(&base, route.path);
            debug!(
                action = %route.action,
                method = %route.method,
                path = %path,
                model = self.descriptor().type_name(),
                "Binding resource route"
            );
            router = router.route(&path, route.handler);
        }

        Ok(router)
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn join_path(base: &str, sub: &str) -> String {
    let path = format!("{}{}", base, sub);
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionSet;
    use crate::repository::InMemoryRepository;
    use crate::resource::{ApiError, Hooks, ModelDescriptor};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
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

    type Service = ResourceService<Widget, InMemoryRepository<Widget>>;

    fn service() -> Arc<Service> {
        Arc::new(ResourceService::new(
            ModelDescriptor::new("widget", "widgets"),
            Arc::new(InMemoryRepository::new()),
        ))
    }

    fn app(service: &Arc<Service>) -> Router {
        service
            .router("/widget", ActionSet::All.actions().iter().copied())
            .unwrap()
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("widget/"), "/widget");
        assert_eq!(normalize_base("/api/widget"), "/api/widget");
        assert_eq!(normalize_base("/"), "");
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("/widget", "/{id}"), "/widget/{id}");
    }

    #[tokio::test]
    async fn test_route_reports_method_and_path() {
        let service = service();
        let route = service.route(Action::Restore).unwrap();
        assert_eq!(route.method, Method::DELETE);
        assert_eq!(route.path, "/{id}/restore");
    }

    #[tokio::test]
    async fn test_unsupported_action_is_rejected() {
        let service = Arc::new(ResourceService::new(
            ModelDescriptor::<Widget>::new("widget", "widgets").soft_deletable(false),
            Arc::new(InMemoryRepository::new()),
        ));
        let err = service.router("/widget", [Action::Remove]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAction { .. }));
        assert!(service.router("/widget", [Action::Destroy]).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_action_is_rejected() {
        let err = service()
            .router("/widget", [Action::List, Action::List])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { .. }));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service();
        let app = app(&service);

        let (status, body) = call(&app, Method::POST, "/widget", Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"ok": true, "data": {"widget": {"id": 1, "name": "x", "stock": 0}}})
        );

        let (status, body) = call(&app, Method::GET, "/widget/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["widget"]["name"], "x");
    }

    #[tokio::test]
    async fn test_missing_row_is_404_envelope() {
        let app = app(&service());
        let (status, body) = call(&app, Method::GET, "/widget/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
        assert!(body["error"].is_string());
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_404_envelope() {
        let app = app(&service());
        let (status, body) = call(&app, Method::GET, "/widget/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = app(&service());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/widget")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_client_id_at_u64_max_is_rejected() {
        let service = service();
        let app = app(&service);
        let (status, body) = call(
            &app,
            Method::POST,
            "/widget",
            Some(json!({"id": u64::MAX, "name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["ok"], false);
        assert!(service.repository().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_page() {
        let service = service();
        let app = app(&service);
        for name in ["a", "b", "c"] {
            call(&app, Method::POST, "/widget", Some(json!({"name": name, "stock": 1}))).await;
        }

        let (_, body) = call(
            &app,
            Method::POST,
            "/widget/list",
            Some(json!({"filters": [{"field": "name", "operator": "!=", "value": "b"}]})),
        )
        .await;
        assert_eq!(body["data"]["widgets"].as_array().unwrap().len(), 2);

        let (_, body) = call(
            &app,
            Method::POST,
            "/widget/page",
            Some(json!({"page": 2, "pageSize": 2})),
        )
        .await;
        assert_eq!(body["data"]["widgets"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["pagination"]["total"], 3);

        let (_, body) = call(&app, Method::POST, "/widget/first", None).await;
        assert_eq!(body["data"]["widget"]["name"], "a");
    }

    #[tokio::test]
    async fn test_update_and_update_fields() {
        let service = service();
        let app = app(&service);
        call(&app, Method::POST, "/widget", Some(json!({"name": "x", "stock": 5}))).await;

        let (status, body) = call(&app, Method::PUT, "/widget/1", Some(json!({"name": "y"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["widget"],
            json!({"id": 1, "name": "y", "stock": 0})
        );

        let (status, _) = call(&app, Method::PATCH, "/widget/1", Some(json!({"stock": 9}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, Method::GET, "/widget/1", None).await;
        assert_eq!(body["data"]["widget"], json!({"id": 1, "name": "y", "stock": 9}));
    }

    #[tokio::test]
    async fn test_remove_restore_destroy() {
        let service = service();
        let app = app(&service);
        call(&app, Method::POST, "/widget", Some(json!({"name": "x"}))).await;

        let (status, _) = call(&app, Method::DELETE, "/widget/1/remove", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::GET, "/widget/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::DELETE, "/widget/1/restore", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["widget"]["id"], 1);

        let (status, body) = call(&app, Method::DELETE, "/widget/1/destroy", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        assert!(service.repository().is_empty());
    }

    #[tokio::test]
    async fn test_vetoing_hook_returns_its_message() {
        let service = Arc::new(
            ResourceService::new(
                ModelDescriptor::<Widget>::new("widget", "widgets"),
                Arc::new(InMemoryRepository::new()),
            )
            .with_hooks(Hooks::new().before_create(|widget: Widget, _| {
                if widget.name.is_empty() {
                    return Err(ApiError::vetoed("name is required"));
                }
                Ok(widget)
            })),
        );
        let app = app(&service);

        let (status, body) = call(&app, Method::POST, "/widget", Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, json!({"ok": false, "error": "name is required"}));
        assert!(service.repository().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_action_is_not_routed() {
        let service = service();
        let app = service.router("/widget", [Action::GetById]).unwrap();
        let (status, _) = call(&app, Method::POST, "/widget/list", None).await;
        assert!(status == StatusCode::NOT_FOUND || status == StatusCode::METHOD_NOT_ALLOWED);
    }
}
