//! RPC Action Registry
//!
//! Non-HTTP handlers advertise their callable operations here. The registry
//! is filled once during start-up, then [`RpcRegistry::start`] asks each
//! handler for its actions, logs them and binds the handler into an
//! [`RpcTransport`] under its registered name. Nothing changes after that.
//!
//! ```rust
//! use resource_service::rpc::{InProcessTransport, RpcAction, RpcHandler, RpcRegistry};
//!
//! struct WidgetRpc;
//!
//! impl RpcHandler for WidgetRpc {
//!     fn actions(&self, _scope: &str) -> resource_service::Result<Vec<RpcAction>> {
//!         Ok(vec![RpcAction::new("Count", "Empty", "CountReply")])
//!     }
//! }
//!
//! let mut registry = RpcRegistry::new();
//! registry.register(WidgetRpc);
//!
//! let mut transport = InProcessTransport::new();
//! let catalog = registry.start(&mut transport).unwrap();
//! assert_eq!(catalog.actions("WidgetRpc").unwrap()[0].to_string(), "Count(Empty, CountReply)");
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::resource::short_type_name;

/// Scope passed to [`RpcHandler::actions`] at start-up
pub const ALL_SCOPE: &str = "all";

/// One callable operation: name plus request and response shape labels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RpcAction {
    name: String,
    request: String,
    response: String,
}

impl RpcAction {
    pub fn new(name: impl Into<String>, request: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: request.into(),
            response: response.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn response(&self) -> &str {
        &self.response
    }
}

impl fmt::Display for RpcAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.name, self.request, self.response)
    }
}

/// A non-HTTP handler that can list its callable operations
pub trait RpcHandler: Send + Sync {
    /// Actions visible under `scope`; start-up always asks for [`ALL_SCOPE`]
    fn actions(&self, scope: &str) -> Result<Vec<RpcAction>>;
}

/// Whatever carries RPC calls to bound handlers
pub trait RpcTransport {
    fn bind(&mut self, name: &str, handler: Arc<dyn RpcHandler>) -> Result<()>;
}

/// Transport that keeps bound handlers in a map, for in-process dispatch
#[derive(Default)]
pub struct InProcessTransport {
    handlers: HashMap<String, Arc<dyn RpcHandler>>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler bound under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn RpcHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl RpcTransport for InProcessTransport {
    fn bind(&mut self, name: &str, handler: Arc<dyn RpcHandler>) -> Result<()> {
        if self.handlers.contains_key(name) {
            return Err(Error::Rpc(format!("handler {} is already bound", name)));
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }
}

/// Append-only list of RPC handlers, consumed by [`start`](Self::start)
#[derive(Default)]
pub struct RpcRegistry {
    handlers: Vec<(String, Arc<dyn RpcHandler>)>,
}

impl RpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its type name
    ///
    /// `my_app::rpc::WidgetRpc` registers as `WidgetRpc`.
    pub fn register<H: RpcHandler + 'static>(&mut self, handler: H) -> &mut Self {
        self.register_named(short_type_name::<H>(), handler)
    }

    /// Register a handler under an explicit name
    pub fn register_named<H: RpcHandler + 'static>(&mut self, name: impl Into<String>, handler: H) -> &mut Self {
        self.handlers.push((name.into(), Arc::new(handler)));
        self
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Enumerate, log and bind every handler
    ///
    /// Names are checked for duplicates before anything is bound, so a
    /// failed start leaves the transport untouched unless the transport
    /// itself or a handler's enumeration fails midway.
    pub fn start<T: RpcTransport + ?Sized>(self, transport: &mut T) -> Result<RpcCatalog> {
        let mut seen = HashSet::new();
        for (name, _) in &self.handlers {
            if !seen.insert(name.as_str()) {
                return Err(Error::Rpc(format!("duplicate RPC handler name: {}", name)));
            }
        }

        let mut entries = Vec::with_capacity(self.handlers.len());
        for (name, handler) in self.handlers {
            let actions = handler
                .actions(ALL_SCOPE)
                .map_err(|e| Error::Rpc(format!("{} failed to list its actions: {}", name, e)))?;

            let listing = actions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            transport.bind(&name, handler)?;
            info!(handler = %name, actions = actions.len(), "{} [{}]", name, listing);

            entries.push((name, actions));
        }

        Ok(RpcCatalog { entries })
    }
}

/// Snapshot of what was bound at start-up, for introspection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcCatalog {
    entries: Vec<(String, Vec<RpcAction>)>,
}

impl RpcCatalog {
    /// Actions advertised by `name`
    pub fn actions(&self, name: &str) -> Option<&[RpcAction]> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, actions)| actions.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RpcAction])> {
        self.entries
            .iter()
            .map(|(name, actions)| (name.as_str(), actions.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WidgetRpc;

    impl RpcHandler for WidgetRpc {
        fn actions(&self, _scope: &str) -> Result<Vec<RpcAction>> {
            Ok(vec![
                RpcAction::new("Count", "Empty", "CountReply"),
                RpcAction::new("Rename", "RenameRequest", "Widget"),
            ])
        }
    }

    struct Silent;

    impl RpcHandler for Silent {
        fn actions(&self, _scope: &str) -> Result<Vec<RpcAction>> {
            Ok(Vec::new())
        }
    }

    struct Broken;

    impl RpcHandler for Broken {
        fn actions(&self, _scope: &str) -> Result<Vec<RpcAction>> {
            Err(Error::Internal("no listing".to_string()))
        }
    }

    #[test]
    fn test_action_display() {
        let action = RpcAction::new("Count", "Empty", "CountReply");
        assert_eq!(action.to_string(), "Count(Empty, CountReply)");
        assert_eq!(action.name(), "Count");
    }

    #[test]
    fn test_register_uses_type_name() {
        let mut registry = RpcRegistry::new();
        registry.register(WidgetRpc).register_named("quiet", Silent);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["WidgetRpc", "quiet"]);
    }

    #[test]
    fn test_start_binds_and_catalogs_in_order() {
        let mut registry = RpcRegistry::new();
        registry.register(WidgetRpc).register(Silent);

        let mut transport = InProcessTransport::new();
        let catalog = registry.start(&mut transport).unwrap();

        assert_eq!(transport.len(), 2);
        assert!(transport.get("WidgetRpc").is_some());
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["WidgetRpc", "Silent"]);
        assert_eq!(catalog.actions("WidgetRpc").unwrap().len(), 2);
        assert_eq!(catalog.actions("Silent").unwrap(), &[] as &[RpcAction]);
        assert!(catalog.actions("Missing").is_none());
    }

    #[test]
    fn test_duplicate_names_fail_before_binding() {
        let mut registry = RpcRegistry::new();
        registry.register(WidgetRpc).register_named("WidgetRpc", Silent);

        let mut transport = InProcessTransport::new();
        let err = registry.start(&mut transport).unwrap_err();
        assert!(matches!(err, Error::Rpc(_)));
        assert!(transport.is_empty());
    }

    #[test]
    fn test_enumeration_failure_is_reported() {
        let mut registry = RpcRegistry::new();
        registry.register(Broken);

        let err = registry.start(&mut InProcessTransport::new()).unwrap_err();
        assert!(err.to_string().contains("Broken failed to list its actions"));
    }

    #[test]
    fn test_empty_registry_starts_cleanly() {
        let catalog = RpcRegistry::new().start(&mut InProcessTransport::new()).unwrap();
        assert!(catalog.is_empty());
    }
}
