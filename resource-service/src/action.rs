//! Action Catalog
//!
//! The fixed set of symbolic CRUD actions a resource service can expose, and
//! the named groups used to register them in bulk. Each action binds to
//! exactly one method and sub-path:
//!
//! | Action         | Method | Sub-path         |
//! |----------------|--------|------------------|
//! | `GetByID`      | GET    | `/{id}`          |
//! | `First`        | POST   | `/first`         |
//! | `List`         | POST   | `/list`          |
//! | `Page`         | POST   | `/page`          |
//! | `Create`       | POST   | (base path)      |
//! | `Update`       | PUT    | `/{id}`          |
//! | `UpdateFields` | PATCH  | `/{id}`          |
//! | `Remove`       | DELETE | `/{id}/remove`   |
//! | `Restore`      | DELETE | `/{id}/restore`  |
//! | `Destroy`      | DELETE | `/{id}/destroy`  |

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::error::{Error, Result};

/// Symbolic CRUD operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    GetById,
    First,
    List,
    Page,
    /// Also accepted as `Store`
    Create,
    Update,
    UpdateFields,
    Remove,
    /// Also accepted as `Resotre`
    Restore,
    /// Also accepted as `Destory`
    Destroy,
}

impl Action {
    /// Every action, in catalog order
    pub const ALL: [Action; 10] = [
        Action::GetById,
        Action::First,
        Action::List,
        Action::Page,
        Action::Create,
        Action::Update,
        Action::UpdateFields,
        Action::Remove,
        Action::Restore,
        Action::Destroy,
    ];

    /// Canonical name
    pub const fn name(self) -> &'static str {
        match self {
            Action::GetById => "GetByID",
            Action::First => "First",
            Action::List => "List",
            Action::Page => "Page",
            Action::Create => "Create",
            Action::Update => "Update",
            Action::UpdateFields => "UpdateFields",
            Action::Remove => "Remove",
            Action::Restore => "Restore",
            Action::Destroy => "Destroy",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Action::GetById => Method::GET,
            Action::First | Action::List | Action::Page | Action::Create => Method::POST,
            Action::Update => Method::PUT,
            Action::UpdateFields => Method::PATCH,
            Action::Remove | Action::Restore | Action::Destroy => Method::DELETE,
        }
    }

    /// Sub-path relative to the resource's base path
    ///
    /// `{id}` is the axum capture for the primary key. Create mounts at the
    /// base path itself and returns an empty string.
    pub const fn path(self) -> &'static str {
        match self {
            Action::GetById | Action::Update | Action::UpdateFields => "/{id}",
            Action::First => "/first",
            Action::List => "/list",
            Action::Page => "/page",
            Action::Create => "",
            Action::Remove => "/{id}/remove",
            Action::Restore => "/{id}/restore",
            Action::Destroy => "/{id}/destroy",
        }
    }

    /// Whether a success changes an existing row and must invalidate its cache
    pub const fn invalidates_cache(self) -> bool {
        matches!(
            self,
            Action::Update
                | Action::UpdateFields
                | Action::Remove
                | Action::Restore
                | Action::Destroy
        )
    }

    /// Whether the model must support soft deletes for this action to exist
    pub const fn requires_soft_delete(self) -> bool {
        matches!(self, Action::Remove | Action::Restore)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let action = match s.to_ascii_lowercase().as_str() {
            "getbyid" => Action::GetById,
            "first" => Action::First,
            "list" => Action::List,
            "page" => Action::Page,
            "create" | "store" => Action::Create,
            "update" => Action::Update,
            "updatefields" => Action::UpdateFields,
            "remove" => Action::Remove,
            "restore" | "resotre" => Action::Restore,
            "destroy" | "destory" => Action::Destroy,
            _ => return Err(Error::unsupported_action(s)),
        };
        Ok(action)
    }
}

/// Named group of actions for bulk registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSet {
    /// GetByID, First, List, Page
    Read,
    /// Create, Update, UpdateFields
    Write,
    /// Remove, Restore, Destroy
    Delete,
    /// Restore, Destroy
    Admin,
    /// Every action
    All,
}

impl ActionSet {
    pub fn actions(self) -> &'static [Action] {
        const READ: &[Action] = &[Action::GetById, Action::First, Action::List, Action::Page];
        const WRITE: &[Action] = &[Action::Create, Action::Update, Action::UpdateFields];
        const DELETE: &[Action] = &[Action::Remove, Action::Restore, Action::Destroy];
        const ADMIN: &[Action] = &[Action::Restore, Action::Destroy];

        match self {
            ActionSet::Read => READ,
            ActionSet::Write => WRITE,
            ActionSet::Delete => DELETE,
            ActionSet::Admin => ADMIN,
            ActionSet::All => &Action::ALL,
        }
    }
}

impl FromStr for ActionSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let set = match s.to_ascii_lowercase().as_str() {
            "read" => ActionSet::Read,
            "write" => ActionSet::Write,
            "delete" => ActionSet::Delete,
            "admin" => ActionSet::Admin,
            "all" => ActionSet::All,
            _ => return Err(Error::unsupported_action(s)),
        };
        Ok(set)
    }
}

/// Resolve a mix of action and set names into a flat action list
///
/// Set names are tried first, so `"admin"` is the set rather than an
/// action. Order follows first appearance and repeats are dropped.
///
/// ```rust
/// use resource_service::action::{resolve_actions, Action};
///
/// let actions = resolve_actions(["read", "Store", "GetByID"]).unwrap();
/// assert_eq!(actions.len(), 5);
/// assert_eq!(actions[4], Action::Create);
/// ```
pub fn resolve_actions<I, S>(names: I) -> Result<Vec<Action>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut resolved: Vec<Action> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        let batch: Vec<Action> = match name.parse::<ActionSet>() {
            Ok(set) => set.actions().to_vec(),
            Err(_) => vec![name.parse::<Action>()?],
        };
        for action in batch {
            if !resolved.contains(&action) {
                resolved.push(action);
            }
        }
    }
    Ok(resolved)
}
