//! Handler and middleware modules.
//!
//! Every routable file in a tree is a marker for a *module*: a factory the
//! composer calls once while building the table. Rust has no runtime
//! `require`, so modules are registered ahead of time under the file's path
//! relative to the tree root and fetched through a [`ModuleLoader`].
//!
//! ```rust
//! use dirroute::{BoxedHandler, ModuleRegistry, Request};
//!
//! struct App;
//!
//! async fn list_owners(_req: Request) -> &'static str { "[]" }
//!
//! let routes = ModuleRegistry::<App>::new()
//!     .route("owners/get.rs", |_app, _tree, _chain| Ok(BoxedHandler::new(list_owners).into()));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::BoxError;
use crate::handler::BoxedHandler;
use crate::middleware::MiddlewareTree;

/// Route handler factory: `(app, middleware tree, this route's middleware chain)`.
///
/// The chain is this route's own copy: removing or reordering entries opts
/// this route out of ambient middleware without touching its siblings.
pub type RouteFactory<A> = Arc<
    dyn Fn(&A, &MiddlewareTree, &mut Vec<BoxedHandler>) -> Result<Exported, BoxError> + Send + Sync,
>;

/// Scope middleware factory, for files inside `^` directories and `^verb` files.
pub type ScopeFactory<A> =
    Arc<dyn Fn(&A, &MiddlewareTree) -> Result<Exported, BoxError> + Send + Sync>;

/// Named middleware factory, for files under the middlewares root.
pub type LibraryFactory<A> = Arc<dyn Fn(&A) -> Result<BoxedHandler, BoxError> + Send + Sync>;

/// What a route or scope factory hands back: one callable or several, in order.
#[derive(Clone, Debug)]
pub enum Exported {
    One(BoxedHandler),
    Many(Vec<BoxedHandler>),
}

impl Exported {
    pub fn into_vec(self) -> Vec<BoxedHandler> {
        match self {
            Self::One(handler) => vec![handler],
            Self::Many(handlers) => handlers,
        }
    }
}

impl From<BoxedHandler> for Exported {
    fn from(handler: BoxedHandler) -> Self {
        Self::One(handler)
    }
}

impl From<Vec<BoxedHandler>> for Exported {
    fn from(handlers: Vec<BoxedHandler>) -> Self {
        Self::Many(handlers)
    }
}

/// A loaded module, by the factory shape it exports.
pub enum Module<A> {
    Route(RouteFactory<A>),
    Scope(ScopeFactory<A>),
    Library(LibraryFactory<A>),
}

impl<A> Module<A> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Route(_) => "route factory",
            Self::Scope(_) => "scope middleware factory",
            Self::Library(_) => "named middleware factory",
        }
    }
}

impl<A> Clone for Module<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Route(f) => Self::Route(Arc::clone(f)),
            Self::Scope(f) => Self::Scope(Arc::clone(f)),
            Self::Library(f) => Self::Library(Arc::clone(f)),
        }
    }
}

impl<A> fmt::Debug for Module<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Resolves a file, relative to the root of the tree being composed, to its module.
pub trait ModuleLoader<A> {
    /// # Errors
    /// Any error here surfaces as [`Error::ModuleLoad`](crate::Error::ModuleLoad).
    fn load(&self, relative_path: &Path) -> Result<Module<A>, BoxError>;
}

/// The default [`ModuleLoader`]: a map from relative path to module.
pub struct ModuleRegistry<A> {
    modules: HashMap<PathBuf, Module<A>>,
}

impl<A> ModuleRegistry<A> {
    pub fn new() -> Self {
        Self { modules: HashMap::new() }
    }

    pub fn route<F>(self, path: impl Into<PathBuf>, factory: F) -> Self
    where
        F: Fn(&A, &MiddlewareTree, &mut Vec<BoxedHandler>) -> Result<Exported, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(path, Module::Route(Arc::new(factory)))
    }

    pub fn scope<F>(self, path: impl Into<PathBuf>, factory: F) -> Self
    where
        F: Fn(&A, &MiddlewareTree) -> Result<Exported, BoxError> + Send + Sync + 'static,
    {
        self.insert(path, Module::Scope(Arc::new(factory)))
    }

    pub fn library<F>(self, path: impl Into<PathBuf>, factory: F) -> Self
    where
        F: Fn(&A) -> Result<BoxedHandler, BoxError> + Send + Sync + 'static,
    {
        self.insert(path, Module::Library(Arc::new(factory)))
    }

    /// Registers `module` at `path`, replacing any earlier registration.
    pub fn insert(mut self, path: impl Into<PathBuf>, module: Module<A>) -> Self {
        self.modules.insert(path.into(), module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<A> Default for ModuleRegistry<A> {
    fn default() -> Self { Self::new() }
}

impl<A> ModuleLoader<A> for ModuleRegistry<A> {
    fn load(&self, relative_path: &Path) -> Result<Module<A>, BoxError> {
        self.modules
            .get(relative_path)
            .cloned()
            .ok_or_else(|| format!("no module registered for `{}`", relative_path.display()).into())
    }
}
