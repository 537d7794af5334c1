//! # dirroute
//!
//! Your directory tree is your route table.
//!
//! ## The contract
//!
//! Directories become URL paths. Filenames become verbs. Nesting becomes
//! middleware scope. dirroute walks the tree once at startup and hands back
//! an ordered list of registrations; matching requests against them is the
//! job of whatever router you feed them to.
//!
//! | On disk | Means |
//! |---|---|
//! | `owners/get.rs` | `GET /owners` |
//! | `owners/$id/put.rs` | `PUT /owners/:id` |
//! | `owners/get.star.rs` | `GET /owners*`, registered ahead of `GET /owners` |
//! | `2.post.rs`, `10.post.rs` | explicit order: 2 before 10 |
//! | `^get.rs` | default `GET` middleware for this path and below, no route |
//! | `^auth/…` | middleware scope: everything under it runs behind `^auth`'s files, no URL segment |
//! | `all.rs` | every method |
//!
//! Files that don't fit the grammar are ignored, so fixtures and notes can
//! sit next to handlers.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use dirroute::{BoxedHandler, Composer, ComposerOptions, ModuleRegistry, Request, Router};
//!
//! struct App;
//!
//! async fn list_owners(_req: Request) -> &'static str { "[]" }
//! async fn get_owner(req: Request) -> String { format!("owner {}", req.param("id").unwrap_or("?")) }
//!
//! # fn main() -> Result<(), dirroute::Error> {
//! let routes = ModuleRegistry::<App>::new()
//!     .route("owners/get.rs",     |_app, _tree, _chain| Ok(BoxedHandler::new(list_owners).into()))
//!     .route("owners/$id/get.rs", |_app, _tree, _chain| Ok(BoxedHandler::new(get_owner).into()));
//!
//! let composer = Composer::new(App, ComposerOptions::default())?;
//! let middlewares = composer.load_middlewares("app/middlewares", &ModuleRegistry::<App>::new())?;
//! let records = composer.routify("app/routes", &routes, &middlewares)?;
//! let router = Router::from_records(records)?;
//! # Ok(())
//! # }
//! ```

mod composer;
mod config;
mod error;
mod handler;
mod method;
mod module;
mod request;
mod response;
mod router;

pub mod filename;
pub mod middleware;
pub mod scanner;

pub use composer::Composer;
pub use config::ComposerOptions;
pub use error::{BoxError, Error, Result};
pub use handler::{BoxFuture, BoxedHandler, Handler, Next};
pub use method::{Method, Verb};
pub use middleware::{MiddlewareTree, Node};
pub use module::{Exported, LibraryFactory, Module, ModuleLoader, ModuleRegistry, RouteFactory, ScopeFactory};
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::{RegistrationRecord, RouteSink, Router, WILDCARD_PARAM};
pub use scanner::{DirectoryListing, FsScanner, Scanner};
