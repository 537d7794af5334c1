//! Middleware bookkeeping for the composer.
//!
//! Two structures live here:
//!
//! - [`MiddlewareTree`] — every named middleware loaded from the middlewares
//!   root, addressed by normalized keys (`auth.jwt`, `rateLimit`). Built once,
//!   then handed read-only to every factory.
//! - [`MiddlewareStack`] — the frames in scope at the directory the composer
//!   is currently visiting, per verb. Pushed on the way down, popped on the
//!   way back up.

mod stack;
mod tree;

pub use stack::{Frame, MiddlewareStack};
pub use tree::{MiddlewareTree, Node};
