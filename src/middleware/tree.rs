//! The named-middleware tree.

use std::collections::BTreeMap;

use crate::handler::BoxedHandler;

/// One node of the tree: a directory of further nodes, or a loaded middleware.
#[derive(Clone, Debug)]
pub enum Node {
    Directory(BTreeMap<String, Node>),
    Middleware(BoxedHandler),
}

impl Node {
    pub fn as_middleware(&self) -> Option<&BoxedHandler> {
        match self {
            Self::Middleware(handler) => Some(handler),
            Self::Directory(_) => None,
        }
    }
}

/// Loaded middleware, mirroring the directory layout of the middlewares root.
///
/// `middlewares/auth/check-admin.rs` is reachable as `["auth", "checkAdmin"]`,
/// or `"auth.checkAdmin"` through [`MiddlewareTree::middleware`].
#[derive(Clone, Debug, Default)]
pub struct MiddlewareTree {
    root: BTreeMap<String, Node>,
}

impl MiddlewareTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Looks up the node at `path`. The empty path has no node.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;
        let mut map = &self.root;
        for segment in parents {
            match map.get(segment.as_ref())? {
                Node::Directory(children) => map = children,
                Node::Middleware(_) => return None,
            }
        }
        map.get(last.as_ref())
    }

    /// Looks up a middleware by its dotted key path, e.g. `"auth.checkAdmin"`.
    pub fn middleware(&self, dotted: &str) -> Option<&BoxedHandler> {
        let path: Vec<&str> = dotted.split('.').collect();
        self.get(&path)?.as_middleware()
    }

    /// Every middleware with its dotted key path, in key order.
    pub fn entries(&self) -> Vec<(String, &BoxedHandler)> {
        fn walk<'t>(
            map: &'t BTreeMap<String, Node>,
            prefix: &str,
            out: &mut Vec<(String, &'t BoxedHandler)>,
        ) {
            for (key, node) in map {
                let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                match node {
                    Node::Middleware(handler) => out.push((path, handler)),
                    Node::Directory(children) => walk(children, &path, out),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.root, "", &mut out);
        out
    }

    /// The directory mapping at `segments`, created on the way down.
    ///
    /// `None` when some segment is already a middleware: a file claimed the
    /// name first and everything beneath a same-named directory is shadowed.
    pub(crate) fn directory_mut(&mut self, segments: &[String]) -> Option<&mut BTreeMap<String, Node>> {
        let mut map = &mut self.root;
        for segment in segments {
            let node = map
                .entry(segment.clone())
                .or_insert_with(|| Node::Directory(BTreeMap::new()));
            match node {
                Node::Directory(children) => map = children,
                Node::Middleware(_) => return None,
            }
        }
        Some(map)
    }
}
