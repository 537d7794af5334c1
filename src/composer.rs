//! The composer: directory trees in, ordered route table out.
//!
//! ```text
//! routes/
//! ├── ^get.rs              default GET middleware for `/` and below
//! ├── owners/
//! │   ├── get.rs           GET    /owners
//! │   ├── get.star.rs      GET    /owners*        (registered before GET /owners)
//! │   └── $id/
//! │       └── 1.delete.rs  DELETE /owners/:id
//! └── ^auth/               middleware scope, no URL segment
//!     ├── all.rs           runs before everything under ^auth
//!     └── users/
//!         └── get.rs       GET    /users
//! ```
//!
//! Each directory is visited once, depth first. Middleware frames are
//! pushed when a scope opens and popped when it closes, whether or not the
//! subtree succeeded, so siblings never see each other's middleware.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::ComposerOptions;
use crate::error::{Error, Result};
use crate::filename::{
    decode_allowed, normalize_key, IgnorePattern, RouteDescriptor, MIDDLEWARE_MARKER,
    PARAMETER_MARKER,
};
use crate::handler::BoxedHandler;
use crate::method::Verb;
use crate::middleware::{Frame, MiddlewareStack, MiddlewareTree, Node};
use crate::module::{Module, ModuleLoader};
use crate::router::{RegistrationRecord, RouteSink};
use crate::scanner::{DirectoryListing, FsScanner, Scanner};

/// Builds route tables for an application handle `A`.
///
/// `A` is passed by reference to every module factory; it is whatever your
/// handlers need at construction time (a database pool, settings, …).
pub struct Composer<A, S = FsScanner> {
    app: A,
    options: ComposerOptions,
    ignore: IgnorePattern,
    scanner: S,
}

impl<A> Composer<A> {
    /// # Errors
    /// [`Error::InvalidIgnorePattern`] if the configured pattern does not compile.
    pub fn new(app: A, options: ComposerOptions) -> Result<Self> {
        Self::with_scanner(app, options, FsScanner)
    }
}

impl<A, S: Scanner> Composer<A, S> {
    pub fn with_scanner(app: A, options: ComposerOptions, scanner: S) -> Result<Self> {
        let ignore = options.ignore()?;
        Ok(Self { app, options, ignore, scanner })
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn options(&self) -> &ComposerOptions {
        &self.options
    }

    /// Composes the configured roots: loads `middlewares_root` (if set) with
    /// `middlewares`, then routifies `routes_root` with `routes`.
    ///
    /// # Errors
    /// [`Error::Configuration`] when no routes root is configured, otherwise
    /// anything [`load_middlewares`](Self::load_middlewares) or
    /// [`routify`](Self::routify) returns.
    pub fn build(
        &self,
        routes: &dyn ModuleLoader<A>,
        middlewares: &dyn ModuleLoader<A>,
    ) -> Result<Vec<RegistrationRecord>> {
        let Some(routes_root) = &self.options.routes_root else {
            return Err(Error::Configuration("no routes root configured".into()));
        };
        let tree = match &self.options.middlewares_root {
            Some(root) => self.load_middlewares(root, middlewares)?,
            None => MiddlewareTree::new(),
        };
        self.routify(routes_root, routes, &tree)
    }

    /// Loads every named middleware under `root` into a tree, skipping files
    /// that match the configured ignore pattern.
    pub fn load_middlewares(
        &self,
        root: impl AsRef<Path>,
        loader: &dyn ModuleLoader<A>,
    ) -> Result<MiddlewareTree> {
        self.load_middlewares_ignoring(root, loader, &self.ignore)
    }

    /// [`load_middlewares`](Self::load_middlewares) with an explicit ignore pattern.
    ///
    /// A file and a directory normalizing to the same key collide; the file
    /// is seen first and wins, the directory is skipped with a warning.
    pub fn load_middlewares_ignoring(
        &self,
        root: impl AsRef<Path>,
        loader: &dyn ModuleLoader<A>,
        ignore: &IgnorePattern,
    ) -> Result<MiddlewareTree> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(Error::Configuration("middlewares root is empty".into()));
        }

        let mut tree = MiddlewareTree::new();
        self.scanner.traverse(root, &mut |listing: &DirectoryListing| -> Result<()> {
            let relative = listing.directory.strip_prefix(root).unwrap_or(Path::new(""));
            let segments: Vec<String> = relative
                .components()
                .map(|c| normalize_key(&c.as_os_str().to_string_lossy(), false))
                .collect();

            let Some(directory) = tree.directory_mut(&segments) else {
                warn!(
                    dir = %listing.directory.display(),
                    key = %segments.join("."),
                    "a middleware file already owns this name, skipping directory"
                );
                return Ok(());
            };

            for file in &listing.files {
                if file.starts_with('.') || ignore.is_ignored(file) {
                    continue;
                }
                let key = normalize_key(file, true);
                let path = listing.directory.join(file);
                if directory.contains_key(&key) {
                    warn!(path = %path.display(), %key, "middleware name already taken, skipping file");
                    continue;
                }
                let handler = self.load_library(loader, &relative.join(file), &path, &key)?;
                if self.options.log_routes {
                    info!(key = %dotted(&segments, &key), path = %path.display(), "middleware loaded");
                }
                directory.insert(key, Node::Middleware(handler));
            }
            Ok(())
        })?;
        Ok(tree)
    }

    /// Walks `root` and returns its registrations in order.
    ///
    /// # Errors
    /// [`Error::Configuration`] for an empty root, [`Error::NotFound`] for a
    /// missing one, and any grammar or module error met on the way.
    pub fn routify(
        &self,
        root: impl AsRef<Path>,
        loader: &dyn ModuleLoader<A>,
        middlewares: &MiddlewareTree,
    ) -> Result<Vec<RegistrationRecord>> {
        let mut records = Vec::new();
        self.routify_into(root, loader, middlewares, &mut records)?;
        Ok(records)
    }

    /// Walks `root`, handing each registration to `sink` as soon as it is built.
    ///
    /// On error the sink may already hold some registrations; treat it as
    /// unusable.
    pub fn routify_into(
        &self,
        root: impl AsRef<Path>,
        loader: &dyn ModuleLoader<A>,
        middlewares: &MiddlewareTree,
        sink: &mut dyn RouteSink,
    ) -> Result<()> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(Error::Configuration("routes root is empty".into()));
        }

        let mut walk = Walk {
            composer: self,
            loader,
            tree: middlewares,
            sink,
            root,
            stack: MiddlewareStack::new(),
            segments: Vec::new(),
            registered: 0,
        };
        walk.visit(root, Mode::Normal)?;
        if self.options.log_routes {
            info!(root = %root.display(), routes = walk.registered, "routes composed");
        }
        Ok(())
    }

    fn load_library(
        &self,
        loader: &dyn ModuleLoader<A>,
        relative: &Path,
        path: &Path,
        key: &str,
    ) -> Result<BoxedHandler> {
        let failed = |err: Error| {
            error!(path = %path.display(), %key, error = %err, "failed to load middleware");
            err
        };

        let module = loader
            .load(relative)
            .map_err(|source| failed(Error::ModuleLoad { path: path.to_path_buf(), source }))?;
        let kind = module.kind();
        let Module::Library(factory) = module else {
            return Err(failed(Error::ModuleContract {
                path: path.to_path_buf(),
                reason: format!("expected a named middleware factory, found a {kind}"),
            }));
        };
        let handler = factory(&self.app)
            .map_err(|source| failed(Error::ModuleLoad { path: path.to_path_buf(), source }))?;

        if self.options.auto_name_anonymous_middleware && handler.name().is_none() {
            return Ok(handler.with_name(key));
        }
        Ok(handler)
    }
}

fn dotted(segments: &[String], key: &str) -> String {
    segments.iter().map(String::as_str).chain([key]).collect::<Vec<_>>().join(".")
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    Normal,
    Middleware,
}

/// State of one `routify` call. Dropped, with its stacks, when the call returns.
struct Walk<'w, A, S, L: ?Sized, K: ?Sized> {
    composer: &'w Composer<A, S>,
    loader: &'w L,
    tree: &'w MiddlewareTree,
    sink: &'w mut K,
    root: &'w Path,
    stack: MiddlewareStack,
    segments: Vec<String>,
    registered: usize,
}

impl<A, S, L, K> Walk<'_, A, S, L, K>
where
    S: Scanner,
    L: ModuleLoader<A> + ?Sized,
    K: RouteSink + ?Sized,
{
    fn visit(&mut self, dir: &Path, mode: Mode) -> Result<()> {
        let listing = self.composer.scanner.list_directory(dir)?;
        debug!(dir = %dir.display(), ?mode, "visiting");

        let allowed = self.composer.options.methods.as_deref();
        let mut descriptors = Vec::new();
        for file in &listing.files {
            if let Some(descriptor) = decode_allowed(&listing.directory, file, allowed) {
                descriptor.validate()?;
                descriptors.push(descriptor);
            }
        }
        arrange(&mut descriptors);

        match mode {
            Mode::Middleware => {
                let mut scope = Vec::new();
                for d in descriptors {
                    if d.middleware_prefix {
                        warn!(path = %d.absolute_path.display(), "default middleware inside a middleware directory is ignored");
                    } else if !d.has_numeric_prefix() && !d.star {
                        scope.push(d);
                    }
                }
                let frames = self.scope_frames(&scope)?;
                self.scoped(frames, |walk| walk.descend(&listing))
            }
            Mode::Normal => {
                let (defaults, routes): (Vec<_>, Vec<_>) =
                    descriptors.into_iter().partition(|d| d.middleware_prefix);
                let frames = self.scope_frames(&defaults)?;
                self.scoped(frames, |walk| {
                    for route in &routes {
                        walk.register(route)?;
                    }
                    walk.descend(&listing)
                })
            }
        }
    }

    fn descend(&mut self, listing: &DirectoryListing) -> Result<()> {
        for name in &listing.sub_directories {
            let path = listing.directory.join(name);
            if name.starts_with(MIDDLEWARE_MARKER) {
                self.visit(&path, Mode::Middleware)?;
                continue;
            }

            let segment = match name.strip_prefix(PARAMETER_MARKER) {
                Some(param) => format!(":{param}"),
                None => name.clone(),
            };
            self.segments.push(segment);
            let result = self.visit(&path, Mode::Normal);
            self.segments.pop();
            result?;
        }
        Ok(())
    }

    /// Runs `body` with `frames` pushed, popping them on every exit path.
    fn scoped(
        &mut self,
        frames: Vec<(Verb, Frame)>,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let pushed = self.stack.push_all(frames);
        let result = body(self);
        self.stack.pop_all(&pushed);
        result
    }

    fn scope_frames(&self, descriptors: &[RouteDescriptor]) -> Result<Vec<(Verb, Frame)>> {
        let pattern = self.pattern(false);
        let mut frames = Vec::with_capacity(descriptors.len());
        for d in descriptors {
            let module = self.load(d, &pattern)?;
            let kind = module.kind();
            let Module::Scope(factory) = module else {
                return Err(self.fail(d, &pattern, Error::ModuleContract {
                    path: d.absolute_path.clone(),
                    reason: format!("expected a scope middleware factory, found a {kind}"),
                }));
            };
            let exported = factory(&self.composer.app, self.tree).map_err(|source| {
                self.fail(d, &pattern, Error::ModuleLoad { path: d.absolute_path.clone(), source })
            })?;
            let frame = self.non_empty(d, &pattern, exported.into_vec())?;
            debug!(verb = %d.verb, scope = %pattern, size = frame.len(), "middleware frame");
            frames.push((d.verb, frame));
        }
        Ok(frames)
    }

    fn register(&mut self, d: &RouteDescriptor) -> Result<()> {
        let pattern = self.pattern(d.star);
        let module = self.load(d, &pattern)?;
        let kind = module.kind();
        let Module::Route(factory) = module else {
            return Err(self.fail(d, &pattern, Error::ModuleContract {
                path: d.absolute_path.clone(),
                reason: format!("expected a route factory, found a {kind}"),
            }));
        };

        let mut middleware = self.stack.resolve(d.verb);
        let exported = factory(&self.composer.app, self.tree, &mut middleware).map_err(|source| {
            self.fail(d, &pattern, Error::ModuleLoad { path: d.absolute_path.clone(), source })
        })?;
        let handlers = self.non_empty(d, &pattern, exported.into_vec())?;

        if self.composer.options.log_routes {
            info!(
                verb = %d.verb,
                %pattern,
                middleware = middleware.len(),
                handlers = handlers.len(),
                file = %d.absolute_path.display(),
                "route registered"
            );
        }
        let record = RegistrationRecord { verb: d.verb, pattern, middleware, handlers };
        let pattern = record.pattern.clone();
        self.sink.register(record).map_err(|err| self.fail(d, &pattern, err))?;
        self.registered += 1;
        Ok(())
    }

    fn load(&self, d: &RouteDescriptor, pattern: &str) -> Result<Module<A>> {
        self.loader.load(&self.relative(&d.absolute_path)).map_err(|source| {
            self.fail(d, pattern, Error::ModuleLoad { path: d.absolute_path.clone(), source })
        })
    }

    fn non_empty(
        &self,
        d: &RouteDescriptor,
        pattern: &str,
        chain: Vec<BoxedHandler>,
    ) -> Result<Vec<BoxedHandler>> {
        if chain.is_empty() {
            return Err(self.fail(d, pattern, Error::ModuleContract {
                path: d.absolute_path.clone(),
                reason: "factory returned no handlers".into(),
            }));
        }
        Ok(chain)
    }

    fn fail(&self, d: &RouteDescriptor, pattern: &str, err: Error) -> Error {
        error!(
            path = %d.absolute_path.display(),
            verb = %d.verb,
            %pattern,
            error = %err,
            "failed to build route"
        );
        err
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.root).unwrap_or(path).to_path_buf()
    }

    fn pattern(&self, star: bool) -> String {
        let mut pattern = format!("/{}", self.segments.join("/"));
        if star {
            pattern.push('*');
        }
        pattern
    }
}

/// Orders one directory's descriptors.
///
/// Input is lexical. Numeric prefixes sort by value ahead of the rest; then
/// any plain route directly followed by its own verb's wildcard swaps with
/// it, so the wildcard registers first. A swapped pair is not revisited.
fn arrange(descriptors: &mut [RouteDescriptor]) {
    descriptors.sort_by_key(|d| match d.order {
        Some(n) => (0, n),
        None => (1, 0),
    });

    let mut i = 0;
    while i + 1 < descriptors.len() {
        let (current, next) = (&descriptors[i], &descriptors[i + 1]);
        let swap = next.star
            && current.verb == next.verb
            && !current.has_numeric_prefix()
            && !next.has_numeric_prefix()
            && !current.middleware_prefix
            && !next.middleware_prefix;
        if swap {
            descriptors.swap(i, i + 1);
            i += 2;
        } else {
            i += 1;
        }
    }
}
