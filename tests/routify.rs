mod common;

use common::{endpoint, find, mark, names, patterns, touch, tree};
use dirroute::{
    BoxError, BoxedHandler, Composer, ComposerOptions, Error, Exported, Method, MiddlewareTree,
    ModuleRegistry, Request, Router, Verb,
};
use http::StatusCode;

type Registry = ModuleRegistry<()>;

fn route(
    handler: BoxedHandler,
) -> impl Fn(&(), &MiddlewareTree, &mut Vec<BoxedHandler>) -> Result<Exported, BoxError> + Send + Sync + 'static
{
    move |_: &(), _: &MiddlewareTree, _: &mut Vec<BoxedHandler>| Ok(handler.clone().into())
}

fn scope(
    handler: BoxedHandler,
) -> impl Fn(&(), &MiddlewareTree) -> Result<Exported, BoxError> + Send + Sync + 'static {
    move |_: &(), _: &MiddlewareTree| Ok(handler.clone().into())
}

fn composer() -> Composer<()> {
    Composer::new((), ComposerOptions::default().with_log_routes(false)).unwrap()
}

#[test]
fn round_trip_of_a_small_tree() {
    let dir = tree(&["owners/get.rs", "owners/$id/get.rs", "^auth/all.rs", "^auth/users/get.rs"]);
    let auth = mark("auth");
    let routes = Registry::new()
        .route("owners/get.rs", route(endpoint("owners")))
        .route("owners/$id/get.rs", route(endpoint("owner")))
        .scope("^auth/all.rs", scope(auth.clone()))
        .route("^auth/users/get.rs", route(endpoint("users")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();

    // `^` sorts before lowercase letters, so the scope is visited first.
    assert_eq!(patterns(&records), ["GET /users", "GET /owners", "GET /owners/:id"]);
    let users = find(&records, "GET /users");
    assert_eq!(users.middleware.len(), 1);
    assert!(users.middleware[0].ptr_eq(&auth));
    assert!(find(&records, "GET /owners").middleware.is_empty());
    assert!(find(&records, "GET /owners/:id").middleware.is_empty());
}

#[tokio::test]
async fn wildcard_registers_before_its_sibling() {
    let dir = tree(&["owners/get.rs", "owners/get.star.rs", "owners/$id/get.rs"]);
    let routes = Registry::new()
        .route("owners/get.rs", route(endpoint("list")))
        .route("owners/get.star.rs", route(mark("star")))
        .route("owners/$id/get.rs", route(endpoint("owner")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&records), ["GET /owners*", "GET /owners", "GET /owners/:id"]);

    let router = Router::from_records(records).unwrap();
    let res = router.dispatch(Request::new(Method::Get, "/owners/42")).await;
    assert_eq!(res.text_body(), "star > owner(42)");
    let res = router.dispatch(Request::new(Method::Get, "/owners")).await;
    assert_eq!(res.text_body(), "star > list");
}

#[test]
fn numeric_prefixes_override_lexical_order() {
    let dir = tree(&["2.delete.rs", "1.get.rs", "10.post.rs", "put.rs"]);
    let routes = Registry::new()
        .route("1.get.rs", route(endpoint("get")))
        .route("2.delete.rs", route(endpoint("delete")))
        .route("10.post.rs", route(endpoint("post")))
        .route("put.rs", route(endpoint("put")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&records), ["GET /", "DELETE /", "POST /", "PUT /"]);
}

#[test]
fn middleware_scopes_do_not_leak_into_siblings() {
    let dir = tree(&[
        "^a/all.rs",
        "^a/one/get.rs",
        "^b/get.rs",
        "^b/two/get.rs",
        "three/get.rs",
    ]);
    let routes = Registry::new()
        .scope("^a/all.rs", scope(mark("a")))
        .route("^a/one/get.rs", route(endpoint("one")))
        .scope("^b/get.rs", scope(mark("b")))
        .route("^b/two/get.rs", route(endpoint("two")))
        .route("three/get.rs", route(endpoint("three")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&records), ["GET /one", "GET /two", "GET /three"]);
    assert_eq!(names(&find(&records, "GET /one").middleware), ["a"]);
    assert_eq!(names(&find(&records, "GET /two").middleware), ["b"]);
    assert!(find(&records, "GET /three").middleware.is_empty());
}

#[test]
fn default_middleware_covers_its_path_and_below() {
    let dir = tree(&["^get.rs", "get.rs", "post.rs", "sub/get.rs", "sub/^post.rs", "sub/post.rs"]);
    let routes = Registry::new()
        .scope("^get.rs", scope(mark("root-get")))
        .route("get.rs", route(endpoint("get")))
        .route("post.rs", route(endpoint("post")))
        .route("sub/get.rs", route(endpoint("sub-get")))
        .scope("sub/^post.rs", scope(mark("sub-post")))
        .route("sub/post.rs", route(endpoint("sub-post")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&records), ["GET /", "POST /", "GET /sub", "POST /sub"]);
    assert_eq!(names(&find(&records, "GET /").middleware), ["root-get"]);
    assert!(find(&records, "POST /").middleware.is_empty());
    assert_eq!(names(&find(&records, "GET /sub").middleware), ["root-get"]);
    assert_eq!(names(&find(&records, "POST /sub").middleware), ["sub-post"]);
}

#[test]
fn all_frames_precede_method_frames() {
    let dir = tree(&["^get.rs", "sub/^all.rs", "sub/get.rs", "sub/all.rs"]);
    let routes = Registry::new()
        .scope("^get.rs", scope(mark("root-get")))
        .scope("sub/^all.rs", scope(mark("sub-all")))
        .route("sub/get.rs", route(endpoint("get")))
        .route("sub/all.rs", route(endpoint("all")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(names(&find(&records, "GET /sub").middleware), ["sub-all", "root-get"]);
    // An `all` route gets the `all` frames once and nothing method-specific.
    assert_eq!(names(&find(&records, "ALL /sub").middleware), ["sub-all"]);
}

#[test]
fn multi_handler_frames_keep_their_order() {
    let dir = tree(&["^all.rs", "get.rs"]);
    let routes = Registry::new()
        .scope("^all.rs", |_, _| Ok(vec![mark("first"), mark("second")].into()))
        .route("get.rs", |_, _, _| Ok(vec![mark("validate"), endpoint("get")].into()));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    let get = find(&records, "GET /");
    assert_eq!(names(&get.middleware), ["first", "second"]);
    assert_eq!(names(&get.handlers), ["validate", "get"]);
}

#[test]
fn chain_edits_stay_with_their_route() {
    let dir = tree(&["^all.rs", "get.rs", "post.rs"]);
    let routes = Registry::new()
        .scope("^all.rs", scope(mark("session")))
        .route("get.rs", |_, _, chain: &mut Vec<BoxedHandler>| {
            chain.retain(|h| h.name() != Some("session"));
            Ok(endpoint("public").into())
        })
        .route("post.rs", route(endpoint("private")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert!(find(&records, "GET /").middleware.is_empty());
    assert_eq!(names(&find(&records, "POST /").middleware), ["session"]);
}

#[test]
fn middleware_directories_only_take_plain_verb_files() {
    let dir = tree(&["^mw/1.get.rs", "^mw/get.star.rs", "^mw/^post.rs", "^mw/get.rs", "^mw/x/get.rs"]);
    // Anything but ^mw/get.rs being loaded would fail: nothing else is registered.
    let routes = Registry::new()
        .scope("^mw/get.rs", scope(mark("mw")))
        .route("^mw/x/get.rs", route(endpoint("x")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&records), ["GET /x"]);
    assert_eq!(names(&records[0].middleware), ["mw"]);
}

#[test]
fn non_route_files_are_ignored() {
    let dir = tree(&["get.rs", "README.md", "fixtures.json", "helpers.rs"]);
    let routes = Registry::new().route("get.rs", route(endpoint("get")));

    let records = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&records), ["GET /"]);
}

#[test]
fn method_allow_list_skips_other_verbs() {
    let dir = tree(&["get.rs", "post.rs", "all.rs"]);
    let routes = Registry::new()
        .route("get.rs", route(endpoint("get")))
        .route("all.rs", route(endpoint("all")));
    let options = ComposerOptions::default().with_log_routes(false).with_methods([Method::Get]);
    let composer = Composer::new((), options).unwrap();

    let records = composer.routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&records), ["ALL /", "GET /"]);
}

#[test]
fn rescans_reflect_the_filesystem() {
    let dir = tree(&["get.rs"]);
    let routes = Registry::new()
        .route("get.rs", route(endpoint("get")))
        .route("items/get.rs", route(endpoint("items")));
    let composer = composer();

    let first = composer.routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&first), ["GET /"]);
    touch(dir.path(), "items/get.rs");
    let second = composer.routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(patterns(&second), ["GET /", "GET /items"]);
}

#[test]
fn factories_see_the_app_handle() {
    struct App {
        greeting: &'static str,
    }

    let dir = tree(&["get.rs"]);
    let routes = ModuleRegistry::<App>::new().route("get.rs", |app: &App, _, _| {
        Ok(endpoint(app.greeting).into())
    });
    let composer = Composer::new(App { greeting: "hi" }, ComposerOptions::default()).unwrap();

    let records = composer.routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap();
    assert_eq!(names(&records[0].handlers), ["hi"]);
    assert_eq!(composer.app().greeting, "hi");
}

#[tokio::test]
async fn routify_into_a_router() {
    let dir = tree(&["^auth/all.rs", "^auth/owners/$id/get.rs", "health/get.rs"]);
    let routes = Registry::new()
        .scope("^auth/all.rs", scope(mark("auth")))
        .route("^auth/owners/$id/get.rs", route(endpoint("owner")))
        .route("health/get.rs", route(endpoint("health")));

    let mut router = Router::new();
    composer().routify_into(dir.path(), &routes, &MiddlewareTree::new(), &mut router).unwrap();
    assert_eq!(router.len(), 2);

    let res = router.dispatch(Request::new(Method::Get, "/owners/9")).await;
    assert_eq!(res.text_body(), "auth > owner(9)");
    let res = router.dispatch(Request::new(Method::Get, "/health")).await;
    assert_eq!(res.text_body(), "health");
    let res = router.dispatch(Request::new(Method::Post, "/health")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[test]
fn missing_roots() {
    let routes = Registry::new();
    let tree_ = MiddlewareTree::new();
    assert!(matches!(composer().routify("", &routes, &tree_), Err(Error::Configuration(_))));

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does/not/exist");
    assert!(matches!(composer().routify(&missing, &routes, &tree_), Err(Error::NotFound { .. })));
}

#[test]
fn wildcard_default_middleware_is_a_grammar_violation() {
    let dir = tree(&["^get.star.rs"]);
    let err = composer().routify(dir.path(), &Registry::new(), &MiddlewareTree::new()).unwrap_err();
    assert!(matches!(err, Error::Grammar { .. }), "{err:?}");

    let dir = tree(&["^mw/^get.star.rs"]);
    let err = composer().routify(dir.path(), &Registry::new(), &MiddlewareTree::new()).unwrap_err();
    assert!(matches!(err, Error::Grammar { .. }), "{err:?}");
}

#[test]
fn wrong_module_shape_is_a_contract_violation() {
    let dir = tree(&["get.rs"]);
    let routes = Registry::new().scope("get.rs", scope(endpoint("get")));
    let err = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap_err();
    assert!(matches!(&err, Error::ModuleContract { path, .. } if path.ends_with("get.rs")), "{err:?}");

    let dir = tree(&["^get.rs", "get.rs"]);
    let routes = Registry::new()
        .route("^get.rs", route(endpoint("oops")))
        .route("get.rs", route(endpoint("get")));
    let err = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap_err();
    assert!(matches!(err, Error::ModuleContract { .. }), "{err:?}");
}

#[test]
fn empty_export_is_a_contract_violation() {
    let dir = tree(&["get.rs"]);
    let routes = Registry::new().route("get.rs", |_, _, _| Ok(Exported::Many(Vec::new())));
    let err = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap_err();
    assert!(matches!(err, Error::ModuleContract { .. }), "{err:?}");
}

#[test]
fn unloadable_modules_abort_the_build() {
    let dir = tree(&["get.rs"]);
    let err = composer().routify(dir.path(), &Registry::new(), &MiddlewareTree::new()).unwrap_err();
    assert!(matches!(err, Error::ModuleLoad { .. }), "{err:?}");

    let routes = Registry::new().route("get.rs", |_, _, _| Err("database unavailable".into()));
    let err = composer().routify(dir.path(), &routes, &MiddlewareTree::new()).unwrap_err();
    let Error::ModuleLoad { source, .. } = &err else { panic!("{err:?}") };
    assert_eq!(source.to_string(), "database unavailable");
}

#[test]
fn verbs_display_for_diagnostics() {
    assert_eq!(Verb::All.to_string(), "ALL");
    assert_eq!(Verb::from(Method::Patch).to_string(), "PATCH");
}
