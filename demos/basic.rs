//! Composes `demos/app` into a route table and sends it a few requests.
//!
//! Run with:
//!   cargo run --example basic
//!
//! The tree:
//!
//! ```text
//! demos/app/
//! ├── middlewares/
//! │   ├── cors.rs                   cors
//! │   └── auth/require-token.rs     auth.requireToken
//! └── routes/
//!     ├── ^all.rs                   cors, for everything
//!     ├── ^admin/all.rs             auth.requireToken, for everything under ^admin
//!     ├── ^admin/stats/get.rs       GET    /stats
//!     ├── health/get.rs             GET    /health
//!     └── owners/
//!         ├── get.rs                GET    /owners
//!         ├── get.star.rs           GET    /owners*
//!         └── $id/
//!             ├── get.rs            GET    /owners/:id
//!             └── 1.delete.rs       DELETE /owners/:id
//! ```

use std::path::Path;
use std::sync::Arc;

use dirroute::{
    BoxedHandler, Composer, ComposerOptions, Method, ModuleRegistry, Next, Request, Response, Router,
};
use http::StatusCode;

struct App {
    owners: Arc<Vec<&'static str>>,
}

#[tokio::main]
async fn main() -> Result<(), dirroute::Error> {
    tracing_subscriber::fmt::init();

    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/app");
    let options = ComposerOptions::default()
        .with_routes_root(root.join("routes"))
        .with_middlewares_root(root.join("middlewares"))
        .with_auto_name_anonymous_middleware(true);
    let app = App { owners: Arc::new(vec!["alice", "bob"]) };

    let composer = Composer::new(app, options)?;
    let records = composer.build(&routes(), &middlewares())?;
    for record in &records {
        let chain: Vec<&str> = record.middleware.iter().filter_map(BoxedHandler::name).collect();
        println!("{:<7} {:<12} [{}]", record.verb.to_string(), record.pattern, chain.join(", "));
    }

    let router = Router::from_records(records)?;
    let requests = [
        Request::new(Method::Get, "/owners"),
        Request::new(Method::Get, "/owners/1"),
        Request::new(Method::Delete, "/owners/1"),
        Request::new(Method::Get, "/stats"),
        Request::new(Method::Get, "/stats").with_header("authorization", "Bearer demo"),
        Request::new(Method::Get, "/health"),
        Request::new(Method::Post, "/health"),
    ];
    for req in requests {
        let line = format!("{} {}", req.method(), req.path());
        let res = router.dispatch(req).await;
        let cors = res.header("access-control-allow-origin").unwrap_or("-");
        println!("{line:<20} {} cors={cors} {}", res.status_code(), res.text_body());
    }
    Ok(())
}

fn middlewares() -> ModuleRegistry<App> {
    ModuleRegistry::new()
        .library("cors.rs", |_| Ok(BoxedHandler::new(cors)))
        .library("auth/require-token.rs", |_| Ok(BoxedHandler::new(require_token)))
}

fn routes() -> ModuleRegistry<App> {
    ModuleRegistry::new()
        .scope("^all.rs", |_, tree| {
            let cors = tree.middleware("cors").ok_or("cors middleware not loaded")?;
            Ok(cors.clone().into())
        })
        .scope("^admin/all.rs", |_, tree| {
            let auth = tree.middleware("auth.requireToken").ok_or("auth middleware not loaded")?;
            Ok(auth.clone().into())
        })
        .route("^admin/stats/get.rs", |app: &App, _, _| {
            let count = app.owners.len();
            Ok(BoxedHandler::new(move |_req: Request| async move {
                Response::json(format!(r#"{{"owners":{count}}}"#).into_bytes())
            })
            .into())
        })
        .route("health/get.rs", |_, _, _| Ok(BoxedHandler::new(health).into()))
        .route("owners/get.star.rs", |_, _, _| Ok(BoxedHandler::new(trace_owner_reads).into()))
        .route("owners/get.rs", |app: &App, _, _| {
            let owners = Arc::clone(&app.owners);
            Ok(BoxedHandler::new(move |_req: Request| {
                let body = format!("{:?}", owners);
                async move { Response::text(body) }
            })
            .into())
        })
        .route("owners/$id/get.rs", |app: &App, _, _| {
            let owners = Arc::clone(&app.owners);
            Ok(BoxedHandler::new(move |req: Request| {
                let owner = req
                    .param("id")
                    .and_then(|id| id.parse::<usize>().ok())
                    .and_then(|i| owners.get(i).copied());
                async move {
                    match owner {
                        Some(name) => Response::text(name),
                        None => Response::status(StatusCode::NOT_FOUND),
                    }
                }
            })
            .into())
        })
        .route("owners/$id/1.delete.rs", |_, _, chain: &mut Vec<BoxedHandler>| {
            // Deletes are same-origin only.
            chain.retain(|h| h.name() != Some("cors"));
            Ok(vec![BoxedHandler::new(require_token), BoxedHandler::new(delete_owner)].into())
        })
}

async fn cors(req: Request, next: Next) -> Response {
    next.run(req).await.with_header("access-control-allow-origin", "*")
}

async fn require_token(req: Request, next: Next) -> Response {
    match req.header("authorization") {
        Some(value) if value.starts_with("Bearer ") => next.run(req).await,
        _ => Response::status(StatusCode::UNAUTHORIZED),
    }
}

async fn trace_owner_reads(req: Request, next: Next) -> Response {
    tracing::info!(path = %req.path(), "owner read");
    next.run(req).await
}

async fn health(_req: Request) -> &'static str {
    "ok"
}

async fn delete_owner(_req: Request) -> Response {
    Response::status(StatusCode::NO_CONTENT)
}
