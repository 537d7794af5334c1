#![allow(dead_code)]

use std::fs;
use std::path::Path;

use dirroute::{BoxedHandler, Next, RegistrationRecord, Request, Response};
use tempfile::TempDir;

/// Creates a temporary tree with an empty file at each relative path.
pub fn tree(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for rel in files {
        touch(dir.path(), rel);
    }
    dir
}

pub fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

/// Middleware that appends `name` to the request's `x-trail` headers.
pub fn mark(name: &str) -> BoxedHandler {
    let label = name.to_owned();
    BoxedHandler::named(name, move |mut req: Request, next: Next| {
        let label = label.clone();
        async move {
            req.insert_header("x-trail", &label);
            next.run(req).await
        }
    })
}

/// Terminal handler answering `trail > name`, params included.
pub fn endpoint(name: &str) -> BoxedHandler {
    let label = name.to_owned();
    BoxedHandler::named(name, move |req: Request| {
        let label = label.clone();
        async move {
            let mut parts: Vec<String> = req
                .headers()
                .iter()
                .filter(|(k, _)| k == "x-trail")
                .map(|(_, v)| v.clone())
                .collect();
            match req.param("id") {
                Some(id) => parts.push(format!("{label}({id})")),
                None => parts.push(label),
            }
            Response::text(parts.join(" > "))
        }
    })
}

pub fn names(chain: &[BoxedHandler]) -> Vec<String> {
    chain.iter().map(|h| h.name().unwrap_or("<anonymous>").to_owned()).collect()
}

pub fn patterns(records: &[RegistrationRecord]) -> Vec<String> {
    records.iter().map(|r| format!("{} {}", r.verb, r.pattern)).collect()
}

pub fn find<'r>(records: &'r [RegistrationRecord], verb_and_pattern: &str) -> &'r RegistrationRecord {
    records
        .iter()
        .find(|r| format!("{} {}", r.verb, r.pattern) == verb_and_pattern)
        .unwrap_or_else(|| panic!("no registration for {verb_and_pattern}: {:?}", patterns(records)))
}
