//! GET /owners
