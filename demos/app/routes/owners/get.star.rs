//! GET /owners* (runs ahead of every GET under /owners)
