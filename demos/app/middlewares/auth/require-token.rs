//! Named middleware `auth.requireToken`. Factory registered in demos/basic.rs.
