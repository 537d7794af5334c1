//! Named middleware `cors`. Factory registered in demos/basic.rs.
