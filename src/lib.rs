//! An HTTP service storing items in a relational database.

pub mod app;
pub mod feature;
pub mod infra;
