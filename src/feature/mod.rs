//! The features of the application, one module per API area.

pub mod health;
pub mod home;
pub mod item;
