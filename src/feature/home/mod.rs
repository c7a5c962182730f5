pub mod home_api;
