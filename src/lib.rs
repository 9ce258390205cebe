#![doc = "The `project_tracker` library crate."]
#![doc = ""]
#![doc = "Domain models, the owner-scoped repository, authentication (password hashing,"]
#![doc = "bearer tokens, the authorization guard), routing and error handling for the"]
#![doc = "project tracker API. The binary (`main.rs`) only loads configuration and runs"]
#![doc = "the server built by [`app::build_app`]."]

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use app::{build_app, AppState};
pub use error::AppError;
