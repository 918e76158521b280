pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod goals;
pub mod state;
pub mod users;
