pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod services;
pub mod session;
pub mod store;
