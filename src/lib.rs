pub mod app;
pub mod auth;
pub mod calculations;
pub mod config;
pub mod error;
pub mod pages;
pub mod state;
pub mod store;
