pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod resolver;
pub mod services;
pub mod store;
pub mod weather;
