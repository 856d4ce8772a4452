pub mod collector;
pub mod config;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod services;
pub mod table;
