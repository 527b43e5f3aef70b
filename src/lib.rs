pub mod app_state;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod handlers;
pub mod logging;
pub mod queries;
