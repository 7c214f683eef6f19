pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod router;
