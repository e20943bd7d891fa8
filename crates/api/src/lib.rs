//! HTTP API: routing, request/response mapping, and server bootstrap.

pub mod app;
pub mod server;
