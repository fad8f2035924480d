//! Timeline server and CLI.
//!
//! The HTTP surface ([`api`]) serves the shared state blob, derived
//! dashboard views and file uploads. The CLI works against either the local
//! store or a running server through [`backend::Backend`].

pub mod api;
pub mod backend;
pub mod client;
pub mod commands;
pub mod config;
pub mod upload;
