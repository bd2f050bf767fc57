//! Library crate for scan-dash: backend client, fetch bookkeeping, page shell and pages.
pub mod api;
pub mod auth;
pub mod controller;
pub mod fetch;
pub mod logging;
pub mod pages;
pub mod settings;
pub mod shell;
pub mod types;
