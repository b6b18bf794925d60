//! Core QR Mini library (config, logging, API client, session storage).

pub mod api;
pub mod config;
pub mod logging;
pub mod models;
pub mod storage;
