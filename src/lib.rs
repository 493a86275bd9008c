//! Offline-aware profile and settings sync.
//!
//! Reads go through an expiring cache, writes made while offline are queued
//! and replayed on reconnect, and the application state survives restarts
//! through a debounced snapshot. [`app::App`] wires the pieces together;
//! [`service::ProfileService`] is the surface callers use.

pub mod api;
pub mod app;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod notifications;
pub mod offline;
pub mod service;
pub mod store;
pub mod validation;
