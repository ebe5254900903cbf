//! Infrastructure adapters and runtime bootstrap.

pub mod auth;
pub mod backend;
pub mod db;
pub mod error;
pub mod local_store;
pub mod storage;
pub mod telemetry;
pub mod uploads;
