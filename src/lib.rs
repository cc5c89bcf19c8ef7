//! # Stockroom
//!
//! Multi-tenant company management with a per-company feature catalog,
//! role-based access control and a warehouse inventory, served over an
//! Axum JSON API.

pub mod access;
pub mod auth;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod features;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod tenancy;
pub mod validation;
pub use migration;
