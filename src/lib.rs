//! # Skyline
//!
//! Backend for Project Skyline: visitors claim a window (or a whole building)
//! on an illustrated city skyline, attach a name and a goal, and watch it
//! light up.
//!
//! - [`validate`] checks untyped request bodies.
//! - [`store`] owns all illumination state (in-memory or PostgreSQL).
//! - [`stats`] derives lit / total / available counters.
//! - [`api`] exposes everything over HTTP.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod model;
pub mod prom_metrics;
pub mod stats;
pub mod store;
pub mod validate;
