//! User-profile service for a movie-tracking application.
//!
//! Owns users and their watch history and derives viewing statistics from
//! that history joined with movie metadata from the catalog service.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
