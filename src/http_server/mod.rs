//! # Balades HTTP Server Module
//!
//! Axum server exposing the Balade collection.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/all`, `/id/{id}`, `/search/{search}`, `/site-internet`, `/mot-cle`,
//!   `/publie/{annee}` - Reads
//! - `/arrondissement/{num}`, `/synthese`, `/categories` - Aggregates
//! - `/add`, `/add-mot_cle/{id}`, `/update-one/{id}`, `/update-many/{search}`,
//!   `/delete/{id}` - Writes

pub mod balade_routes;
pub mod config;
pub mod observability_routes;
pub mod server;

pub use balade_routes::{balade_routes, BaladeState};
pub use config::HttpServerConfig;
pub use server::{build_router, HttpServer};
