//! balades - REST API over a collection of Paris walking-tour points of interest
//!
//! The record store lives in [`store`], the HTTP surface in [`http_server`]
//! with its error taxonomy in [`rest_api`].

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod rest_api;
pub mod store;
