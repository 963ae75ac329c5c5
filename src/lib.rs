//! Rent Engine library crate.
//!
//! This crate exposes the crane rental pricing engine and its API
//! components as reusable modules.  External applications may depend
//! on the `rent_engine` crate and call `engine::compute_trip_cost` or
//! `engine::compute_rent` directly, or embed the API via
//! `api::build_router`.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod form;
pub mod models;
pub mod rates;
pub mod repository;
pub mod service;

pub use engine::{compute_rent, compute_rent_batch, compute_rent_with, compute_trip_cost};
pub use error::{Error, Result, ValidationError};
