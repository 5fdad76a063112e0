//! Viaje.ro application services.
//!
//! This crate ties the domain model, geometry pipeline and storage backends
//! into the operations a signed-in traveller performs:
//!
//! - Sign up, sign in and session handling against the hosted auth service
//! - Visited and wishlist cities with per-state statistics
//! - City reviews with photos and a positioned cover photo
//! - Per-state map colours, kept remotely or in a local file when signed out
//! - Map layers with municipality outlines and cover-photo overlays
//!
//! # Consistency
//!
//! Mutations write to the store and then reload the affected collection.
//! Reads always come from the last loaded snapshot; a reload that finishes
//! after the session changed is discarded.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod map;
pub mod reviews;
pub mod routes;
pub mod settings;
pub mod tracker;

pub use account::Account;
pub use app::{Backends, Viajero};
pub use auth::{AuthClient, Session, SignUpOutcome};
pub use config::AppConfig;
pub use error::{AppError, Notice, Result, Severity};
pub use map::{LayerKind, LayerStyle, MapComposer, MapLayer, MapView};
pub use routes::{Route, Router};
pub use settings::SettingsRepository;
pub use tracker::{Cover, Snapshot, Tracker};
