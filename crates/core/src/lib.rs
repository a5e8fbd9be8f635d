#![warn(clippy::all, missing_docs)]

//! Core logic for the gamecat catalogue manager.
//!
//! This crate hosts the record models, configuration handling, the
//! REST client for the `/games` resource, and the catalogue controller
//! used by the terminal UI and any future frontends.

pub mod api;
pub mod catalogue;
pub mod config;
pub mod models;

pub use api::{ApiError, GamesApi, HttpGamesApi};
pub use catalogue::{CatalogueController, CatalogueState};
pub use config::AppConfig;
pub use models::{GameDraft, GameId, GamePayload, GameRecord};
