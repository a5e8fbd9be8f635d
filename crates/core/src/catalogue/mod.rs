//! Catalogue view controller: cached collection, drafts, validation and projections.

mod controller;
mod state;
pub mod validation;
pub mod view;

pub use controller::{
    CatalogueController, CatalogueError, Confirmation, RemovalRequest, CREATED, CREATE_FAILED,
    DELETED, DELETE_FAILED, LOAD_FAILED, UPDATED, UPDATE_FAILED,
};
pub use state::{Activity, CatalogueState, EditState};
pub use validation::ValidationError;
pub use view::{SortKey, ViewParams};
