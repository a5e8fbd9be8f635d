use crate::models::{GameDraft, GameId, GameRecord};

use super::view::{self, ViewParams};

/// Fetch cycle of the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activity {
    /// No request in flight.
    #[default]
    Idle,
    /// `GET /games` in flight.
    Loading,
}

/// Inline edit mode. At most one record is edited at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    /// No record is being edited.
    #[default]
    NotEditing,
    /// `id` is open for editing with its unsaved `draft`.
    Editing {
        /// Record being edited.
        id: GameId,
        /// Unsaved form values.
        draft: GameDraft,
    },
}

impl EditState {
    /// Id of the record being edited, if any.
    pub fn id(&self) -> Option<&GameId> {
        match self {
            EditState::NotEditing => None,
            EditState::Editing { id, .. } => Some(id),
        }
    }
}

/// Everything the catalogue view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogueState {
    /// Cached collection in server order. Replaced wholesale on every load.
    pub games: Vec<GameRecord>,
    /// Whether a load is running.
    pub activity: Activity,
    /// Last error message.
    pub error: Option<String>,
    /// Last success message.
    pub success: Option<String>,
    /// Whether the creation form is shown.
    pub show_create_form: bool,
    /// Creation form values.
    pub create_draft: GameDraft,
    /// Inline edit mode.
    pub edit: EditState,
    /// Search, genre filter and sort.
    pub view: ViewParams,
}

impl CatalogueState {
    /// `true` while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.activity == Activity::Loading
    }

    /// Distinct genres of the cached collection.
    pub fn genre_options(&self) -> Vec<String> {
        view::genre_options(&self.games)
    }

    /// Filtered and sorted projection of the cached collection.
    pub fn visible_records(&self) -> Vec<GameRecord> {
        view::visible_records(&self.games, &self.view)
    }

    pub(crate) fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }
}
