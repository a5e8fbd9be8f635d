use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    api::{ApiError, GamesApi},
    models::{GameDraft, GameId, GameRecord},
};

use super::{
    state::{Activity, CatalogueState, EditState},
    validation::{validate_draft, ValidationError},
    view::SortKey,
};

/// Shown when `GET /games` fails.
pub const LOAD_FAILED: &str = "Failed to load games.";
/// Shown when `POST /games` fails.
pub const CREATE_FAILED: &str = "Failed to add game.";
/// Shown when `PUT /games/{id}` fails.
pub const UPDATE_FAILED: &str = "Failed to update game.";
/// Shown when `DELETE /games/{id}` fails.
pub const DELETE_FAILED: &str = "Failed to delete game.";
/// Shown after a successful create.
pub const CREATED: &str = "Game added successfully!";
/// Shown after a successful update.
pub const UPDATED: &str = "Game updated successfully!";
/// Shown after a successful delete.
pub const DELETED: &str = "Game deleted successfully!";

/// Why a controller operation did not complete. The state already carries the
/// user-facing message; this is for callers and logs.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Refused locally before any request.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// `save_edit` was called with no record open.
    #[error("no record is being edited")]
    NotEditing,
}

/// Answer to a delete confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Go ahead with the delete.
    Confirmed,
    /// Leave everything as it is.
    Declined,
}

/// Pending delete awaiting a [`Confirmation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    id: GameId,
    title: String,
}

impl RemovalRequest {
    /// Record the request targets.
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// Question to put to the user.
    pub fn prompt(&self) -> String {
        format!("Are you sure you want to delete \"{}\"?", self.title)
    }
}

type Today = dyn Fn() -> NaiveDate + Send + Sync;

/// Owns the catalogue state and drives the backend.
///
/// Clones share state, client and request gate, so operations can run on
/// spawned tasks while a renderer reads [`CatalogueController::state`].
/// Loads and mutations queue on a FIFO gate; a mutation and the reload it
/// triggers complete before the next queued operation starts.
#[derive(Clone)]
pub struct CatalogueController {
    api: Arc<dyn GamesApi>,
    state: Arc<RwLock<CatalogueState>>,
    gate: Arc<Mutex<()>>,
    today: Arc<Today>,
}

impl CatalogueController {
    /// Build a controller with empty state that dates against the local clock.
    pub fn new(api: Arc<dyn GamesApi>) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(CatalogueState::default())),
            gate: Arc::new(Mutex::new(())),
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the source of "today" used by the future-date check.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CatalogueState {
        self.state.read().clone()
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&CatalogueState) -> R) -> R {
        f(&self.state.read())
    }

    /// Fetch the full collection and replace the cache.
    pub async fn load(&self) -> Result<(), CatalogueError> {
        let _turn = self.gate.lock().await;
        self.load_queued().await
    }

    /// Validate the create draft and `POST` it.
    pub async fn create(&self) -> Result<(), CatalogueError> {
        let _turn = self.gate.lock().await;
        let today = (self.today)();
        let validated = {
            let mut state = self.state.write();
            state.clear_messages();
            validate_draft(&state.create_draft, &state.games, None, today)
        };
        let payload = match validated {
            Ok(payload) => payload,
            Err(err) => return Err(self.reject(err)),
        };

        info!(title = %payload.title, "Creating game");
        if let Err(err) = self.api.create(&payload).await {
            warn!(?err, title = %payload.title, "Create failed");
            self.state.write().error = Some(CREATE_FAILED.to_string());
            return Err(err.into());
        }

        {
            let mut state = self.state.write();
            state.success = Some(CREATED.to_string());
            state.create_draft = GameDraft::default();
            state.show_create_form = false;
        }
        self.load_queued().await
    }

    /// Open `record` for inline editing, discarding any other open edit.
    pub fn start_edit(&self, record: &GameRecord) {
        let mut state = self.state.write();
        if let Some(previous) = state.edit.id().filter(|id| **id != record.id) {
            info!(previous = %previous, next = %record.id, "Switching edit focus");
        }
        state.edit = EditState::Editing {
            id: record.id.clone(),
            draft: GameDraft::from(record),
        };
    }

    /// Validate the edit draft and `PUT` it.
    pub async fn save_edit(&self) -> Result<(), CatalogueError> {
        let _turn = self.gate.lock().await;
        let today = (self.today)();
        let validated = {
            let mut state = self.state.write();
            state.clear_messages();
            match &state.edit {
                EditState::NotEditing => None,
                EditState::Editing { id, draft } => Some((
                    id.clone(),
                    validate_draft(draft, &state.games, Some(id), today),
                )),
            }
        };
        let (id, payload) = match validated {
            None => return Err(CatalogueError::NotEditing),
            Some((_, Err(err))) => return Err(self.reject(err)),
            Some((id, Ok(payload))) => (id, payload),
        };

        info!(%id, title = %payload.title, "Updating game");
        if let Err(err) = self.api.update(&id, &payload).await {
            warn!(?err, %id, "Update failed");
            self.state.write().error = Some(UPDATE_FAILED.to_string());
            return Err(err.into());
        }

        {
            let mut state = self.state.write();
            state.success = Some(UPDATED.to_string());
            if state.edit.id() == Some(&id) {
                state.edit = EditState::NotEditing;
            }
        }
        self.load_queued().await
    }

    /// Leave edit mode without saving.
    pub fn cancel_edit(&self) {
        self.state.write().edit = EditState::NotEditing;
    }

    /// Prepare a delete of `record`; nothing happens until it is confirmed.
    pub fn request_removal(&self, record: &GameRecord) -> RemovalRequest {
        RemovalRequest {
            id: record.id.clone(),
            title: record.title.clone(),
        }
    }

    /// `DELETE` the requested record if `answer` confirms it.
    pub async fn remove(
        &self,
        request: RemovalRequest,
        answer: Confirmation,
    ) -> Result<(), CatalogueError> {
        if answer == Confirmation::Declined {
            return Ok(());
        }

        let _turn = self.gate.lock().await;
        self.state.write().clear_messages();
        info!(id = %request.id, title = %request.title, "Deleting game");
        if let Err(err) = self.api.delete(&request.id).await {
            warn!(?err, id = %request.id, "Delete failed");
            self.state.write().error = Some(DELETE_FAILED.to_string());
            return Err(err.into());
        }

        self.state.write().success = Some(DELETED.to_string());
        self.load_queued().await
    }

    /// Show or hide the creation form.
    pub fn toggle_create_form(&self) -> bool {
        let mut state = self.state.write();
        state.show_create_form = !state.show_create_form;
        state.show_create_form
    }

    /// Show or hide the creation form explicitly.
    pub fn set_create_form(&self, visible: bool) {
        self.state.write().show_create_form = visible;
    }

    /// Mutate the creation draft.
    pub fn update_create_draft(&self, f: impl FnOnce(&mut GameDraft)) {
        f(&mut self.state.write().create_draft);
    }

    /// Mutate the open edit draft. Returns `false` when nothing is being edited.
    pub fn update_edit_draft(&self, f: impl FnOnce(&mut GameDraft)) -> bool {
        match &mut self.state.write().edit {
            EditState::Editing { draft, .. } => {
                f(draft);
                true
            }
            EditState::NotEditing => false,
        }
    }

    /// Set the title search string.
    pub fn set_search(&self, search: impl Into<String>) {
        self.state.write().view.search = search.into();
    }

    /// Set or clear the genre filter.
    pub fn set_genre_filter(&self, genre: Option<String>) {
        self.state.write().view.genre = genre;
    }

    /// Set the sort key.
    pub fn set_sort(&self, sort: SortKey) {
        self.state.write().view.sort = sort;
    }

    async fn load_queued(&self) -> Result<(), CatalogueError> {
        {
            let mut state = self.state.write();
            state.activity = Activity::Loading;
            state.error = None;
        }

        let result = self.api.list().await;
        let mut state = self.state.write();
        state.activity = Activity::Idle;
        match result {
            Ok(games) => {
                info!(total = games.len(), "Games loaded");
                state.games = games;
                Ok(())
            }
            Err(err) => {
                warn!(?err, "Load failed");
                state.error = Some(LOAD_FAILED.to_string());
                Err(err.into())
            }
        }
    }

    fn reject(&self, err: ValidationError) -> CatalogueError {
        info!(reason = %err, "Draft rejected");
        self.state.write().error = Some(err.to_string());
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    use parking_lot::Mutex as SyncMutex;
    use reqwest::StatusCode;
    use tokio::{sync::Notify, task::yield_now, time::timeout};

    use crate::models::GamePayload;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List,
        Create(GamePayload),
        Update(GameId, GamePayload),
        Delete(GameId),
    }

    /// Records calls and suspends once inside each of them, so concurrent
    /// operations interleave unless something orders them.
    #[derive(Default)]
    struct FakeApi {
        games: SyncMutex<Vec<GameRecord>>,
        calls: SyncMutex<Vec<Call>>,
        fail_list: SyncMutex<bool>,
        fail_mutations: SyncMutex<bool>,
        hold_list: SyncMutex<Option<Arc<Notify>>>,
    }

    impl FakeApi {
        fn with_games(games: Vec<GameRecord>) -> Arc<Self> {
            Arc::new(Self {
                games: SyncMutex::new(games),
                ..Self::default()
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn mutation_calls(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|call| *call != Call::List)
                .collect()
        }

        fn failure(&self) -> ApiError {
            ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }

    #[async_trait]
    impl GamesApi for FakeApi {
        async fn list(&self) -> Result<Vec<GameRecord>, ApiError> {
            self.calls.lock().push(Call::List);
            let hold = self.hold_list.lock().clone();
            if let Some(release) = hold {
                release.notified().await;
            }
            yield_now().await;
            if *self.fail_list.lock() {
                return Err(self.failure());
            }
            Ok(self.games.lock().clone())
        }

        async fn create(&self, payload: &GamePayload) -> Result<(), ApiError> {
            self.calls.lock().push(Call::Create(payload.clone()));
            yield_now().await;
            if *self.fail_mutations.lock() {
                return Err(self.failure());
            }
            let mut games = self.games.lock();
            let id = games.len() as i64 + 100;
            games.push(record_from(GameId::Number(id), payload));
            Ok(())
        }

        async fn update(&self, id: &GameId, payload: &GamePayload) -> Result<(), ApiError> {
            self.calls.lock().push(Call::Update(id.clone(), payload.clone()));
            yield_now().await;
            if *self.fail_mutations.lock() {
                return Err(self.failure());
            }
            let mut games = self.games.lock();
            if let Some(game) = games.iter_mut().find(|game| &game.id == id) {
                *game = record_from(id.clone(), payload);
            }
            Ok(())
        }

        async fn delete(&self, id: &GameId) -> Result<(), ApiError> {
            self.calls.lock().push(Call::Delete(id.clone()));
            yield_now().await;
            if *self.fail_mutations.lock() {
                return Err(self.failure());
            }
            self.games.lock().retain(|game| &game.id != id);
            Ok(())
        }
    }

    fn record_from(id: GameId, payload: &GamePayload) -> GameRecord {
        GameRecord {
            id,
            title: payload.title.clone(),
            release_date: payload.release_date,
            rating: payload.rating,
            genre: payload.genre.clone(),
            platform: payload.platform.clone(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn game(id: i64, title: &str, rating: u8, genre: &str) -> GameRecord {
        GameRecord {
            id: GameId::Number(id),
            title: title.to_string(),
            release_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            rating,
            genre: genre.to_string(),
            platform: "PC".to_string(),
        }
    }

    fn draft(title: &str, release_date: &str) -> GameDraft {
        GameDraft {
            title: title.to_string(),
            release_date: release_date.to_string(),
            rating: "75".to_string(),
            genre: "RPG".to_string(),
            platform: "Switch".to_string(),
        }
    }

    async fn loaded(api: &Arc<FakeApi>) -> CatalogueController {
        let controller = CatalogueController::new(api.clone()).with_today(today);
        controller.load().await.expect("initial load");
        controller
    }

    #[tokio::test]
    async fn load_replaces_cache_in_server_order() {
        let api = FakeApi::with_games(vec![game(2, "B", 90, "FPS"), game(1, "A", 10, "RPG")]);
        let controller = loaded(&api).await;

        let state = controller.state();
        assert_eq!(state.activity, Activity::Idle);
        assert_eq!(state.error, None);
        let ids: Vec<_> = state.games.iter().map(|game| game.id.clone()).collect();
        assert_eq!(ids, [GameId::Number(2), GameId::Number(1)]);
    }

    #[tokio::test]
    async fn loading_is_reported_while_list_is_pending() {
        let api = FakeApi::with_games(vec![game(1, "A", 10, "RPG")]);
        let controller = CatalogueController::new(api.clone()).with_today(today);
        let release = Arc::new(Notify::new());
        *api.hold_list.lock() = Some(release.clone());
        assert!(!controller.state().is_loading());

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.load().await }
        });
        timeout(Duration::from_secs(5), async {
            while !controller.state().is_loading() {
                yield_now().await;
            }
        })
        .await
        .expect("load never started");
        assert!(controller.state().games.is_empty());

        release.notify_one();
        pending.await.expect("load task").expect("load");
        let state = controller.state();
        assert_eq!(state.activity, Activity::Idle);
        assert_eq!(state.games.len(), 1);
    }

    #[tokio::test]
    async fn failed_load_sets_message_and_keeps_cache() {
        let api = FakeApi::with_games(vec![game(1, "A", 10, "RPG")]);
        let controller = loaded(&api).await;

        *api.fail_list.lock() = true;
        assert!(controller.load().await.is_err());
        let state = controller.state();
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED));
        assert_eq!(state.activity, Activity::Idle);
        assert_eq!(state.games.len(), 1);

        *api.fail_list.lock() = false;
        controller.load().await.expect("retry by hand");
        assert_eq!(controller.state().error, None);
    }

    #[tokio::test]
    async fn future_release_date_aborts_create() {
        let api = FakeApi::with_games(vec![game(1, "A", 10, "RPG")]);
        let controller = loaded(&api).await;
        controller.toggle_create_form();
        controller.update_create_draft(|d| *d = draft("Tomorrow's Game", "2024-06-16"));

        let err = controller.create().await.expect_err("future date");
        assert!(matches!(
            err,
            CatalogueError::Validation(ValidationError::FutureReleaseDate)
        ));
        let state = controller.state();
        assert_eq!(
            state.error.as_deref(),
            Some("Release date cannot be in the future.")
        );
        assert!(api.mutation_calls().is_empty());
        assert_eq!(state.games.len(), 1);
        assert!(state.show_create_form);
        assert_eq!(state.create_draft.title, "Tomorrow's Game");
    }

    #[tokio::test]
    async fn duplicate_title_aborts_create() {
        let api = FakeApi::with_games(vec![game(1, "halo ", 80, "FPS")]);
        let controller = loaded(&api).await;
        controller.update_create_draft(|d| *d = draft("Halo", "2001-11-15"));

        let err = controller.create().await.expect_err("duplicate");
        assert!(matches!(
            err,
            CatalogueError::Validation(ValidationError::DuplicateTitle)
        ));
        assert_eq!(
            controller.state().error.as_deref(),
            Some("A game with this title already exists.")
        );
        assert!(api.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn successful_create_resets_form_and_reloads() {
        let api = FakeApi::with_games(vec![game(1, "A", 10, "RPG")]);
        let controller = loaded(&api).await;
        controller.toggle_create_form();
        controller.update_create_draft(|d| *d = draft("Okami", "2006-04-20"));

        controller.create().await.expect("create");

        let state = controller.state();
        assert_eq!(state.success.as_deref(), Some(CREATED));
        assert_eq!(state.error, None);
        assert!(!state.show_create_form);
        assert_eq!(state.create_draft, GameDraft::default());
        assert_eq!(state.games.len(), 2);

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(&calls[1], Call::Create(payload) if payload.rating == 75));
        assert_eq!(calls[2], Call::List);
    }

    #[tokio::test]
    async fn hiding_create_form_after_create_keeps_it_hidden() {
        let api = FakeApi::with_games(Vec::new());
        let controller = loaded(&api).await;
        controller.set_create_form(true);
        controller.update_create_draft(|d| *d = draft("Okami", "2006-04-20"));
        controller.create().await.expect("create");

        controller.set_create_form(false);
        assert!(!controller.state().show_create_form);
    }

    #[tokio::test]
    async fn failed_create_keeps_draft_and_form() {
        let api = FakeApi::with_games(Vec::new());
        let controller = loaded(&api).await;
        controller.toggle_create_form();
        controller.update_create_draft(|d| *d = draft("Okami", "2006-04-20"));
        *api.fail_mutations.lock() = true;

        assert!(matches!(
            controller.create().await,
            Err(CatalogueError::Api(_))
        ));
        let state = controller.state();
        assert_eq!(state.error.as_deref(), Some(CREATE_FAILED));
        assert_eq!(state.success, None);
        assert!(state.show_create_form);
        assert_eq!(state.create_draft.title, "Okami");
        assert_eq!(api.calls().last(), Some(&Call::Create(GamePayload {
            title: "Okami".to_string(),
            release_date: NaiveDate::from_ymd_opt(2006, 4, 20).unwrap(),
            rating: 75,
            genre: "RPG".to_string(),
            platform: "Switch".to_string(),
        })));
    }

    #[tokio::test]
    async fn edit_keeps_own_title_and_closes_on_success() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS"), game(2, "Doom", 90, "FPS")]);
        let controller = loaded(&api).await;
        let halo = controller.state().games[0].clone();

        controller.start_edit(&halo);
        assert!(controller.update_edit_draft(|d| d.rating = "85".to_string()));
        controller.save_edit().await.expect("save");

        let state = controller.state();
        assert_eq!(state.success.as_deref(), Some(UPDATED));
        assert_eq!(state.edit, EditState::NotEditing);
        assert_eq!(state.games[0].rating, 85);
        assert!(matches!(
            api.mutation_calls().as_slice(),
            [Call::Update(GameId::Number(1), _)]
        ));
    }

    #[tokio::test]
    async fn edit_rejects_other_records_title() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS"), game(2, "Doom", 90, "FPS")]);
        let controller = loaded(&api).await;
        let halo = controller.state().games[0].clone();

        controller.start_edit(&halo);
        controller.update_edit_draft(|d| d.title = " doom".to_string());
        assert!(controller.save_edit().await.is_err());

        let state = controller.state();
        assert_eq!(
            state.error.as_deref(),
            Some("A game with this title already exists.")
        );
        assert_eq!(state.edit.id(), Some(&GameId::Number(1)));
        assert!(api.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn failed_update_leaves_edit_open() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS")]);
        let controller = loaded(&api).await;
        let halo = controller.state().games[0].clone();
        controller.start_edit(&halo);
        *api.fail_mutations.lock() = true;

        assert!(controller.save_edit().await.is_err());
        let state = controller.state();
        assert_eq!(state.error.as_deref(), Some(UPDATE_FAILED));
        assert_eq!(state.edit.id(), Some(&GameId::Number(1)));
    }

    #[tokio::test]
    async fn switching_edit_discards_previous_draft() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS"), game(2, "Doom", 90, "FPS")]);
        let controller = loaded(&api).await;
        let games = controller.state().games;

        controller.start_edit(&games[0]);
        controller.update_edit_draft(|d| d.title = "Halo: Combat Evolved".to_string());
        controller.start_edit(&games[1]);

        match controller.state().edit {
            EditState::Editing { id, draft } => {
                assert_eq!(id, GameId::Number(2));
                assert_eq!(draft.title, "Doom");
            }
            EditState::NotEditing => panic!("expected an open edit"),
        }

        controller.cancel_edit();
        assert_eq!(controller.state().edit, EditState::NotEditing);
        assert!(!controller.update_edit_draft(|d| d.title.clear()));
        assert!(matches!(
            controller.save_edit().await,
            Err(CatalogueError::NotEditing)
        ));
        assert!(api.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn declined_removal_changes_nothing() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS")]);
        let controller = loaded(&api).await;
        controller.set_search("zzz");
        let before = controller.state();

        let request = controller.request_removal(&before.games[0]);
        assert_eq!(request.prompt(), "Are you sure you want to delete \"Halo\"?");
        controller
            .remove(request, Confirmation::Declined)
            .await
            .expect("declined is not an error");

        assert_eq!(controller.state(), before);
        assert!(api.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn confirmed_removal_deletes_and_reloads() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS"), game(2, "Doom", 90, "FPS")]);
        let controller = loaded(&api).await;
        let request = controller.request_removal(&controller.state().games[0]);
        assert_eq!(request.id(), &GameId::Number(1));

        controller
            .remove(request, Confirmation::Confirmed)
            .await
            .expect("delete");

        let state = controller.state();
        assert_eq!(state.success.as_deref(), Some(DELETED));
        assert_eq!(state.games.len(), 1);
        assert_eq!(api.calls().last(), Some(&Call::List));
    }

    #[tokio::test]
    async fn failed_removal_reports_error() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS")]);
        let controller = loaded(&api).await;
        *api.fail_mutations.lock() = true;
        let request = controller.request_removal(&controller.state().games[0]);

        assert!(controller.remove(request, Confirmation::Confirmed).await.is_err());
        let state = controller.state();
        assert_eq!(state.error.as_deref(), Some(DELETE_FAILED));
        assert_eq!(state.games.len(), 1);
    }

    #[tokio::test]
    async fn new_action_clears_previous_messages() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS")]);
        let controller = loaded(&api).await;
        controller.update_create_draft(|d| *d = draft("Halo", "2001-01-01"));
        assert!(controller.create().await.is_err());
        assert!(controller.state().error.is_some());

        controller.update_create_draft(|d| d.title = "Myst".to_string());
        controller.create().await.expect("create");
        let state = controller.state();
        assert_eq!(state.error, None);
        assert_eq!(state.success.as_deref(), Some(CREATED));
    }

    #[tokio::test]
    async fn concurrent_deletes_are_serialized() {
        let api = FakeApi::with_games(vec![game(1, "Halo", 80, "FPS"), game(2, "Doom", 90, "FPS")]);
        let controller = loaded(&api).await;
        let games = controller.state().games;
        let first = controller.request_removal(&games[0]);
        let second = controller.request_removal(&games[1]);

        let (a, b) = tokio::join!(
            controller.remove(first, Confirmation::Confirmed),
            controller.remove(second, Confirmation::Confirmed),
        );
        a.expect("first delete");
        b.expect("second delete");

        let calls = api.calls();
        assert_eq!(
            &calls[1..],
            [
                Call::Delete(GameId::Number(1)),
                Call::List,
                Call::Delete(GameId::Number(2)),
                Call::List,
            ]
        );
        assert!(controller.state().games.is_empty());
    }

    #[tokio::test]
    async fn projection_follows_view_params() {
        let api = FakeApi::with_games(vec![game(1, "A", 10, "RPG"), game(2, "B", 90, "FPS")]);
        let controller = loaded(&api).await;

        controller.set_sort(SortKey::Rating);
        let titles: Vec<_> = controller
            .read(|state| state.visible_records())
            .into_iter()
            .map(|game| game.title)
            .collect();
        assert_eq!(titles, ["B", "A"]);

        controller.set_genre_filter(Some("RPG".to_string()));
        assert_eq!(controller.read(|state| state.visible_records().len()), 1);
        assert_eq!(controller.read(|state| state.genre_options()), ["FPS", "RPG"]);
        assert_eq!(controller.state().games.len(), 2);
    }
}
