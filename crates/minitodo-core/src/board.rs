use tracing::{debug, instrument};

use crate::datastore::KeyValueStore;
use crate::edit::EditSession;
use crate::error::CoreResult;
use crate::filter::FilterState;
use crate::store::TaskStore;
use crate::task::Task;
use crate::view::{self, BoardView};

/// Everything one task list needs at runtime: the backend it persists to,
/// the tasks, the filters and the edit session.
///
/// Independent boards can live side by side; each owns its backend.
#[derive(Debug)]
pub struct Board<S: KeyValueStore> {
    kv: S,
    store: TaskStore,
    filters: FilterState,
    edit: EditSession,
}

impl<S: KeyValueStore> Board<S> {
    /// Loads tasks and filters from `kv`. Never fails; bad data is dropped.
    #[instrument(skip(kv))]
    pub fn open(kv: S) -> Self {
        let store = TaskStore::load(&kv);
        let filters = FilterState::load(&kv);
        debug!(tasks = store.len(), "board opened");
        Self {
            kv,
            store,
            filters,
            edit: EditSession::Idle,
        }
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.store
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    pub fn into_backend(self) -> S {
        self.kv
    }

    pub fn create(&mut self, text: &str) -> CoreResult<Task> {
        self.store.create(&mut self.kv, text)
    }

    pub fn remove(&mut self, id: &str) -> CoreResult<()> {
        self.store.remove(&mut self.kv, id)
    }

    pub fn set_done(&mut self, id: &str, done: bool) -> CoreResult<()> {
        self.store.set_done(&mut self.kv, id, done)
    }

    pub fn set_priority(&mut self, id: &str, priority: &str) -> CoreResult<()> {
        self.store.set_priority(&mut self.kv, id, priority)
    }

    pub fn set_text(&mut self, id: &str, text: &str) -> CoreResult<()> {
        self.store.set_text(&mut self.kv, id, text)
    }

    pub fn clear_done(&mut self) -> CoreResult<()> {
        self.store.clear_done(&mut self.kv)
    }

    pub fn set_status_filter(&mut self, value: &str) -> CoreResult<()> {
        self.filters.set_status(&mut self.kv, value)
    }

    pub fn set_priority_filter(&mut self, value: &str) -> CoreResult<()> {
        self.filters.set_priority(&mut self.kv, value)
    }

    pub fn begin_edit(&mut self, id: &str) {
        self.edit.begin(id);
    }

    pub fn save_edit(&mut self, new_text: &str) -> CoreResult<()> {
        self.edit.save(&mut self.store, &mut self.kv, new_text)
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    pub fn view(&self) -> BoardView {
        view::project(&self.store, &self.filters, &self.edit)
    }
}
