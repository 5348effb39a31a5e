use tracing::debug;

use crate::datastore::KeyValueStore;
use crate::error::CoreResult;
use crate::store::TaskStore;

/// Which task, if any, is being text-edited. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditSession {
    #[default]
    Idle,
    Editing(String),
}

impl EditSession {
    /// Starts editing `task_id`. An edit already in progress on another
    /// task is dropped without saving.
    pub fn begin(&mut self, task_id: &str) {
        if let EditSession::Editing(previous) = self
            && previous.as_str() != task_id
        {
            debug!(previous = %previous, "abandoning previous edit");
        }
        *self = EditSession::Editing(task_id.to_string());
    }

    /// Applies `new_text` to the edited task and returns to idle. Blank
    /// text leaves the task unchanged. The session is idle afterwards even
    /// when the write fails.
    pub fn save(
        &mut self,
        store: &mut TaskStore,
        kv: &mut dyn KeyValueStore,
        new_text: &str,
    ) -> CoreResult<()> {
        let EditSession::Editing(id) = std::mem::take(self) else {
            return Ok(());
        };
        if new_text.trim().is_empty() {
            debug!(id = %id, "blank edit discarded");
            return Ok(());
        }
        store.set_text(kv, &id, new_text)
    }

    pub fn cancel(&mut self) {
        *self = EditSession::Idle;
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing(id) => Some(id),
        }
    }

    /// True only while editing `task_id` and that task still exists.
    pub fn is_editing(&self, store: &TaskStore, task_id: &str) -> bool {
        self.editing_id() == Some(task_id) && store.contains(task_id)
    }
}
