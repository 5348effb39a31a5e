use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::datastore::{KeyValueStore, TASKS_KEY};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::task::{Priority, Task};

/// The canonical task list, most recent first.
///
/// Every mutating operation writes the whole list back to the backend
/// before returning. A failed write is reported but the in-memory change
/// is kept, so memory and storage may differ until the next good save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Reads the persisted list. Never fails: missing, unreadable or
    /// malformed data yields an empty list, and records lacking a string
    /// `id`, string `text` or boolean `done` are dropped one by one. When an
    /// id repeats, the first record wins.
    #[tracing::instrument(skip(kv))]
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        let raw = match kv.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(err) => {
                warn!(error = %err, "could not read task list; starting empty");
                return Self::default();
            }
        };

        let tasks = parse_task_list(&raw);
        debug!(count = tasks.len(), "loaded tasks");
        Self { tasks }
    }

    #[tracing::instrument(skip(self, kv), fields(count = self.tasks.len()))]
    pub fn save(&self, kv: &mut dyn KeyValueStore) -> CoreResult<()> {
        let persist_err = |source: anyhow::Error| CoreError::Persistence {
            key: TASKS_KEY.to_string(),
            source,
        };
        let serialized = serde_json::to_string(&self.tasks).map_err(|e| persist_err(e.into()))?;
        kv.set(TASKS_KEY, &serialized).map_err(persist_err)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Resolves a full id or an unambiguous id prefix.
    pub fn resolve(&self, prefix: &str) -> Result<&str, ValidationError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(ValidationError::UnknownTask(prefix.to_string()));
        }
        if let Some(task) = self.get(prefix) {
            return Ok(&task.id);
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(prefix));
        let first = matches
            .next()
            .ok_or_else(|| ValidationError::UnknownTask(prefix.to_string()))?;
        if matches.next().is_some() {
            return Err(ValidationError::AmbiguousTask(prefix.to_string()));
        }
        Ok(&first.id)
    }

    #[tracing::instrument(skip(self, kv))]
    pub fn create(&mut self, kv: &mut dyn KeyValueStore, text: &str) -> CoreResult<Task> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText.into());
        }

        let task = Task::new_open(text.to_string(), Utc::now());
        self.tasks.insert(0, task.clone());
        info!(id = %task.id, count = self.tasks.len(), "task created");

        self.save(kv)?;
        Ok(task)
    }

    #[tracing::instrument(skip(self, kv))]
    pub fn remove(&mut self, kv: &mut dyn KeyValueStore, id: &str) -> CoreResult<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        debug!(removed = before - self.tasks.len(), "remove");
        self.save(kv)
    }

    #[tracing::instrument(skip(self, kv))]
    pub fn set_done(&mut self, kv: &mut dyn KeyValueStore, id: &str, done: bool) -> CoreResult<()> {
        if let Some(task) = self.find_mut(id) {
            task.done = done;
        }
        self.save(kv)
    }

    #[tracing::instrument(skip(self, kv))]
    pub fn set_priority(
        &mut self,
        kv: &mut dyn KeyValueStore,
        id: &str,
        priority: &str,
    ) -> CoreResult<()> {
        let priority: Priority = priority.parse()?;
        if let Some(task) = self.find_mut(id) {
            task.set_priority(priority);
        }
        self.save(kv)
    }

    /// Replaces the text of a task. Blank input leaves the old text alone.
    #[tracing::instrument(skip(self, kv, text))]
    pub fn set_text(&mut self, kv: &mut dyn KeyValueStore, id: &str, text: &str) -> CoreResult<()> {
        let text = text.trim();
        if !text.is_empty()
            && let Some(task) = self.find_mut(id)
        {
            task.text = text.to_string();
        }
        self.save(kv)
    }

    #[tracing::instrument(skip(self, kv))]
    pub fn clear_done(&mut self, kv: &mut dyn KeyValueStore) -> CoreResult<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.done);
        info!(
            before,
            after = self.tasks.len(),
            "cleared completed tasks"
        );
        self.save(kv)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

fn parse_task_list(raw: &str) -> Vec<Task> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "stored task list is not valid JSON; ignoring it");
            return vec![];
        }
    };

    let Value::Array(items) = parsed else {
        warn!("stored task list is not an array; ignoring it");
        return vec![];
    };

    let total = items.len();
    let mut seen = HashSet::new();
    let tasks: Vec<Task> = items
        .into_iter()
        .filter(Task::has_required_shape)
        .filter_map(|item| serde_json::from_value::<Task>(item).ok())
        .filter(|task| seen.insert(task.id.clone()))
        .collect();

    if tasks.len() < total {
        debug!(dropped = total - tasks.len(), "dropped malformed or duplicate task records");
    }
    tasks
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TaskStore;
    use crate::datastore::{MemoryStore, ReadOnlyStore, TASKS_KEY};
    use crate::error::{CoreError, ValidationError};
    use crate::task::{Priority, Task};

    fn texts(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn create_inserts_at_head_with_defaults() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();

        store.create(&mut kv, "first").expect("create first");
        let task = store.create(&mut kv, "  second  ").expect("create second");

        assert_eq!(task.text, "second");
        assert!(!task.done);
        assert_eq!(task.effective_priority(), Priority::Medium);
        assert_eq!(texts(&store), vec!["second", "first"]);
        assert_eq!(TaskStore::load(&kv), store);
    }

    #[test]
    fn create_rejects_blank_text() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();
        store.create(&mut kv, "keep").expect("create");
        let before = store.clone();

        for blank in ["", "   ", "\t\n"] {
            let err = store.create(&mut kv, blank).expect_err("blank must fail");
            assert_eq!(err.as_validation(), Some(&ValidationError::EmptyText));
        }
        assert_eq!(store, before);
    }

    #[test]
    fn remove_present_and_absent() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();
        let a = store.create(&mut kv, "a").expect("create a");
        store.create(&mut kv, "b").expect("create b");

        store.remove(&mut kv, &a.id).expect("remove a");
        assert!(!store.contains(&a.id));
        assert_eq!(texts(&store), vec!["b"]);

        let before = store.clone();
        store.remove(&mut kv, "no-such-id").expect("remove absent");
        assert_eq!(store, before);
    }

    #[test]
    fn set_priority_validates_before_touching_state() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();
        let task = store.create(&mut kv, "a").expect("create");

        let err = store
            .set_priority(&mut kv, &task.id, "urgent")
            .expect_err("invalid priority");
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::InvalidPriority("urgent".to_string()))
        );

        assert_eq!(store.get(&task.id).map(Task::effective_priority), Some(Priority::Medium));
        assert_eq!(TaskStore::load(&kv), store);

        store.set_priority(&mut kv, &task.id, "high").expect("set high");
        let stored = store.get(&task.id).expect("task exists");
        assert_eq!(stored.effective_priority(), Priority::High);

        let before = store.clone();
        store.set_priority(&mut kv, "missing", "low").expect("absent id is a no-op");
        assert_eq!(store, before);
    }

    #[test]
    fn updates_on_absent_ids_change_nothing() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();
        store.create(&mut kv, "only").expect("create");
        let before = store.clone();

        store.set_done(&mut kv, "missing", true).expect("done on absent id");
        store.set_text(&mut kv, "missing", "renamed").expect("text on absent id");
        assert_eq!(store, before);
        assert_eq!(TaskStore::load(&kv), before);
    }

    #[test]
    fn set_text_ignores_blank() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();
        let task = store.create(&mut kv, "original").expect("create");

        store.set_text(&mut kv, &task.id, "   ").expect("blank edit");
        assert_eq!(store.get(&task.id).map(|t| t.text.as_str()), Some("original"));

        store.set_text(&mut kv, &task.id, " renamed ").expect("edit");
        assert_eq!(store.get(&task.id).map(|t| t.text.as_str()), Some("renamed"));
    }

    #[test]
    fn clear_done_keeps_open_tasks_in_order() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();
        for text in ["a", "b", "c", "d", "e"] {
            store.create(&mut kv, text).expect("create");
        }
        let ids: Vec<String> = store.tasks().iter().map(|t| t.id.clone()).collect();
        store.set_done(&mut kv, &ids[1], true).expect("done d");
        store.set_done(&mut kv, &ids[3], true).expect("done b");

        store.clear_done(&mut kv).expect("clear");
        assert_eq!(texts(&store), vec!["e", "c", "a"]);
        assert_eq!(TaskStore::load(&kv), store);
    }

    #[test]
    fn load_tolerates_garbage() {
        for raw in ["not json", "{\"id\":\"1\"}", "42", "null", ""] {
            let kv = MemoryStore::new().with_entry(TASKS_KEY, raw);
            assert!(TaskStore::load(&kv).is_empty(), "raw value {raw:?}");
        }
        assert!(TaskStore::load(&MemoryStore::new()).is_empty());
        assert!(TaskStore::load(&ReadOnlyStore).is_empty());
    }

    #[test]
    fn load_keeps_only_well_formed_records() {
        let raw = json!([
            {"id": "a", "text": "valid", "done": false, "priority": "low", "createdAt": 1},
            {"id": 7, "text": "numeric id", "done": false},
            {"id": "b", "text": "no done flag"},
            "just a string",
            {"id": "c", "text": "legacy", "done": true}
        ])
        .to_string();
        let kv = MemoryStore::new().with_entry(TASKS_KEY, &raw);

        let store = TaskStore::load(&kv);
        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(store.get("c").and_then(|t| t.priority.clone()), None);
    }

    #[test]
    fn repeated_ids_keep_the_first_record() {
        let raw = json!([
            {"id": "a", "text": "first a", "done": false},
            {"id": "b", "text": "only b", "done": false},
            {"id": "a", "text": "second a", "done": true}
        ])
        .to_string();
        let mut kv = MemoryStore::new().with_entry(TASKS_KEY, &raw);

        let mut store = TaskStore::load(&kv);
        assert_eq!(texts(&store), vec!["first a", "only b"]);

        store.set_done(&mut kv, "a", true).expect("done a");
        assert_eq!(store.get("a").map(|t| t.done), Some(true));
        store.remove(&mut kv, "a").expect("remove a");
        assert_eq!(texts(&TaskStore::load(&kv)), vec!["only b"]);
    }

    #[test]
    fn failed_write_propagates_and_keeps_memory_state() {
        let mut kv = ReadOnlyStore;
        let mut store = TaskStore::default();

        let err = store.create(&mut kv, "unsaved").expect_err("write fails");
        assert!(matches!(err, CoreError::Persistence { ref key, .. } if key == TASKS_KEY));
        assert_eq!(texts(&store), vec!["unsaved"]);
    }

    #[test]
    fn resolve_by_prefix() {
        let store = TaskStore::from_tasks(
            serde_json::from_value(json!([
                {"id": "abc123", "text": "one", "done": false},
                {"id": "abd456", "text": "two", "done": false}
            ]))
            .expect("fixture tasks"),
        );

        assert_eq!(store.resolve("abc"), Ok("abc123"));
        assert_eq!(store.resolve("abd456"), Ok("abd456"));
        assert_eq!(
            store.resolve("ab"),
            Err(ValidationError::AmbiguousTask("ab".to_string()))
        );
        assert_eq!(
            store.resolve("zz"),
            Err(ValidationError::UnknownTask("zz".to_string()))
        );
    }
}
