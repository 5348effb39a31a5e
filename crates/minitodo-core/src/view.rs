//! Pure projection from board state to what a view layer paints.
//!
//! Nothing here mutates or persists. The projection is recomputed from
//! scratch after every user action.

use serde::Serialize;

use crate::edit::EditSession;
use crate::filter::{FilterState, PriorityFilter, StatusFilter};
use crate::store::TaskStore;
use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// The store holds no tasks at all.
    Onboarding,
    NoOpenTasks,
    NoCompletedTasks,
    NoMatches,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::Onboarding => "Noch keine Aufgaben. Leg oben deine erste an!",
            EmptyState::NoOpenTasks => "Alles erledigt! Keine offenen Aufgaben. 🎉",
            EmptyState::NoCompletedTasks => "Noch keine erledigten Aufgaben.",
            EmptyState::NoMatches => "Keine Aufgaben passen zu diesem Filter.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub editing: bool,
    pub done: bool,
    pub priority: Priority,
    /// Raw task text, for view layers that do their own escaping.
    pub text: String,
    /// Markup-safe task text.
    pub html_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn label(&self) -> String {
        format!("{} von {} erledigt", self.done, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterButton {
    pub value: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub rows: Vec<TaskRow>,
    pub empty_state: Option<EmptyState>,
    pub progress: Progress,
    pub status_buttons: Vec<FilterButton>,
    pub priority_buttons: Vec<FilterButton>,
}

pub fn visible_tasks<'a>(
    store: &'a TaskStore,
    filters: &FilterState,
) -> impl Iterator<Item = &'a Task> {
    let filters = *filters;
    store.tasks().iter().filter(move |t| filters.matches(t))
}

pub fn empty_state(store: &TaskStore, filters: &FilterState, visible: usize) -> Option<EmptyState> {
    if store.is_empty() {
        return Some(EmptyState::Onboarding);
    }
    if visible > 0 {
        return None;
    }
    Some(match filters.status {
        StatusFilter::Open => EmptyState::NoOpenTasks,
        StatusFilter::Done => EmptyState::NoCompletedTasks,
        StatusFilter::All => EmptyState::NoMatches,
    })
}

pub fn row(task: &Task, store: &TaskStore, edit: &EditSession) -> TaskRow {
    TaskRow {
        id: task.id.clone(),
        editing: edit.is_editing(store, &task.id),
        done: task.done,
        priority: task.effective_priority(),
        text: task.text.clone(),
        html_text: escape_html(&task.text),
    }
}

pub fn progress(store: &TaskStore) -> Progress {
    Progress {
        done: store.tasks().iter().filter(|t| t.done).count(),
        total: store.len(),
    }
}

pub fn status_buttons(store: &TaskStore, filters: &FilterState) -> Vec<FilterButton> {
    StatusFilter::ALL
        .into_iter()
        .map(|option| FilterButton {
            value: option.as_str(),
            label: option.label(),
            count: store.tasks().iter().filter(|t| option.matches(t)).count(),
            active: option == filters.status,
        })
        .collect()
}

pub fn priority_buttons(store: &TaskStore, filters: &FilterState) -> Vec<FilterButton> {
    PriorityFilter::ALL
        .into_iter()
        .map(|option| FilterButton {
            value: option.as_str(),
            label: option.label(),
            count: store.tasks().iter().filter(|t| option.matches(t)).count(),
            active: option == filters.priority,
        })
        .collect()
}

pub fn project(store: &TaskStore, filters: &FilterState, edit: &EditSession) -> BoardView {
    let rows: Vec<TaskRow> = visible_tasks(store, filters)
        .map(|task| row(task, store, edit))
        .collect();
    let empty_state = empty_state(store, filters, rows.len());

    BoardView {
        rows,
        empty_state,
        progress: progress(store),
        status_buttons: status_buttons(store, filters),
        priority_buttons: priority_buttons(store, filters),
    }
}

/// Escapes `& < > " '`. The ampersand goes first so entities produced by
/// the later replacements are not escaped twice.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{EmptyState, escape_html, project};
    use crate::datastore::MemoryStore;
    use crate::edit::EditSession;
    use crate::filter::{FilterState, PriorityFilter, StatusFilter};
    use crate::store::TaskStore;
    use crate::task::Priority;

    fn fixture() -> TaskStore {
        TaskStore::from_tasks(
            serde_json::from_value(json!([
                {"id": "1", "text": "low open", "done": false, "priority": "low"},
                {"id": "2", "text": "high done", "done": true, "priority": "high"},
                {"id": "3", "text": "legacy", "done": false},
                {"id": "4", "text": "<b>bold</b>", "done": false, "priority": "high"}
            ]))
            .expect("fixture tasks"),
        )
    }

    #[test]
    fn escapes_all_five_characters() {
        let out = escape_html(r#"<b>"hi"</b> & 'bye'"#);
        assert_eq!(
            out,
            "&lt;b&gt;&quot;hi&quot;&lt;/b&gt; &amp; &#039;bye&#039;"
        );
        assert!(!out.contains(['<', '>', '"', '\'']));
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn empty_store_shows_onboarding() {
        let view = project(&TaskStore::default(), &FilterState::default(), &EditSession::Idle);
        assert!(view.rows.is_empty());
        assert_eq!(view.empty_state, Some(EmptyState::Onboarding));
        assert_eq!(view.progress.label(), "0 von 0 erledigt");
    }

    #[test]
    fn empty_messages_follow_status_filter() {
        let mut kv = MemoryStore::new();
        let mut store = TaskStore::default();
        let task = store.create(&mut kv, "only").expect("create");

        let open = FilterState {
            status: StatusFilter::Open,
            priority: PriorityFilter::All,
        };
        let done = FilterState {
            status: StatusFilter::Done,
            priority: PriorityFilter::All,
        };
        let high = FilterState {
            status: StatusFilter::All,
            priority: PriorityFilter::Only(Priority::High),
        };

        assert_eq!(
            project(&store, &done, &EditSession::Idle).empty_state,
            Some(EmptyState::NoCompletedTasks)
        );
        assert_eq!(
            project(&store, &high, &EditSession::Idle).empty_state,
            Some(EmptyState::NoMatches)
        );

        store.set_done(&mut kv, &task.id, true).expect("done");
        assert_eq!(
            project(&store, &open, &EditSession::Idle).empty_state,
            Some(EmptyState::NoOpenTasks)
        );
        assert_eq!(project(&store, &done, &EditSession::Idle).empty_state, None);
    }

    #[test]
    fn rows_and_buttons() {
        let store = fixture();
        let filters = FilterState {
            status: StatusFilter::Open,
            priority: PriorityFilter::All,
        };
        let edit = EditSession::Editing("3".to_string());

        let view = project(&store, &filters, &edit);
        let ids: Vec<&str> = view.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert!(view.rows[1].editing);
        assert!(!view.rows[0].editing);
        assert_eq!(view.rows[1].priority, Priority::Medium);
        assert_eq!(view.rows[2].html_text, "&lt;b&gt;bold&lt;/b&gt;");
        assert_eq!(view.rows[2].text, "<b>bold</b>");

        let status: Vec<(&str, usize, bool)> = view
            .status_buttons
            .iter()
            .map(|b| (b.value, b.count, b.active))
            .collect();
        assert_eq!(
            status,
            vec![("all", 4, false), ("open", 3, true), ("done", 1, false)]
        );

        let priority: Vec<(&str, usize, bool)> = view
            .priority_buttons
            .iter()
            .map(|b| (b.value, b.count, b.active))
            .collect();
        assert_eq!(
            priority,
            vec![
                ("all", 4, true),
                ("low", 1, false),
                ("medium", 1, false),
                ("high", 2, false)
            ]
        );
        assert_eq!(view.progress.done, 1);
        assert_eq!(view.progress.total, 4);
    }

    #[test]
    fn edit_on_missing_task_is_ignored() {
        let store = fixture();
        let edit = EditSession::Editing("gone".to_string());
        let view = project(&store, &FilterState::default(), &edit);
        assert!(view.rows.iter().all(|r| !r.editing));
    }
}
