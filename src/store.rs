//! Board state store.
//!
//! `Store` owns the columns and tasks together with the backend they are
//! persisted to. Every operation is total: unknown ids and blank input are
//! ignored, and any change is written through to storage before returning.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::storage::StateStorage;
use crate::types::{BoardState, Column, ColumnColor, LabelColor, Task, new_id};

pub struct Store<S: StateStorage> {
    state: BoardState,
    storage: S,
    persist_error: Option<anyhow::Error>,
}

impl<S: StateStorage> Store<S> {
    /// Seeds the store from storage, falling back to the default board when
    /// nothing usable is persisted.
    pub fn open(storage: S) -> Self {
        match storage.load() {
            Ok(Some(state)) => return Self::with_state(state, storage),
            Ok(None) => {}
            Err(error) => warn!("failed to load board state, using default board: {error:#}"),
        }

        // A record that exists but was not usable would be overwritten by the
        // next change.
        match storage.preserve_unreadable() {
            Ok(Some(backup)) => warn!("kept unreadable board record at {}", backup.display()),
            Ok(None) => {}
            Err(error) => warn!("failed to keep unreadable board record: {error:#}"),
        }
        Self::with_state(BoardState::default(), storage)
    }

    pub fn with_state(state: BoardState, storage: S) -> Self {
        Self {
            state,
            storage,
            persist_error: None,
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn columns(&self) -> &[Column] {
        &self.state.columns
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.state.columns.iter().find(|column| column.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.state.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks_in_column<'a>(&'a self, column_id: &'a str) -> impl Iterator<Item = &'a Task> {
        self.state
            .tasks
            .iter()
            .filter(move |task| task.column_id == column_id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Most recent write failure since the last call, if any.
    pub fn take_persist_error(&mut self) -> Option<anyhow::Error> {
        self.persist_error.take()
    }

    pub fn add_task(&mut self, column_id: &str, content: &str) -> Option<String> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        if self.column(column_id).is_none() {
            debug!("add_task ignored: unknown column {column_id}");
            return None;
        }

        let id = new_id();
        self.state.tasks.push(Task {
            id: id.clone(),
            column_id: column_id.to_string(),
            content: content.to_string(),
            image: None,
            tags: Vec::new(),
        });
        self.persist();
        Some(id)
    }

    pub fn delete_task(&mut self, id: &str) {
        let before = self.state.tasks.len();
        self.state.tasks.retain(|task| task.id != id);
        if self.state.tasks.len() != before {
            self.persist();
        }
    }

    /// Replaces content, image and tags wholesale.
    pub fn update_task(
        &mut self,
        id: &str,
        content: &str,
        image: Option<String>,
        tags: Vec<LabelColor>,
    ) {
        let Some(task) = self.state.tasks.iter_mut().find(|task| task.id == id) else {
            return;
        };

        let mut unique_tags = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique_tags.contains(&tag) {
                unique_tags.push(tag);
            }
        }

        task.content = content.to_string();
        task.image = image;
        task.tags = unique_tags;
        self.persist();
    }

    /// Replaces the flat task sequence. The new sequence must hold exactly
    /// the current task ids.
    pub fn reorder_tasks(&mut self, tasks: Vec<Task>) -> bool {
        if !same_id_multiset(&self.state.tasks, &tasks) {
            warn!("reorder_tasks ignored: sequence does not match current tasks");
            return false;
        }
        if tasks == self.state.tasks {
            return false;
        }
        self.state.tasks = tasks;
        self.persist();
        true
    }

    pub fn move_task(&mut self, from: usize, to: usize) -> bool {
        if !array_move(&mut self.state.tasks, from, to) {
            return false;
        }
        self.persist();
        true
    }

    pub fn set_task_column(&mut self, id: &str, column_id: &str) -> bool {
        let Some(task) = self.state.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        if task.column_id == column_id {
            return false;
        }
        task.column_id = column_id.to_string();
        self.persist();
        true
    }

    pub fn add_column(&mut self, title: &str) -> Option<String> {
        self.add_column_with_color(title, ColumnColor::random())
    }

    pub fn add_column_with_color(&mut self, title: &str, color: ColumnColor) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let id = new_id();
        self.state.columns.push(Column {
            id: id.clone(),
            title: title.to_string(),
            color,
        });
        self.persist();
        Some(id)
    }

    /// Removes the column together with every task that references it.
    pub fn delete_column(&mut self, id: &str) {
        let before = self.state.columns.len();
        self.state.columns.retain(|column| column.id != id);
        if self.state.columns.len() == before {
            return;
        }
        self.state.tasks.retain(|task| task.column_id != id);
        self.persist();
    }

    pub fn update_column_title(&mut self, id: &str, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let Some(column) = self.state.columns.iter_mut().find(|column| column.id == id) else {
            return;
        };
        if column.title == title {
            return;
        }
        column.title = title.to_string();
        self.persist();
    }

    pub fn update_column_color(&mut self, id: &str, color: ColumnColor) {
        let Some(column) = self.state.columns.iter_mut().find(|column| column.id == id) else {
            return;
        };
        if column.color == color {
            return;
        }
        column.color = color;
        self.persist();
    }

    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if !array_move(&mut self.state.columns, from, to) {
            return false;
        }
        self.persist();
        true
    }

    fn persist(&mut self) {
        match self.storage.save(&self.state) {
            Ok(()) => self.persist_error = None,
            Err(error) => {
                warn!("failed to persist board state: {error:#}");
                self.persist_error = Some(error);
            }
        }
    }
}

/// Removes the element at `from` and inserts it at `to`. Returns whether the
/// slice changed.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

fn same_id_multiset(current: &[Task], next: &[Task]) -> bool {
    if current.len() != next.len() {
        return false;
    }
    let mut counts: HashMap<&str, isize> = HashMap::new();
    for task in current {
        *counts.entry(task.id.as_str()).or_default() += 1;
    }
    for task in next {
        *counts.entry(task.id.as_str()).or_default() -= 1;
    }
    counts.values().all(|count| *count == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> Store<MemoryStorage> {
        Store::open(MemoryStorage::new())
    }

    fn ids_in(store: &Store<MemoryStorage>, column: &str) -> Vec<String> {
        store
            .tasks_in_column(column)
            .map(|task| task.id.clone())
            .collect()
    }

    #[test]
    fn test_open_without_record_uses_default_board() {
        let store = store();
        assert_eq!(store.state(), &BoardState::default());
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn test_open_reads_persisted_record() {
        let mut state = BoardState::default();
        state.tasks.clear();
        let storage = MemoryStorage::with_state(&state).expect("record should encode");
        let store = Store::open(storage);
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_add_task_appends_last_in_column() {
        let mut store = store();
        let first = store.add_task("todo", "one").expect("task should be added");
        let second = store.add_task("todo", "two").expect("task should be added");

        assert_eq!(ids_in(&store, "todo"), vec!["1".to_string(), first, second.clone()]);
        let task = store.task(&second).expect("task should exist");
        assert_eq!(task.column_id, "todo");
        assert_eq!(task.image, None);
        assert!(task.tags.is_empty());
        assert_eq!(store.storage().writes(), 2);
    }

    #[test]
    fn test_blank_adds_leave_state_untouched() {
        let mut store = store();
        let before = store.state().clone();

        assert_eq!(store.add_task("todo", ""), None);
        assert_eq!(store.add_task("todo", "   \n"), None);
        assert_eq!(store.add_column(""), None);
        assert_eq!(store.add_column("\t"), None);

        assert_eq!(store.state(), &before);
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn test_add_task_to_unknown_column_is_ignored() {
        let mut store = store();
        assert_eq!(store.add_task("missing", "orphan"), None);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_delete_task_and_unknown_id() {
        let mut store = store();
        store.delete_task("nope");
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.storage().writes(), 0);

        store.delete_task("1");
        assert!(store.tasks().is_empty());
        assert_eq!(store.storage().writes(), 1);
    }

    #[test]
    fn test_update_task_replaces_wholesale() {
        let mut store = store();
        store.update_task(
            "1",
            "Rewritten",
            Some("data:image/png;base64,AAAA".to_string()),
            vec![LabelColor::Red, LabelColor::Green, LabelColor::Red],
        );

        let task = store.task("1").expect("task should exist");
        assert_eq!(task.content, "Rewritten");
        assert_eq!(task.image.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(task.tags, vec![LabelColor::Red, LabelColor::Green]);

        store.update_task("1", "Rewritten", None, Vec::new());
        let task = store.task("1").expect("task should exist");
        assert_eq!(task.image, None);
        assert!(task.tags.is_empty());
    }

    #[test]
    fn test_reorder_requires_same_membership() {
        let mut store = store();
        let a = store.add_task("todo", "a").expect("added");
        let b = store.add_task("doing", "b").expect("added");

        let mut reversed = store.tasks().to_vec();
        reversed.reverse();
        assert!(store.reorder_tasks(reversed));
        let order: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec![b.as_str(), a.as_str(), "1"]);

        let mut truncated = store.tasks().to_vec();
        truncated.pop();
        assert!(!store.reorder_tasks(truncated));
        assert_eq!(store.tasks().len(), 3);

        let mut duplicated = store.tasks().to_vec();
        duplicated[0] = duplicated[1].clone();
        assert!(!store.reorder_tasks(duplicated));
    }

    #[test]
    fn test_move_task_uses_array_move() {
        let mut store = store();
        let a = store.add_task("todo", "a").expect("added");
        let b = store.add_task("todo", "b").expect("added");

        assert!(store.move_task(2, 0));
        let order: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec![b.as_str(), "1", a.as_str()]);

        assert!(!store.move_task(0, 9));
        assert!(!store.move_task(1, 1));
    }

    #[test]
    fn test_delete_column_cascades_only_its_tasks() {
        let mut store = store();
        let doing = store.add_task("doing", "keep me").expect("added");
        store.add_task("todo", "drop me").expect("added");

        store.delete_column("todo");

        assert!(store.column("todo").is_none());
        assert_eq!(store.columns().len(), 2);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, doing);
        assert!(store.tasks().iter().all(|task| task.column_id != "todo"));
    }

    #[test]
    fn test_add_column_assigns_palette_color() {
        let mut store = store();
        let id = store.add_column("  Review  ").expect("column added");
        let column = store.column(&id).expect("column exists");
        assert_eq!(column.title, "Review");
        assert!(ColumnColor::ALL.contains(&column.color));
        assert_eq!(store.columns().last().map(|c| c.id.as_str()), Some(id.as_str()));
    }

    #[test]
    fn test_update_column_title_and_color() {
        let mut store = store();
        store.update_column_title("todo", "Backlog");
        store.update_column_title("todo", "  ");
        store.update_column_title("missing", "Ghost");
        store.update_column_color("todo", ColumnColor::Rose);
        store.update_column_color("missing", ColumnColor::Rose);

        let column = store.column("todo").expect("column exists");
        assert_eq!(column.title, "Backlog");
        assert_eq!(column.color, ColumnColor::Rose);
        assert_eq!(store.storage().writes(), 2);
    }

    #[test]
    fn test_move_column_reorders_columns() {
        let mut store = store();
        assert!(store.move_column(0, 2));
        let ids: Vec<&str> = store.columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["doing", "done", "todo"]);
    }

    #[test]
    fn test_changes_are_persisted_to_storage() {
        let mut store = store();
        store.add_column_with_color("Later", ColumnColor::Teal);
        let reloaded = store
            .storage()
            .load()
            .expect("record should decode")
            .expect("record should exist");
        assert_eq!(&reloaded, store.state());
    }

    #[test]
    fn test_end_to_end_add_then_delete() {
        let mut store = store();
        store.add_task("doing", "second").expect("added");
        store.delete_task("1");

        assert_eq!(store.tasks_in_column("doing").count(), 1);
        assert_eq!(store.tasks_in_column("todo").count(), 0);
        assert_eq!(store.tasks_in_column("done").count(), 0);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_array_move_bounds() {
        let mut items = vec![1, 2, 3, 4];
        assert!(array_move(&mut items, 0, 3));
        assert_eq!(items, vec![2, 3, 4, 1]);
        assert!(array_move(&mut items, 3, 1));
        assert_eq!(items, vec![2, 1, 3, 4]);
        assert!(!array_move(&mut items, 4, 0));
    }

    struct ReadOnlyStorage;

    impl StateStorage for ReadOnlyStorage {
        fn load(&self) -> anyhow::Result<Option<BoardState>> {
            Ok(None)
        }

        fn save(&mut self, _state: &BoardState) -> anyhow::Result<()> {
            anyhow::bail!("storage is read-only")
        }
    }

    #[test]
    fn test_failed_write_keeps_state_and_reports_once() {
        let mut store = Store::open(ReadOnlyStorage);
        let id = store.add_task("todo", "still here").expect("added");

        assert!(store.task(&id).is_some());
        let error = store.take_persist_error().expect("write failure recorded");
        assert!(error.to_string().contains("read-only"));
        assert!(store.take_persist_error().is_none());
    }
}
