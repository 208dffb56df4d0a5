//! Drag-and-drop controller.
//!
//! Input layers (mouse, keyboard, CLI) report the three phases of a gesture:
//! `on_start` when an item is picked up, `on_over` while it hovers a drop
//! target and `on_end` when it is released. The controller turns those into
//! store mutations.

use tracing::debug;

use crate::storage::StateStorage;
use crate::store::{Store, array_move};
use crate::types::{Column, Task};

/// What the pointer picked up.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DragSource {
    Task(String),
    Column(String),
}

/// What the pointer is currently over.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DropTarget {
    Task(String),
    Column(String),
}

/// Captured copy of the dragged item, used for overlay rendering.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DragItem {
    Task(Task),
    Column(Column),
}

impl DragItem {
    pub fn id(&self) -> &str {
        match self {
            DragItem::Task(task) => &task.id,
            DragItem::Column(column) => &column.id,
        }
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragItem>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&DragItem> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_start<S: StateStorage>(&mut self, store: &Store<S>, source: &DragSource) -> bool {
        self.active = match source {
            DragSource::Task(id) => store.task(id).cloned().map(DragItem::Task),
            DragSource::Column(id) => store.column(id).cloned().map(DragItem::Column),
        };
        if let Some(item) = &self.active {
            debug!("drag started: {}", item.id());
        }
        self.active.is_some()
    }

    /// Moves the dragged task into the hovered column. Column drags only
    /// commit on release.
    pub fn on_over<S: StateStorage>(
        &mut self,
        store: &mut Store<S>,
        over: Option<&DropTarget>,
    ) -> bool {
        let Some(DragItem::Task(active)) = &self.active else {
            return false;
        };
        let Some(over) = over else {
            return false;
        };
        let active_id = active.id.clone();
        let changed = move_task_over(store, &active_id, over);
        if changed && let Some(task) = store.task(&active_id) {
            self.active = Some(DragItem::Task(task.clone()));
        }
        changed
    }

    /// Commits the final ordering and clears the captured item.
    pub fn on_end<S: StateStorage>(
        &mut self,
        store: &mut Store<S>,
        over: Option<&DropTarget>,
    ) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        let Some(over) = over else {
            debug!("drag ended without a drop target: {}", active.id());
            return false;
        };

        match active {
            DragItem::Task(task) => {
                let moved_column = move_task_over(store, &task.id, over);
                let DropTarget::Task(over_id) = over else {
                    return moved_column;
                };
                if *over_id == task.id {
                    return moved_column;
                }
                let (Some(from), Some(to)) = (
                    store.state().task_index(&task.id),
                    store.state().task_index(over_id),
                ) else {
                    return moved_column;
                };
                store.move_task(from, to) || moved_column
            }
            DragItem::Column(column) => {
                let target_column = match over {
                    DropTarget::Column(id) => Some(id.clone()),
                    DropTarget::Task(id) => store.task(id).map(|task| task.column_id.clone()),
                };
                let Some(target_column) = target_column else {
                    return false;
                };
                let (Some(from), Some(to)) = (
                    store.state().column_index(&column.id),
                    store.state().column_index(&target_column),
                ) else {
                    return false;
                };
                store.move_column(from, to)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }
}

/// Reassigns the dragged task to the target's column. Over a task in another
/// column the task also takes the target's slot in the flat sequence.
fn move_task_over<S: StateStorage>(store: &mut Store<S>, active_id: &str, over: &DropTarget) -> bool {
    match over {
        DropTarget::Task(over_id) => {
            if over_id == active_id {
                return false;
            }
            let state = store.state();
            let (Some(from), Some(to)) = (state.task_index(active_id), state.task_index(over_id))
            else {
                return false;
            };
            let target_column = state.tasks[to].column_id.clone();
            if state.tasks[from].column_id == target_column {
                return false;
            }

            let mut tasks = state.tasks.clone();
            tasks[from].column_id = target_column;
            array_move(&mut tasks, from, to);
            store.reorder_tasks(tasks)
        }
        DropTarget::Column(column_id) => {
            if store.column(column_id).is_none() {
                return false;
            }
            store.set_task_column(active_id, column_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::LabelColor;

    fn store() -> Store<MemoryStorage> {
        Store::open(MemoryStorage::new())
    }

    fn order(store: &Store<MemoryStorage>) -> Vec<String> {
        store.tasks().iter().map(|task| task.id.clone()).collect()
    }

    fn task_target(id: &str) -> DropTarget {
        DropTarget::Task(id.to_string())
    }

    #[test]
    fn test_start_captures_task_for_overlay() {
        let store = store();
        let mut drag = DragController::new();
        assert!(drag.on_start(&store, &DragSource::Task("1".to_string())));
        assert!(matches!(drag.active(), Some(DragItem::Task(task)) if task.id == "1"));
    }

    #[test]
    fn test_start_with_unknown_id_captures_nothing() {
        let store = store();
        let mut drag = DragController::new();
        assert!(!drag.on_start(&store, &DragSource::Task("ghost".to_string())));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_over_task_in_other_column_moves_next_to_it() {
        let mut store = store();
        let a = store.add_task("doing", "a").expect("added");
        let b = store.add_task("doing", "b").expect("added");
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task("1".to_string()));

        assert!(drag.on_over(&mut store, Some(&task_target(&b))));

        assert_eq!(order(&store), vec![a.clone(), b.clone(), "1".to_string()]);
        assert_eq!(store.task("1").map(|t| t.column_id.as_str()), Some("doing"));
        assert!(matches!(drag.active(), Some(DragItem::Task(task)) if task.column_id == "doing"));
    }

    #[test]
    fn test_over_keeps_identity_fields() {
        let mut store = store();
        store.update_task(
            "1",
            "card",
            Some("data:image/gif;base64,R0lG".to_string()),
            vec![LabelColor::Pink],
        );
        let before = store.task("1").cloned().expect("task exists");
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task("1".to_string()));

        drag.on_over(&mut store, Some(&DropTarget::Column("done".to_string())));

        let after = store.task("1").expect("task exists");
        assert_eq!(after.column_id, "done");
        assert_eq!(after.id, before.id);
        assert_eq!(after.content, before.content);
        assert_eq!(after.image, before.image);
        assert_eq!(after.tags, before.tags);
    }

    #[test]
    fn test_over_same_column_task_or_self_is_noop() {
        let mut store = store();
        let a = store.add_task("todo", "a").expect("added");
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task("1".to_string()));
        let writes = store.storage().writes();

        assert!(!drag.on_over(&mut store, Some(&task_target(&a))));
        assert!(!drag.on_over(&mut store, Some(&task_target("1"))));
        assert!(!drag.on_over(&mut store, Some(&DropTarget::Column("todo".to_string()))));
        assert!(!drag.on_over(&mut store, None));
        assert_eq!(store.storage().writes(), writes);
    }

    #[test]
    fn test_end_reorders_within_column() {
        let mut store = store();
        let a = store.add_task("todo", "a").expect("added");
        let b = store.add_task("todo", "b").expect("added");
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task(b.clone()));

        assert!(drag.on_end(&mut store, Some(&task_target("1"))));

        assert_eq!(order(&store), vec![b, "1".to_string(), a]);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_end_without_target_only_clears() {
        let mut store = store();
        let before = store.state().clone();
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task("1".to_string()));

        assert!(!drag.on_end(&mut store, None));
        assert!(!drag.is_dragging());
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_end_on_self_is_noop() {
        let mut store = store();
        let before = store.state().clone();
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task("1".to_string()));
        assert!(!drag.on_end(&mut store, Some(&task_target("1"))));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_end_without_over_takes_target_slot_in_its_column() {
        let mut store = store();
        let done = store.add_task("done", "finished").expect("added");
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task("1".to_string()));

        assert!(drag.on_end(&mut store, Some(&task_target(&done))));

        assert_eq!(store.task("1").map(|t| t.column_id.as_str()), Some("done"));
        let done_ids: Vec<&str> = store.tasks_in_column("done").map(|t| t.id.as_str()).collect();
        assert_eq!(done_ids, vec!["1", done.as_str()]);
    }

    #[test]
    fn test_full_gesture_preserves_membership() {
        let mut store = store();
        let a = store.add_task("doing", "a").expect("added");
        let b = store.add_task("done", "b").expect("added");
        let mut before = order(&store);
        before.sort();

        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Task("1".to_string()));
        drag.on_over(&mut store, Some(&task_target(&a)));
        drag.on_over(&mut store, Some(&task_target(&b)));
        drag.on_end(&mut store, Some(&task_target(&b)));

        let mut after = order(&store);
        after.sort();
        assert_eq!(before, after);
        assert_eq!(store.task("1").map(|t| t.column_id.as_str()), Some("done"));
    }

    #[test]
    fn test_column_drag_reorders_columns() {
        let mut store = store();
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Column("done".to_string()));

        assert!(!drag.on_over(&mut store, Some(&DropTarget::Column("todo".to_string()))));
        assert!(drag.on_end(&mut store, Some(&task_target("1"))));

        let ids: Vec<&str> = store.columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["done", "todo", "doing"]);
    }

    #[test]
    fn test_phases_without_start_are_noops() {
        let mut store = store();
        let mut drag = DragController::new();
        assert!(!drag.on_over(&mut store, Some(&DropTarget::Column("done".to_string()))));
        assert!(!drag.on_end(&mut store, Some(&DropTarget::Column("done".to_string()))));
        assert_eq!(store.task("1").map(|t| t.column_id.as_str()), Some("todo"));
    }

    #[test]
    fn test_cancel_clears_without_mutation() {
        let store = store();
        let mut drag = DragController::new();
        drag.on_start(&store, &DragSource::Column("todo".to_string()));
        drag.cancel();
        assert!(drag.active().is_none());
    }
}
