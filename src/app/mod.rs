mod input;
pub mod interaction;
pub mod messages;
pub mod state;

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use self::interaction::InteractionMap;
pub use self::messages::Message;
pub use self::state::{
    ActiveDialog, COLOR_PICKER_ROW, ColorPickerDialogState, DeleteColumnDialogState,
    DeleteColumnField, EditTaskDialogState, EditTaskField, TextInputDialogState, TextInputMode,
};

use crate::drag::{DragController, DragSource, DropTarget};
use crate::image;
use crate::settings::Settings;
use crate::storage::StateStorage;
use crate::store::Store;
use crate::theme::Theme;
use crate::types::{Column, Task};

pub type BoardStore = Store<Box<dyn StateStorage + Send>>;

/// Left button press that may turn into a drag once the pointer travels far
/// enough.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PointerPress {
    pub origin: (u16, u16),
    pub source: DragSource,
}

pub struct App {
    pub should_quit: bool,
    pub store: BoardStore,
    pub settings: Settings,
    pub theme: Theme,
    pub viewport: (u16, u16),
    pub focused_column: usize,
    pub selected_task_per_column: HashMap<usize, usize>,
    pub scroll_offset_per_column: HashMap<usize, usize>,
    pub active_dialog: ActiveDialog,
    pub footer_notice: Option<String>,
    pub interaction_map: InteractionMap,
    pub drag: DragController,
    pub pointer: Option<PointerPress>,
    pub drag_cursor: Option<(u16, u16)>,
    pub hovered_drop: Option<DropTarget>,
}

impl App {
    pub fn new(store: BoardStore, settings: Settings) -> Self {
        Self {
            should_quit: false,
            store,
            settings,
            theme: Theme::default(),
            viewport: (0, 0),
            focused_column: 0,
            selected_task_per_column: HashMap::new(),
            scroll_offset_per_column: HashMap::new(),
            active_dialog: ActiveDialog::None,
            footer_notice: None,
            interaction_map: InteractionMap::default(),
            drag: DragController::new(),
            pointer: None,
            drag_cursor: None,
            hovered_drop: None,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn update(&mut self, message: Message) -> Result<()> {
        match message {
            Message::Key(key) => self.handle_key(key)?,
            Message::Mouse(mouse) => self.handle_mouse(mouse)?,
            Message::Resize(width, height) => self.viewport = (width, height),
            Message::Tick => {}

            Message::FocusColumn(column) => self.focus_column(column),
            Message::SelectTask(column, index) => {
                self.focus_column(column);
                self.selected_task_per_column.insert(column, index);
            }

            Message::OpenAddTask => self.open_add_task(),
            Message::OpenAddTaskIn(column) => {
                self.focus_column(column);
                self.open_add_task();
            }
            Message::OpenAddColumn => {
                self.active_dialog = ActiveDialog::TextInput(TextInputDialogState {
                    mode: TextInputMode::AddColumn,
                    input: String::new(),
                });
            }
            Message::OpenRenameColumn => {
                if let Some(column) = self.focused_column_ref() {
                    self.active_dialog = ActiveDialog::TextInput(TextInputDialogState {
                        mode: TextInputMode::RenameColumn {
                            column_id: column.id.clone(),
                        },
                        input: column.title.clone(),
                    });
                }
            }
            Message::OpenColorPicker => {
                if let Some(column) = self.focused_column_ref() {
                    self.active_dialog = ActiveDialog::ColorPicker(ColorPickerDialogState::new(
                        column.id.clone(),
                        column.color,
                    ));
                }
            }
            Message::OpenEditTask => {
                if let Some(task) = self.selected_task() {
                    self.active_dialog =
                        ActiveDialog::EditTask(EditTaskDialogState::from_task(task));
                }
            }
            Message::OpenDeleteColumn => self.open_delete_column(),
            Message::DeleteSelectedTask => {
                if let Some(task_id) = self.selected_task().map(|task| task.id.clone()) {
                    self.store.delete_task(&task_id);
                    self.clamp_selection();
                }
            }

            Message::SubmitDialog => self.submit_dialog(),
            Message::DismissDialog => self.active_dialog = ActiveDialog::None,
            Message::PickColumnColor(color) => {
                if let ActiveDialog::ColorPicker(state) = &mut self.active_dialog {
                    state.selected = color.index();
                    self.submit_dialog();
                }
            }
            Message::ToggleLabel(label) => {
                if let ActiveDialog::EditTask(state) = &mut self.active_dialog {
                    state.focused_field = EditTaskField::Labels;
                    state.toggle_label(label);
                }
            }
            Message::FocusEditField(field) => {
                if let ActiveDialog::EditTask(state) = &mut self.active_dialog {
                    state.focused_field = field;
                }
            }
            Message::ClearTaskImage => {
                if let ActiveDialog::EditTask(state) = &mut self.active_dialog {
                    state.image = None;
                    state.image_path_input.clear();
                    state.error = None;
                }
            }
            Message::ConfirmDeleteColumn => {
                if let ActiveDialog::DeleteColumn(state) = &self.active_dialog {
                    let column_id = state.column_id.clone();
                    self.delete_column(&column_id);
                }
                self.active_dialog = ActiveDialog::None;
            }

            Message::MoveTaskUp => self.move_selected_task_vertical(-1),
            Message::MoveTaskDown => self.move_selected_task_vertical(1),
            Message::MoveTaskLeft => self.move_selected_task_horizontal(-1),
            Message::MoveTaskRight => self.move_selected_task_horizontal(1),
            Message::MoveColumnLeft => self.move_focused_column(-1),
            Message::MoveColumnRight => self.move_focused_column(1),
            Message::CancelDrag => self.cancel_drag(),

            Message::ToggleHelp => {
                self.active_dialog = if self.active_dialog == ActiveDialog::Help {
                    ActiveDialog::None
                } else {
                    ActiveDialog::Help
                };
            }
            Message::Quit => self.should_quit = true,
        }

        if let Some(error) = self.store.take_persist_error() {
            self.footer_notice = Some(format!("failed to save board: {error:#}"));
        }
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.store.columns().len()
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.store.columns().get(index)
    }

    pub fn focused_column_ref(&self) -> Option<&Column> {
        self.column_at(self.focused_column)
    }

    pub fn column_tasks(&self, index: usize) -> Vec<&Task> {
        match self.column_at(index) {
            Some(column) => self.store.tasks_in_column(&column.id).collect(),
            None => Vec::new(),
        }
    }

    pub fn selected_index(&self, column: usize) -> usize {
        self.selected_task_per_column
            .get(&column)
            .copied()
            .unwrap_or(0)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.column_tasks(self.focused_column)
            .get(self.selected_index(self.focused_column))
            .copied()
    }

    pub fn focus_column(&mut self, column: usize) {
        if column < self.column_count() {
            self.focused_column = column;
        }
    }

    pub fn select_relative(&mut self, delta: isize) {
        let len = self.column_tasks(self.focused_column).len();
        if len == 0 {
            return;
        }
        let current = self.selected_index(self.focused_column) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.selected_task_per_column
            .insert(self.focused_column, next);
    }

    pub fn focus_relative(&mut self, delta: isize) {
        let count = self.column_count();
        if count == 0 {
            return;
        }
        let next = (self.focused_column as isize + delta).clamp(0, count as isize - 1);
        self.focused_column = next as usize;
    }

    /// Keeps focus and selections within the current board.
    pub fn clamp_selection(&mut self) {
        let count = self.column_count();
        self.focused_column = self.focused_column.min(count.saturating_sub(1));
        for column in 0..count {
            let len = self.column_tasks(column).len();
            if let Some(selected) = self.selected_task_per_column.get_mut(&column) {
                *selected = (*selected).min(len.saturating_sub(1));
            }
        }
        self.selected_task_per_column
            .retain(|column, _| *column < count);
    }

    /// Moves focus and selection onto the given task wherever it now lives.
    pub fn select_task_by_id(&mut self, task_id: &str) {
        let Some(task) = self.store.task(task_id) else {
            return;
        };
        let Some(column) = self.store.state().column_index(&task.column_id) else {
            return;
        };
        let Some(index) = self
            .column_tasks(column)
            .iter()
            .position(|candidate| candidate.id == task_id)
        else {
            return;
        };
        self.focused_column = column;
        self.selected_task_per_column.insert(column, index);
    }

    /// Maps a hit-test message onto the drag target it stands for.
    pub fn drop_target_for(&self, message: &Message) -> Option<DropTarget> {
        match message {
            Message::SelectTask(column, index) => self
                .column_tasks(*column)
                .get(*index)
                .map(|task| DropTarget::Task(task.id.clone())),
            Message::FocusColumn(column) => self
                .column_at(*column)
                .map(|column| DropTarget::Column(column.id.clone())),
            _ => None,
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
        self.pointer = None;
        self.drag_cursor = None;
        self.hovered_drop = None;
    }

    fn open_add_task(&mut self) {
        if let Some(column) = self.focused_column_ref() {
            self.active_dialog = ActiveDialog::TextInput(TextInputDialogState {
                mode: TextInputMode::AddTask {
                    column_id: column.id.clone(),
                },
                input: String::new(),
            });
        }
    }

    fn open_delete_column(&mut self) {
        let Some((column_id, column_title)) = self
            .focused_column_ref()
            .map(|column| (column.id.clone(), column.title.clone()))
        else {
            return;
        };
        if !self.settings.confirm_column_delete {
            self.delete_column(&column_id);
            return;
        }
        self.active_dialog = ActiveDialog::DeleteColumn(DeleteColumnDialogState {
            task_count: self.store.tasks_in_column(&column_id).count(),
            column_id,
            column_title,
            focused_field: DeleteColumnField::Cancel,
        });
    }

    fn delete_column(&mut self, column_id: &str) {
        self.store.delete_column(column_id);
        self.selected_task_per_column.clear();
        self.scroll_offset_per_column.clear();
        self.clamp_selection();
    }

    fn submit_dialog(&mut self) {
        let dialog = std::mem::replace(&mut self.active_dialog, ActiveDialog::None);
        match dialog {
            ActiveDialog::TextInput(state) => match state.mode {
                TextInputMode::AddTask { column_id } => {
                    if let Some(task_id) = self.store.add_task(&column_id, &state.input) {
                        self.select_task_by_id(&task_id);
                    }
                }
                TextInputMode::AddColumn => {
                    if self.store.add_column(&state.input).is_some() {
                        self.focused_column = self.column_count().saturating_sub(1);
                    }
                }
                TextInputMode::RenameColumn { column_id } => {
                    self.store.update_column_title(&column_id, &state.input);
                }
            },
            ActiveDialog::ColorPicker(state) => {
                self.store
                    .update_column_color(&state.column_id, state.selected_color());
            }
            ActiveDialog::EditTask(mut state) => {
                if state.focused_field == EditTaskField::Cancel {
                    return;
                }
                let path = state.image_path_input.trim();
                if !path.is_empty() {
                    match image::data_url_from_path(path) {
                        Ok(data_url) => state.image = Some(data_url),
                        Err(error) => {
                            warn!("failed to attach image: {error:#}");
                            state.error = Some(format!("{error:#}"));
                            state.focused_field = EditTaskField::Image;
                            self.active_dialog = ActiveDialog::EditTask(state);
                            return;
                        }
                    }
                }
                self.store
                    .update_task(&state.task_id, &state.content, state.image, state.tags);
            }
            ActiveDialog::DeleteColumn(state) => {
                if state.focused_field == DeleteColumnField::Delete {
                    self.delete_column(&state.column_id);
                }
            }
            ActiveDialog::Help | ActiveDialog::None => {}
        }
    }

    /// Reorders the selected task inside its column through a full drag
    /// gesture onto its neighbour.
    fn move_selected_task_vertical(&mut self, delta: isize) {
        let column = self.focused_column;
        let tasks = self.column_tasks(column);
        let index = self.selected_index(column);
        let Some(task) = tasks.get(index) else {
            return;
        };
        let target_index = index as isize + delta;
        if target_index < 0 {
            return;
        }
        let Some(neighbour) = tasks.get(target_index as usize) else {
            return;
        };
        let task_id = task.id.clone();
        let target = DropTarget::Task(neighbour.id.clone());

        self.run_keyboard_drag(DragSource::Task(task_id.clone()), target);
        self.select_task_by_id(&task_id);
    }

    fn move_selected_task_horizontal(&mut self, delta: isize) {
        let Some(task_id) = self.selected_task().map(|task| task.id.clone()) else {
            return;
        };
        let target_index = self.focused_column as isize + delta;
        if target_index < 0 {
            return;
        }
        let Some(target) = self.column_at(target_index as usize) else {
            return;
        };
        let target = DropTarget::Column(target.id.clone());

        self.run_keyboard_drag(DragSource::Task(task_id.clone()), target);
        self.select_task_by_id(&task_id);
    }

    fn move_focused_column(&mut self, delta: isize) {
        let Some(column) = self.focused_column_ref() else {
            return;
        };
        let column_id = column.id.clone();
        let target_index = self.focused_column as isize + delta;
        if target_index < 0 {
            return;
        }
        let Some(target) = self.column_at(target_index as usize) else {
            return;
        };
        let target = DropTarget::Column(target.id.clone());

        if self.run_keyboard_drag(DragSource::Column(column_id.clone()), target) {
            self.selected_task_per_column.clear();
            self.scroll_offset_per_column.clear();
            if let Some(index) = self.store.state().column_index(&column_id) {
                self.focused_column = index;
            }
        }
    }

    fn run_keyboard_drag(&mut self, source: DragSource, target: DropTarget) -> bool {
        if !self.drag.on_start(&self.store, &source) {
            return false;
        }
        let moved_over = self.drag.on_over(&mut self.store, Some(&target));
        let moved_end = self.drag.on_end(&mut self.store, Some(&target));
        debug!("keyboard drag {source:?} -> {target:?}");
        moved_over || moved_end
    }
}
