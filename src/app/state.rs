//! Dialog state for the board.

use crate::types::{ColumnColor, LabelColor, Task};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ActiveDialog {
    None,
    TextInput(TextInputDialogState),
    ColorPicker(ColorPickerDialogState),
    EditTask(EditTaskDialogState),
    DeleteColumn(DeleteColumnDialogState),
    Help,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TextInputMode {
    AddTask { column_id: String },
    AddColumn,
    RenameColumn { column_id: String },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TextInputDialogState {
    pub mode: TextInputMode,
    pub input: String,
}

impl TextInputDialogState {
    pub fn title(&self) -> &'static str {
        match self.mode {
            TextInputMode::AddTask { .. } => " New Task ",
            TextInputMode::AddColumn => " New List ",
            TextInputMode::RenameColumn { .. } => " Rename List ",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self.mode {
            TextInputMode::AddTask { .. } => "Describe the task...",
            TextInputMode::AddColumn => "e.g. Backlog, Review...",
            TextInputMode::RenameColumn { .. } => "List title",
        }
    }
}

/// Swatches per row in the color picker grid.
pub const COLOR_PICKER_ROW: usize = 8;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ColorPickerDialogState {
    pub column_id: String,
    pub current: ColumnColor,
    pub selected: usize,
}

impl ColorPickerDialogState {
    pub fn new(column_id: String, current: ColumnColor) -> Self {
        Self {
            column_id,
            current,
            selected: current.index(),
        }
    }

    pub fn selected_color(&self) -> ColumnColor {
        ColumnColor::ALL[self.selected % ColumnColor::ALL.len()]
    }

    pub fn move_by(&mut self, delta: isize) {
        let len = ColumnColor::ALL.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EditTaskField {
    Content,
    Labels,
    Image,
    Save,
    Cancel,
}

impl EditTaskField {
    const ORDER: [EditTaskField; 5] = [
        EditTaskField::Content,
        EditTaskField::Labels,
        EditTaskField::Image,
        EditTaskField::Save,
        EditTaskField::Cancel,
    ];

    pub fn next(self) -> Self {
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(index + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(index + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EditTaskDialogState {
    pub task_id: String,
    pub content: String,
    /// Payload kept unless replaced through `image_path_input` or removed.
    pub image: Option<String>,
    pub image_path_input: String,
    pub tags: Vec<LabelColor>,
    pub label_cursor: usize,
    pub focused_field: EditTaskField,
    pub error: Option<String>,
}

impl EditTaskDialogState {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            content: task.content.clone(),
            image: task.image.clone(),
            image_path_input: String::new(),
            tags: task.tags.clone(),
            label_cursor: 0,
            focused_field: EditTaskField::Content,
            error: None,
        }
    }

    pub fn toggle_label(&mut self, label: LabelColor) {
        if let Some(index) = self.tags.iter().position(|tag| *tag == label) {
            self.tags.remove(index);
        } else {
            self.tags.push(label);
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DeleteColumnField {
    Delete,
    Cancel,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeleteColumnDialogState {
    pub column_id: String,
    pub column_title: String,
    pub task_count: usize,
    pub focused_field: DeleteColumnField,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_picker_wraps() {
        let mut picker = ColorPickerDialogState::new("todo".to_string(), ColumnColor::Neutral);
        picker.move_by(-1);
        assert_eq!(picker.selected_color(), ColumnColor::Rose);
        picker.move_by(COLOR_PICKER_ROW as isize);
        assert_eq!(picker.selected_color(), ColumnColor::Cyan);
    }

    #[test]
    fn test_edit_field_cycle() {
        assert_eq!(EditTaskField::Cancel.next(), EditTaskField::Content);
        assert_eq!(EditTaskField::Content.prev(), EditTaskField::Cancel);
        assert_eq!(EditTaskField::Labels.next(), EditTaskField::Image);
    }

    #[test]
    fn test_toggle_label() {
        let task = Task {
            id: "t".to_string(),
            column_id: "todo".to_string(),
            content: "x".to_string(),
            image: None,
            tags: vec![LabelColor::Red],
        };
        let mut state = EditTaskDialogState::from_task(&task);
        state.toggle_label(LabelColor::Red);
        state.toggle_label(LabelColor::Blue);
        assert_eq!(state.tags, vec![LabelColor::Blue]);
    }
}
