use crossterm::event::{KeyEvent, MouseEvent};

use crate::app::state::EditTaskField;
use crate::types::{ColumnColor, LabelColor};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,

    FocusColumn(usize),
    SelectTask(usize, usize),

    OpenAddTask,
    OpenAddTaskIn(usize),
    OpenAddColumn,
    OpenRenameColumn,
    OpenColorPicker,
    OpenEditTask,
    OpenDeleteColumn,
    DeleteSelectedTask,

    SubmitDialog,
    DismissDialog,
    PickColumnColor(ColumnColor),
    ToggleLabel(LabelColor),
    FocusEditField(EditTaskField),
    ClearTaskImage,
    ConfirmDeleteColumn,

    MoveTaskUp,
    MoveTaskDown,
    MoveTaskLeft,
    MoveTaskRight,
    MoveColumnLeft,
    MoveColumnRight,
    CancelDrag,

    ToggleHelp,
    Quit,
}
