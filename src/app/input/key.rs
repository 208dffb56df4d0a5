use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{
    ActiveDialog, App, COLOR_PICKER_ROW, DeleteColumnField, EditTaskDialogState, EditTaskField,
    Message,
};
use crate::types::LabelColor;

impl App {
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.update(Message::Quit);
        }

        if self.drag.is_dragging() {
            if key.code == KeyCode::Esc {
                return self.update(Message::CancelDrag);
            }
            return Ok(());
        }

        if self.active_dialog != ActiveDialog::None {
            if let Some(message) = self.handle_dialog_key(key) {
                self.update(message)?;
            }
            return Ok(());
        }

        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::ToggleHelp),

            KeyCode::Char('h') | KeyCode::Left => {
                self.focus_relative(-1);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.focus_relative(1);
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.select_relative(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select_relative(-1);
                None
            }

            KeyCode::Char('J') => Some(Message::MoveTaskDown),
            KeyCode::Char('K') => Some(Message::MoveTaskUp),
            KeyCode::Char('H') => Some(Message::MoveTaskLeft),
            KeyCode::Char('L') => Some(Message::MoveTaskRight),
            KeyCode::Char('<') => Some(Message::MoveColumnLeft),
            KeyCode::Char('>') => Some(Message::MoveColumnRight),

            KeyCode::Char('n') => Some(Message::OpenAddTask),
            KeyCode::Char('c') => Some(Message::OpenAddColumn),
            KeyCode::Char('r') => Some(Message::OpenRenameColumn),
            KeyCode::Char('p') => Some(Message::OpenColorPicker),
            KeyCode::Char('e') | KeyCode::Enter => Some(Message::OpenEditTask),
            KeyCode::Char('d') => Some(Message::DeleteSelectedTask),
            KeyCode::Char('x') => Some(Message::OpenDeleteColumn),
            _ => None,
        };

        if let Some(message) = message {
            self.update(message)?;
        }
        Ok(())
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> Option<Message> {
        match &mut self.active_dialog {
            ActiveDialog::None => None,
            ActiveDialog::Help => match key.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Enter => {
                    Some(Message::DismissDialog)
                }
                _ => None,
            },
            ActiveDialog::TextInput(state) => match key.code {
                KeyCode::Esc => Some(Message::DismissDialog),
                KeyCode::Enter => Some(Message::SubmitDialog),
                KeyCode::Backspace => {
                    state.input.pop();
                    None
                }
                KeyCode::Char(ch) if is_plain_char(key.modifiers) => {
                    state.input.push(ch);
                    None
                }
                _ => None,
            },
            ActiveDialog::ColorPicker(state) => {
                let row = COLOR_PICKER_ROW as isize;
                match key.code {
                    KeyCode::Esc => return Some(Message::DismissDialog),
                    KeyCode::Enter | KeyCode::Char(' ') => return Some(Message::SubmitDialog),
                    KeyCode::Left | KeyCode::Char('h') => state.move_by(-1),
                    KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => state.move_by(1),
                    KeyCode::Up | KeyCode::Char('k') => state.move_by(-row),
                    KeyCode::Down | KeyCode::Char('j') => state.move_by(row),
                    KeyCode::BackTab => state.move_by(-1),
                    _ => {}
                }
                None
            }
            ActiveDialog::EditTask(state) => handle_edit_task_key(state, key),
            ActiveDialog::DeleteColumn(state) => match key.code {
                KeyCode::Esc | KeyCode::Char('n') => Some(Message::DismissDialog),
                KeyCode::Char('y') => Some(Message::ConfirmDeleteColumn),
                KeyCode::Enter => Some(Message::SubmitDialog),
                KeyCode::Left
                | KeyCode::Right
                | KeyCode::Tab
                | KeyCode::BackTab
                | KeyCode::Char('h')
                | KeyCode::Char('l') => {
                    state.focused_field = match state.focused_field {
                        DeleteColumnField::Delete => DeleteColumnField::Cancel,
                        DeleteColumnField::Cancel => DeleteColumnField::Delete,
                    };
                    None
                }
                _ => None,
            },
        }
    }
}

fn is_plain_char(modifiers: KeyModifiers) -> bool {
    modifiers.is_empty() || modifiers == KeyModifiers::SHIFT
}

fn handle_edit_task_key(state: &mut EditTaskDialogState, key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Esc => return Some(Message::DismissDialog),
        KeyCode::Tab => {
            state.focused_field = state.focused_field.next();
            return None;
        }
        KeyCode::BackTab => {
            state.focused_field = state.focused_field.prev();
            return None;
        }
        _ => {}
    }

    match state.focused_field {
        EditTaskField::Content => match key.code {
            KeyCode::Enter => return Some(Message::SubmitDialog),
            KeyCode::Backspace => {
                state.content.pop();
            }
            KeyCode::Char(ch) if is_plain_char(key.modifiers) => state.content.push(ch),
            _ => {}
        },
        EditTaskField::Labels => {
            let len = LabelColor::ALL.len();
            match key.code {
                KeyCode::Left | KeyCode::Char('h') => {
                    state.label_cursor = (state.label_cursor + len - 1) % len;
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    state.label_cursor = (state.label_cursor + 1) % len;
                }
                KeyCode::Char(' ') => {
                    let label = LabelColor::ALL[state.label_cursor % len];
                    return Some(Message::ToggleLabel(label));
                }
                KeyCode::Enter => return Some(Message::SubmitDialog),
                _ => {}
            }
        }
        EditTaskField::Image => match key.code {
            KeyCode::Enter => return Some(Message::SubmitDialog),
            KeyCode::Delete => return Some(Message::ClearTaskImage),
            KeyCode::Backspace => {
                state.image_path_input.pop();
                state.error = None;
            }
            KeyCode::Char(ch) if is_plain_char(key.modifiers) => {
                state.image_path_input.push(ch);
                state.error = None;
            }
            _ => {}
        },
        EditTaskField::Save => match key.code {
            KeyCode::Enter => return Some(Message::SubmitDialog),
            KeyCode::Right | KeyCode::Char('l') => state.focused_field = EditTaskField::Cancel,
            _ => {}
        },
        EditTaskField::Cancel => match key.code {
            KeyCode::Enter => return Some(Message::DismissDialog),
            KeyCode::Left | KeyCode::Char('h') => state.focused_field = EditTaskField::Save,
            _ => {}
        },
    }
    None
}
