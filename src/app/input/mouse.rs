use anyhow::Result;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::app::interaction::{InteractionKind, InteractionLayer};
use crate::app::{ActiveDialog, App, Message, PointerPress};
use crate::drag::{DragItem, DragSource, DropTarget};

impl App {
    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.pointer_down(mouse)?,
            MouseEventKind::Drag(MouseButton::Left) => self.pointer_drag(mouse),
            MouseEventKind::Up(MouseButton::Left) => self.pointer_up(mouse),

            MouseEventKind::Down(MouseButton::Right) => {
                if self.active_dialog != ActiveDialog::None {
                    return Ok(());
                }
                if let Some(message @ Message::SelectTask(..)) = self.interaction_map.resolve_message(
                    mouse.column,
                    mouse.row,
                    InteractionKind::RightClick,
                ) {
                    self.update(message)?;
                    self.update(Message::OpenEditTask)?;
                }
            }

            MouseEventKind::ScrollDown => self.handle_scroll(mouse.column, mouse.row, 1),
            MouseEventKind::ScrollUp => self.handle_scroll(mouse.column, mouse.row, -1),

            _ => {}
        }

        Ok(())
    }

    fn pointer_down(&mut self, mouse: MouseEvent) -> Result<()> {
        self.cancel_drag();

        let Some(node) =
            self.interaction_map
                .resolve_node(mouse.column, mouse.row, InteractionKind::LeftClick)
        else {
            return Ok(());
        };
        if self.active_dialog != ActiveDialog::None && node.layer != InteractionLayer::Dialog {
            return Ok(());
        }
        let message = node.message.clone();

        let source = match &message {
            Message::SelectTask(column, index) => self
                .column_tasks(*column)
                .get(*index)
                .map(|task| DragSource::Task(task.id.clone())),
            Message::FocusColumn(column) => self
                .column_at(*column)
                .map(|column| DragSource::Column(column.id.clone())),
            _ => None,
        };
        if self.active_dialog == ActiveDialog::None
            && let Some(source) = source
        {
            self.pointer = Some(PointerPress {
                origin: (mouse.column, mouse.row),
                source,
            });
        }

        self.update(message)
    }

    fn pointer_drag(&mut self, mouse: MouseEvent) {
        let Some(press) = self.pointer.clone() else {
            return;
        };

        if !self.drag.is_dragging() {
            let distance = travel(press.origin, (mouse.column, mouse.row));
            if distance < self.settings.drag_activation_distance {
                return;
            }
            if !self.drag.on_start(&self.store, &press.source) {
                self.pointer = None;
                return;
            }
        }

        self.drag_cursor = Some((mouse.column, mouse.row));
        self.hovered_drop = self.drop_target_at(mouse.column, mouse.row);
        if self
            .drag
            .on_over(&mut self.store, self.hovered_drop.as_ref())
        {
            self.follow_dragged_item();
        }
    }

    fn pointer_up(&mut self, mouse: MouseEvent) {
        self.pointer = None;
        if !self.drag.is_dragging() {
            self.cancel_drag();
            return;
        }

        let target = self
            .drop_target_at(mouse.column, mouse.row)
            .or_else(|| self.hovered_drop.clone());
        let dragged = self.drag.active().cloned();
        let moved = self.drag.on_end(&mut self.store, target.as_ref());
        debug!("drop on {target:?} moved={moved}");

        match dragged {
            Some(DragItem::Task(task)) => self.select_task_by_id(&task.id),
            Some(DragItem::Column(column)) => {
                if moved {
                    self.selected_task_per_column.clear();
                    self.scroll_offset_per_column.clear();
                }
                if let Some(index) = self.store.state().column_index(&column.id) {
                    self.focused_column = index;
                }
            }
            None => {}
        }
        self.cancel_drag();
    }

    fn drop_target_at(&self, col: u16, row: u16) -> Option<DropTarget> {
        let message = self
            .interaction_map
            .resolve_message(col, row, InteractionKind::Drop)?;
        self.drop_target_for(&message)
    }

    fn follow_dragged_item(&mut self) {
        if let Some(DragItem::Task(task)) = self.drag.active() {
            let task_id = task.id.clone();
            self.select_task_by_id(&task_id);
        }
    }

    pub(crate) fn handle_scroll(&mut self, col: u16, row: u16, delta: isize) {
        if self.active_dialog != ActiveDialog::None || self.drag.is_dragging() {
            return;
        }
        let column = match self
            .interaction_map
            .resolve_message(col, row, InteractionKind::Drop)
        {
            Some(Message::SelectTask(column, _)) | Some(Message::FocusColumn(column)) => column,
            _ => return,
        };
        self.focus_column(column);
        self.select_relative(delta);
    }
}

/// Chebyshev distance in terminal cells.
fn travel(from: (u16, u16), to: (u16, u16)) -> u16 {
    from.0.abs_diff(to.0).max(from.1.abs_diff(to.1))
}
