use tuirealm::ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::app::interaction::InteractionLayer;
use crate::app::{
    ActiveDialog, App, COLOR_PICKER_ROW, DeleteColumnField, EditTaskField, Message,
};
use crate::drag::{DragItem, DropTarget};
use crate::image;
use crate::theme::{Theme, column_color, label_color};
use crate::types::{ColumnColor, LabelColor, Task};

const COLUMN_WIDTH: u16 = 30;
const ADD_LIST_WIDTH: u16 = 18;
const CARD_HEIGHT: u16 = 4;

pub fn render(frame: &mut Frame<'_>, app: &mut App) {
    app.interaction_map.clear();
    let area = frame.area();
    app.viewport = (area.width, area.height);

    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.canvas)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_board(frame, chunks[1], app);
    render_footer(frame, chunks[2], app);
    render_drag_overlay(frame, app);

    if app.active_dialog != ActiveDialog::None {
        render_dialog(frame, app);
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let theme = app.theme;
    let line = Line::from(vec![
        Span::styled(
            " TaskFlow ",
            Style::default().fg(theme.focus).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " {} lists · {} tasks ",
                app.store.columns().len(),
                app.store.tasks().len()
            ),
            Style::default().fg(theme.text_muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let notice = if app.drag.is_dragging() {
        "drag to a list or card · release to drop · Esc: cancel"
    } else {
        app.footer_notice.as_deref().unwrap_or(
            "n: new task  e: edit  d: delete  J/K H/L: move task  </>: move list  c/r/p/x: list  ?: help  q: quit",
        )
    };
    frame.render_widget(
        Paragraph::new(notice)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.text_muted)),
        area,
    );
}

/// First column index to draw so the focused column stays on screen.
fn first_visible_column(focused: usize, count: usize, visible: usize) -> usize {
    if visible == 0 || count <= visible {
        return 0;
    }
    let max_start = count - visible;
    focused.saturating_sub(visible - 1).min(max_start)
}

fn render_board(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let count = app.column_count();
    let slot = COLUMN_WIDTH + 1;
    let visible = (area.width.saturating_sub(ADD_LIST_WIDTH) / slot).max(1) as usize;
    let start = first_visible_column(app.focused_column, count, visible);

    let mut x = area.x;
    for index in start..count.min(start + visible) {
        let width = COLUMN_WIDTH.min(area.right().saturating_sub(x));
        if width < 8 {
            break;
        }
        render_column(frame, Rect::new(x, area.y, width, area.height), app, index);
        x = x.saturating_add(slot);
    }

    let remaining = area.right().saturating_sub(x);
    if remaining >= 6 {
        let add_area = Rect::new(x, area.y, remaining.min(ADD_LIST_WIDTH), 3.min(area.height));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(app.theme.border));
        frame.render_widget(
            Paragraph::new("+ Add list")
                .alignment(Alignment::Center)
                .style(Style::default().fg(app.theme.text_muted))
                .block(block),
            add_area,
        );
        app.interaction_map
            .register_click(InteractionLayer::Base, add_area, Message::OpenAddColumn);
    }
}

fn render_column(frame: &mut Frame<'_>, area: Rect, app: &mut App, index: usize) {
    let theme = app.theme;
    let Some(column) = app.column_at(index).cloned() else {
        return;
    };
    let tasks: Vec<Task> = app.column_tasks(index).into_iter().cloned().collect();
    let is_focused = index == app.focused_column;
    let accent = column_color(column.color);
    let dragged_id = app.drag.active().map(|item| item.id().to_string());
    let is_drop_target = matches!(
        &app.hovered_drop,
        Some(DropTarget::Column(id)) if *id == column.id
    );
    let column_dragged = matches!(app.drag.active(), Some(DragItem::Column(c)) if c.id == column.id);

    let border_style = if is_drop_target {
        Style::default().fg(theme.drop_target)
    } else if column_dragged {
        Style::default().fg(theme.text_muted)
    } else {
        Style::default().fg(accent)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if is_focused {
            BorderType::Double
        } else {
            BorderType::Rounded
        })
        .border_style(border_style)
        .title(Line::from(vec![
            Span::styled("● ", Style::default().fg(accent)),
            Span::styled(
                column.title.clone(),
                Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} ", tasks.len()),
                Style::default().fg(theme.text_muted),
            ),
        ]));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.interaction_map
        .register_drop_zone(InteractionLayer::Base, area, Message::FocusColumn(index));

    if inner.height == 0 {
        return;
    }
    let cards_height = inner.height.saturating_sub(1);
    let visible_cards = (cards_height / CARD_HEIGHT).max(1) as usize;
    let selected = app.selected_index(index);
    let offset = clamp_scroll(
        app.scroll_offset_per_column.get(&index).copied().unwrap_or(0),
        selected,
        visible_cards,
        tasks.len(),
    );
    app.scroll_offset_per_column.insert(index, offset);

    let mut y = inner.y;
    for (task_index, task) in tasks.iter().enumerate().skip(offset) {
        if y + CARD_HEIGHT > inner.y + cards_height {
            break;
        }
        let card_area = Rect::new(inner.x, y, inner.width, CARD_HEIGHT);
        let is_selected = is_focused && selected == task_index;
        let is_dragged = dragged_id.as_deref() == Some(task.id.as_str());
        render_card(frame, card_area, &theme, task, is_selected, is_dragged);
        app.interaction_map.register_task(
            InteractionLayer::Base,
            card_area,
            Message::SelectTask(index, task_index),
        );
        y += CARD_HEIGHT;
    }

    if tasks.is_empty() && cards_height > 0 {
        frame.render_widget(
            Paragraph::new("Drop tasks here")
                .alignment(Alignment::Center)
                .style(Style::default().fg(theme.text_muted)),
            Rect::new(inner.x, inner.y + cards_height / 2, inner.width, 1),
        );
    }

    let add_area = Rect::new(inner.x, inner.bottom().saturating_sub(1), inner.width, 1);
    frame.render_widget(
        Paragraph::new("+ Add task").style(Style::default().fg(theme.text_muted)),
        add_area,
    );
    app.interaction_map
        .register_click(InteractionLayer::Base, add_area, Message::OpenAddTaskIn(index));
}

fn clamp_scroll(offset: usize, selected: usize, visible: usize, len: usize) -> usize {
    let mut offset = offset.min(len.saturating_sub(visible));
    if selected < offset {
        offset = selected;
    } else if selected >= offset + visible {
        offset = selected + 1 - visible;
    }
    offset
}

fn render_card(
    frame: &mut Frame<'_>,
    area: Rect,
    theme: &Theme,
    task: &Task,
    is_selected: bool,
    is_dragged: bool,
) {
    let border = if is_dragged {
        theme.drop_target
    } else if is_selected {
        theme.focus
    } else {
        theme.border
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if is_dragged {
            BorderType::Thick
        } else {
            BorderType::Rounded
        })
        .border_style(Style::default().fg(border))
        .style(if is_selected {
            Style::default().bg(theme.selected_bg)
        } else {
            Style::default()
        });

    let text_style = if is_dragged {
        Style::default().fg(theme.text_muted)
    } else {
        Style::default().fg(theme.text)
    };
    let lines = vec![
        Line::from(Span::styled(task.content.clone(), text_style)),
        meta_line(theme, task),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn meta_line(theme: &Theme, task: &Task) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = task
        .tags
        .iter()
        .map(|tag| Span::styled("▬ ", Style::default().fg(label_color(*tag))))
        .collect();
    if let Some(data_url) = &task.image {
        let label = image::describe(data_url)
            .map(|summary| summary.label())
            .unwrap_or_else(|| "image".to_string());
        spans.push(Span::styled(
            format!("▣ {label}"),
            Style::default().fg(theme.text_muted),
        ));
    }
    Line::from(spans)
}

fn render_drag_overlay(frame: &mut Frame<'_>, app: &App) {
    let (Some(item), Some((col, row))) = (app.drag.active(), app.drag_cursor) else {
        return;
    };
    let (label, accent) = match item {
        DragItem::Task(task) => (task.content.clone(), app.theme.drop_target),
        DragItem::Column(column) => (column.title.clone(), column_color(column.color)),
    };
    let area = frame.area();
    let width = overlay_width(&label, area.width);
    let x = col.min(area.right().saturating_sub(width));
    let y = row.min(area.bottom().saturating_sub(3));
    let overlay = Rect::new(x, y, width, 3.min(area.height));

    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(label).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(accent)),
        ),
        overlay,
    );
}

fn overlay_width(label: &str, available: u16) -> u16 {
    u16::try_from(label.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(4)
        .min(COLUMN_WIDTH)
        .min(available)
}

fn render_dialog(frame: &mut Frame<'_>, app: &mut App) {
    let screen = frame.area();
    // Clicks outside the dialog dismiss it.
    app.interaction_map
        .register_click(InteractionLayer::Dialog, screen, Message::DismissDialog);

    let (percent_x, percent_y) = match &app.active_dialog {
        ActiveDialog::Help => (60, 70),
        ActiveDialog::EditTask(_) => (60, 70),
        ActiveDialog::ColorPicker(_) => (50, 40),
        ActiveDialog::DeleteColumn(_) => (50, 35),
        _ => (50, 25),
    };
    let area = centered_rect(percent_x, percent_y, screen);
    frame.render_widget(Clear, area);
    app.interaction_map
        .register_click(InteractionLayer::Dialog, area, Message::Tick);

    let title = match &app.active_dialog {
        ActiveDialog::TextInput(state) => state.title(),
        ActiveDialog::ColorPicker(_) => " List Color ",
        ActiveDialog::EditTask(_) => " Edit Task ",
        ActiveDialog::DeleteColumn(_) => " Delete List ",
        ActiveDialog::Help => " Help ",
        ActiveDialog::None => "",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(app.theme.focus))
        .title(title)
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.canvas));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let dialog = app.active_dialog.clone();
    match &dialog {
        ActiveDialog::TextInput(state) => {
            let rows = dialog_rows(inner, &[Constraint::Length(3), Constraint::Min(0)]);
            let value = if state.input.is_empty() {
                Span::styled(state.placeholder(), Style::default().fg(app.theme.text_muted))
            } else {
                Span::raw(format!("{}▏", state.input))
            };
            render_input_field(frame, rows[0], "", Line::from(value), true, &app.theme);
            render_hint(frame, rows[1], app, "Enter: save · Esc: cancel");
        }
        ActiveDialog::ColorPicker(state) => {
            render_color_picker(frame, inner, app, state.current, state.selected);
        }
        ActiveDialog::EditTask(state) => render_edit_task(frame, inner, app, state),
        ActiveDialog::DeleteColumn(state) => {
            let rows = dialog_rows(inner, &[Constraint::Min(2), Constraint::Length(3)]);
            let message = format!(
                "Delete list \"{}\" and its {} task(s)? This cannot be undone.",
                state.column_title, state.task_count
            );
            frame.render_widget(
                Paragraph::new(message)
                    .wrap(Wrap { trim: true })
                    .style(Style::default().fg(app.theme.text)),
                rows[0],
            );
            let buttons = split_buttons(rows[1]);
            render_button(
                frame,
                buttons[0],
                "Delete",
                state.focused_field == DeleteColumnField::Delete,
                app.theme.danger,
            );
            render_button(
                frame,
                buttons[1],
                "Cancel",
                state.focused_field == DeleteColumnField::Cancel,
                app.theme.focus,
            );
            app.interaction_map.register_click(
                InteractionLayer::Dialog,
                buttons[0],
                Message::ConfirmDeleteColumn,
            );
            app.interaction_map.register_click(
                InteractionLayer::Dialog,
                buttons[1],
                Message::DismissDialog,
            );
        }
        ActiveDialog::Help => render_help(frame, inner),
        ActiveDialog::None => {}
    }
}

fn render_color_picker(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &mut App,
    current: ColumnColor,
    selected: usize,
) {
    let rows = ColumnColor::ALL.len().div_ceil(COLOR_PICKER_ROW);
    let swatch_width = (area.width / COLOR_PICKER_ROW as u16).max(3);
    for (index, color) in ColumnColor::ALL.into_iter().enumerate() {
        let row = (index / COLOR_PICKER_ROW) as u16;
        let col = (index % COLOR_PICKER_ROW) as u16;
        let rect = Rect::new(
            area.x + col * swatch_width,
            area.y + row * 3,
            swatch_width.min(area.width),
            3,
        )
        .intersection(area);
        if rect.is_empty() {
            continue;
        }
        let marker = if color == current { "✓" } else { " " };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if index == selected {
                BorderType::Double
            } else {
                BorderType::Plain
            })
            .border_style(Style::default().fg(if index == selected {
                app.theme.text
            } else {
                app.theme.border
            }));
        frame.render_widget(
            Paragraph::new(marker)
                .alignment(Alignment::Center)
                .style(Style::default().bg(column_color(color)).fg(Color::White))
                .block(block),
            rect,
        );
        app.interaction_map.register_click(
            InteractionLayer::Dialog,
            rect,
            Message::PickColumnColor(color),
        );
    }

    let hint_y = area.y + rows as u16 * 3;
    if hint_y < area.bottom() {
        let label = ColumnColor::ALL[selected % ColumnColor::ALL.len()].as_str();
        render_hint(
            frame,
            Rect::new(area.x, hint_y, area.width, area.bottom() - hint_y),
            app,
            &format!("{label} · arrows: choose · Enter: apply · Esc: cancel"),
        );
    }
}

fn render_edit_task(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &mut App,
    state: &crate::app::EditTaskDialogState,
) {
    let theme = app.theme;
    let rows = dialog_rows(
        area,
        &[
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ],
    );

    let content = Line::from(Span::raw(if state.focused_field == EditTaskField::Content {
        format!("{}▏", state.content)
    } else {
        state.content.clone()
    }));
    render_input_field(
        frame,
        rows[0],
        " Content ",
        content,
        state.focused_field == EditTaskField::Content,
        &theme,
    );
    app.interaction_map.register_click(
        InteractionLayer::Dialog,
        rows[0],
        Message::FocusEditField(EditTaskField::Content),
    );

    let labels_block = field_block(" Labels ", state.focused_field == EditTaskField::Labels, &theme);
    let labels_inner = labels_block.inner(rows[1]);
    frame.render_widget(labels_block, rows[1]);
    let chip_width = (labels_inner.width / LabelColor::ALL.len() as u16).max(3);
    for (index, label) in LabelColor::ALL.into_iter().enumerate() {
        let rect = Rect::new(
            labels_inner.x + index as u16 * chip_width,
            labels_inner.y,
            chip_width,
            1,
        )
        .intersection(labels_inner);
        if rect.is_empty() {
            continue;
        }
        let active = state.tags.contains(&label);
        let under_cursor =
            state.focused_field == EditTaskField::Labels && state.label_cursor == index;
        let mut style = Style::default().fg(label_color(label));
        if under_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let chip = if active { "■ " } else { "□ " };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(chip, style),
                Span::styled(label.as_str(), style),
            ])),
            rect,
        );
        app.interaction_map.register_click(
            InteractionLayer::Dialog,
            rect,
            Message::ToggleLabel(label),
        );
    }

    let image_line = if !state.image_path_input.is_empty() {
        Line::from(Span::raw(format!("{}▏", state.image_path_input)))
    } else if let Some(data_url) = &state.image {
        let label = image::describe(data_url)
            .map(|summary| summary.label())
            .unwrap_or_else(|| "unreadable image".to_string());
        Line::from(vec![
            Span::styled(format!("▣ {label}"), Style::default().fg(theme.text)),
            Span::styled("  Del: remove", Style::default().fg(theme.text_muted)),
        ])
    } else {
        Line::from(Span::styled(
            "path to an image file",
            Style::default().fg(theme.text_muted),
        ))
    };
    render_input_field(
        frame,
        rows[2],
        " Image ",
        image_line,
        state.focused_field == EditTaskField::Image,
        &theme,
    );
    app.interaction_map.register_click(
        InteractionLayer::Dialog,
        rows[2],
        Message::FocusEditField(EditTaskField::Image),
    );

    let buttons = split_buttons(rows[3]);
    render_button(
        frame,
        buttons[0],
        "Save",
        state.focused_field == EditTaskField::Save,
        theme.focus,
    );
    render_button(
        frame,
        buttons[1],
        "Cancel",
        state.focused_field == EditTaskField::Cancel,
        theme.focus,
    );
    app.interaction_map
        .register_click(InteractionLayer::Dialog, buttons[0], Message::SubmitDialog);
    app.interaction_map
        .register_click(InteractionLayer::Dialog, buttons[1], Message::DismissDialog);

    if let Some(error) = &state.error {
        frame.render_widget(
            Paragraph::new(error.as_str())
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(theme.danger)),
            rows[4],
        );
    } else {
        render_hint(frame, rows[4], app, "Tab: next field · Space: toggle label · Enter: save");
    }
}

fn render_help(frame: &mut Frame<'_>, area: Rect) {
    let text = [
        "Navigation",
        "  h/l or arrows: switch lists",
        "  j/k or arrows: select task",
        "Tasks",
        "  n: new task in focused list",
        "  e or Enter: edit content, labels and image",
        "  d: delete selected task",
        "  J/K: move task within its list",
        "  H/L: move task to neighbouring list",
        "Lists",
        "  c: add list",
        "  r: rename list",
        "  p: pick list color",
        "  x: delete list and its tasks",
        "  </>: move focused list",
        "Mouse",
        "  click: focus list or task",
        "  drag: move tasks and lists",
        "  right click: edit task",
        "General",
        "  ?: toggle help",
        "  Esc: dismiss",
        "  q: quit",
    ]
    .join("\n");

    frame.render_widget(Paragraph::new(text), area);
}

fn dialog_rows(area: Rect, constraints: &[Constraint]) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints.to_vec())
        .split(area)
}

fn split_buttons(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn field_block(label: &str, is_focused: bool, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(label.to_string())
        .border_style(Style::default().fg(if is_focused {
            theme.focus
        } else {
            theme.border
        }))
}

fn render_input_field(
    frame: &mut Frame<'_>,
    area: Rect,
    label: &str,
    value: Line<'_>,
    is_focused: bool,
    theme: &Theme,
) {
    frame.render_widget(
        Paragraph::new(value)
            .wrap(Wrap { trim: false })
            .block(field_block(label, is_focused, theme)),
        area,
    );
}

fn render_button(frame: &mut Frame<'_>, area: Rect, label: &str, is_focused: bool, accent: Color) {
    let (bg, fg) = if is_focused {
        (accent, Color::White)
    } else {
        (Color::Reset, Color::Reset)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if is_focused {
            Style::default().fg(accent)
        } else {
            Style::default().fg(Color::Gray)
        })
        .style(Style::default().bg(bg).fg(fg));
    frame.render_widget(
        Paragraph::new(label)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn render_hint(frame: &mut Frame<'_>, area: Rect, app: &App, hint: &str) {
    if area.height == 0 {
        return;
    }
    frame.render_widget(
        Paragraph::new(hint.to_string())
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.text_muted)),
        Rect::new(area.x, area.bottom() - 1, area.width, 1),
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
