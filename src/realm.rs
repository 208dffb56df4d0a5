use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::event::{
    KeyCode as CrosstermKeyCode, KeyEvent as CrosstermKeyEvent,
    KeyModifiers as CrosstermKeyModifiers, MouseButton as CrosstermMouseButton,
    MouseEvent as CrosstermMouseEvent, MouseEventKind as CrosstermMouseEventKind,
};
use tracing::trace;
use tuirealm::{
    Application, AttrValue, Attribute, Component, Event, EventListenerCfg, Frame, MockComponent,
    NoUserEvent, PollStrategy, Props, State,
    command::{Cmd, CmdResult},
    event::{
        Key as RealmKey, KeyEvent as RealmKeyEvent, KeyModifiers as RealmKeyModifiers,
        MouseButton as RealmMouseButton, MouseEvent as RealmMouseEvent,
        MouseEventKind as RealmMouseEventKind,
    },
    ratatui::layout::Rect,
    terminal::{CrosstermTerminalAdapter, TerminalBridge},
};

use crate::{
    app::{App, Message},
    ui,
};

pub type SharedApp = Arc<Mutex<App>>;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum BoardId {
    Board,
}

/// Drives the board through a tui-realm application with a single mounted
/// component.
pub struct BoardRuntime {
    app: SharedApp,
    application: Application<BoardId, Message, NoUserEvent>,
    needs_redraw: bool,
}

impl BoardRuntime {
    pub fn new(app: App) -> Result<Self> {
        let app = Arc::new(Mutex::new(app));
        let mut application: Application<BoardId, Message, NoUserEvent> = Application::init(
            EventListenerCfg::default()
                .crossterm_input_listener(Duration::from_millis(10), 5)
                .poll_timeout(Duration::from_millis(10))
                .tick_interval(Duration::from_secs(1)),
        );

        application
            .mount(
                BoardId::Board,
                Box::new(BoardComponent::new(Arc::clone(&app))),
                Vec::new(),
            )
            .context("failed to mount board component")?;
        application
            .active(&BoardId::Board)
            .context("failed to activate board component")?;

        Ok(Self {
            app,
            application,
            needs_redraw: true,
        })
    }

    pub fn should_quit(&self) -> Result<bool> {
        Ok(lock_app(&self.app)?.should_quit())
    }

    pub fn draw(&mut self, terminal: &mut TerminalBridge<CrosstermTerminalAdapter>) -> Result<()> {
        if !self.needs_redraw {
            return Ok(());
        }
        terminal
            .draw(|frame| {
                let area = frame.area();
                self.application.view(&BoardId::Board, frame, area);
            })
            .context("failed to render frame")?;
        self.needs_redraw = false;
        Ok(())
    }

    /// Polls input once and applies every resulting message.
    pub fn step(&mut self) -> Result<()> {
        let messages = self
            .application
            .tick(PollStrategy::Once)
            .context("failed to process terminal events")?;

        for message in messages {
            if !matches!(message, Message::Tick) {
                self.needs_redraw = true;
            }
            trace!("message: {message:?}");
            apply_message(&self.app, message)?;
        }
        Ok(())
    }

    pub fn run(&mut self, terminal: &mut TerminalBridge<CrosstermTerminalAdapter>) -> Result<()> {
        while !self.should_quit()? {
            self.draw(terminal)?;
            self.step()?;
        }
        Ok(())
    }
}

pub fn apply_message(shared_app: &SharedApp, message: Message) -> Result<()> {
    let mut app = lock_app(shared_app)?;
    app.update(message)
}

fn lock_app(shared_app: &SharedApp) -> Result<MutexGuard<'_, App>> {
    shared_app
        .lock()
        .map_err(|_| anyhow!("failed to lock board state"))
}

struct BoardComponent {
    props: Props,
    app: SharedApp,
}

impl BoardComponent {
    fn new(app: SharedApp) -> Self {
        Self {
            props: Props::default(),
            app,
        }
    }
}

impl MockComponent for BoardComponent {
    fn view(&mut self, frame: &mut Frame, _area: Rect) {
        if let Ok(mut app) = self.app.lock() {
            ui::render(frame, &mut app);
        }
    }

    fn query(&self, attr: Attribute) -> Option<AttrValue> {
        self.props.get(attr)
    }

    fn attr(&mut self, attr: Attribute, value: AttrValue) {
        self.props.set(attr, value);
    }

    fn state(&self) -> State {
        State::None
    }

    fn perform(&mut self, _cmd: Cmd) -> CmdResult {
        CmdResult::None
    }
}

impl Component<Message, NoUserEvent> for BoardComponent {
    fn on(&mut self, ev: Event<NoUserEvent>) -> Option<Message> {
        match ev {
            Event::Keyboard(key) => Some(Message::Key(convert_key_event(key))),
            Event::Mouse(mouse) => convert_mouse_event(mouse).map(Message::Mouse),
            Event::WindowResize(width, height) => Some(Message::Resize(width, height)),
            Event::Tick => Some(Message::Tick),
            _ => None,
        }
    }
}

fn convert_key_event(key: RealmKeyEvent) -> CrosstermKeyEvent {
    let modifiers = convert_key_modifiers(key.modifiers);
    let code = match key.code {
        RealmKey::Backspace => CrosstermKeyCode::Backspace,
        RealmKey::Enter => CrosstermKeyCode::Enter,
        RealmKey::Left => CrosstermKeyCode::Left,
        RealmKey::Right => CrosstermKeyCode::Right,
        RealmKey::Up => CrosstermKeyCode::Up,
        RealmKey::Down => CrosstermKeyCode::Down,
        RealmKey::Home => CrosstermKeyCode::Home,
        RealmKey::End => CrosstermKeyCode::End,
        RealmKey::PageUp => CrosstermKeyCode::PageUp,
        RealmKey::PageDown => CrosstermKeyCode::PageDown,
        RealmKey::Tab => CrosstermKeyCode::Tab,
        RealmKey::BackTab => CrosstermKeyCode::BackTab,
        RealmKey::Delete => CrosstermKeyCode::Delete,
        RealmKey::Char(ch) => CrosstermKeyCode::Char(ch),
        RealmKey::Esc => CrosstermKeyCode::Esc,
        _ => CrosstermKeyCode::Null,
    };
    CrosstermKeyEvent::new(code, modifiers)
}

fn convert_key_modifiers(modifiers: RealmKeyModifiers) -> CrosstermKeyModifiers {
    let mut converted = CrosstermKeyModifiers::empty();
    if modifiers.contains(RealmKeyModifiers::SHIFT) {
        converted.insert(CrosstermKeyModifiers::SHIFT);
    }
    if modifiers.contains(RealmKeyModifiers::CONTROL) {
        converted.insert(CrosstermKeyModifiers::CONTROL);
    }
    if modifiers.contains(RealmKeyModifiers::ALT) {
        converted.insert(CrosstermKeyModifiers::ALT);
    }
    converted
}

/// Horizontal wheel events have no meaning on the board and are dropped.
fn convert_mouse_event(mouse: RealmMouseEvent) -> Option<CrosstermMouseEvent> {
    let kind = match mouse.kind {
        RealmMouseEventKind::Down(button) => CrosstermMouseEventKind::Down(convert_button(button)),
        RealmMouseEventKind::Up(button) => CrosstermMouseEventKind::Up(convert_button(button)),
        RealmMouseEventKind::Drag(button) => CrosstermMouseEventKind::Drag(convert_button(button)),
        RealmMouseEventKind::Moved => CrosstermMouseEventKind::Moved,
        RealmMouseEventKind::ScrollDown => CrosstermMouseEventKind::ScrollDown,
        RealmMouseEventKind::ScrollUp => CrosstermMouseEventKind::ScrollUp,
        RealmMouseEventKind::ScrollLeft | RealmMouseEventKind::ScrollRight => return None,
    };
    Some(CrosstermMouseEvent {
        kind,
        column: mouse.column,
        row: mouse.row,
        modifiers: convert_key_modifiers(mouse.modifiers),
    })
}

fn convert_button(button: RealmMouseButton) -> CrosstermMouseButton {
    match button {
        RealmMouseButton::Left => CrosstermMouseButton::Left,
        RealmMouseButton::Right => CrosstermMouseButton::Right,
        RealmMouseButton::Middle => CrosstermMouseButton::Middle,
    }
}
