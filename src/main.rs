use std::{
    io::{self, Write},
    panic,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    style::ResetColor,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use tracing::info;
use tuirealm::terminal::{CrosstermTerminalAdapter, TerminalBridge};

use taskflow::{
    app::{App, BoardStore},
    cli::{self, RootCommand},
    logging::{init_logging, print_log_location},
    realm::BoardRuntime,
    settings::Settings,
    storage::{JsonFileStorage, StateStorage},
    store::Store,
};

#[derive(Parser, Debug)]
#[command(
    name = "taskflow",
    about = "Terminal kanban board with drag-and-drop lists and cards",
    long_about = "A kanban board for the terminal. Run without a command to open the board, or use the subcommands to script it.",
    version = env!("TASKFLOW_BUILD_VERSION"),
    author
)]
struct Cli {
    /// Board record location (overrides TASKFLOW_STORAGE_PATH and settings)
    #[arg(long, global = true, value_name = "PATH")]
    storage: Option<PathBuf>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<RootCommand>,
}

enum RunOutcome {
    Continue,
    Exit(i32),
}

static TERMINAL_RESTORED: AtomicBool = AtomicBool::new(false);

fn main() -> Result<()> {
    let log_path = match init_logging() {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("warning: failed to initialize logging: {err}");
            None
        }
    };
    install_panic_hook(log_path.clone());

    match run_app() {
        Ok(RunOutcome::Continue) => {
            if let Some(path) = log_path.as_ref() {
                print_log_location(path);
            }
            Ok(())
        }
        Ok(RunOutcome::Exit(code)) => std::process::exit(code),
        Err(err) => {
            if let Some(path) = log_path.as_ref() {
                print_log_location(path);
            }
            Err(err)
        }
    }
}

fn run_app() -> Result<RunOutcome> {
    let cli = Cli::parse();
    let settings = Settings::load();
    let storage_path = settings.resolve_storage_path(cli.storage.as_deref())?;
    info!("board record at {}", storage_path.display());

    if let Some(command) = cli.command {
        let code = cli::run(&storage_path, command, cli.json, cli.quiet);
        return Ok(RunOutcome::Exit(code));
    }

    let storage: Box<dyn StateStorage + Send> = Box::new(JsonFileStorage::new(storage_path));
    let store: BoardStore = Store::open(storage);

    let _guard = TerminalGuard;
    let mut terminal = setup_terminal()?;
    let mut runtime = BoardRuntime::new(App::new(store, settings))?;
    runtime.run(&mut terminal)?;

    let _ = execute!(io::stdout(), DisableMouseCapture);
    let _ = terminal.disable_raw_mode();
    let _ = terminal.leave_alternate_screen();
    let _ = terminal.clear_screen();
    TERMINAL_RESTORED.store(true, Ordering::SeqCst);

    Ok(RunOutcome::Continue)
}

fn setup_terminal() -> Result<TerminalBridge<CrosstermTerminalAdapter>> {
    TERMINAL_RESTORED.store(false, Ordering::SeqCst);

    let mut terminal =
        TerminalBridge::new_crossterm().context("failed to initialize terminal bridge")?;

    terminal
        .enable_raw_mode()
        .context("failed to enable raw mode")?;
    terminal
        .enter_alternate_screen()
        .context("failed to enter alternate screen")?;
    execute!(io::stdout(), EnableMouseCapture).context("failed to enable mouse capture")?;

    Ok(terminal)
}

fn install_panic_hook(log_path: Option<PathBuf>) {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        if let Some(path) = log_path.as_ref() {
            eprintln!();
            eprintln!("taskflow crashed; log file: {}", path.display());
            eprintln!();
        }
        previous_hook(panic_info);
    }));
}

fn restore_terminal() -> Result<()> {
    if TERMINAL_RESTORED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let _ = disable_raw_mode();

    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        LeaveAlternateScreen,
        DisableMouseCapture,
        Show,
        ResetColor
    );
    let _ = stdout.flush();

    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "taskflow", "task", "move", "--id", "1", "--over", "2", "--json", "--storage", "/tmp/b.json",
        ])
        .expect("arguments parse");
        assert!(cli.json);
        assert_eq!(cli.storage.as_deref(), Some(std::path::Path::new("/tmp/b.json")));
        assert!(cli.command.is_some());
    }

    #[test]
    fn task_move_requires_a_target() {
        assert!(Cli::try_parse_from(["taskflow", "task", "move", "--id", "1"]).is_err());
        assert!(
            Cli::try_parse_from([
                "taskflow", "task", "move", "--id", "1", "--column", "done", "--over", "2"
            ])
            .is_err()
        );
    }
}
