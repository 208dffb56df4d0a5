use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::{
    drag::{DragController, DragSource, DropTarget},
    image,
    storage::{JsonFileStorage, StateStorage},
    store::Store,
    types::{BoardState, Column, ColumnColor, LabelColor, Task},
};

const SCHEMA_VERSION: &str = "cli.v1";

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    /// Print every list with its tasks
    Board,
    Column {
        #[command(subcommand)]
        command: ColumnCommand,
    },
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ColumnCommand {
    List,
    Add(ColumnAddArgs),
    Rename(ColumnRenameArgs),
    Color(ColumnColorArgs),
    Move(ColumnMoveArgs),
    Delete(ColumnDeleteArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    List(TaskListArgs),
    Add(TaskAddArgs),
    Edit(TaskEditArgs),
    Delete(TaskDeleteArgs),
    Move(TaskMoveArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ColumnAddArgs {
    #[arg(long, value_name = "TEXT")]
    pub title: String,

    /// Palette color; random when omitted
    #[arg(long, value_name = "COLOR")]
    pub color: Option<ColumnColor>,
}

#[derive(Debug, Clone, Args)]
pub struct ColumnRenameArgs {
    #[arg(long, value_name = "COLUMN_ID")]
    pub id: String,

    #[arg(long, value_name = "TEXT")]
    pub title: String,
}

#[derive(Debug, Clone, Args)]
pub struct ColumnColorArgs {
    #[arg(long, value_name = "COLUMN_ID")]
    pub id: String,

    #[arg(long, value_name = "COLOR")]
    pub color: ColumnColor,
}

#[derive(Debug, Clone, Args)]
pub struct ColumnMoveArgs {
    #[arg(long, value_name = "COLUMN_ID")]
    pub id: String,

    /// Zero-based destination index
    #[arg(long, value_name = "INDEX")]
    pub to: usize,
}

#[derive(Debug, Clone, Args)]
pub struct ColumnDeleteArgs {
    #[arg(long, value_name = "COLUMN_ID")]
    pub id: String,

    /// Confirm deleting the list together with its tasks
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TaskListArgs {
    #[arg(long, value_name = "COLUMN_ID")]
    pub column: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskAddArgs {
    #[arg(long, value_name = "COLUMN_ID")]
    pub column: String,

    #[arg(long, value_name = "TEXT")]
    pub text: String,
}

#[derive(Debug, Clone, Args)]
pub struct TaskEditArgs {
    #[arg(long, value_name = "TASK_ID")]
    pub id: String,

    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Attach an image file, replacing any current one
    #[arg(long, value_name = "PATH", conflicts_with = "clear_image")]
    pub image: Option<PathBuf>,

    #[arg(long)]
    pub clear_image: bool,

    /// Label color; repeat for several. Replaces the current labels.
    #[arg(long = "tag", value_name = "COLOR")]
    pub tags: Vec<LabelColor>,

    #[arg(long)]
    pub clear_tags: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TaskDeleteArgs {
    #[arg(long, value_name = "TASK_ID")]
    pub id: String,
}

#[derive(Debug, Clone, Args)]
#[group(id = "move_target", required = true, multiple = false)]
pub struct MoveTargetArgs {
    /// Drop onto a list
    #[arg(long, value_name = "COLUMN_ID", group = "move_target")]
    pub column: Option<String>,

    /// Drop onto another task, taking its place
    #[arg(long, value_name = "TASK_ID", group = "move_target")]
    pub over: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskMoveArgs {
    #[arg(long, value_name = "TASK_ID")]
    pub id: String,

    #[command(flatten)]
    pub target: MoveTargetArgs,
}

pub fn run(storage_path: &Path, command: RootCommand, json_output: bool, quiet: bool) -> i32 {
    let result = open_store(storage_path).and_then(|mut store| {
        let output = execute(&mut store, command)?;
        if let Some(err) = store.take_persist_error() {
            return Err(runtime_error("SAVE_FAILED", format!("{err:#}")));
        }
        Ok(output)
    });

    match result {
        Ok(output) => {
            print_success(output, json_output, quiet);
            0
        }
        Err(err) => {
            print_error(&err, json_output);
            err.exit_code
        }
    }
}

#[derive(Debug)]
struct CommandOutput {
    command: &'static str,
    data: Value,
    text: String,
}

#[derive(Debug)]
struct CliError {
    exit_code: i32,
    code: &'static str,
    message: String,
}

type CliResult<T> = Result<T, CliError>;

fn open_store(path: &Path) -> CliResult<Store<JsonFileStorage>> {
    let storage = JsonFileStorage::new(path);
    let loaded = storage
        .load()
        .map_err(|err| runtime_error("LOAD_FAILED", format!("{err:#}")))?;
    if let Some(state) = loaded {
        return Ok(Store::with_state(state, storage));
    }
    // A record from another version is replaced by the default board.
    if let Some(backup) = storage
        .preserve_unreadable()
        .map_err(|err| runtime_error("LOAD_FAILED", format!("{err:#}")))?
    {
        info!("kept board record from another version at {}", backup.display());
    }
    Ok(Store::with_state(BoardState::default(), storage))
}

fn execute<S: StateStorage>(store: &mut Store<S>, command: RootCommand) -> CliResult<CommandOutput> {
    match command {
        RootCommand::Board => Ok(board(store)),
        RootCommand::Column { command } => execute_column_command(store, command),
        RootCommand::Task { command } => execute_task_command(store, command),
    }
}

fn execute_column_command<S: StateStorage>(
    store: &mut Store<S>,
    command: ColumnCommand,
) -> CliResult<CommandOutput> {
    match command {
        ColumnCommand::List => Ok(column_list(store)),
        ColumnCommand::Add(args) => column_add(store, args),
        ColumnCommand::Rename(args) => column_rename(store, args),
        ColumnCommand::Color(args) => column_color(store, args),
        ColumnCommand::Move(args) => column_move(store, args),
        ColumnCommand::Delete(args) => column_delete(store, args),
    }
}

fn execute_task_command<S: StateStorage>(
    store: &mut Store<S>,
    command: TaskCommand,
) -> CliResult<CommandOutput> {
    match command {
        TaskCommand::List(args) => task_list(store, args),
        TaskCommand::Add(args) => task_add(store, args),
        TaskCommand::Edit(args) => task_edit(store, args),
        TaskCommand::Delete(args) => task_delete(store, args),
        TaskCommand::Move(args) => task_move(store, args),
    }
}

fn board<S: StateStorage>(store: &Store<S>) -> CommandOutput {
    let columns = store
        .columns()
        .iter()
        .map(|column| {
            let mut value = column_json(store, column);
            value["tasks"] = Value::Array(
                store
                    .tasks_in_column(&column.id)
                    .map(task_json)
                    .collect(),
            );
            value
        })
        .collect::<Vec<_>>();

    let mut sections = Vec::new();
    for column in store.columns() {
        let tasks = store.tasks_in_column(&column.id).collect::<Vec<_>>();
        let mut lines = vec![format!(
            "{} [{}] ({} {})",
            column.title,
            column.color,
            tasks.len(),
            if tasks.len() == 1 { "task" } else { "tasks" }
        )];
        if tasks.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for task in tasks {
            lines.push(format!("  - {} {}", short_id(&task.id), task_summary(task)));
        }
        sections.push(lines.join("\n"));
    }

    CommandOutput {
        command: "board",
        data: json!({ "columns": columns }),
        text: sections.join("\n\n"),
    }
}

fn column_list<S: StateStorage>(store: &Store<S>) -> CommandOutput {
    let columns = store.columns();
    let text = if columns.is_empty() {
        "No lists found.".to_string()
    } else {
        let rows = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                vec![
                    index.to_string(),
                    column.id.clone(),
                    column.title.replace('\n', " "),
                    column.color.to_string(),
                    store.tasks_in_column(&column.id).count().to_string(),
                ]
            })
            .collect::<Vec<_>>();
        render_text_table(&["Pos", "ID", "Title", "Color", "Tasks"], &rows)
    };

    CommandOutput {
        command: "column list",
        data: json!({
            "columns": columns.iter().map(|column| column_json(store, column)).collect::<Vec<_>>()
        }),
        text,
    }
}

fn column_add<S: StateStorage>(store: &mut Store<S>, args: ColumnAddArgs) -> CliResult<CommandOutput> {
    let id = match args.color {
        Some(color) => store.add_column_with_color(&args.title, color),
        None => store.add_column(&args.title),
    }
    .ok_or_else(|| usage_error("EMPTY_INPUT", "list title cannot be empty"))?;
    let column = require_column(store, &id)?;
    info!(column_id = %id, "list added from cli");

    Ok(CommandOutput {
        command: "column add",
        data: json!({ "column": column_json(store, column) }),
        text: format!("Added list {} ({})", column.title, column.id),
    })
}

fn column_rename<S: StateStorage>(
    store: &mut Store<S>,
    args: ColumnRenameArgs,
) -> CliResult<CommandOutput> {
    require_column(store, &args.id)?;
    if args.title.trim().is_empty() {
        return Err(usage_error("EMPTY_INPUT", "list title cannot be empty"));
    }
    store.update_column_title(&args.id, &args.title);
    let column = require_column(store, &args.id)?;

    Ok(CommandOutput {
        command: "column rename",
        data: json!({ "column": column_json(store, column) }),
        text: format!("Renamed list {} to {}", column.id, column.title),
    })
}

fn column_color<S: StateStorage>(
    store: &mut Store<S>,
    args: ColumnColorArgs,
) -> CliResult<CommandOutput> {
    require_column(store, &args.id)?;
    store.update_column_color(&args.id, args.color);
    let column = require_column(store, &args.id)?;

    Ok(CommandOutput {
        command: "column color",
        data: json!({ "column": column_json(store, column) }),
        text: format!("List {} is now {}", column.id, column.color),
    })
}

fn column_move<S: StateStorage>(
    store: &mut Store<S>,
    args: ColumnMoveArgs,
) -> CliResult<CommandOutput> {
    let from = store
        .state()
        .column_index(&args.id)
        .ok_or_else(|| column_not_found(&args.id))?;
    let count = store.columns().len();
    if args.to >= count {
        return Err(usage_error(
            "INVALID_INDEX",
            format!("index {} is out of range for {} lists", args.to, count),
        ));
    }
    store.move_column(from, args.to);

    Ok(CommandOutput {
        command: "column move",
        data: json!({
            "id": args.id,
            "from": from,
            "to": args.to,
            "order": store.columns().iter().map(|column| column.id.clone()).collect::<Vec<_>>()
        }),
        text: format!("Moved list {} from {} to {}", args.id, from, args.to),
    })
}

fn column_delete<S: StateStorage>(
    store: &mut Store<S>,
    args: ColumnDeleteArgs,
) -> CliResult<CommandOutput> {
    let column = require_column(store, &args.id)?.clone();
    let task_count = store.tasks_in_column(&column.id).count();
    if !args.yes {
        return Err(usage_error(
            "CONFIRMATION_REQUIRED",
            format!(
                "deleting list '{}' also deletes its {} task(s); pass --yes to confirm",
                column.title, task_count
            ),
        ));
    }
    store.delete_column(&column.id);
    info!(column_id = %column.id, task_count, "list deleted from cli");

    Ok(CommandOutput {
        command: "column delete",
        data: json!({ "id": column.id, "deleted_tasks": task_count }),
        text: format!("Deleted list {} and {} task(s)", column.title, task_count),
    })
}

fn task_list<S: StateStorage>(store: &Store<S>, args: TaskListArgs) -> CliResult<CommandOutput> {
    if let Some(column_id) = &args.column {
        require_column(store, column_id)?;
    }
    let tasks = store
        .tasks()
        .iter()
        .filter(|task| {
            args.column
                .as_deref()
                .is_none_or(|column_id| task.column_id == column_id)
        })
        .collect::<Vec<_>>();

    let text = if tasks.is_empty() {
        "No tasks found.".to_string()
    } else {
        let rows = tasks
            .iter()
            .map(|task| {
                vec![
                    short_id(&task.id),
                    task.column_id.clone(),
                    task.content.replace('\n', " "),
                    label_list(&task.tags),
                ]
            })
            .collect::<Vec<_>>();
        render_text_table(&["ID", "List", "Content", "Labels"], &rows)
    };

    Ok(CommandOutput {
        command: "task list",
        data: json!({ "tasks": tasks.iter().map(|task| task_json(task)).collect::<Vec<_>>() }),
        text,
    })
}

fn task_add<S: StateStorage>(store: &mut Store<S>, args: TaskAddArgs) -> CliResult<CommandOutput> {
    require_column(store, &args.column)?;
    let id = store
        .add_task(&args.column, &args.text)
        .ok_or_else(|| usage_error("EMPTY_INPUT", "task text cannot be empty"))?;
    let task = require_task(store, &id)?;

    Ok(CommandOutput {
        command: "task add",
        data: json!({ "task": task_json(task) }),
        text: format!("Added task {} to {}", task.id, task.column_id),
    })
}

fn task_edit<S: StateStorage>(store: &mut Store<S>, args: TaskEditArgs) -> CliResult<CommandOutput> {
    let current = require_task(store, &args.id)?.clone();

    let content = args.text.unwrap_or(current.content);

    let image = if let Some(path) = &args.image {
        Some(
            image::data_url_from_path(path)
                .map_err(|err| runtime_error("IMAGE_READ_FAILED", format!("{err:#}")))?,
        )
    } else if args.clear_image {
        None
    } else {
        current.image
    };

    let tags = if args.clear_tags || !args.tags.is_empty() {
        args.tags
    } else {
        current.tags
    };

    store.update_task(&current.id, &content, image, tags);
    let task = require_task(store, &current.id)?;

    Ok(CommandOutput {
        command: "task edit",
        data: json!({ "task": task_json(task) }),
        text: format!("Updated task {}", task.id),
    })
}

fn task_delete<S: StateStorage>(
    store: &mut Store<S>,
    args: TaskDeleteArgs,
) -> CliResult<CommandOutput> {
    let id = require_task(store, &args.id)?.id.clone();
    store.delete_task(&id);

    Ok(CommandOutput {
        command: "task delete",
        data: json!({ "id": id }),
        text: format!("Deleted task {id}"),
    })
}

/// Replays a full drag gesture so scripted moves land exactly where a pointer
/// drop would.
fn task_move<S: StateStorage>(store: &mut Store<S>, args: TaskMoveArgs) -> CliResult<CommandOutput> {
    let id = require_task(store, &args.id)?.id.clone();
    let target = match (&args.target.column, &args.target.over) {
        (Some(column_id), _) => {
            require_column(store, column_id)?;
            DropTarget::Column(column_id.clone())
        }
        (None, Some(task_id)) => DropTarget::Task(require_task(store, task_id)?.id.clone()),
        (None, None) => {
            return Err(usage_error(
                "MISSING_TARGET",
                "pass --column or --over to choose where the task goes",
            ));
        }
    };

    let mut drag = DragController::new();
    drag.on_start(store, &DragSource::Task(id.clone()));
    let moved_over = drag.on_over(store, Some(&target));
    let moved_end = drag.on_end(store, Some(&target));
    let task = require_task(store, &id)?;
    let position = store
        .tasks_in_column(&task.column_id)
        .position(|candidate| candidate.id == task.id)
        .unwrap_or(0);

    Ok(CommandOutput {
        command: "task move",
        data: json!({
            "task": task_json(task),
            "position": position,
            "moved": moved_over || moved_end
        }),
        text: format!(
            "Task {} is now at position {} in {}",
            task.id, position, task.column_id
        ),
    })
}

fn require_column<'a, S: StateStorage>(store: &'a Store<S>, id: &str) -> CliResult<&'a Column> {
    store.column(id).ok_or_else(|| column_not_found(id))
}

/// Resolves a task by exact id, then by unique id prefix, so the short ids
/// printed in text output can be passed back in.
fn require_task<'a, S: StateStorage>(store: &'a Store<S>, selector: &str) -> CliResult<&'a Task> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(usage_error("EMPTY_INPUT", "task id cannot be empty"));
    }
    if let Some(task) = store.task(trimmed) {
        return Ok(task);
    }

    let needle = trimmed.to_ascii_lowercase();
    let matches = store
        .tasks()
        .iter()
        .filter(|task| task.id.to_ascii_lowercase().starts_with(&needle))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(usage_error("NOT_FOUND", format!("task '{selector}' not found"))),
        many => Err(usage_error(
            "AMBIGUOUS_ID",
            format!(
                "task id prefix '{selector}' matches {} tasks; use a longer id",
                many.len()
            ),
        )),
    }
}

fn column_not_found(id: &str) -> CliError {
    usage_error("NOT_FOUND", format!("list '{id}' not found"))
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn label_list(tags: &[LabelColor]) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter()
        .map(|tag| tag.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn task_summary(task: &Task) -> String {
    let mut summary = task.content.replace('\n', " ");
    if !task.tags.is_empty() {
        summary.push_str(&format!(" [{}]", label_list(&task.tags)));
    }
    if let Some(data_url) = &task.image {
        let label = image::describe(data_url)
            .map(|image| image.label())
            .unwrap_or_else(|| "image".to_string());
        summary.push_str(&format!(" <{label}>"));
    }
    summary
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| {
        format!(
            "| {} |",
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
                .collect::<Vec<_>>()
                .join(" | ")
        )
    };
    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(*width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut lines = vec![border.clone(), format_row(headers.to_vec()), border.clone()];
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines.push(border);
    lines.join("\n")
}

fn column_json<S: StateStorage>(store: &Store<S>, column: &Column) -> Value {
    json!({
        "id": column.id,
        "title": column.title,
        "color": column.color.as_str(),
        "task_count": store.tasks_in_column(&column.id).count()
    })
}

fn task_json(task: &Task) -> Value {
    let image = task.image.as_deref().map(|data_url| match image::describe(data_url) {
        Some(summary) => json!({ "mime": summary.mime, "bytes": summary.byte_len }),
        None => json!({ "mime": Value::Null, "bytes": Value::Null }),
    });
    json!({
        "id": task.id,
        "column_id": task.column_id,
        "content": task.content,
        "tags": task.tags.iter().map(|tag| tag.as_str()).collect::<Vec<_>>(),
        "image": image
    })
}

fn usage_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 2,
        code,
        message: message.into(),
    }
}

fn runtime_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 1,
        code,
        message: message.into(),
    }
}

fn print_success(output: CommandOutput, json_output: bool, quiet: bool) {
    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "ok": true,
            "command": output.command,
            "data": output.data
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => println!("{value}"),
            Err(_) => println!("{payload}"),
        }
        return;
    }

    if quiet {
        return;
    }

    if output.text.is_empty() {
        println!("ok");
    } else {
        println!("{}", output.text);
    }
}

fn print_error(err: &CliError, json_output: bool) {
    error!(code = err.code, message = %err.message, "cli command failed");

    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "ok": false,
            "error": {
                "code": err.code,
                "message": err.message
            }
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => eprintln!("{value}"),
            Err(_) => eprintln!("{payload}"),
        }
        return;
    }

    eprintln!("error[{}]: {}", err.code, err.message);
}
