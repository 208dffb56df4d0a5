use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

use taskflow::drag::{DragController, DragSource, DropTarget};
use taskflow::settings::Settings;
use taskflow::storage::{JsonFileStorage, StateStorage};
use taskflow::store::Store;
use taskflow::types::{BoardState, ColumnColor, LabelColor};

fn ids_in(store: &Store<JsonFileStorage>, column: &str) -> Vec<String> {
    store
        .tasks_in_column(column)
        .map(|task| task.id.clone())
        .collect()
}

#[test]
fn fresh_directory_opens_default_board() -> Result<()> {
    let temp = TempDir::new()?;
    let store = Store::open(JsonFileStorage::in_dir(temp.path()));

    assert_eq!(store.state(), &BoardState::default());
    assert!(!store.storage().path().exists());
    Ok(())
}

#[test]
fn add_then_delete_round_trips_through_disk() -> Result<()> {
    let temp = TempDir::new()?;
    let mut store = Store::open(JsonFileStorage::in_dir(temp.path()));

    let added = store
        .add_task("doing", "Wire up storage")
        .context("task should be added")?;
    store.delete_task("1");

    assert_eq!(store.tasks_in_column("doing").count(), 1);
    assert_eq!(store.tasks_in_column("todo").count(), 0);
    assert_eq!(store.tasks_in_column("done").count(), 0);
    assert_eq!(store.tasks().len(), 1);

    let reopened = Store::open(JsonFileStorage::in_dir(temp.path()));
    assert_eq!(reopened.state(), store.state());
    assert_eq!(ids_in(&reopened, "doing"), vec![added]);
    Ok(())
}

#[test]
fn persisted_record_uses_versioned_camel_case_envelope() -> Result<()> {
    let temp = TempDir::new()?;
    let mut store = Store::open(JsonFileStorage::in_dir(temp.path()));
    store.update_task("1", "Set up the project", None, vec![LabelColor::Pink]);

    let raw = std::fs::read_to_string(temp.path().join("task-flow-storage-v2.json"))?;
    let record: Value = serde_json::from_str(&raw)?;

    assert_eq!(record["version"], 0);
    assert_eq!(record["state"]["columns"][1]["color"], "blue");
    assert_eq!(record["state"]["tasks"][0]["columnId"], "todo");
    assert_eq!(record["state"]["tasks"][0]["tags"][0], "pink");
    Ok(())
}

#[test]
fn record_from_another_version_falls_back_to_default() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("board.json");
    std::fs::write(
        &path,
        r#"{"state":{"columns":[],"tasks":[]},"version":3}"#,
    )?;

    let storage = JsonFileStorage::new(&path);
    assert!(storage.load()?.is_none());
    let store = Store::open(storage);
    assert_eq!(store.columns().len(), 3);
    Ok(())
}

#[test]
fn corrupt_record_opens_default_board() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("board.json");
    std::fs::write(&path, "{ not json")?;

    let storage = JsonFileStorage::new(&path);
    assert!(storage.load().is_err());
    let store = Store::open(storage);
    assert_eq!(store.state(), &BoardState::default());
    Ok(())
}

#[test]
fn unreadable_record_survives_the_next_save() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("board.json");
    let original = r#"{"state":{"columns":[],"tasks":[{"id":"a","columnId":"x","content":"","image":null,"tags":["mauve"]}]},"version":0}"#;
    std::fs::write(&path, original)?;

    let mut store = Store::open(JsonFileStorage::new(&path));
    store.add_column("Fresh").context("column added")?;

    assert_eq!(
        std::fs::read_to_string(temp.path().join("board.json.bak"))?,
        original
    );
    let reopened = Store::open(JsonFileStorage::new(&path));
    assert_eq!(reopened.columns().len(), 4);
    Ok(())
}

#[test]
fn drag_across_columns_changes_only_the_column_reference() -> Result<()> {
    let temp = TempDir::new()?;
    let mut store = Store::open(JsonFileStorage::in_dir(temp.path()));
    let target = store
        .add_task("done", "Ship")
        .context("task should be added")?;
    let before = store.task("1").cloned().context("seed task exists")?;

    let mut drag = DragController::new();
    assert!(drag.on_start(&store, &DragSource::Task("1".to_string())));
    assert!(drag.on_over(&mut store, Some(&DropTarget::Column("doing".to_string()))));

    let during = store.task("1").cloned().context("task still exists")?;
    assert_eq!(during.column_id, "doing");
    assert_eq!(during.content, before.content);
    assert_eq!(during.tags, before.tags);
    assert_eq!(during.image, before.image);

    drag.on_over(&mut store, Some(&DropTarget::Task(target.clone())));
    drag.on_end(&mut store, Some(&DropTarget::Task(target.clone())));
    assert!(!drag.is_dragging());

    let reopened = Store::open(JsonFileStorage::in_dir(temp.path()));
    assert_eq!(ids_in(&reopened, "done"), vec!["1".to_string(), target]);

    let mut ids: Vec<String> = reopened.tasks().iter().map(|t| t.id.clone()).collect();
    ids.sort();
    let mut expected: Vec<String> = store.tasks().iter().map(|t| t.id.clone()).collect();
    expected.sort();
    assert_eq!(ids, expected);
    Ok(())
}

#[test]
fn deleting_a_column_cascades_on_disk() -> Result<()> {
    let temp = TempDir::new()?;
    let mut store = Store::open(JsonFileStorage::in_dir(temp.path()));
    let review = store
        .add_column_with_color("Review", ColumnColor::Amber)
        .context("column should be added")?;
    store.add_task(&review, "Look at PR").context("task added")?;
    store.add_task("todo", "Keep me").context("task added")?;

    store.delete_column(&review);

    let reopened = Store::open(JsonFileStorage::in_dir(temp.path()));
    assert!(reopened.column(&review).is_none());
    assert!(reopened.tasks().iter().all(|task| task.column_id != review));
    assert_eq!(reopened.tasks_in_column("todo").count(), 2);
    Ok(())
}

#[test]
fn settings_point_the_board_elsewhere() -> Result<()> {
    let temp = TempDir::new()?;
    let settings_path = temp.path().join("settings.toml");
    let board_path = temp.path().join("boards").join("work.json");
    std::fs::write(
        &settings_path,
        format!(
            "storage_path = {:?}\ndrag_activation_distance = 4\n",
            board_path.display().to_string()
        ),
    )?;

    let settings = Settings::load_from_path(&settings_path);
    assert_eq!(settings.drag_activation_distance, 4);
    assert!(settings.confirm_column_delete);

    let cli_path = temp.path().join("cli.json");
    assert_eq!(settings.resolve_storage_path(Some(&cli_path))?, cli_path);

    // Only assert the settings fallback when the environment does not override it.
    if std::env::var_os("TASKFLOW_STORAGE_PATH").is_none() {
        let resolved = settings.resolve_storage_path(None)?;
        assert_eq!(resolved, board_path);

        let mut store = Store::open(JsonFileStorage::new(&resolved));
        store.add_column("Later").context("column added")?;
        assert!(board_path.exists());
    }
    Ok(())
}
