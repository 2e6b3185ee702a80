//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task/group use cases to Dart via FRB as plain sync functions.
//! - Own the process-wide `TaskStore` behind one mutex.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Ids cross the boundary as UUID strings; statuses and priorities as
//!   snake_case names.
//! - Every mutation runs under the store mutex, so a cascading group delete
//!   is never observed half-applied.

use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use todolist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    MemoryPreferenceRepository, PreferenceRepository, SqlitePreferenceRepository, Task,
    TaskFilter, TaskGroup, TaskPriority, TaskStatus, TaskStore,
};
use uuid::Uuid;

const STORE_DB_FILE_NAME: &str = "todolist_prefs.sqlite3";
const STORE_DB_PATH_ENV: &str = "TODOLIST_DB_PATH";

type SharedStore = TaskStore<Box<dyn PreferenceRepository + Send>>;

static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE: OnceLock<Mutex<SharedStore>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message otherwise.
/// Safe to repeat with the same `level + log_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Task row for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub details: String,
    /// `todo|in_progress|done`.
    pub status: String,
    /// `low|medium|high`.
    pub priority: String,
    pub group_id: Option<String>,
}

/// Group row for sidebar rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at_ms: i64,
    /// Tasks in this group that are not done.
    pub active_count: u32,
}

/// Full state for one re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreView {
    pub groups: Vec<GroupItem>,
    pub tasks: Vec<TaskItem>,
    /// `true` when saving failed this session and edits live in memory only.
    pub persistence_degraded: bool,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the action changed state.
    pub ok: bool,
    /// Id of the created or targeted record, when there is one.
    pub id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }

    fn from_applied(applied: bool, id: &str, done: &str, missing: &str) -> Self {
        if applied {
            Self::success(done, Some(id.to_string()))
        } else {
            Self::failure(missing)
        }
    }
}

/// Returns the whole store for rendering.
#[flutter_rust_bridge::frb(sync)]
pub fn store_snapshot() -> StoreView {
    with_store(|store| {
        let store: &SharedStore = store;
        StoreView {
            groups: store
                .groups()
                .iter()
                .map(|group| to_group_item(store, group))
                .collect(),
            tasks: store.tasks().iter().map(to_task_item).collect(),
            persistence_degraded: store.is_persistence_degraded(),
        }
    })
    .unwrap_or_else(|err| {
        warn!("event=ffi_snapshot module=ffi status=error error={err}");
        StoreView {
            groups: Vec::new(),
            tasks: Vec::new(),
            persistence_degraded: true,
        }
    })
}

/// Tasks in one group (`None` = ungrouped), in list order.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_for_group(group_id: Option<String>) -> Vec<TaskItem> {
    let Ok(group_id) = parse_optional_id("group_id", group_id) else {
        return Vec::new();
    };
    with_store(|store| {
        store
            .tasks_for_group(group_id)
            .iter()
            .map(to_task_item)
            .collect()
    })
    .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_group(name: String, description: String) -> ActionResponse {
    run(|store| {
        let group = store
            .add_group(&name, description)
            .map_err(|err| format!("add_group failed: {err}"))?;
        Ok(ActionResponse::success(
            "Group created.",
            Some(group.id.to_string()),
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn rename_group(group_id: String, name: String, description: String) -> ActionResponse {
    run(|store| {
        let id = parse_id("group_id", &group_id)?;
        let applied = store
            .rename_group(id, &name, description)
            .map_err(|err| format!("rename_group failed: {err}"))?;
        Ok(ActionResponse::from_applied(
            applied,
            &group_id,
            "Group updated.",
            "Group not found.",
        ))
    })
}

/// Deletes a group; its tasks stay and become ungrouped.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_group(group_id: String) -> ActionResponse {
    run(|store| {
        let id = parse_id("group_id", &group_id)?;
        Ok(ActionResponse::from_applied(
            store.delete_group(id),
            &group_id,
            "Group deleted.",
            "Group not found.",
        ))
    })
}

/// Creates a task. `priority` defaults to `medium` when empty.
#[flutter_rust_bridge::frb(sync)]
pub fn add_task(
    title: String,
    details: String,
    priority: String,
    group_id: Option<String>,
) -> ActionResponse {
    run(|store| {
        let priority = parse_priority(&priority)?;
        let group_id = parse_optional_id("group_id", group_id)?;
        let task = store
            .add_task(&title, details, priority, group_id)
            .map_err(|err| format!("add_task failed: {err}"))?;
        Ok(ActionResponse::success(
            "Task created.",
            Some(task.id.to_string()),
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn update_task(task_id: String, title: String, details: String) -> ActionResponse {
    run(|store| {
        let id = parse_id("task_id", &task_id)?;
        let applied = store
            .update_task(id, &title, details)
            .map_err(|err| format!("update_task failed: {err}"))?;
        Ok(ActionResponse::from_applied(
            applied,
            &task_id,
            "Task updated.",
            "Task not found.",
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_task_status(task_id: String, status: String) -> ActionResponse {
    run(|store| {
        let id = parse_id("task_id", &task_id)?;
        let status = TaskStatus::parse(&status)
            .ok_or_else(|| format!("unsupported task status `{status}`"))?;
        Ok(ActionResponse::from_applied(
            store.set_task_status(id, status),
            &task_id,
            "Task status updated.",
            "Task not found.",
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_task_priority(task_id: String, priority: String) -> ActionResponse {
    run(|store| {
        let id = parse_id("task_id", &task_id)?;
        let priority = parse_priority(&priority)?;
        Ok(ActionResponse::from_applied(
            store.set_task_priority(id, priority),
            &task_id,
            "Task priority updated.",
            "Task not found.",
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn toggle_task(task_id: String) -> ActionResponse {
    run(|store| {
        let id = parse_id("task_id", &task_id)?;
        Ok(ActionResponse::from_applied(
            store.toggle_task_completion(id),
            &task_id,
            "Task toggled.",
            "Task not found.",
        ))
    })
}

/// Moves a task to `group_id`, or ungroups it when `None`.
#[flutter_rust_bridge::frb(sync)]
pub fn move_task(task_id: String, group_id: Option<String>) -> ActionResponse {
    run(|store| {
        let id = parse_id("task_id", &task_id)?;
        let group_id = parse_optional_id("group_id", group_id)?;
        Ok(ActionResponse::from_applied(
            store.move_task(id, group_id),
            &task_id,
            "Task moved.",
            "Task not found.",
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn remove_task(task_id: String) -> ActionResponse {
    run(|store| {
        let id = parse_id("task_id", &task_id)?;
        Ok(ActionResponse::from_applied(
            store.remove_task(id),
            &task_id,
            "Task removed.",
            "Task not found.",
        ))
    })
}

/// Reorders every task. `ordered_ids` must list each task exactly once.
#[flutter_rust_bridge::frb(sync)]
pub fn reorder_tasks(ordered_ids: Vec<String>) -> ActionResponse {
    reorder_tasks_in(TaskFilter::All, ordered_ids)
}

/// Reorders one group section (`None` = ungrouped section) after a drag.
#[flutter_rust_bridge::frb(sync)]
pub fn reorder_group_tasks(group_id: Option<String>, ordered_ids: Vec<String>) -> ActionResponse {
    match parse_optional_id("group_id", group_id) {
        Ok(group_id) => reorder_tasks_in(TaskFilter::Group(group_id), ordered_ids),
        Err(err) => ActionResponse::failure(err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn reorder_groups(ordered_ids: Vec<String>) -> ActionResponse {
    run(|store| {
        let ids = parse_ids("group_id", &ordered_ids)?;
        if store.reorder_groups(&ids) {
            Ok(ActionResponse::success("Groups reordered.", None))
        } else {
            Ok(ActionResponse::failure(
                "Order must list every group exactly once.",
            ))
        }
    })
}

fn reorder_tasks_in(filter: TaskFilter, ordered_ids: Vec<String>) -> ActionResponse {
    run(|store| {
        let ids = parse_ids("task_id", &ordered_ids)?;
        if store.reorder_tasks_in(&filter, &ids) {
            Ok(ActionResponse::success("Tasks reordered.", None))
        } else {
            Ok(ActionResponse::failure(
                "Order must list every task in the section exactly once.",
            ))
        }
    })
}

fn run(f: impl FnOnce(&mut SharedStore) -> Result<ActionResponse, String>) -> ActionResponse {
    match with_store(f) {
        Ok(Ok(response)) => response,
        Ok(Err(message)) | Err(message) => ActionResponse::failure(message),
    }
}

fn with_store<T>(f: impl FnOnce(&mut SharedStore) -> T) -> Result<T, String> {
    let store = STORE.get_or_init(|| Mutex::new(open_store()));
    let mut guard = store
        .lock()
        .map_err(|_| "task store is unavailable after an earlier panic".to_string())?;
    Ok(f(&mut guard))
}

fn open_store() -> SharedStore {
    let db_path = resolve_store_db_path();
    let repo: Box<dyn PreferenceRepository + Send> =
        match SqlitePreferenceRepository::open(&db_path) {
            Ok(repo) => Box::new(repo),
            Err(err) => {
                warn!(
                    "event=ffi_store_open module=ffi status=fallback_memory path={} error={}",
                    db_path.display(),
                    err
                );
                Box::new(MemoryPreferenceRepository::new())
            }
        };
    TaskStore::new(repo)
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(STORE_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn parse_id(field: &str, raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid {field} `{raw}`"))
}

fn parse_optional_id(field: &str, raw: Option<String>) -> Result<Option<Uuid>, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(field, value).map(Some),
    }
}

fn parse_ids(field: &str, raw: &[String]) -> Result<Vec<Uuid>, String> {
    raw.iter().map(|value| parse_id(field, value)).collect()
}

fn parse_priority(raw: &str) -> Result<TaskPriority, String> {
    if raw.trim().is_empty() {
        return Ok(TaskPriority::default());
    }
    TaskPriority::parse(raw).ok_or_else(|| format!("unsupported task priority `{raw}`"))
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        details: task.details.clone(),
        status: task.status.as_str().to_string(),
        priority: task.priority.as_str().to_string(),
        group_id: task.group_id.map(|id| id.to_string()),
    }
}

fn to_group_item(store: &SharedStore, group: &TaskGroup) -> GroupItem {
    GroupItem {
        id: group.id.to_string(),
        name: group.name.clone(),
        description: group.description.clone(),
        created_at_ms: group.created_at,
        active_count: u32::try_from(store.active_task_count(Some(group.id))).unwrap_or(u32::MAX),
    }
}
