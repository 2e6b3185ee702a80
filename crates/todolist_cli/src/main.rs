//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `todolist_core` linkage and print a summary of persisted state.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `todolist_cli [DB_PATH]`. Without an argument the path comes from
//! `TODOLIST_DB_PATH`; without either only ping/version are printed.

use todolist_core::{SqlitePreferenceRepository, TaskStatus, TaskStore};

fn main() {
    println!("todolist_core ping={}", todolist_core::ping());
    println!("todolist_core version={}", todolist_core::core_version());

    let Some(db_path) = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TODOLIST_DB_PATH").ok())
        .filter(|value| !value.trim().is_empty())
    else {
        return;
    };

    let repo = match SqlitePreferenceRepository::open(db_path.trim()) {
        Ok(repo) => repo,
        Err(err) => {
            eprintln!("todolist_core store=unavailable path={} error={err}", db_path.trim());
            std::process::exit(1);
        }
    };
    let store = TaskStore::new(repo);

    println!(
        "todolist_core groups={} tasks={} orphans={}",
        store.groups().len(),
        store.tasks().len(),
        store.orphan_tasks().len()
    );
    for status in TaskStatus::ALL {
        let count = store
            .tasks()
            .iter()
            .filter(|task| task.status == status)
            .count();
        println!("todolist_core status.{}={count}", status.as_str());
    }
    for group in store.groups() {
        println!(
            "todolist_core group id={} tasks={} active={}",
            group.id,
            store.tasks_for_group(Some(group.id)).len(),
            store.active_task_count(Some(group.id))
        );
    }
}
