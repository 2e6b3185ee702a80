//! Task store: the single owner of groups, tasks and their relationship.
//!
//! # Responsibility
//! - Execute every task/group mutation against two ordered collections.
//! - Persist a full snapshot after each mutation, then notify listeners.
//! - Load the persisted snapshot once at construction (or on `reload`).
//!
//! # Invariants
//! - After `delete_group(g)` returns, no task references `g`.
//! - Ids are unique within their collection.
//! - Collection order is insertion/reorder order; nothing is sorted.
//! - In-memory state is authoritative; a failed save never rolls it back.
//! - Mutations on unknown ids are silent no-ops reported as `false`.

use crate::model::group::{GroupId, TaskGroup};
use crate::model::task::{Task, TaskId, TaskPriority, TaskStatus};
use crate::model::{normalize_required, ValidationError};
use crate::repo::pref_repo::{MemoryPreferenceRepository, PreferenceRepository};
use crate::service::filter::TaskFilter;
use crate::service::reorder::{apply_scoped_order, move_offsets};
use crate::service::snapshot::{
    decode_with_layout, encode_parts, SnapshotError, SnapshotLayout, StoreSnapshot,
};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Well-known preference key the store persists under.
pub const STATE_KEY: &str = "todolist.state";

/// Suffix of the key that keeps a copy of stored state that failed to decode.
pub const UNREADABLE_SUFFIX: &str = ".unreadable";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store mutations that take user input.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Snapshot(SnapshotError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Snapshot(err) => Some(err),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SnapshotError> for StoreError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// Describes one applied mutation. Delivered to listeners after the save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    TaskAdded(TaskId),
    TaskUpdated(TaskId),
    TasksRemoved(Vec<TaskId>),
    TasksReordered,
    GroupAdded(GroupId),
    GroupUpdated(GroupId),
    /// Groups removed together with the tasks whose reference was cleared.
    GroupsDeleted {
        group_ids: Vec<GroupId>,
        cleared_tasks: Vec<TaskId>,
    },
    GroupsReordered,
    Replaced,
    Cleared,
    Reloaded,
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type ChangeListener = Box<dyn FnMut(&StoreChange) + Send>;

/// In-memory task/group store with snapshot persistence.
pub struct TaskStore<R: PreferenceRepository> {
    repo: R,
    state_key: String,
    groups: Vec<TaskGroup>,
    tasks: Vec<Task>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener_id: u64,
    persistence_degraded: bool,
}

impl TaskStore<MemoryPreferenceRepository> {
    /// Creates an empty store backed by a process-local map.
    pub fn in_memory() -> Self {
        Self::new(MemoryPreferenceRepository::new())
    }
}

impl<R: PreferenceRepository> TaskStore<R> {
    /// Creates a store persisting under `STATE_KEY` and loads saved state.
    pub fn new(repo: R) -> Self {
        Self::with_key(repo, STATE_KEY)
    }

    /// Creates a store persisting under `state_key` and loads saved state.
    ///
    /// Absent state starts empty. Undecodable state starts empty after its
    /// bytes are copied to `unreadable_key()`. A repository read failure (or
    /// a failed copy) also starts empty and disables saving for this session
    /// so the stored value is not overwritten. A legacy layout is rewritten
    /// in the current layout right away.
    pub fn with_key(repo: R, state_key: impl Into<String>) -> Self {
        let mut store = Self {
            repo,
            state_key: state_key.into(),
            groups: Vec::new(),
            tasks: Vec::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            persistence_degraded: false,
        };
        store.load_state();
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn group(&self, group_id: GroupId) -> Option<&TaskGroup> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    /// Tasks in `group_id` (`None` = ungrouped), in collection order.
    pub fn tasks_for_group(&self, group_id: Option<GroupId>) -> Vec<Task> {
        self.tasks_matching(&TaskFilter::Group(group_id))
    }

    pub fn ungrouped_tasks(&self) -> Vec<Task> {
        self.tasks_for_group(None)
    }

    pub fn tasks_matching(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    /// Tasks whose group id resolves to no existing group.
    pub fn orphan_tasks(&self) -> Vec<Task> {
        let known: HashSet<GroupId> = self.groups.iter().map(|group| group.id).collect();
        self.tasks
            .iter()
            .filter(|task| task.group_id.is_some_and(|id| !known.contains(&id)))
            .cloned()
            .collect()
    }

    /// Number of tasks in `group_id` that are not done.
    pub fn active_task_count(&self, group_id: Option<GroupId>) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.belongs_to(group_id) && !task.is_completed())
            .count()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::new(self.groups.clone(), self.tasks.clone())
    }

    /// Whether persistence failed this session and the store runs in memory only.
    pub fn is_persistence_degraded(&self) -> bool {
        self.persistence_degraded
    }

    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    /// Key holding the last stored value that could not be decoded.
    pub fn unreadable_key(&self) -> String {
        format!("{}{}", self.state_key, UNREADABLE_SUFFIX)
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Registers a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreChange) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Appends a new group.
    ///
    /// # Errors
    /// - `Validation(BlankName)` when `name` is blank.
    pub fn add_group(&mut self, name: &str, description: impl Into<String>) -> StoreResult<TaskGroup> {
        let group = TaskGroup::create(name, description)?;
        self.groups.push(group.clone());
        debug!(
            "event=group_add module=store status=ok group_id={} group_count={}",
            group.id,
            self.groups.len()
        );
        self.commit(StoreChange::GroupAdded(group.id));
        Ok(group)
    }

    /// Updates name and description in place. `Ok(false)` when the id is unknown.
    pub fn rename_group(
        &mut self,
        group_id: GroupId,
        name: &str,
        description: impl Into<String>,
    ) -> StoreResult<bool> {
        let name = normalize_required(name, ValidationError::BlankName)?;
        let Some(group) = self.groups.iter_mut().find(|group| group.id == group_id) else {
            debug!("event=group_rename module=store status=not_found group_id={group_id}");
            return Ok(false);
        };
        group.name = name;
        group.description = description.into();
        self.commit(StoreChange::GroupUpdated(group_id));
        Ok(true)
    }

    /// Removes a group and clears its id from every referencing task.
    ///
    /// Returns whether the group existed. Tasks still referencing a missing
    /// group id are cleared either way.
    pub fn delete_group(&mut self, group_id: GroupId) -> bool {
        let (existed, cleared_tasks) = self.cascade_delete(group_id);
        if !existed && cleared_tasks.is_empty() {
            debug!("event=group_delete module=store status=not_found group_id={group_id}");
            return false;
        }
        debug!(
            "event=group_delete module=store status=ok group_id={} cleared_tasks={}",
            group_id,
            cleared_tasks.len()
        );
        self.commit(StoreChange::GroupsDeleted {
            group_ids: if existed { vec![group_id] } else { Vec::new() },
            cleared_tasks,
        });
        existed
    }

    /// Same as `delete_group`.
    pub fn remove_group(&mut self, group_id: GroupId) -> bool {
        self.delete_group(group_id)
    }

    /// Deletes the groups at `offsets` of the group list, cascading like
    /// `delete_group`. Out-of-range offsets are ignored.
    pub fn remove_groups_at(&mut self, offsets: &[usize]) -> usize {
        let targets: Vec<GroupId> = unique_in_range(offsets, self.groups.len())
            .into_iter()
            .map(|index| self.groups[index].id)
            .collect();
        if targets.is_empty() {
            return 0;
        }

        let mut cleared_tasks = Vec::new();
        for group_id in &targets {
            let (_, cleared) = self.cascade_delete(*group_id);
            cleared_tasks.extend(cleared);
        }
        let removed = targets.len();
        self.commit(StoreChange::GroupsDeleted {
            group_ids: targets,
            cleared_tasks,
        });
        removed
    }

    /// Appends a new task with status `Todo`.
    ///
    /// `group_id` is not checked against existing groups; an unknown id
    /// produces an orphan task.
    ///
    /// # Errors
    /// - `Validation(BlankTitle)` when `title` is blank.
    pub fn add_task(
        &mut self,
        title: &str,
        details: impl Into<String>,
        priority: TaskPriority,
        group_id: Option<GroupId>,
    ) -> StoreResult<Task> {
        let task = Task::create(title, details, priority, group_id)?;
        self.tasks.push(task.clone());
        debug!(
            "event=task_add module=store status=ok task_id={} grouped={} task_count={}",
            task.id,
            task.group_id.is_some(),
            self.tasks.len()
        );
        self.commit(StoreChange::TaskAdded(task.id));
        Ok(task)
    }

    /// Replaces title and details. `Ok(false)` when the id is unknown.
    pub fn update_task(
        &mut self,
        task_id: TaskId,
        title: &str,
        details: impl Into<String>,
    ) -> StoreResult<bool> {
        let title = normalize_required(title, ValidationError::BlankTitle)?;
        let details = details.into();
        Ok(self.mutate_task(task_id, "task_update", |task| {
            task.title = title;
            task.details = details;
        }))
    }

    pub fn set_task_status(&mut self, task_id: TaskId, status: TaskStatus) -> bool {
        self.mutate_task(task_id, "task_status", |task| task.status = status)
    }

    pub fn set_task_priority(&mut self, task_id: TaskId, priority: TaskPriority) -> bool {
        self.mutate_task(task_id, "task_priority", |task| task.priority = priority)
    }

    /// `Done` becomes `Todo`; any other status becomes `Done`.
    pub fn toggle_task_completion(&mut self, task_id: TaskId) -> bool {
        self.mutate_task(task_id, "task_toggle", |task| {
            task.status = if task.is_completed() {
                TaskStatus::Todo
            } else {
                TaskStatus::Done
            };
        })
    }

    /// Sets the task's group (`None` ungroups). The target is not validated.
    pub fn move_task(&mut self, task_id: TaskId, to_group: Option<GroupId>) -> bool {
        self.mutate_task(task_id, "task_move", |task| task.group_id = to_group)
    }

    /// Moves a task from `from` to `to`; no-op unless the groups differ and
    /// the task currently belongs to `from`.
    pub fn move_task_between(&mut self, task_id: TaskId, from: GroupId, to: GroupId) -> bool {
        if from == to {
            return false;
        }
        let in_source = self
            .task(task_id)
            .is_some_and(|task| task.group_id == Some(from));
        if !in_source {
            return false;
        }
        self.move_task(task_id, Some(to))
    }

    /// Removes one task. Idempotent.
    pub fn remove_task(&mut self, task_id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != task_id);
        if self.tasks.len() == before {
            return false;
        }
        debug!("event=task_remove module=store status=ok task_id={task_id}");
        self.commit(StoreChange::TasksRemoved(vec![task_id]));
        true
    }

    /// Removes the tasks at `offsets` of the `filter` view. Returns the count removed.
    pub fn remove_tasks_at(&mut self, filter: &TaskFilter, offsets: &[usize]) -> usize {
        let view = self.view_ids(filter);
        let targets: Vec<TaskId> = unique_in_range(offsets, view.len())
            .into_iter()
            .map(|index| view[index])
            .collect();
        if targets.is_empty() {
            return 0;
        }

        let doomed: HashSet<TaskId> = targets.iter().copied().collect();
        self.tasks.retain(|task| !doomed.contains(&task.id));
        let removed = targets.len();
        self.commit(StoreChange::TasksRemoved(targets));
        removed
    }

    /// Applies a permutation of every task id.
    pub fn reorder_tasks(&mut self, new_order: &[TaskId]) -> bool {
        self.reorder_tasks_in(&TaskFilter::All, new_order)
    }

    /// Applies a permutation of the ids in the `filter` view; tasks outside
    /// the view keep their positions in the backing collection.
    pub fn reorder_tasks_in(&mut self, filter: &TaskFilter, new_order: &[TaskId]) -> bool {
        let applied = apply_scoped_order(
            &mut self.tasks,
            |task| task.id,
            |task| filter.matches(task),
            new_order,
        );
        if !applied {
            debug!(
                "event=task_reorder module=store status=rejected filter={:?} len={}",
                filter,
                new_order.len()
            );
            return false;
        }
        self.commit(StoreChange::TasksReordered);
        true
    }

    /// Drag move inside the `filter` view using list-move semantics.
    pub fn move_tasks(&mut self, filter: &TaskFilter, from_offsets: &[usize], to_offset: usize) -> bool {
        let mut view = self.view_ids(filter);
        if !move_offsets(&mut view, from_offsets, to_offset) {
            return false;
        }
        self.reorder_tasks_in(filter, &view)
    }

    /// Applies a permutation of every group id.
    pub fn reorder_groups(&mut self, new_order: &[GroupId]) -> bool {
        if !apply_scoped_order(&mut self.groups, |group| group.id, |_| true, new_order) {
            debug!(
                "event=group_reorder module=store status=rejected len={}",
                new_order.len()
            );
            return false;
        }
        self.commit(StoreChange::GroupsReordered);
        true
    }

    /// Drag move in the group list using list-move semantics.
    pub fn move_groups(&mut self, from_offsets: &[usize], to_offset: usize) -> bool {
        let mut order: Vec<GroupId> = self.groups.iter().map(|group| group.id).collect();
        if !move_offsets(&mut order, from_offsets, to_offset) {
            return false;
        }
        self.reorder_groups(&order)
    }

    /// Replaces all state with a validated snapshot.
    ///
    /// # Errors
    /// - `Snapshot` when the snapshot holds duplicate ids or invalid records.
    pub fn replace_all(&mut self, snapshot: StoreSnapshot) -> StoreResult<()> {
        snapshot.validate()?;
        self.groups = snapshot.groups;
        self.tasks = snapshot.tasks;
        info!(
            "event=store_replace module=store status=ok groups={} tasks={}",
            self.groups.len(),
            self.tasks.len()
        );
        self.commit(StoreChange::Replaced);
        Ok(())
    }

    /// Empties both collections.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.tasks.clear();
        self.commit(StoreChange::Cleared);
    }

    /// Re-reads persisted state, replacing the in-memory collections.
    pub fn reload(&mut self) {
        self.load_state();
        self.notify(&StoreChange::Reloaded);
    }

    fn load_state(&mut self) {
        self.groups.clear();
        self.tasks.clear();

        match self.repo.load(&self.state_key) {
            Ok(None) => {
                self.persistence_degraded = false;
                info!(
                    "event=store_load module=store status=empty key={}",
                    self.state_key
                );
            }
            Ok(Some(bytes)) => {
                self.persistence_degraded = false;
                match decode_with_layout(&bytes) {
                    Ok((snapshot, layout)) => {
                        self.groups = snapshot.groups;
                        self.tasks = snapshot.tasks;
                        info!(
                            "event=store_load module=store status=ok key={} layout={:?} groups={} tasks={}",
                            self.state_key,
                            layout,
                            self.groups.len(),
                            self.tasks.len()
                        );
                        if layout == SnapshotLayout::Legacy {
                            self.persist();
                        }
                    }
                    Err(err) => {
                        warn!(
                            "event=store_load module=store status=discarded key={} bytes={} error={}",
                            self.state_key,
                            bytes.len(),
                            err
                        );
                        self.preserve_unreadable(&bytes);
                    }
                }
            }
            Err(err) => {
                self.persistence_degraded = true;
                warn!(
                    "event=store_load module=store status=error key={} error={}",
                    self.state_key, err
                );
            }
        }
    }

    fn preserve_unreadable(&mut self, bytes: &[u8]) {
        let backup_key = self.unreadable_key();
        match self.repo.save(&backup_key, bytes) {
            Ok(()) => info!(
                "event=store_backup module=store status=ok key={} bytes={}",
                backup_key,
                bytes.len()
            ),
            Err(err) => {
                self.persistence_degraded = true;
                warn!(
                    "event=store_backup module=store status=error key={} error={}",
                    backup_key, err
                );
            }
        }
    }

    fn commit(&mut self, change: StoreChange) {
        self.persist();
        self.notify(&change);
    }

    fn persist(&mut self) {
        if self.persistence_degraded {
            return;
        }

        let bytes = match encode_parts(&self.groups, &self.tasks) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.persistence_degraded = true;
                warn!("event=store_save module=store status=error stage=encode error={err}");
                return;
            }
        };

        if let Err(err) = self.repo.save(&self.state_key, &bytes) {
            self.persistence_degraded = true;
            warn!(
                "event=store_save module=store status=error stage=save key={} error={}",
                self.state_key, err
            );
        }
    }

    fn notify(&mut self, change: &StoreChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }

    fn mutate_task(&mut self, task_id: TaskId, event: &str, apply: impl FnOnce(&mut Task)) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) else {
            debug!("event={event} module=store status=not_found task_id={task_id}");
            return false;
        };
        apply(task);
        debug!("event={event} module=store status=ok task_id={task_id}");
        self.commit(StoreChange::TaskUpdated(task_id));
        true
    }

    fn cascade_delete(&mut self, group_id: GroupId) -> (bool, Vec<TaskId>) {
        let before = self.groups.len();
        self.groups.retain(|group| group.id != group_id);
        let existed = self.groups.len() != before;

        let mut cleared = Vec::new();
        for task in &mut self.tasks {
            if task.group_id == Some(group_id) {
                task.group_id = None;
                cleared.push(task.id);
            }
        }
        (existed, cleared)
    }

    fn view_ids(&self, filter: &TaskFilter) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|task| filter.matches(task))
            .map(|task| task.id)
            .collect()
    }
}

fn unique_in_range(offsets: &[usize], len: usize) -> Vec<usize> {
    let mut indexes: Vec<usize> = offsets.iter().copied().filter(|&index| index < len).collect();
    indexes.sort_unstable();
    indexes.dedup();
    indexes
}
