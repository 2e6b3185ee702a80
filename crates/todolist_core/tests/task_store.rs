use std::sync::{Arc, Mutex};
use todolist_core::{
    StoreChange, StoreError, TaskFilter, TaskPriority, TaskStatus, TaskStore, ValidationError,
};
use uuid::Uuid;

fn titles(tasks: &[todolist_core::Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.title.as_str()).collect()
}

#[test]
fn add_task_records_fields_with_default_status() {
    let mut store = TaskStore::in_memory();

    let task = store
        .add_task("Test Task", "Test Details", TaskPriority::High, None)
        .expect("add task");

    assert_eq!(store.tasks().len(), 1);
    let stored = &store.tasks()[0];
    assert_eq!(stored, &task);
    assert_eq!(stored.title, "Test Task");
    assert_eq!(stored.details, "Test Details");
    assert_eq!(stored.priority, TaskPriority::High);
    assert_eq!(stored.status, TaskStatus::Todo);
    assert_eq!(stored.group_id, None);
}

#[test]
fn counts_match_successful_adds() {
    let mut store = TaskStore::in_memory();

    for index in 0..5 {
        store
            .add_task(&format!("task {index}"), "", TaskPriority::Medium, None)
            .expect("add task");
    }
    assert!(store.add_task("  ", "", TaskPriority::Low, None).is_err());
    store.add_group("A", "").expect("add group");
    store.add_group("B", "").expect("add group");
    assert!(store.add_group("", "desc").is_err());

    assert_eq!(store.tasks().len(), 5);
    assert_eq!(store.groups().len(), 2);
}

#[test]
fn blank_inputs_are_rejected_with_validation_errors() {
    let mut store = TaskStore::in_memory();
    let task = store.add_task("T", "", TaskPriority::Low, None).expect("add task");
    let group = store.add_group("G", "").expect("add group");

    assert!(matches!(
        store.add_task("", "", TaskPriority::Low, None),
        Err(StoreError::Validation(ValidationError::BlankTitle))
    ));
    assert!(matches!(
        store.update_task(task.id, " ", "details"),
        Err(StoreError::Validation(ValidationError::BlankTitle))
    ));
    assert!(matches!(
        store.rename_group(group.id, "", ""),
        Err(StoreError::Validation(ValidationError::BlankName))
    ));
    assert_eq!(store.task(task.id).expect("task exists").title, "T");
    assert_eq!(store.group(group.id).expect("group exists").name, "G");
}

#[test]
fn update_status_with_unknown_id_leaves_tasks_unchanged() {
    let mut store = TaskStore::in_memory();
    store.add_task("Test", "Details", TaskPriority::Medium, None).expect("add task");
    let before = store.tasks().to_vec();

    assert!(!store.set_task_status(Uuid::new_v4(), TaskStatus::Done));
    assert!(!store.update_task(Uuid::new_v4(), "x", "y").unwrap());
    assert!(!store.move_task(Uuid::new_v4(), None));

    assert_eq!(store.tasks(), before.as_slice());
}

#[test]
fn status_transitions_are_unrestricted() {
    let mut store = TaskStore::in_memory();
    let task = store.add_task("T", "", TaskPriority::Medium, None).expect("add task");

    assert!(store.set_task_status(task.id, TaskStatus::Done));
    assert!(store.set_task_status(task.id, TaskStatus::InProgress));
    assert!(store.set_task_status(task.id, TaskStatus::Todo));
    assert!(store.set_task_status(task.id, TaskStatus::Done));
    assert_eq!(store.task(task.id).expect("task exists").status, TaskStatus::Done);
}

#[test]
fn toggle_completion_flips_between_done_and_todo() {
    let mut store = TaskStore::in_memory();
    let task = store.add_task("T", "", TaskPriority::Medium, None).expect("add task");

    assert!(store.toggle_task_completion(task.id));
    assert_eq!(store.task(task.id).expect("task exists").status, TaskStatus::Done);
    assert!(store.toggle_task_completion(task.id));
    assert_eq!(store.task(task.id).expect("task exists").status, TaskStatus::Todo);

    store.set_task_status(task.id, TaskStatus::InProgress);
    store.toggle_task_completion(task.id);
    assert_eq!(store.task(task.id).expect("task exists").status, TaskStatus::Done);
}

#[test]
fn update_task_and_priority_change_only_target() {
    let mut store = TaskStore::in_memory();
    let a = store.add_task("A", "a", TaskPriority::Low, None).expect("add task");
    let b = store.add_task("B", "b", TaskPriority::Low, None).expect("add task");

    assert!(store.update_task(a.id, " A2 ", "new details").unwrap());
    assert!(store.set_task_priority(a.id, TaskPriority::High));

    let updated = store.task(a.id).expect("task exists");
    assert_eq!(updated.title, "A2");
    assert_eq!(updated.details, "new details");
    assert_eq!(updated.priority, TaskPriority::High);
    assert_eq!(store.task(b.id).expect("task exists"), &b);
}

#[test]
fn work_group_scenario() {
    let mut store = TaskStore::in_memory();
    let work = store.add_group("Work", "desc").expect("add group");
    store
        .add_task("Write spec", "", TaskPriority::High, Some(work.id))
        .expect("add task");

    let in_work = store.tasks_for_group(Some(work.id));
    assert_eq!(in_work.len(), 1);
    assert_eq!(in_work[0].title, "Write spec");
    assert_eq!(in_work[0].priority, TaskPriority::High);
    assert_eq!(in_work[0].status, TaskStatus::Todo);
}

#[test]
fn tasks_for_group_returns_exact_subset_in_order() {
    let mut store = TaskStore::in_memory();
    let g1 = store.add_group("Group 1", "Description 1").expect("add group");
    let g2 = store.add_group("Group 2", "Description 2").expect("add group");

    store.add_task("Task 1", "", TaskPriority::Medium, Some(g1.id)).expect("add task");
    store.add_task("Loose 1", "", TaskPriority::Medium, None).expect("add task");
    store.add_task("Task 2", "", TaskPriority::Medium, Some(g2.id)).expect("add task");
    store.add_task("Task 3", "", TaskPriority::Medium, Some(g1.id)).expect("add task");
    store.add_task("Loose 2", "", TaskPriority::Medium, None).expect("add task");

    assert_eq!(
        titles(&store.tasks_for_group(Some(g1.id))),
        vec!["Task 1", "Task 3"]
    );
    assert_eq!(titles(&store.tasks_for_group(Some(g2.id))), vec!["Task 2"]);
    assert_eq!(titles(&store.ungrouped_tasks()), vec!["Loose 1", "Loose 2"]);
    assert_eq!(store.tasks_for_group(None), store.ungrouped_tasks());
}

#[test]
fn delete_group_clears_only_matching_references() {
    let mut store = TaskStore::in_memory();
    let g = store.add_group("G", "").expect("add group");
    let keep = store.add_group("Keep", "").expect("add group");
    let t1 = store.add_task("T1", "", TaskPriority::Medium, Some(g.id)).expect("add task");
    let t2 = store.add_task("T2", "", TaskPriority::Medium, Some(keep.id)).expect("add task");
    let t3 = store.add_task("T3", "", TaskPriority::Medium, Some(g.id)).expect("add task");

    assert!(store.delete_group(g.id));

    assert_eq!(store.groups().len(), 1);
    assert_eq!(store.groups()[0].id, keep.id);
    assert_eq!(store.task(t1.id).expect("task exists").group_id, None);
    assert_eq!(store.task(t2.id).expect("task exists").group_id, Some(keep.id));
    assert_eq!(store.task(t3.id).expect("task exists").group_id, None);
    assert_eq!(store.tasks().len(), 3);
}

#[test]
fn delete_only_group_keeps_task_ungrouped() {
    let mut store = TaskStore::in_memory();
    let g = store.add_group("G", "").expect("add group");
    let t = store.add_task("T", "", TaskPriority::Medium, Some(g.id)).expect("add task");

    store.delete_group(g.id);

    assert!(store.groups().is_empty());
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].id, t.id);
    assert_eq!(store.tasks()[0].group_id, None);
    assert!(!store.delete_group(g.id));
    assert!(!store.remove_group(g.id));
}

#[test]
fn rename_group_updates_in_place() {
    let mut store = TaskStore::in_memory();
    let a = store.add_group("A", "first").expect("add group");
    let b = store.add_group("B", "second").expect("add group");

    assert!(store.rename_group(a.id, "Alpha", "updated").unwrap());

    let groups = store.groups();
    assert_eq!(groups[0].id, a.id);
    assert_eq!(groups[0].name, "Alpha");
    assert_eq!(groups[0].description, "updated");
    assert_eq!(groups[0].created_at, a.created_at);
    assert_eq!(groups[1], b);
}

#[test]
fn orphan_group_ids_are_accepted_and_reported() {
    let mut store = TaskStore::in_memory();
    let ghost = Uuid::new_v4();
    let orphan = store
        .add_task("Orphan", "", TaskPriority::Low, Some(ghost))
        .expect("add task");
    let loose = store.add_task("Loose", "", TaskPriority::Low, None).expect("add task");
    assert!(store.move_task(loose.id, Some(Uuid::new_v4())));

    assert_eq!(store.orphan_tasks().len(), 2);
    assert_eq!(store.tasks_for_group(Some(ghost))[0].id, orphan.id);

    // deleting an unknown group still clears tasks that point at it
    assert!(!store.delete_group(ghost));
    assert_eq!(store.task(orphan.id).expect("task exists").group_id, None);
    assert_eq!(store.orphan_tasks().len(), 1);
}

#[test]
fn move_task_sets_and_clears_group() {
    let mut store = TaskStore::in_memory();
    let a = store.add_group("A", "").expect("add group");
    let b = store.add_group("B", "").expect("add group");
    let t = store.add_task("T", "", TaskPriority::Medium, Some(a.id)).expect("add task");

    assert!(store.move_task(t.id, Some(b.id)));
    assert_eq!(store.task(t.id).expect("task exists").group_id, Some(b.id));
    assert!(store.move_task(t.id, None));
    assert_eq!(store.task(t.id).expect("task exists").group_id, None);
}

#[test]
fn move_task_between_requires_distinct_groups_and_membership() {
    let mut store = TaskStore::in_memory();
    let a = store.add_group("A", "").expect("add group");
    let b = store.add_group("B", "").expect("add group");
    let t = store.add_task("T", "", TaskPriority::Medium, Some(a.id)).expect("add task");

    assert!(!store.move_task_between(t.id, a.id, a.id));
    assert!(!store.move_task_between(t.id, b.id, a.id));
    assert_eq!(store.task(t.id).expect("task exists").group_id, Some(a.id));

    assert!(store.move_task_between(t.id, a.id, b.id));
    assert_eq!(store.task(t.id).expect("task exists").group_id, Some(b.id));
}

#[test]
fn remove_task_is_idempotent() {
    let mut store = TaskStore::in_memory();
    let a = store.add_task("A", "", TaskPriority::Medium, None).expect("add task");
    let b = store.add_task("B", "", TaskPriority::Medium, None).expect("add task");

    assert!(store.remove_task(a.id));
    assert!(!store.remove_task(a.id));
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].id, b.id);
}

#[test]
fn reorder_two_ungrouped_tasks() {
    let mut store = TaskStore::in_memory();
    let a = store.add_task("A", "", TaskPriority::Medium, None).expect("add task");
    let b = store.add_task("B", "", TaskPriority::Medium, None).expect("add task");

    assert!(store.reorder_tasks(&[b.id, a.id]));

    assert_eq!(titles(store.tasks()), vec!["B", "A"]);
    assert_eq!(store.tasks()[0], b);
    assert_eq!(store.tasks()[1], a);
}

#[test]
fn reorder_rejects_partial_or_unknown_permutations() {
    let mut store = TaskStore::in_memory();
    let a = store.add_task("A", "", TaskPriority::Medium, None).expect("add task");
    let b = store.add_task("B", "", TaskPriority::Medium, None).expect("add task");

    assert!(!store.reorder_tasks(&[b.id]));
    assert!(!store.reorder_tasks(&[b.id, b.id]));
    assert!(!store.reorder_tasks(&[b.id, Uuid::new_v4()]));
    assert_eq!(titles(store.tasks()), vec!["A", "B"]);
    assert!(store.reorder_tasks(&[a.id, b.id]));
}

#[test]
fn scoped_reorder_keeps_interleaved_tasks_in_place() {
    let mut store = TaskStore::in_memory();
    let g = store.add_group("G", "").expect("add group");
    let g1 = store.add_task("g1", "", TaskPriority::Medium, Some(g.id)).expect("add task");
    store.add_task("x1", "", TaskPriority::Medium, None).expect("add task");
    let g2 = store.add_task("g2", "", TaskPriority::Medium, Some(g.id)).expect("add task");
    store.add_task("x2", "", TaskPriority::Medium, None).expect("add task");
    let g3 = store.add_task("g3", "", TaskPriority::Medium, Some(g.id)).expect("add task");

    let scope = TaskFilter::Group(Some(g.id));
    assert!(store.reorder_tasks_in(&scope, &[g3.id, g1.id, g2.id]));

    assert_eq!(titles(store.tasks()), vec!["g3", "x1", "g1", "x2", "g2"]);
    assert_eq!(
        titles(&store.tasks_for_group(Some(g.id))),
        vec!["g3", "g1", "g2"]
    );
}

#[test]
fn drag_move_in_status_section_translates_offsets() {
    let mut store = TaskStore::in_memory();
    let t1 = store.add_task("t1", "", TaskPriority::Medium, None).expect("add task");
    store.add_task("d1", "", TaskPriority::Medium, None).expect("add task");
    let t2 = store.add_task("t2", "", TaskPriority::Medium, None).expect("add task");
    let t3 = store.add_task("t3", "", TaskPriority::Medium, None).expect("add task");
    let d1 = store.tasks()[1].id;
    store.set_task_status(d1, TaskStatus::Done);

    // todo section is [t1, t2, t3]; drag t1 to the end
    let todo = TaskFilter::Status(TaskStatus::Todo);
    assert!(store.move_tasks(&todo, &[0], 3));

    assert_eq!(titles(store.tasks()), vec!["t2", "d1", "t3", "t1"]);
    let section: Vec<_> = store.tasks_matching(&todo).iter().map(|t| t.id).collect();
    assert_eq!(section, vec![t2.id, t3.id, t1.id]);

    assert!(!store.move_tasks(&todo, &[5], 0));
}

#[test]
fn remove_tasks_at_uses_view_offsets() {
    let mut store = TaskStore::in_memory();
    let g = store.add_group("G", "").expect("add group");
    store.add_task("g1", "", TaskPriority::Medium, Some(g.id)).expect("add task");
    store.add_task("x1", "", TaskPriority::Medium, None).expect("add task");
    store.add_task("g2", "", TaskPriority::Medium, Some(g.id)).expect("add task");

    let removed = store.remove_tasks_at(&TaskFilter::Group(Some(g.id)), &[1, 1, 9]);

    assert_eq!(removed, 1);
    assert_eq!(titles(store.tasks()), vec!["g1", "x1"]);
}

#[test]
fn group_reorder_and_move() {
    let mut store = TaskStore::in_memory();
    let a = store.add_group("A", "").expect("add group");
    let b = store.add_group("B", "").expect("add group");
    let c = store.add_group("C", "").expect("add group");

    assert!(store.reorder_groups(&[c.id, a.id, b.id]));
    let names: Vec<_> = store.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);

    assert!(store.move_groups(&[0], 3));
    let names: Vec<_> = store.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    assert!(!store.reorder_groups(&[a.id, b.id]));
}

#[test]
fn remove_groups_at_cascades() {
    let mut store = TaskStore::in_memory();
    let a = store.add_group("A", "").expect("add group");
    let b = store.add_group("B", "").expect("add group");
    let ta = store.add_task("ta", "", TaskPriority::Medium, Some(a.id)).expect("add task");
    let tb = store.add_task("tb", "", TaskPriority::Medium, Some(b.id)).expect("add task");

    assert_eq!(store.remove_groups_at(&[0]), 1);

    assert_eq!(store.groups().len(), 1);
    assert_eq!(store.groups()[0].id, b.id);
    assert_eq!(store.task(ta.id).expect("task exists").group_id, None);
    assert_eq!(store.task(tb.id).expect("task exists").group_id, Some(b.id));
    assert_eq!(store.remove_groups_at(&[3]), 0);
}

#[test]
fn active_task_count_ignores_done_tasks() {
    let mut store = TaskStore::in_memory();
    let g = store.add_group("G", "").expect("add group");
    let a = store.add_task("a", "", TaskPriority::Medium, Some(g.id)).expect("add task");
    store.add_task("b", "", TaskPriority::Medium, Some(g.id)).expect("add task");
    store.add_task("c", "", TaskPriority::Medium, None).expect("add task");

    store.set_task_status(a.id, TaskStatus::Done);

    assert_eq!(store.active_task_count(Some(g.id)), 1);
    assert_eq!(store.active_task_count(None), 1);
}

#[test]
fn listener_sees_cascade_details() {
    let mut store = TaskStore::in_memory();
    let g = store.add_group("G", "").expect("add group");
    let t = store.add_task("T", "", TaskPriority::Medium, Some(g.id)).expect("add task");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

    store.delete_group(g.id);
    store.clear();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            StoreChange::GroupsDeleted {
                group_ids: vec![g.id],
                cleared_tasks: vec![t.id],
            },
            StoreChange::Cleared,
        ]
    );
    assert!(store.tasks().is_empty());
}
