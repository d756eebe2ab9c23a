use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use super::*;
use crate::{
    memory::InMemoryTaskList,
    task::{TaskAttribute, TaskData, attribute},
};

/// A task list of one repository task created at `created`.
fn repository_list(created: DateTime<Utc>) -> (Arc<InMemoryTaskList>, Task) {
    let list = Arc::new(InMemoryTaskList::new());
    let mut task = Task::repository("http://bugs/1", "bugzilla", "Crash in the save dialog");
    task.creation_date = Some(created);
    list.add_task(task.clone());
    list.set_task_data(
        &task.handle,
        TaskData::new(vec![
            TaskAttribute::new(attribute::SUMMARY, "Crash in the save dialog"),
            TaskAttribute::new(attribute::DESCRIPTION, "segfault while writing the file"),
            TaskAttribute::new(attribute::STATUS, "NEW"),
        ]),
    );
    (list, task)
}

fn open(list: &Arc<InMemoryTaskList>) -> TaskListIndex {
    TaskListIndex::in_memory(list.clone(), IndexOptions::synchronous()).unwrap()
}

fn find_all(index: &TaskListIndex, pattern: &str) -> Vec<String> {
    let mut handles = Vec::new();
    index.find(pattern, |task| handles.push(task.handle), 100);
    handles.sort();
    handles
}

#[test]
fn matches_summary() {
    let (list, task) = repository_list(Utc::now());
    let index = open(&list);

    assert!(index.matches(&task, "crash"));
    assert!(index.matches(&task, "sav"));
    assert!(!index.matches(&task, "segfault"));
    assert!(!index.matches(&task, "unrelated"));
}

#[test]
fn description_is_content_not_summary() {
    let (list, task) = repository_list(Utc::now());
    let index = open(&list);

    assert!(!index.matches(&task, "summary:segfault"));
    assert!(index.matches(&task, "content:segfault"));
    assert!(index.matches(&task, "description:segfault"));

    index.set_default_field(TaskField::Content);
    assert_eq!(index.default_field(), TaskField::Content);
    assert!(index.matches(&task, "segfault"));
}

#[test]
fn local_notes_are_content() {
    let list = Arc::new(InMemoryTaskList::new());
    let mut task = Task::local("local-1", "Plan the release");
    task.notes = "remember the changelog".into();
    list.add_task(task.clone());
    let index = open(&list);

    assert!(index.matches(&task, "plan"));
    assert!(!index.matches(&task, "changelog"));
    assert!(index.matches(&task, "content:changelog"));
}

#[test]
fn creation_date_ranges() {
    let created = Utc.with_ymd_and_hms(2011, 10, 20, 9, 0, 0).unwrap();
    let (list, task) = repository_list(created);
    let index = open(&list);

    assert!(!index.matches(&task, "creation_date:[20010101 TO 20010105]"));
    assert!(index.matches(&task, "creation_date:[20111019 TO 20111022]"));
    assert!(index.matches(&task, "creation_date:{20111020 TO 20111022}"));
    assert!(!index.matches(&task, "creation_date:[20111021 TO 20111022]"));
}

#[test]
fn find_returns_each_matching_task_once() {
    let (list, task) = repository_list(Utc::now());
    let index = open(&list);

    let mut found = Vec::new();
    let count = index.find("crash", |task| found.push(task), 10);
    assert_eq!(count, 1);
    assert_eq!(found, vec![task]);

    assert_eq!(index.find("nothing", |_| panic!("no match expected"), 10), 0);
    assert_eq!(index.find("crash", |_| panic!("limit is zero"), 0), 0);
}

#[test]
fn find_skips_tasks_missing_from_the_repository() {
    let list = Arc::new(InMemoryTaskList::new());
    list.add_task(Task::local("local-1", "Write docs"));
    list.add_task(Task::local("local-2", "Write tests"));

    let dir = TempDir::new().unwrap();
    let location = StoreLocation::directory(dir.path());
    let full = TaskListIndex::open(list.clone(), location.clone(), IndexOptions::synchronous())
        .unwrap();
    full.close();

    // Reopen over a list that only knows one of the indexed tasks.
    let partial = Arc::new(InMemoryTaskList::new());
    partial.add_task(Task::local("local-2", "Write tests"));
    let index = TaskListIndex::open(
        partial.clone(),
        location,
        IndexOptions::default().with_startup_delay(Duration::from_secs(60)),
    )
    .unwrap();
    assert_eq!(index.indexed_document_count().unwrap(), 2);
    assert_eq!(find_all(&index, "write"), vec!["local-2"]);
}

#[test]
fn updates_replace_stale_documents() {
    let list = Arc::new(InMemoryTaskList::new());
    let mut task = Task::local("local-1", "Old summary");
    list.add_task(task.clone());
    let index = open(&list);
    assert!(index.matches(&task, "old"));

    task.summary = "New summary".into();
    list.update_task(task.clone());
    assert!(!index.matches(&task, "old"));
    assert!(index.matches(&task, "new"));
    assert_eq!(index.indexed_document_count().unwrap(), 1);
}

#[test]
fn repository_data_updates_are_indexed() {
    let (list, task) = repository_list(Utc::now());
    let index = open(&list);
    assert!(!index.matches(&task, "content:deadlock"));

    list.set_task_data(
        &task.handle,
        TaskData::new(vec![
            TaskAttribute::new(attribute::SUMMARY, "Crash in the save dialog"),
            TaskAttribute::new(attribute::DESCRIPTION, "deadlock in the writer"),
        ]),
    );
    assert!(index.matches(&task, "content:deadlock"));
    assert!(!index.matches(&task, "content:segfault"));
}

#[test]
fn removed_local_tasks_are_deleted() {
    let list = Arc::new(InMemoryTaskList::new());
    let task = Task::local("local-1", "Temporary task");
    list.add_task(task.clone());
    list.add_task(Task::local("local-2", "Permanent task"));
    let index = open(&list);
    assert_eq!(index.indexed_document_count().unwrap(), 2);

    list.remove_task("local-1");
    assert!(!index.matches(&task, "temporary"));
    assert_eq!(index.indexed_document_count().unwrap(), 1);
}

#[test]
fn reindex_is_idempotent() {
    let (list, task) = repository_list(Utc::now());
    list.add_task(Task::local("local-1", "Crash report triage"));
    let index = open(&list);

    let before = find_all(&index, "crash");
    index.reindex();
    index.reindex();
    index.wait_until_idle();
    assert_eq!(find_all(&index, "crash"), before);
    assert_eq!(index.indexed_document_count().unwrap(), 2);
    assert!(index.matches(&task, "crash"));
}

#[test]
fn reset_command_rebuilds_and_still_matches() {
    let list = Arc::new(InMemoryTaskList::new());
    let task = Task::local("local-1", "Rebuild on demand");
    list.add_task(task.clone());
    let index = open(&list);

    // A task added while the index is closed to notifications is only
    // picked up by a rebuild.
    list.remove_listener(index.listener);
    let late = Task::local("local-2", "Added behind the index's back");
    list.add_task(late.clone());
    assert!(!index.matches(&late, "added"));

    index.matches(&task, RESET_COMMAND);
    assert!(index.matches(&late, "added"));
}

#[test]
fn delayed_runs_complete_before_idle() {
    let (list, task) = repository_list(Utc::now());
    let options = IndexOptions::default()
        .with_startup_delay(Duration::from_millis(20))
        .with_reindex_delay(Duration::from_millis(20));
    let index = TaskListIndex::in_memory(list.clone(), options).unwrap();
    assert_eq!(index.maintenance_state(), MaintenanceState::ScheduledStartup);
    assert_eq!(index.startup_delay(), Duration::from_millis(20));

    index.wait_until_idle();
    assert_eq!(index.maintenance_state(), MaintenanceState::Idle);
    assert!(index.last_maintenance_run().unwrap().rebuilt);
    assert!(index.matches(&task, "crash"));

    let mut task = task;
    task.summary = "Hang in the save dialog".into();
    list.update_task(task.clone());
    list.set_task_data(
        &task.handle,
        TaskData::new(vec![TaskAttribute::new(attribute::SUMMARY, "Hang in the save dialog")]),
    );
    index.wait_until_idle();
    assert!(index.matches(&task, "hang"));
}

#[test]
fn max_match_hits_caps_matching() {
    let list = Arc::new(InMemoryTaskList::new());
    for i in 0..5 {
        list.add_task(Task::local(format!("local-{i}"), "same words"));
    }
    let index = open(&list);
    let matched = |index: &TaskListIndex| {
        list.all_tasks()
            .iter()
            .filter(|task| index.matches(task, "same"))
            .count()
    };
    assert_eq!(matched(&index), 5);

    index.set_max_match_hits(2);
    assert_eq!(index.max_match_hits(), 2);
    assert_eq!(matched(&index), 2);
}

#[test]
fn close_is_idempotent_and_disables_queries() {
    let (list, task) = repository_list(Utc::now());
    let index = open(&list);
    assert_eq!(list.listener_count(), 1);

    index.close();
    index.close();
    assert!(index.is_closed());
    assert_eq!(list.listener_count(), 0);
    assert!(!index.matches(&task, "crash"));
    assert_eq!(index.find("crash", |_| panic!("closed"), 10), 0);
    index.reindex();
    assert!(matches!(
        index.indexed_document_count(),
        Err(IndexError::Closed)
    ));
}

#[test]
fn drop_unregisters_listener() {
    let (list, _) = repository_list(Utc::now());
    {
        let _index = open(&list);
        assert_eq!(list.listener_count(), 1);
    }
    assert_eq!(list.listener_count(), 0);
}

#[test]
fn settings_are_adjustable() {
    let (list, _) = repository_list(Utc::now());
    let index = open(&list);
    assert_eq!(index.reindex_delay(), Duration::ZERO);
    index.set_reindex_delay(Duration::from_millis(5));
    assert_eq!(index.reindex_delay(), Duration::from_millis(5));
}

#[test]
fn invalid_options_are_rejected() {
    let list = Arc::new(InMemoryTaskList::new());
    let options = IndexOptions::default().with_startup_delay(Duration::from_secs(120));
    assert!(matches!(
        TaskListIndex::in_memory(list.clone(), options),
        Err(IndexError::InvalidSetting { .. })
    ));
    assert_eq!(list.listener_count(), 0);
}

#[test]
fn concurrent_matching() {
    let list = Arc::new(InMemoryTaskList::new());
    for i in 0..50 {
        list.add_task(Task::local(format!("local-{i}"), format!("task number {i}")));
    }
    let index = Arc::new(open(&list));

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let index = Arc::clone(&index);
            let list = Arc::clone(&list);
            thread::spawn(move || {
                let pattern = if worker % 2 == 0 { "task" } else { "number" };
                list.all_tasks()
                    .iter()
                    .filter(|task| index.matches(task, pattern))
                    .count()
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 50);
    }
}

#[test]
fn matching_continues_during_updates() {
    let list = Arc::new(InMemoryTaskList::new());
    let mut tasks: Vec<Task> = (0..50)
        .map(|i| Task::local(format!("local-{i}"), format!("task r0 number {i}")))
        .collect();
    for task in &tasks {
        list.add_task(task.clone());
    }
    let options = IndexOptions::synchronous().with_reindex_delay(Duration::from_millis(1));
    let index = Arc::new(TaskListIndex::in_memory(list.clone(), options).unwrap());
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let list = Arc::clone(&list);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut queries = 0;
                while !stop.load(Ordering::SeqCst) {
                    for task in list.all_tasks() {
                        index.matches(&task, "task");
                        queries += 1;
                    }
                }
                queries
            })
        })
        .collect();

    for round in 1..=20 {
        for (i, task) in tasks.iter_mut().enumerate() {
            task.summary = format!("task r{round} number {i}");
            list.update_task(task.clone());
        }
    }
    stop.store(true, Ordering::SeqCst);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    index.wait_until_idle();
    assert_eq!(index.indexed_document_count().unwrap(), 50);
    for task in &tasks {
        assert!(index.matches(task, "r20"));
        assert!(!index.matches(task, "r19"));
    }
}

/// Makes the store unreadable underneath an open index.
fn break_store(index: &TaskListIndex, dir: &Path) {
    index.inner.cache.invalidate();
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn unreadable_store_at_query_time_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index");
    let (list, task) = repository_list(Utc::now());
    let options = IndexOptions::synchronous().with_reindex_delay(Duration::from_millis(20));
    let index = TaskListIndex::open(list.clone(), StoreLocation::directory(&path), options)
        .unwrap();
    assert!(index.matches(&task, "crash"));

    break_store(&index, &path);
    assert_eq!(index.find("crash", |_| panic!("store is unreadable"), 10), 0);
    index.wait_until_idle();
    assert_eq!(find_all(&index, "crash"), vec![task.handle.clone()]);

    break_store(&index, &path);
    assert!(!index.matches(&task, "crash"));
    index.wait_until_idle();
    assert!(index.last_maintenance_run().unwrap().rebuilt);
    assert!(index.matches(&task, "crash"));
    assert_eq!(index.indexed_document_count().unwrap(), 1);
}

#[test]
fn directory_store_persists_between_opens() {
    let dir = TempDir::new().unwrap();
    let location = StoreLocation::directory(dir.path().join("index"));
    let (list, task) = repository_list(Utc::now());

    {
        let index =
            TaskListIndex::open(list.clone(), location.clone(), IndexOptions::synchronous())
                .unwrap();
        assert!(index.matches(&task, "crash"));
    }

    // No run has happened yet, so matches come from the persisted store.
    let index = TaskListIndex::open(
        list.clone(),
        location,
        IndexOptions::default().with_startup_delay(Duration::from_secs(60)),
    )
    .unwrap();
    assert!(index.matches(&task, "crash"));
}

#[test]
fn corrupt_directory_store_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("meta.json"), "not json").unwrap();
    let (list, task) = repository_list(Utc::now());

    let index = TaskListIndex::open(
        list.clone(),
        StoreLocation::directory(dir.path()),
        IndexOptions::synchronous(),
    )
    .unwrap();
    assert!(index.matches(&task, "crash"));
}
