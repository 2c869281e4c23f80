#![expect(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use test_case::test_case;
use tracing_test::traced_test;
use w800_osal::{ObjectAllocation, TaskSpec, Unbacked};

use crate::common::{TaskRecord, osal};

pub mod common;

#[test_case(4, "mlme")]
#[test_case(5, "scan")]
#[test_case(7, "rx")]
#[test_case(10, "bss")]
#[test_case(13, "supplicant")]
#[test_case(14, "supplicant timer")]
#[test_case(28, "plcp")]
#[test_case(9, "litepoint")]
#[test_case(3, "task")]
fn unnamed_task_gets_priority_name(priority: u8, expected: &str) {
    let (osal, _) = osal(ObjectAllocation::Kernel);

    let task = osal
        .task_create(TaskSpec::new(priority, 1024), |_: ()| {}, ())
        .unwrap();

    assert_eq!(task.name(), expected);
    assert_eq!(osal.kernel().task(*task.raw()).name, expected);
}

#[test]
fn task_is_created_running_with_configured_slice() {
    let (osal, _) = osal(ObjectAllocation::Kernel);

    let task = osal
        .task_create(TaskSpec::new(12, 2050).name("bt host"), |_: ()| {}, ())
        .unwrap();

    assert_eq!(
        osal.kernel().task(*task.raw()),
        TaskRecord {
            name: "bt host".to_owned(),
            priority: 12,
            time_slice: 50,
            stack_words: 512,
            static_stack: false,
            autorun: true,
            deleted: false,
        }
    );
}

#[test]
fn task_runs_with_caller_stack() {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    let stack: &'static mut [u8] = Box::leak(vec![0; 512].into_boxed_slice());

    let task = osal
        .task_create(TaskSpec::new(12, 512).stack(stack), |_: ()| {}, ())
        .unwrap();

    let record = osal.kernel().task(*task.raw());
    assert!(record.static_stack);
    assert_eq!(record.stack_words, 128);
}

#[test]
fn entry_receives_argument() {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    let seen = Arc::new(Mutex::new(None));

    let sink = seen.clone();
    osal.task_create(
        TaskSpec::new(20, 1024),
        move |argument: u32| *sink.lock().unwrap() = Some(argument),
        0xbeef,
    )
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(0xbeef));
}

#[test_case(20 ; "other priority")]
#[test_case(8 ; "well-known priority")]
fn dropped_handle_keeps_control_block(priority: u8) {
    let (osal, allocator) = osal(ObjectAllocation::Kernel);

    let task = osal
        .task_create(TaskSpec::new(priority, 1024), |_: ()| {}, ())
        .unwrap();
    assert_eq!(allocator.live(), 1);

    drop(task);
    assert_eq!(allocator.live(), 1);
}

#[test]
fn delete_by_priority_releases_control_block() {
    let (osal, allocator) = osal(ObjectAllocation::Kernel);
    osal.task_create(TaskSpec::new(2, 1024), |_: ()| {}, ())
        .unwrap();

    osal.task_delete_by_priority(2, None).unwrap();

    assert_eq!(allocator.live(), 0);
}

#[test]
fn replaced_task_keeps_control_block() {
    let (osal, allocator) = osal(ObjectAllocation::Kernel);
    for name in ["first", "second"] {
        osal.task_create(TaskSpec::new(9, 1024).name(name), |_: ()| {}, ())
            .unwrap();
    }
    assert_eq!(allocator.live(), 2);

    osal.task_delete_by_priority(9, None).unwrap();

    assert_eq!(allocator.live(), 1);
}

#[test]
fn failed_kernel_delete_keeps_control_block() {
    let (osal, allocator) = osal(ObjectAllocation::Kernel);
    osal.task_create(TaskSpec::new(8, 1024), |_: ()| {}, ())
        .unwrap();
    osal.kernel().fail("task_delete");

    assert!(osal.task_delete_by_priority(8, None).is_err());

    assert_eq!(allocator.live(), 1);
}

#[test]
fn failed_task_create_releases_control_block() {
    let (osal, allocator) = osal(ObjectAllocation::Kernel);
    osal.kernel().fail("task_create");

    assert!(
        osal.task_create(TaskSpec::new(8, 1024), |_: ()| {}, ())
            .is_err()
    );
    assert_eq!(allocator.total(), 1);
    assert_eq!(allocator.live(), 0);
    assert!(osal.task_at_priority(8).is_none());
}

#[test]
fn exhausted_allocator_fails_without_kernel_call() {
    let (osal, allocator) = osal(ObjectAllocation::Kernel);
    allocator.fail_at(1);

    assert!(
        osal.task_create(TaskSpec::new(8, 1024), |_: ()| {}, ())
            .is_err()
    );
    assert!(!osal.kernel().calls().contains(&"task_create"));
}

#[test]
fn delete_by_priority_removes_recorded_task() {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    let task = osal
        .task_create(TaskSpec::new(8, 1024), |_: ()| {}, ())
        .unwrap();

    osal.task_delete_by_priority(8, None).unwrap();

    assert!(osal.kernel().task(*task.raw()).deleted);
    assert!(osal.task_at_priority(8).is_none());
    assert!(osal.task_delete_by_priority(8, None).is_err());
}

#[test]
fn delete_by_priority_runs_cleanup_after_delete() {
    static CLEANUPS: AtomicUsize = AtomicUsize::new(0);

    let (osal, _) = osal(ObjectAllocation::Kernel);
    osal.task_create(TaskSpec::new(2, 1024), |_: ()| {}, ())
        .unwrap();

    osal.task_delete_by_priority(2, Some(|| {
        CLEANUPS.fetch_add(1, Ordering::SeqCst);
    }))
    .unwrap();

    assert_eq!(CLEANUPS.load(Ordering::SeqCst), 1);
}

#[test_case(0)]
#[test_case(3)]
#[test_case(7)]
#[test_case(63)]
fn delete_by_other_priority_fails(priority: u8) {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    osal.task_create(TaskSpec::new(priority, 1024), |_: ()| {}, ())
        .unwrap();

    assert!(osal.task_delete_by_priority(priority, None).is_err());
    assert!(!osal.kernel().calls().contains(&"task_delete"));
}

#[test]
fn delete_of_empty_slot_fails() {
    let (osal, _) = osal(ObjectAllocation::Kernel);

    assert!(osal.task_delete_by_priority(9, None).is_err());
}

#[test]
fn later_task_replaces_slot() {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    let first = osal
        .task_create(TaskSpec::new(9, 1024).name("first"), |_: ()| {}, ())
        .unwrap();
    let second = osal
        .task_create(TaskSpec::new(9, 1024).name("second"), |_: ()| {}, ())
        .unwrap();

    osal.task_delete_by_priority(9, None).unwrap();

    assert!(!osal.kernel().task(*first.raw()).deleted);
    assert!(osal.kernel().task(*second.raw()).deleted);
}

#[test]
fn slots_are_independent() {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    for priority in [2, 8, 9] {
        osal.task_create(TaskSpec::new(priority, 1024), |_: ()| {}, ())
            .unwrap();
    }

    osal.task_delete_by_priority(8, None).unwrap();

    assert!(osal.task_at_priority(2).is_some());
    assert!(osal.task_at_priority(8).is_none());
    assert!(osal.task_at_priority(9).is_some());
}

#[test]
fn failed_kernel_delete_keeps_slot() {
    static CLEANUPS: AtomicUsize = AtomicUsize::new(0);

    let (osal, _) = osal(ObjectAllocation::Kernel);
    osal.task_create(TaskSpec::new(8, 1024), |_: ()| {}, ())
        .unwrap();
    osal.kernel().fail("task_delete");

    assert!(
        osal.task_delete_by_priority(8, Some(|| {
            CLEANUPS.fetch_add(1, Ordering::SeqCst);
        }))
        .is_err()
    );

    assert!(osal.task_at_priority(8).is_some());
    assert_eq!(CLEANUPS.load(Ordering::SeqCst), 0);
}

#[test]
#[traced_test]
fn suspend_and_resume_are_unbacked() {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    let task = osal
        .task_create(TaskSpec::new(20, 1024), |_: ()| {}, ())
        .unwrap();

    assert_eq!(osal.task_suspend(&task), Ok(Unbacked));
    assert_eq!(osal.task_resume(&task), Ok(Unbacked));
    assert!(logs_contain("without kernel backing"));
}

#[test]
#[traced_test]
fn task_stats_list_well_known_tasks() {
    let (osal, _) = osal(ObjectAllocation::Kernel);
    osal.task_create(TaskSpec::new(8, 1024).name("bt controller"), |_: ()| {}, ())
        .unwrap();

    osal.display_task_stats();

    assert!(logs_contain("bt controller"));
}
