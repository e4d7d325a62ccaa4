use std::sync::{Arc, Mutex};
use std::thread;

use tinysync::{TaskList, TaskPanic};

/// Resources opened in order and closed through the list in reverse.
#[test]
fn teardown_closes_in_reverse_acquisition_order() {
    let closed = Arc::new(Mutex::new(Vec::new()));
    let teardown = TaskList::new();

    for name in ["config", "database", "listener"] {
        let closed = Arc::clone(&closed);
        teardown.add(move || closed.lock().unwrap().push(name));
    }

    assert!(teardown.run().is_empty());
    assert_eq!(*closed.lock().unwrap(), ["listener", "database", "config"]);
}

#[test]
fn t2_panic_yields_exactly_one_error() {
    let ran = Arc::new(Mutex::new(Vec::new()));
    let list = TaskList::new();

    let r = Arc::clone(&ran);
    list.add(move || r.lock().unwrap().push("T1"));
    list.add(|| panic!("T2 failed"));
    let r = Arc::clone(&ran);
    list.add(move || r.lock().unwrap().push("T3"));

    let errors = list.run();
    assert_eq!(*ran.lock().unwrap(), ["T3", "T1"]);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].downcast_ref::<TaskPanic>().map(TaskPanic::message),
        Some("T2 failed")
    );

    assert!(list.run().is_empty());
    assert_eq!(ran.lock().unwrap().len(), 2);
}

#[test]
fn concurrent_run_executes_once() {
    let count = Arc::new(Mutex::new(0));
    let list = TaskList::new();
    for _ in 0..10 {
        let count = Arc::clone(&count);
        list.add(move || *count.lock().unwrap() += 1);
    }

    let list = &list;
    let errors: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(move || list.run().len())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(errors, 0);
    assert_eq!(*count.lock().unwrap(), 10);
    assert!(list.is_empty());
}
