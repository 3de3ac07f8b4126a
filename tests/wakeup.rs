use std::thread;
use std::time::{Duration, Instant};

use readywatch::Selector;

#[test]
fn wakeup_unblocks_a_concurrent_select() {
    let selector: Selector<()> = Selector::new().unwrap();
    let waker = selector.waker();

    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        waker.wake().unwrap();
    });

    let mut ready = Vec::new();
    let started = Instant::now();
    let n = selector.select(&mut ready, 16, Some(Duration::from_secs(5))).unwrap();

    handle.join().unwrap();

    assert_eq!(n, 0, "the wakeup endpoint must never be surfaced to the caller");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn wakeup_before_select_is_observed() {
    let selector: Selector<()> = Selector::new().unwrap();
    selector.waker().wake().unwrap();

    let mut ready = Vec::new();
    let n = selector
        .select(&mut ready, 16, Some(Duration::from_millis(500)))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn wakeup_after_close_is_best_effort_success() {
    let selector: Selector<()> = Selector::new().unwrap();
    let waker = selector.waker();
    selector.close().unwrap();
    assert!(waker.wake().is_ok());
}
