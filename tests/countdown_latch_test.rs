use safe_queue::CountdownLatch;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn wait_returns_at_once_when_already_zero() {
    let latch = CountdownLatch::new(0);
    latch.wait();
    assert_eq!(latch.count(), 0);
}

#[test]
fn count_down_saturates_at_zero() {
    let latch = CountdownLatch::new(2);
    latch.count_down();
    assert_eq!(latch.count(), 1);
    latch.count_down();
    latch.count_down();
    assert_eq!(latch.count(), 0);
}

#[test]
fn waiters_released_after_last_count_down() {
    let latch = CountdownLatch::new(3);
    let released = Arc::new(AtomicUsize::new(0));

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let (latch, released) = (latch.clone(), released.clone());
            thread::spawn(move || {
                latch.wait();
                released.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    latch.count_down();
    latch.count_down();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(released.load(Ordering::SeqCst), 0);

    latch.count_down();
    for waiter in waiters {
        waiter.join().unwrap();
    }
    assert_eq!(released.load(Ordering::SeqCst), 4);
}
