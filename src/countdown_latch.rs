use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Lets threads wait until a fixed number of `count_down` calls have happened.
#[derive(Clone)]
pub struct CountdownLatch {
    pair: Arc<(Mutex<usize>, Condvar)>,
}

impl CountdownLatch {
    pub fn new(count: usize) -> CountdownLatch {
        CountdownLatch {
            pair: Arc::new((Mutex::new(count), Condvar::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        let (lock, _) = &*self.pair;
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the count reaches zero. Returns at once if it already has.
    pub fn wait(&self) {
        let (_, cvar) = &*self.pair;
        let mut count = self.lock();
        while *count > 0 {
            count = cvar.wait(count).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn count_down(&self) {
        let (_, cvar) = &*self.pair;
        let mut count = self.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            cvar.notify_all();
        }
    }

    pub fn count(&self) -> usize {
        *self.lock()
    }
}
