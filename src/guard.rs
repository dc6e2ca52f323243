//! Reentrant critical section around resolution state.
//!
//! Construction of a unit can execute code that imports further units, which
//! re-enters the resolver on the same thread, so the lock is reentrant. The
//! context inside is borrowed only for short, non-reentrant updates.

use std::cell::RefCell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::context::ResolutionContext;

pub type GuardHold<'a> = ReentrantMutexGuard<'a, RefCell<ResolutionContext>>;

#[derive(Debug, Default)]
pub struct ResolutionGuard {
    lock: ReentrantMutex<RefCell<ResolutionContext>>,
}

impl ResolutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section; held until the returned guard drops.
    pub fn enter(&self) -> GuardHold<'_> {
        self.lock.lock()
    }

    /// Run `f` against the context, entering the critical section if this
    /// thread is not already inside it.
    pub fn with<R>(&self, f: impl FnOnce(&mut ResolutionContext) -> R) -> R {
        let hold = self.lock.lock();
        let mut ctx = hold.borrow_mut();
        f(&mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn reentry_on_same_thread() {
        let guard = ResolutionGuard::new();
        let _outer = guard.enter();
        let _inner = guard.enter();
        assert_eq!(guard.with(|ctx| ctx.depth()), 0);
    }

    #[test]
    fn other_threads_wait() {
        let guard = Arc::new(ResolutionGuard::new());
        let hold = guard.enter();

        let other = guard.clone();
        let handle = thread::spawn(move || other.with(|ctx| ctx.is_idle()));
        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!handle.is_finished());

        drop(hold);
        assert!(handle.join().unwrap());
    }
}
