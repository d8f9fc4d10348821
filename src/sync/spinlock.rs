/*
 * Spin Lock
 *
 * The one synchronization primitive the scheduler core needs: a CAS-based
 * spin lock guarding a per-CPU or per-table value. Acquisition spins rather
 * than blocking, since blocking would require the scheduler itself.
 */

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// A spin lock protecting a value of type `T`.
///
/// `acquire`/`release`/`try_acquire` are the raw primitive; `lock`/`try_lock`
/// wrap them in an RAII guard for ergonomic use.
pub struct SpinLock<T> {
    locked: AtomicBool,
    value: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Spins until the lock is free, then takes it.
    pub fn acquire(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
    }

    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Takes the lock without spinning if it is already held.
    pub fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        self.acquire();
        SpinLockGuard { lock: self }
    }

    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self.try_acquire() {
            Some(SpinLockGuard { lock: self })
        } else {
            None
        }
    }
}

pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_acquire_fails_while_held() {
        let lock = SpinLock::new(0u32);
        let guard = lock.lock();
        assert!(!lock.try_acquire());
        drop(guard);
        assert!(lock.try_acquire());
        lock.release();
    }

    #[test]
    fn guard_mutates_value() {
        let lock = SpinLock::new(alloc::vec::Vec::<u32>::new());
        lock.lock().push(1);
        lock.lock().push(2);
        assert_eq!(*lock.lock(), alloc::vec![1, 2]);
    }
}
