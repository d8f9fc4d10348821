pub mod irq;
pub mod spinlock;

pub use irq::IrqGuard;
pub use spinlock::{SpinLock, SpinLockGuard};
