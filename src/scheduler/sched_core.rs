/*
 * Scheduler Core
 *
 * The mechanism half of the split described in traits.rs: owns the thread
 * table, one PerCpuState per logical CPU, and the bound policy, and
 * translates kernel-facing lifecycle calls into policy calls while holding
 * whatever locks each one needs. Locks are always taken in a fixed order —
 * per-CPU state(s) before the thread table, and ascending CPU id when two
 * CPUs are involved — so no call path can deadlock against another.
 */

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::sync::{IrqGuard, SpinLock, SpinLockGuard};

use super::percpu::PerCpuState;
use super::thread::{Thread, ThreadFlags, ThreadId, ThreadState, ThreadTable};
use super::traits::Scheduler;
use super::types::CpuId;

/// Bounded retries for cross-CPU balance locking; giving up silently after
/// this many attempts is acceptable since balancing is opportunistic, never
/// load-bearing for correctness.
const BALANCE_LOCK_RETRIES: u32 = 8;

pub struct SchedulerCore {
    next_id: AtomicU32,
    threads: SpinLock<ThreadTable>,
    cpus: Vec<SpinLock<PerCpuState>>,
    policy: SpinLock<Box<dyn Scheduler>>,
}

impl SchedulerCore {
    pub fn new(cpu_count: usize) -> Self {
        let cpus = (0..cpu_count)
            .map(|i| SpinLock::new(PerCpuState::new(CpuId(i as u32))))
            .collect();
        Self {
            next_id: AtomicU32::new(1),
            threads: SpinLock::new(ThreadTable::new()),
            cpus,
            policy: SpinLock::new(Box::new(super::stride::StridePolicy::new())),
        }
    }

    pub fn cpu_count(&self) -> usize {
        self.cpus.len()
    }

    fn cpu(&self, id: CpuId) -> &SpinLock<PerCpuState> {
        &self.cpus[id.index()]
    }

    /// Raw per-CPU state access. The caller is responsible for holding an
    /// `IrqGuard` for as long as it holds the returned guard, so a timer
    /// interrupt on this CPU can't try to re-acquire the same lock.
    pub fn get_cpu_state(&self, id: CpuId) -> SpinLockGuard<'_, PerCpuState> {
        self.cpu(id).lock()
    }

    /// Allocates a descriptor in state Created. Does not enter a run queue
    /// Create and ready are distinct operations.
    #[allow(clippy::too_many_arguments)]
    pub fn create_thread(
        &self,
        name: String,
        cpu: CpuId,
        entry: usize,
        selector: u32,
        arg: usize,
        tickets: u64,
        flags: ThreadFlags,
    ) -> ThreadId {
        let tid = ThreadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let thread = Thread::new(tid, name, cpu, entry, selector, arg, tickets, flags);

        // Disable interrupts before taking this CPU's lock: a timer tick on
        // the same CPU would otherwise spin forever waiting for a lock we
        // already hold.
        let _irq = IrqGuard::new();
        let mut cpu_state = self.cpu(cpu).lock();
        let mut table = self.threads.lock();
        table.insert(thread);
        self.policy.lock().on_create(&mut table, &mut cpu_state, tid);
        tid
    }

    /// Admits a thread to its CPU's run queue, from Created or from Blocked.
    pub fn ready_thread(&self, tid: ThreadId, now_ns: u64) {
        let _irq = IrqGuard::new();
        let cpu = {
            let table = self.threads.lock();
            table.get(tid).expect("ready_thread: unknown thread").cpu
        };
        let mut cpu_state = self.cpu(cpu).lock();
        let mut table = self.threads.lock();
        self.policy.lock().on_ready(&mut table, &mut cpu_state, tid, now_ns);
        table.get_mut(tid).unwrap().set_state(ThreadState::Ready);
    }

    /// Transitions the current thread on a CPU to Blocked.
    pub fn block_thread(&self, tid: ThreadId, now_ns: u64) {
        let _irq = IrqGuard::new();
        let cpu = {
            let table = self.threads.lock();
            table.get(tid).expect("block_thread: unknown thread").cpu
        };
        let mut cpu_state = self.cpu(cpu).lock();
        let mut table = self.threads.lock();
        self.policy.lock().on_blocked(&mut table, &mut cpu_state, tid, now_ns);
        table.get_mut(tid).unwrap().set_state(ThreadState::Blocked);
        if cpu_state.current == Some(tid) {
            cpu_state.current = None;
        }
    }

    /// Terminates a thread from any non-Exited state.
    pub fn exit_thread(&self, tid: ThreadId) {
        let _irq = IrqGuard::new();
        let cpu = {
            let table = self.threads.lock();
            table.get(tid).expect("exit_thread: unknown thread").cpu
        };
        let mut cpu_state = self.cpu(cpu).lock();
        let mut table = self.threads.lock();
        self.policy.lock().on_exit(&mut table, &mut cpu_state, tid);
        table.get_mut(tid).unwrap().set_state(ThreadState::Exited);
        if cpu_state.current == Some(tid) {
            cpu_state.current = None;
        }
    }

    /// Re-ranks a thread under a new ticket count. Zero or negative tickets
    /// are a programming fault, not a value to saturate.
    pub fn set_priority(&self, tid: ThreadId, tickets: u64, now_ns: u64) {
        assert!(tickets >= 1, "set_priority: tickets must be >= 1");
        let _irq = IrqGuard::new();
        let cpu = {
            let table = self.threads.lock();
            table.get(tid).expect("set_priority: unknown thread").cpu
        };
        let mut cpu_state = self.cpu(cpu).lock();
        let mut table = self.threads.lock();
        self.policy
            .lock()
            .set_priority(&mut table, &mut cpu_state, tid, tickets, now_ns);
    }

    pub fn get_priority(&self, tid: ThreadId) -> u64 {
        let _irq = IrqGuard::new();
        let table = self.threads.lock();
        self.policy.lock().get_priority(&table, tid)
    }

    /// Chooses a CPU for a newly readied thread, honoring Pinned.
    pub fn select_cpu(&self, tid: ThreadId) -> CpuId {
        let _irq = IrqGuard::new();
        let (pinned, current) = {
            let table = self.threads.lock();
            let thread = table.get(tid).expect("select_cpu: unknown thread");
            (thread.flags.contains(ThreadFlags::PINNED), thread.cpu)
        };
        if pinned {
            return current;
        }
        let current_total = self.cpu(current).lock().stride.total_tickets;
        let candidates: Vec<(CpuId, u64)> = self
            .cpus
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != current.index())
            .map(|(i, lock)| (CpuId(i as u32), lock.lock().stride.total_tickets))
            .collect();
        self.policy
            .lock()
            .select_cpu(pinned, current, current_total, &candidates)
    }

    /// Moves a thread between CPUs, locking source and target in ascending
    /// CPU-id order regardless of migration direction.
    pub fn migrate_thread(&self, tid: ThreadId, target: CpuId) {
        let _irq = IrqGuard::new();
        let source = {
            let table = self.threads.lock();
            table.get(tid).expect("migrate_thread: unknown thread").cpu
        };
        if source == target {
            return;
        }
        let (lo, hi) = if source.index() < target.index() {
            (source, target)
        } else {
            (target, source)
        };
        let mut lo_guard = self.cpu(lo).lock();
        let mut hi_guard = self.cpu(hi).lock();
        let mut table = self.threads.lock();
        let (src, dst) = if source == lo {
            (&mut *lo_guard, &mut *hi_guard)
        } else {
            (&mut *hi_guard, &mut *lo_guard)
        };
        self.policy.lock().on_migrate(&mut table, src, dst, tid);
    }

    /// Called from the timer interrupt handler for `cpu_id`. Accounts
    /// elapsed runtime, decides whether to preempt, and publishes the
    /// context-switch cells the architecture epilogue reads before
    /// returning from the IRQ. This method is itself the IRQ handler's
    /// entry, so it does not take its own `IrqGuard` — the CPU has already
    /// masked the local timer line on entry.
    pub fn on_timer_interrupt(&self, cpu_id: CpuId, saved_sp: u64, elapsed_ns: u64, now_ns: u64) {
        let mut cpu_state = self.cpu(cpu_id).lock();
        let mut table = self.threads.lock();
        let mut policy = self.policy.lock();

        let preempt = match cpu_state.current {
            Some(current) => {
                if let Some(thread) = table.get_mut(current) {
                    thread.stack_ptr = saved_sp;
                }
                policy.on_tick(&mut table, &mut cpu_state, current, elapsed_ns, now_ns)
            }
            None => true,
        };

        if !preempt {
            return;
        }

        if let Some(current) = cpu_state.current.take() {
            if table.get(current).map(|t| t.state) == Some(ThreadState::Running) {
                table.get_mut(current).unwrap().set_state(ThreadState::Ready);
                policy.on_yield(&mut table, &mut cpu_state, current, now_ns);
            }
        }

        match policy.pick_next(&mut table, &mut cpu_state) {
            Some(next) => {
                let thread = table.get_mut(next).expect("on_timer_interrupt: picked unknown thread");
                let is_new = !thread.ever_run;
                thread.ever_run = true;
                thread.set_state(ThreadState::Running);
                let sp = thread.stack_ptr;
                cpu_state.current = Some(next);

                drop(policy);
                drop(table);
                cpu_state.publish(sp, is_new);
            }
            None => {
                // Nothing ready: publish the idle stack so the epilogue has
                // a valid target. It halts with interrupts enabled, so the
                // next timer tick re-enters this same path.
                drop(policy);
                drop(table);
                cpu_state.publish_idle();
            }
        }

        if cpu_state.tick_balance_counter() && cpu_state.stride.run_queue.is_empty() {
            drop(cpu_state);
            self.try_balance(cpu_id);
        }
    }

    /// Pull-model load balance: an empty CPU scans the others for the
    /// busiest donor and steals its tail thread.
    pub fn try_balance(&self, empty_cpu: CpuId) {
        let _irq = IrqGuard::new();
        let mut best: Option<(CpuId, usize)> = None;
        for (i, lock) in self.cpus.iter().enumerate() {
            if i == empty_cpu.index() {
                continue;
            }
            if let Some(guard) = lock.try_lock() {
                let len = guard.stride.run_queue.len();
                if best.map(|(_, best_len)| len > best_len).unwrap_or(len > 0) {
                    best = Some((CpuId(i as u32), len));
                }
            }
        }

        let Some((donor_id, _)) = best else { return };
        let (lo, hi) = if empty_cpu.index() < donor_id.index() {
            (empty_cpu, donor_id)
        } else {
            (donor_id, empty_cpu)
        };

        for attempt in 0..BALANCE_LOCK_RETRIES {
            let Some(mut lo_guard) = self.cpu(lo).try_lock() else {
                if attempt + 1 == BALANCE_LOCK_RETRIES {
                    return;
                }
                continue;
            };
            let Some(mut hi_guard) = self.cpu(hi).try_lock() else {
                drop(lo_guard);
                if attempt + 1 == BALANCE_LOCK_RETRIES {
                    return;
                }
                continue;
            };
            let mut table = self.threads.lock();
            let (empty, donor) = if empty_cpu == lo {
                (&mut *lo_guard, &mut *hi_guard)
            } else {
                (&mut *hi_guard, &mut *lo_guard)
            };
            self.policy.lock().balance(&mut table, empty, donor);
            return;
        }
    }
}
