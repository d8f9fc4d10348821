/*
 * Scheduler Manager
 *
 * The process-wide facade: a single SchedulerCore instance behind a
 * spin::Once, plus an enabled flag gating when timer interrupts are allowed
 * to actually initiate context switches. Thread lifecycle APIs work during
 * early boot before `enable()` is called; they just never publish a switch.
 */

use core::sync::atomic::{AtomicBool, Ordering};

use alloc::string::String;
use spin::Once;

use super::sched_core::SchedulerCore;
use super::thread::{ThreadFlags, ThreadId};
use super::types::CpuId;

static CORE: Once<SchedulerCore> = Once::new();
static ENABLED: AtomicBool = AtomicBool::new(false);

pub struct SchedulerManager;

impl SchedulerManager {
    /// Must be called exactly once, before any other method, with the
    /// number of logical CPUs the kernel brought online.
    pub fn init(cpu_count: usize) {
        CORE.call_once(|| SchedulerCore::new(cpu_count));
    }

    /// Permits `on_timer_interrupt` to start publishing context switches.
    pub fn enable() {
        ENABLED.store(true, Ordering::Release);
    }

    pub fn is_enabled() -> bool {
        ENABLED.load(Ordering::Acquire)
    }

    fn core() -> &'static SchedulerCore {
        CORE.get().expect("SchedulerManager::init was never called")
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_thread(
        name: String,
        cpu: CpuId,
        entry: usize,
        selector: u32,
        arg: usize,
        tickets: u64,
        flags: ThreadFlags,
    ) -> ThreadId {
        Self::core().create_thread(name, cpu, entry, selector, arg, tickets, flags)
    }

    pub fn ready_thread(tid: ThreadId, now_ns: u64) {
        Self::core().ready_thread(tid, now_ns);
    }

    pub fn block_thread(tid: ThreadId, now_ns: u64) {
        Self::core().block_thread(tid, now_ns);
    }

    pub fn exit_thread(tid: ThreadId) {
        Self::core().exit_thread(tid);
    }

    pub fn set_priority(tid: ThreadId, tickets: u64, now_ns: u64) {
        Self::core().set_priority(tid, tickets, now_ns);
    }

    pub fn get_priority(tid: ThreadId) -> u64 {
        Self::core().get_priority(tid)
    }

    pub fn select_cpu(tid: ThreadId) -> CpuId {
        Self::core().select_cpu(tid)
    }

    pub fn migrate_thread(tid: ThreadId, target: CpuId) {
        Self::core().migrate_thread(tid, target);
    }

    /// Spawns `name` on whichever CPU the policy selects for it, in state
    /// Created, then immediately readies it. Convenience wrapper over the
    /// create/select/migrate/ready sequence a caller would otherwise repeat.
    pub fn spawn_thread(
        name: String,
        home_cpu: CpuId,
        entry: usize,
        selector: u32,
        arg: usize,
        tickets: u64,
        flags: ThreadFlags,
        now_ns: u64,
    ) -> ThreadId {
        let tid = Self::create_thread(name, home_cpu, entry, selector, arg, tickets, flags);
        let target = Self::select_cpu(tid);
        if target != home_cpu {
            Self::migrate_thread(tid, target);
        }
        Self::ready_thread(tid, now_ns);
        tid
    }

    /// Called from each CPU's timer interrupt handler. No-op until
    /// `enable()` has been called.
    pub fn on_timer_interrupt(cpu_id: CpuId, saved_sp: u64, elapsed_ns: u64, now_ns: u64) {
        if !Self::is_enabled() {
            return;
        }
        Self::core().on_timer_interrupt(cpu_id, saved_sp, elapsed_ns, now_ns);
    }

    pub fn cpu_count() -> usize {
        Self::core().cpu_count()
    }
}
