/*
 * Scheduler Policy Trait
 *
 * Mechanism/policy split: the mechanism (SchedulerCore) never mutates
 * run-queue or virtual-time state
 * directly, it only translates kernel lifecycle operations into calls on
 * whichever policy is bound, holding the locks each call needs. A second
 * policy could be added later as another `impl Scheduler` without touching
 * the mechanism.
 */

use super::percpu::PerCpuState;
use super::thread::{ThreadId, ThreadTable};
use super::types::CpuId;

pub trait Scheduler: Send {
    /// A thread has just been allocated, in state Created. Bookkeeping
    /// only — it does not enter a run queue here.
    fn on_create(&mut self, table: &mut ThreadTable, cpu: &mut PerCpuState, tid: ThreadId);

    /// The thread is becoming Ready, either for the first time (from
    /// Created) or on wake (from Blocked). `table.get(tid).state` still
    /// holds the prior state when this is called.
    fn on_ready(&mut self, table: &mut ThreadTable, cpu: &mut PerCpuState, tid: ThreadId, now_ns: u64);

    /// The thread is becoming Blocked.
    fn on_blocked(&mut self, table: &mut ThreadTable, cpu: &mut PerCpuState, tid: ThreadId, now_ns: u64);

    /// The thread is becoming Exited and will never run again.
    fn on_exit(&mut self, table: &mut ThreadTable, cpu: &mut PerCpuState, tid: ThreadId);

    /// A Running thread is being returned to Ready, either because it
    /// yielded voluntarily or because the tick handler preempted it.
    fn on_yield(&mut self, table: &mut ThreadTable, cpu: &mut PerCpuState, tid: ThreadId, now_ns: u64);

    /// Removes and returns the thread that should run next, or None if the
    /// run queue is empty.
    fn pick_next(&mut self, table: &mut ThreadTable, cpu: &mut PerCpuState) -> Option<ThreadId>;

    /// Accounts `elapsed_ns` of runtime against `current`. Returns whether
    /// the mechanism should preempt it.
    fn on_tick(
        &mut self,
        table: &mut ThreadTable,
        cpu: &mut PerCpuState,
        current: ThreadId,
        elapsed_ns: u64,
        now_ns: u64,
    ) -> bool;

    /// Chooses the CPU a Ready thread should be admitted to.
    /// `candidates` is `(cpu, total_tickets)` for every other online CPU.
    fn select_cpu(
        &self,
        pinned: bool,
        current: CpuId,
        current_total_tickets: u64,
        candidates: &[(CpuId, u64)],
    ) -> CpuId;

    /// Moves a thread from `source`'s run queue into `target`'s.
    fn on_migrate(
        &mut self,
        table: &mut ThreadTable,
        source: &mut PerCpuState,
        target: &mut PerCpuState,
        tid: ThreadId,
    );

    /// `empty` has no Ready threads; attempts a pull-steal from `donor`.
    /// Returns the migrated thread, if any.
    fn balance(
        &mut self,
        table: &mut ThreadTable,
        empty: &mut PerCpuState,
        donor: &mut PerCpuState,
    ) -> Option<ThreadId>;

    /// Re-ranks a thread under a new ticket count.
    fn set_priority(
        &mut self,
        table: &mut ThreadTable,
        cpu: &mut PerCpuState,
        tid: ThreadId,
        tickets: u64,
        now_ns: u64,
    );

    fn get_priority(&self, table: &ThreadTable, tid: ThreadId) -> u64;

    fn name(&self) -> &'static str;
}
