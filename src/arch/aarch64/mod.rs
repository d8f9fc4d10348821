/*
 * ARM64 Architecture Support
 *
 * Mirrors `arch::x86_64`: local interrupt control and the context-switch
 * contract, nothing else. The exception-vector table and eret epilogue are
 * boot/HAL concerns outside this crate.
 */

pub mod contextswitch;
pub mod interrupts;

pub fn halt() {
    aarch64_cpu::asm::wfi();
}
