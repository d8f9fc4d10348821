/*
 * x86-64 Architecture Support
 *
 * The slice of x86-64 the scheduler core touches directly: local interrupt
 * control and the context-switch contract. GDT/IDT setup, exception
 * handlers, and the timer ISR's register save/restore asm belong to boot
 * and HAL code outside this crate.
 */

pub mod contextswitch;
pub mod interrupts;

pub fn halt() {
    x86_64::instructions::hlt();
}
