/*
 * Interrupt Control (x86-64)
 *
 * Thin wrappers over the x86-64 interrupt flag. The RAII disable-scope built
 * on top of these lives in `sync::irq`, not here, so it stays
 * architecture-independent.
 */

use x86_64::instructions::interrupts;

pub fn enable() {
    interrupts::enable();
}

pub fn disable() {
    interrupts::disable();
}

pub fn are_enabled() -> bool {
    interrupts::are_enabled()
}
