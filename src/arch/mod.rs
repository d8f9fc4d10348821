/*
 * Architecture Support
 *
 * Everything the scheduler core needs from the platform: local interrupt
 * control, an idle halt, and the context-switch contract (stack
 * initialization for new threads, publishing the switch-target cells). The
 * actual interrupt epilogue that consumes the published cells — the asm
 * that restores registers and executes iretq/eret — lives outside this
 * crate; these modules only declare the symbols it exports.
 */

#[cfg(target_arch = "x86_64")]
pub mod x86_64;
#[cfg(target_arch = "aarch64")]
pub mod aarch64;

#[cfg(target_arch = "x86_64")]
pub use self::x86_64 as native;
#[cfg(target_arch = "aarch64")]
pub use self::aarch64 as native;

pub use native::contextswitch::{STACK_ALIGNMENT, initialize_stack, publish_context_switch};
pub use native::halt;
pub use native::interrupts;
