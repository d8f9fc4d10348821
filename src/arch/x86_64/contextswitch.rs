/*
 * Context-Switch Contract (x86-64)
 *
 * The core never switches stacks itself; it lays out a new thread's initial
 * stack, then publishes a saved stack pointer and an `is_new` flag that the
 * timer/yield interrupt epilogue reads on its way back to ring 0. That
 * epilogue — the asm that restores registers and executes iretq — is not
 * part of this crate; `_native_x64_set_context_switch_rsp` and
 * `_native_x64_set_context_switch_new_thread` are its entry points.
 */

pub const STACK_ALIGNMENT: usize = 16;

/// Minimal frame a never-run thread's stack holds. `is_new=1` consumers
/// branch straight to `entry` with `rdi` loaded and `cs` set, rather than
/// performing a full iretq register restore.
#[repr(C)]
struct NewThreadFrame {
    rdi: u64,
    cs: u64,
    rflags: u64,
    entry: u64,
}

const _: () = assert!(core::mem::size_of::<NewThreadFrame>() % STACK_ALIGNMENT == 0);

unsafe extern "C" {
    fn _native_x64_set_context_switch_rsp(sp: u64);
    fn _native_x64_set_context_switch_new_thread(is_new: i32);
}

/// Lays out `stack` so that the first context restore for this thread
/// branches to `entry` with `arg` in `rdi` and `selector` loaded as `cs`,
/// interrupts enabled.
pub fn initialize_stack(stack: &mut [u8], entry: usize, selector: u32, arg: usize) -> u64 {
    let base = stack.as_mut_ptr() as usize;
    let top = (base + stack.len()) & !(STACK_ALIGNMENT - 1);
    let frame_addr = top - core::mem::size_of::<NewThreadFrame>();
    assert!(frame_addr >= base, "stack too small to hold a new-thread frame");
    assert_eq!(frame_addr % STACK_ALIGNMENT, 0, "new-thread frame must be 16-byte aligned");

    let frame = NewThreadFrame {
        rdi: arg as u64,
        cs: selector as u64,
        rflags: 0x202, // IF = 1
        entry: entry as u64,
    };
    unsafe {
        core::ptr::write(frame_addr as *mut NewThreadFrame, frame);
    }
    frame_addr as u64
}

/// Publishes the two cells the interrupt epilogue reads before it returns.
pub fn publish_context_switch(sp: u64, is_new: bool) {
    unsafe {
        _native_x64_set_context_switch_rsp(sp);
        _native_x64_set_context_switch_new_thread(is_new as i32);
    }
}
