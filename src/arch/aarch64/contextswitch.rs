/*
 * Context-Switch Contract (ARM64)
 *
 * Same contract as x86-64, varying only the epilogue: no code-segment
 * selector exists on ARM64, so `initialize_stack`'s `selector` argument is
 * ignored here.
 */

pub const STACK_ALIGNMENT: usize = 16;

#[repr(C)]
struct NewThreadFrame {
    x0: u64,
    pc: u64,
    pstate: u64,
    _reserved: u64,
}

const _: () = assert!(core::mem::size_of::<NewThreadFrame>() % STACK_ALIGNMENT == 0);

unsafe extern "C" {
    fn _native_arm64_set_context_switch_sp(sp: u64);
    fn _native_arm64_set_context_switch_new_thread(is_new: i32);
}

pub fn initialize_stack(stack: &mut [u8], entry: usize, _selector: u32, arg: usize) -> u64 {
    let base = stack.as_mut_ptr() as usize;
    let top = (base + stack.len()) & !(STACK_ALIGNMENT - 1);
    let frame_addr = top - core::mem::size_of::<NewThreadFrame>();
    assert!(frame_addr >= base, "stack too small to hold a new-thread frame");
    assert_eq!(frame_addr % STACK_ALIGNMENT, 0, "new-thread frame must be 16-byte aligned");

    let frame = NewThreadFrame {
        x0: arg as u64,
        pc: entry as u64,
        pstate: 0,
        _reserved: 0,
    };
    unsafe {
        core::ptr::write(frame_addr as *mut NewThreadFrame, frame);
    }
    frame_addr as u64
}

pub fn publish_context_switch(sp: u64, is_new: bool) {
    unsafe {
        _native_arm64_set_context_switch_sp(sp);
        _native_arm64_set_context_switch_new_thread(is_new as i32);
    }
}
