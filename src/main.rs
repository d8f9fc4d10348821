/*
 * Ashlar Kernel Entry Point
 *
 * Boots via the Limine protocol, brings up a bump heap, and starts the
 * scheduler. The scheduler core publishes its own idle frame on CPUs with
 * nothing ready, so there's no caller-managed idle thread here. Everything
 * below kernel_main other than the scheduler itself stands in for
 * subsystems (framebuffer, paging, device drivers, a real page-frame
 * allocator) that belong to a full kernel build but not to the scheduler
 * core this crate implements.
 */

#![no_std]
#![no_main]
#![allow(dead_code)]

extern crate alloc;

use core::panic::PanicInfo;

use ashlar_kernel_rust::arch;
use ashlar_kernel_rust::scheduler::SchedulerManager;
use ashlar_kernel_rust::sync::IrqGuard;
use limine::BaseRevision;
use limine::request::{EntryPointRequest, RequestsEndMarker, RequestsStartMarker};
use linked_list_allocator::LockedHeap;

#[used]
#[unsafe(link_section = ".requests")]
static BASE_REVISION: BaseRevision = BaseRevision::new();

#[used]
#[unsafe(link_section = ".requests")]
static ENTRY_POINT: EntryPointRequest = EntryPointRequest::new().with_entry_point(kernel_main);

#[used]
#[unsafe(link_section = ".requests_start_marker")]
static _START_MARKER: RequestsStartMarker = RequestsStartMarker::new();
#[used]
#[unsafe(link_section = ".requests_end_marker")]
static _END_MARKER: RequestsEndMarker = RequestsEndMarker::new();

/// Placeholder early heap. A real build replaces this with memory carved out
/// of the Limine memory map.
const EARLY_HEAP_SIZE: usize = 1024 * 1024;

#[repr(align(16))]
struct EarlyHeap([u8; EARLY_HEAP_SIZE]);

static mut EARLY_HEAP: EarlyHeap = EarlyHeap([0; EARLY_HEAP_SIZE]);

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

extern "C" fn kernel_main() -> ! {
    assert!(BASE_REVISION.is_supported());

    unsafe {
        let heap_start = core::ptr::addr_of_mut!(EARLY_HEAP.0) as *mut u8;
        ALLOCATOR.lock().init(heap_start, EARLY_HEAP_SIZE);
    }

    log::info!("ashlar kernel starting");

    SchedulerManager::init(1);

    {
        let _guard = IrqGuard::new();
        SchedulerManager::enable();
    }

    log::info!("scheduler enabled, entering idle loop");
    loop {
        arch::halt();
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    arch::interrupts::disable();
    log::error!("panic: {}", info);
    loop {
        arch::halt();
    }
}
