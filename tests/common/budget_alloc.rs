use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counting allocator for conversion budget tests.
///
/// Tracks live bytes, the high-water mark since the last [`reset`](Self::reset)
/// and the number of allocation calls (reallocations included).
pub struct BudgetAlloc {
    live: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

/// Measurements taken by [`BudgetAlloc::measure`].
#[derive(Clone, Copy, Debug)]
pub struct AllocReport {
    pub peak_bytes: usize,
    pub retained_bytes: usize,
    pub alloc_calls: usize,
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Restart peak and call counters from the current live size.
    pub fn reset(&self) {
        let live = self.live.load(Ordering::SeqCst);
        self.peak.store(live, Ordering::SeqCst);
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn live_bytes(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn alloc_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Run `f` and report allocations made while it ran, relative to the
    /// bytes already live when it started.
    pub fn measure<T>(&self, f: impl FnOnce() -> T) -> (T, AllocReport) {
        self.reset();
        let baseline = self.live_bytes();
        let value = f();
        let report = AllocReport {
            peak_bytes: self.peak_bytes().saturating_sub(baseline),
            retained_bytes: self.live_bytes().saturating_sub(baseline),
            alloc_calls: self.alloc_calls(),
        };
        (value, report)
    }

    fn grow(&self, bytes: usize) {
        let live = self.live.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(live, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(bytes))
            });
    }

    fn record(&self, ptr: *mut u8, bytes: usize) -> *mut u8 {
        if !ptr.is_null() {
            self.grow(bytes);
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.record(unsafe { System.alloc(layout) }, layout.size())
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.record(unsafe { System.alloc_zeroed(layout) }, layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                self.grow(new_size - layout.size());
            } else {
                self.shrink(layout.size() - new_size);
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        new_ptr
    }
}
