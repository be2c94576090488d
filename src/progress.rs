/// Receives coarse progress while pages are parsed.
pub trait Progress {
    fn on_page(&mut self, current: u32, total: u32);
}

impl<F: FnMut(u32, u32)> Progress for F {
    fn on_page(&mut self, current: u32, total: u32) {
        self(current, total);
    }
}

/// Discards progress reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_page(&mut self, _current: u32, _total: u32) {}
}
