//! Progress reporting for image writes

use super::Sector;
use alloc::vec::Vec;

/// Granularity of [`WriteProgress::write_progress`] callbacks, in percent
pub const PROGRESS_STEP: u8 = 10;

/// Statistics from an image write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Sectors erased, in the order they were erased
    pub sectors_erased: Vec<Sector>,
    /// Number of page program commands issued
    pub pages_programmed: usize,
    /// Total bytes programmed
    pub bytes_written: usize,
}

/// Callback for progress reporting during an image write
pub trait WriteProgress {
    /// Called before a sector is erased
    fn erasing(&mut self, sector: Sector);

    /// Called each time another 10% of the image has been programmed
    fn write_progress(&mut self, percent: u8, bytes_written: usize);

    /// Called when the operation is complete
    fn complete(&mut self, stats: &WriteStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl WriteProgress for NoProgress {
    fn erasing(&mut self, _sector: Sector) {}
    fn write_progress(&mut self, _percent: u8, _bytes_written: usize) {}
    fn complete(&mut self, _stats: &WriteStats) {}
}

/// Turns a running byte count into 10% steps
#[derive(Debug, Clone)]
pub(crate) struct ProgressSteps {
    total: usize,
    next: u8,
}

impl ProgressSteps {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            next: PROGRESS_STEP,
        }
    }

    /// Report every step that `written` has reached or passed
    pub(crate) fn advance<P: WriteProgress + ?Sized>(&mut self, written: usize, progress: &mut P) {
        while self.next <= 100 && written * 100 >= self.total * self.next as usize {
            log::debug!("{}%", self.next);
            progress.write_progress(self.next, written);
            self.next += PROGRESS_STEP;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[derive(Default)]
    struct Steps(Vec<u8>);

    impl WriteProgress for Steps {
        fn erasing(&mut self, _sector: Sector) {}
        fn write_progress(&mut self, percent: u8, _bytes_written: usize) {
            self.0.push(percent);
        }
        fn complete(&mut self, _stats: &WriteStats) {}
    }

    #[test]
    fn test_steps_of_ten() {
        let mut steps = ProgressSteps::new(1000);
        let mut seen = Steps::default();
        for written in (256..1000).step_by(256).chain([1000]) {
            steps.advance(written, &mut seen);
        }
        assert_eq!(seen.0, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[test]
    fn test_single_chunk_jumps_to_done() {
        let mut steps = ProgressSteps::new(100);
        let mut seen = Steps::default();
        steps.advance(100, &mut seen);
        steps.advance(100, &mut seen);
        assert_eq!(seen.0.len(), 10);
        assert_eq!(seen.0.last(), Some(&100));
    }
}
