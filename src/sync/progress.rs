//! Throttled, monotonic progress percentages

#[derive(Debug, Clone)]
pub struct Progress {
    total: usize,
    batch: usize,
    done: usize,
    last: Option<u8>,
}

impl Progress {
    pub fn new(total: usize, batch: usize) -> Self {
        Self {
            total,
            batch: batch.max(1),
            done: 0,
            last: None,
        }
    }

    /// Count one unit of work. Returns a percentage every `batch` units and on
    /// the last one.
    pub fn tick(&mut self) -> Option<u8> {
        self.done += 1;
        if self.done % self.batch == 0 || self.done >= self.total {
            self.emit(self.percent())
        } else {
            None
        }
    }

    /// 100, unless already reported
    pub fn finish(&mut self) -> Option<u8> {
        self.done = self.done.max(self.total);
        self.emit(100)
    }

    fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.done.min(self.total) * 100 / self.total) as u8
    }

    fn emit(&mut self, percent: u8) -> Option<u8> {
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batched_reports() {
        let mut progress = Progress::new(25, 10);
        let reported: Vec<u8> = (0..25).filter_map(|_| progress.tick()).collect();
        assert_eq!(reported, vec![40, 80, 100]);
        assert_eq!(progress.finish(), None);
    }

    #[test]
    fn test_finish_reports_once() {
        let mut progress = Progress::new(3, 10);
        assert_eq!(progress.tick(), None);
        assert_eq!(progress.finish(), Some(100));
        assert_eq!(progress.finish(), None);
    }

    #[test]
    fn test_never_decreases() {
        let mut progress = Progress::new(4, 1);
        let mut last = 0;
        for _ in 0..10 {
            if let Some(p) = progress.tick() {
                assert!(p > last);
                last = p;
            }
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_empty_work() {
        let mut progress = Progress::new(0, 10);
        assert_eq!(progress.finish(), Some(100));
    }
}
