use serde::Serialize;

/// A window of `window` samples starting at `position` inside a series of
/// `series_len` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeWindow {
    pub position: i64,
    pub window: i64,
    pub series_len: usize,
}

impl RangeWindow {
    pub fn new(position: i64, window: i64, series_len: usize) -> Self {
        Self {
            position,
            window,
            series_len,
        }
    }

    /// Largest window that still leaves a valid start position.
    pub fn max_window(&self) -> i64 {
        (self.series_len as i64 - 1).max(1)
    }

    /// Window length bounded to `[1, max_window]`.
    pub fn effective_window(&self) -> i64 {
        self.window.clamp(1, self.max_window())
    }

    /// Largest start position: `series_len - window - 1`, never negative.
    pub fn max_position(&self) -> i64 {
        (self.series_len as i64 - self.effective_window() - 1).max(0)
    }

    pub fn effective_position(&self) -> i64 {
        self.position.clamp(0, self.max_position())
    }

    /// Step one window forward, stopping at `max_position`.
    pub fn forward(&self) -> i64 {
        (self.position + self.effective_window()).clamp(0, self.max_position())
    }

    /// Step one window back, stopping at zero.
    pub fn backward(&self) -> i64 {
        (self.position - self.effective_window()).clamp(0, self.max_position())
    }

    /// Sample range currently in view.
    pub fn span(&self) -> std::ops::Range<usize> {
        let start = self.effective_position() as usize;
        let end = (start + self.effective_window() as usize).min(self.series_len);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_steps_by_window() {
        let range = RangeWindow::new(0, 10, 500);
        assert_eq!(range.forward(), 10);
        assert_eq!(range.span(), 0..10);
    }

    #[test]
    fn forward_stops_at_last_full_window() {
        let range = RangeWindow::new(485, 10, 500);
        assert_eq!(range.max_position(), 489);
        assert_eq!(range.forward(), 489);
        assert_eq!(RangeWindow::new(489, 10, 500).forward(), 489);
    }

    #[test]
    fn backward_stops_at_zero() {
        assert_eq!(RangeWindow::new(4, 10, 500).backward(), 0);
        assert_eq!(RangeWindow::new(0, 10, 500).backward(), 0);
        assert_eq!(RangeWindow::new(30, 10, 500).backward(), 20);
    }

    #[test]
    fn oversized_window_is_clamped() {
        let range = RangeWindow::new(3, 1000, 20);
        assert_eq!(range.effective_window(), 19);
        assert_eq!(range.max_position(), 0);
        assert_eq!(range.span(), 0..19);
    }
}
