//! Fixed-window moving average over scaled measurements.

/// Simple moving average over the last `N` samples.
///
/// The ring is fully seeded at construction, so every `update` returns an
/// average over exactly `N` real samples. Invariant: `sum == Σ buf`.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter<const N: usize> {
    buf: [u16; N],
    sum: u32,
    next: usize,
}

impl<const N: usize> MovingAverageFilter<N> {
    /// Build a filter whose window is filled with `initial`.
    pub fn seed(initial: [u16; N]) -> Self {
        const { assert!(N > 0, "filter window must not be empty") };
        let sum = initial.iter().map(|&v| u32::from(v)).sum();
        Self {
            buf: initial,
            sum,
            next: 0,
        }
    }

    /// Replace the oldest sample with `sample` and return the new average (floor).
    #[inline]
    pub fn update(&mut self, sample: u16) -> u16 {
        let slot = &mut self.buf[self.next];
        self.sum = self.sum - u32::from(*slot) + u32::from(sample);
        *slot = sample;
        self.next += 1;
        if self.next == N {
            self.next = 0;
        }
        self.average()
    }

    #[inline]
    pub fn average(&self) -> u16 {
        // The mean of u16 samples always fits in u16.
        u16::try_from(self.sum / N as u32).unwrap_or(u16::MAX)
    }

    pub const fn window(&self) -> usize {
        N
    }

    pub const fn sum(&self) -> u32 {
        self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_computes_initial_average() {
        let f = MovingAverageFilter::seed([10, 20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(f.sum(), 360);
        assert_eq!(f.average(), 45);
        assert_eq!(f.window(), 8);
    }

    #[test]
    fn update_evicts_oldest_first() {
        let mut f = MovingAverageFilter::seed([0, 0, 0, 100]);
        assert_eq!(f.update(40), 35); // [40,0,0,100]
        assert_eq!(f.update(40), 45); // [40,40,0,100]
        assert_eq!(f.update(40), 55); // [40,40,40,100]
        assert_eq!(f.update(40), 40); // 100 evicted
        assert_eq!(f.update(0), 30); // wrapped back to slot 0
    }

    #[test]
    fn average_floors() {
        let mut f = MovingAverageFilter::seed([0, 0, 0]);
        assert_eq!(f.update(2), 0);
        assert_eq!(f.update(2), 1);
    }

    #[test]
    fn saturated_window_does_not_overflow() {
        let mut f = MovingAverageFilter::seed([u16::MAX; 8]);
        assert_eq!(f.update(u16::MAX), u16::MAX);
        assert_eq!(f.sum(), u32::from(u16::MAX) * 8);
    }

    #[test]
    fn window_of_one_tracks_input() {
        let mut f = MovingAverageFilter::seed([7]);
        assert_eq!(f.update(9), 9);
        assert_eq!(f.update(3), 3);
    }
}
