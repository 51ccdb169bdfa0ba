//! Monotonic identifier generator

/// Hands out `base, base + 1, base + 2, …`
///
/// Each counter owns its state; share one behind a lock if several threads
/// need it. Yields `None` once the `u16` range is used up.
#[derive(Debug, Clone)]
pub struct Counter {
    next: Option<u16>,
}

impl Counter {
    pub fn new(base: u16) -> Self {
        Self { next: Some(base) }
    }
}

impl Iterator for Counter {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let current = self.next?;
        self.next = current.checked_add(1);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_base() {
        let mut counter = Counter::new(5);
        assert_eq!(counter.next(), Some(5));
        assert_eq!(counter.next(), Some(6));
        assert_eq!(counter.next(), Some(7));
    }

    #[test]
    fn test_counters_are_independent() {
        let mut a = Counter::new(100);
        let mut b = Counter::new(100);
        assert_eq!(a.next(), Some(100));
        assert_eq!(a.next(), Some(101));
        assert_eq!(b.next(), Some(100));
        assert_eq!(a.next(), Some(102));
    }

    #[test]
    fn test_counter_exhausts_without_wrapping() {
        let mut counter = Counter::new(u16::MAX - 1);
        assert_eq!(counter.next(), Some(u16::MAX - 1));
        assert_eq!(counter.next(), Some(u16::MAX));
        assert_eq!(counter.next(), None);
        assert_eq!(counter.next(), None);
    }
}
