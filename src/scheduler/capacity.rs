//! Capacity charts: piecewise functions from days-since-first-detection to
//! the authorities' daily destruction or vaccination throughput.

use serde::{Deserialize, Serialize};

/// A step function: `capacity_at(d)` holds the value of the last point whose
/// `day` is `<= d`, or `0` before the first point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityChart {
    points: Vec<(i64, u32)>,
}

impl CapacityChart {
    /// `points` need not be pre-sorted; unsorted points are sorted by day.
    pub fn new(mut points: Vec<(i64, u32)>) -> Self {
        points.sort_by_key(|&(day, _)| day);
        Self { points }
    }

    pub fn constant(capacity: u32) -> Self {
        Self::new(vec![(0, capacity)])
    }

    pub fn capacity_at(&self, days_since_first_detection: i64) -> u32 {
        let mut capacity = 0;
        for &(day, cap) in &self.points {
            if day <= days_since_first_detection {
                capacity = cap;
            } else {
                break;
            }
        }
        capacity
    }

    /// The earliest day at which the chart reaches `0` and never rises
    /// again, if any. Lets the scheduler latch a flag and short-circuit
    /// further dispatch once the current day passes this threshold.
    pub fn zero_absorbing_day(&self) -> Option<i64> {
        for (i, &(day, cap)) in self.points.iter().enumerate() {
            if cap == 0 && self.points[i..].iter().all(|&(_, c)| c == 0) {
                return Some(day);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_last_value_until_next_point() {
        let chart = CapacityChart::new(vec![(0, 2), (5, 10), (20, 0)]);
        assert_eq!(chart.capacity_at(-1), 0);
        assert_eq!(chart.capacity_at(0), 2);
        assert_eq!(chart.capacity_at(4), 2);
        assert_eq!(chart.capacity_at(5), 10);
        assert_eq!(chart.capacity_at(19), 10);
        assert_eq!(chart.capacity_at(20), 0);
        assert_eq!(chart.capacity_at(1000), 0);
    }

    #[test]
    fn zero_absorbing_day_ignores_earlier_zero_that_recovers() {
        let chart = CapacityChart::new(vec![(0, 0), (1, 5), (10, 0)]);
        assert_eq!(chart.zero_absorbing_day(), Some(10));
    }

    #[test]
    fn zero_absorbing_day_none_when_chart_never_zeroes() {
        let chart = CapacityChart::new(vec![(0, 1)]);
        assert_eq!(chart.zero_absorbing_day(), None);
    }
}
