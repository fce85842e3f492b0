//! Priority-queue semantics for the scheduler's destruction and vaccination
//! sub-queues.
//!
//! Each (production-type, reason) sub-queue is a FIFO deque; the three
//! `TimeWaitingPriority` strategies translate to three iteration orders over
//! the vector of sub-queues, chosen once per day.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{production_type::ProductionTypeId, reason::ReasonId};

/// Where "time waiting" (oldest request first) sits relative to the other
/// two axes in a sub-queue's dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWaitingPriority {
    /// Scan every sub-queue's head; dispatch whichever has waited longest.
    First,
    /// Dispatch oldest-first within a block of sub-queues sharing the outer
    /// priority axis, then advance to the next block.
    Second,
    /// Strict sub-queue order: drain sub-queue 0 before sub-queue 1, etc.
    Third,
}

/// Which of the two "slow" priority axes (production type, reason) is the
/// more-significant digit of the sub-queue index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityAxisOrder {
    /// `index = production_type * n_reasons + reason`. Block size = `n_reasons`.
    ProductionTypeOuter,
    /// `index = reason * n_production_types + production_type`. Block size = `n_production_types`.
    ReasonOuter,
}

impl PriorityAxisOrder {
    pub fn sub_queue_index(
        &self,
        production_type: ProductionTypeId,
        reason: ReasonId,
        n_production_types: usize,
        n_reasons: usize,
    ) -> usize {
        let pt = production_type.0 as usize;
        let r = reason.0 as usize;
        match self {
            Self::ProductionTypeOuter => pt * n_reasons + r,
            Self::ReasonOuter => r * n_production_types + pt,
        }
    }

    pub fn block_size(&self, n_production_types: usize, n_reasons: usize) -> usize {
        match self {
            Self::ProductionTypeOuter => n_reasons,
            Self::ReasonOuter => n_production_types,
        }
    }
}

/// Pops up to `capacity` entries from `queues` in the order `strategy`
/// dictates, removing them from their sub-queue as they are popped.
pub fn pop_by_priority<T>(
    queues: &mut [VecDeque<T>],
    capacity: u32,
    strategy: TimeWaitingPriority,
    block_size: usize,
    day_of: impl Fn(&T) -> u32,
) -> Vec<T> {
    let mut popped = Vec::new();
    if capacity == 0 {
        return popped;
    }
    match strategy {
        TimeWaitingPriority::First => {
            while (popped.len() as u32) < capacity {
                match oldest_head(queues, 0, queues.len(), &day_of) {
                    Some(idx) => popped.push(queues[idx].pop_front().unwrap()),
                    None => break,
                }
            }
        }
        TimeWaitingPriority::Second => {
            let block_size = block_size.max(1);
            let mut block_start = 0;
            while block_start < queues.len() && (popped.len() as u32) < capacity {
                let block_end = (block_start + block_size).min(queues.len());
                loop {
                    if (popped.len() as u32) >= capacity {
                        break;
                    }
                    match oldest_head(queues, block_start, block_end, &day_of) {
                        Some(idx) => popped.push(queues[idx].pop_front().unwrap()),
                        None => break,
                    }
                }
                block_start = block_end;
            }
        }
        TimeWaitingPriority::Third => {
            for queue in queues.iter_mut() {
                while (popped.len() as u32) < capacity {
                    match queue.pop_front() {
                        Some(entry) => popped.push(entry),
                        None => break,
                    }
                }
                if (popped.len() as u32) >= capacity {
                    break;
                }
            }
        }
    }
    popped
}

/// Index (within `[start, end)`) of the sub-queue whose head has the
/// smallest `day_of` value; ties broken by lowest sub-queue index.
fn oldest_head<T>(
    queues: &[VecDeque<T>],
    start: usize,
    end: usize,
    day_of: &impl Fn(&T) -> u32,
) -> Option<usize> {
    queues[start..end]
        .iter()
        .enumerate()
        .filter_map(|(offset, q)| q.front().map(|entry| (start + offset, day_of(entry))))
        .min_by_key(|&(idx, day)| (day, idx))
        .map(|(idx, _)| idx)
}
