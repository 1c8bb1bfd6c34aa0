//! Priority frontier for the Dijkstra solver: a binary heap of cell indices keyed on
//! tentative distance. Stale entries are left in the heap when a cell is improved and
//! discarded by the solver when popped.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
pub(crate) struct SmallestCostHolder {
    pub(crate) cost: u32,
    pub(crate) index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.index == other.index
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the smallest cost. Equal costs are settled in
        // row-major order, which keeps runs on identical grids identical.
        match other.cost.cmp(&self.cost) {
            Ordering::Equal => other.index.cmp(&self.index),
            s => s,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Frontier {
    to_see: BinaryHeap<SmallestCostHolder>,
}

impl Frontier {
    pub(crate) fn push(&mut self, index: usize, cost: u32) {
        self.to_see.push(SmallestCostHolder { cost, index });
    }

    pub(crate) fn pop(&mut self) -> Option<SmallestCostHolder> {
        self.to_see.pop()
    }
}
