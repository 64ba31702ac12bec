use std::cmp::Ordering;

/// Ordering key of a node stored in a [`TaskHeap`].
///
/// Nodes are ordered by `(sort_index, id)`, so nodes with equal sort indices
/// come out in the order their ids were handed out.
pub trait HeapNode {
    fn sort_index(&self) -> f64;
    fn id(&self) -> u64;
}

fn compare<N: HeapNode>(a: &N, b: &N) -> Ordering {
    a.sort_index()
        .total_cmp(&b.sort_index())
        .then_with(|| a.id().cmp(&b.id()))
}

/// An array-backed binary min-heap.
///
/// Arbitrary removal is not supported. The scheduler cancels tasks lazily and
/// discards them when they reach the root.
#[derive(Debug)]
pub struct TaskHeap<N> {
    nodes: Vec<N>,
}

impl<N> Default for TaskHeap<N> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<N: HeapNode> TaskHeap<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, node: N) {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.sift_up(index);
    }

    /// Returns the minimum node without removing it.
    pub fn peek(&self) -> Option<&N> {
        self.nodes.first()
    }

    /// Removes the minimum node. The last leaf is promoted to the root and
    /// sifted down.
    pub fn pop(&mut self) -> Option<N> {
        if self.nodes.is_empty() {
            return None;
        }
        let last = self.nodes.len() - 1;
        self.nodes.swap(0, last);
        let first = self.nodes.pop();
        if !self.nodes.is_empty() {
            self.sift_down(0);
        }
        first
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the nodes in storage order, not in heap order.
    pub fn iter(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) >> 1;
            if compare(&self.nodes[parent], &self.nodes[index]) == Ordering::Greater {
                self.nodes.swap(parent, index);
                index = parent;
            } else {
                return;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.nodes.len();
        let half = len >> 1;
        while index < half {
            let left = index * 2 + 1;
            let right = left + 1;
            let mut smallest = left;
            if right < len && compare(&self.nodes[right], &self.nodes[left]) == Ordering::Less {
                smallest = right;
            }
            if compare(&self.nodes[smallest], &self.nodes[index]) == Ordering::Less {
                self.nodes.swap(smallest, index);
                index = smallest;
            } else {
                return;
            }
        }
    }
}
