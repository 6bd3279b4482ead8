//! Recency order for [`LruCore`](crate::policy::lru::LruCore).
//!
//! Nodes live in one `Vec` of slots and link to each other by [`NodeId`].
//! Vacant slots form their own singly linked free chain, so a node removed by
//! eviction hands its slot to the next insert.
//!
//! ```text
//!   slots:  [0: Live(b)] [1: Vacant(next=None)] [2: Live(a)] [3: Live(c)]
//!                                ▲
//!   free_head ───────────────────┘
//!
//!   front ─► c ◄──► b ◄──► a ◄─ back
//!           (newest)       (oldest, next victim)
//! ```
//!
//! A `NodeId` whose slot is vacant is rejected (`None` / `false`). The engine
//! only holds ids that its index still maps, so it never reaches a reused slot
//! through a stale id.

use crate::error::InvariantError;

/// Position of a node in a [`RecencyList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    /// Neighbour towards the front.
    newer: Option<NodeId>,
    /// Neighbour towards the back.
    older: Option<NodeId>,
}

#[derive(Debug)]
enum Slot<T> {
    Live(Node<T>),
    Vacant { next_free: Option<usize> },
}

/// Doubly linked list ordered from most to least recently used.
#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    len: usize,
}

impl<T> RecencyList<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        RecencyList {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            front: None,
            back: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn back_id(&self) -> Option<NodeId> {
        self.back
    }

    pub(crate) fn back(&self) -> Option<&T> {
        self.back.and_then(|id| self.get(id))
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Live(node)) => Some(&mut node.value),
            _ => None,
        }
    }

    /// Links `value` in as the newest node.
    pub(crate) fn push_front(&mut self, value: T) -> NodeId {
        let node = Slot::Live(Node {
            value,
            newer: None,
            older: self.front,
        });
        let id = match self.free_head {
            Some(index) => {
                let next_free = match self.slots[index] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Live(_) => None,
                };
                self.free_head = next_free;
                self.slots[index] = node;
                NodeId(index)
            },
            None => {
                self.slots.push(node);
                NodeId(self.slots.len() - 1)
            },
        };

        match self.front {
            Some(old_front) => self.set_newer(old_front, Some(id)),
            None => self.back = Some(id),
        }
        self.front = Some(id);
        self.len += 1;
        id
    }

    /// Marks `id` as the newest node. Returns `false` if `id` is vacant.
    pub(crate) fn move_to_front(&mut self, id: NodeId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        if self.front != Some(id) {
            self.unlink(id);
            self.link_front(id);
        }
        true
    }

    /// Unlinks `id`, frees its slot and returns the value.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<T> {
        self.node(id)?;
        self.unlink(id);
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        let Slot::Live(node) = std::mem::replace(&mut self.slots[id.0], vacant) else {
            return None;
        };
        self.free_head = Some(id.0);
        self.len -= 1;
        Some(node.value)
    }

    /// Values from the back (oldest) to the front (newest).
    pub(crate) fn iter_oldest_first(&self) -> OldestFirst<'_, T> {
        OldestFirst {
            list: self,
            next: self.back,
        }
    }

    /// Walks the links from the front and checks them against the slots.
    pub(crate) fn validate(&self) -> Result<(), InvariantError> {
        let live = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count();
        if live != self.len {
            return Err(InvariantError::new(format!(
                "recency list counts {} nodes but {} slots are live",
                self.len, live
            )));
        }

        let mut walked = 0usize;
        let mut newer = None;
        let mut cursor = self.front;
        while let Some(id) = cursor {
            let node = self
                .node(id)
                .ok_or_else(|| InvariantError::new("recency list links to a vacant slot"))?;
            if node.newer != newer {
                return Err(InvariantError::new("recency list back-link is broken"));
            }
            walked += 1;
            if walked > self.len {
                return Err(InvariantError::new("recency list contains a cycle"));
            }
            newer = Some(id);
            cursor = node.older;
        }

        if newer != self.back || walked != self.len {
            return Err(InvariantError::new(format!(
                "recency list walk reached {} of {} nodes",
                walked, self.len
            )));
        }
        Ok(())
    }

    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        match self.slots.get(id.0) {
            Some(Slot::Live(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Live(node)) => Some(node),
            _ => None,
        }
    }

    fn set_newer(&mut self, id: NodeId, newer: Option<NodeId>) {
        if let Some(node) = self.node_mut(id) {
            node.newer = newer;
        }
    }

    fn set_older(&mut self, id: NodeId, older: Option<NodeId>) {
        if let Some(node) = self.node_mut(id) {
            node.older = older;
        }
    }

    /// Splices `id` out of the chain; its slot stays live.
    fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let (newer, older) = (node.newer.take(), node.older.take());

        match newer {
            Some(newer_id) => self.set_older(newer_id, older),
            None => self.front = older,
        }
        match older {
            Some(older_id) => self.set_newer(older_id, newer),
            None => self.back = newer,
        }
    }

    fn link_front(&mut self, id: NodeId) {
        let old_front = self.front;
        self.set_older(id, old_front);
        match old_front {
            Some(old) => self.set_newer(old, Some(id)),
            None => self.back = Some(id),
        }
        self.front = Some(id);
    }
}

pub(crate) struct OldestFirst<'a, T> {
    list: &'a RecencyList<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for OldestFirst<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.next?)?;
        self.next = node.newer;
        Some(&node.value)
    }
}
