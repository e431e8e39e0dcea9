//! Ordered descriptor registries.
//!
//! A registry is a singly-linked chain of [`Descriptor`]s kept in an
//! owned arena. Slots are addressed by index and the `next` links are
//! indices into the same arena, so a descriptor is reachable from at most
//! one chain and is handed back by value whenever it leaves.
//!
//! Ordering: ascending by key. The key is the supplier's quantity id for
//! request registries and the consumer's quantity id for receival
//! registries. Entries sharing a key stay contiguous; within a run no two
//! requests may name the same consumer, and no two receivals may name the
//! same supplier and staging buffer.

use crate::descriptor::{Descriptor, QuantityId};
use crate::process::ProcessId;
use crate::time::VirtualTime;

/// Which ordering a registry maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// Standing requests a supplier must service. Key: supplier quantity.
    /// Counterpart: the consumer.
    Requests,
    /// Deliveries awaiting settlement at a consumer. Key: consumer quantity.
    /// Counterpart: the supplier.
    Receivals,
}

impl RegistryKind {
    fn key(self, d: &Descriptor) -> QuantityId {
        match self {
            RegistryKind::Requests => d.supplier_quantity_id(),
            RegistryKind::Receivals => d.consumer_quantity_id(),
        }
    }

    fn counterpart(self, d: &Descriptor) -> ProcessId {
        match self {
            RegistryKind::Requests => d.consumer(),
            RegistryKind::Receivals => d.supplier(),
        }
    }

    /// Whether `a` and `b`, already sharing a key, are the same entry.
    ///
    /// A receival is also told apart by its staging buffer: one consumer
    /// may hold several requests on one supplier that settle into the same
    /// destination, and each of their buffers must be committed.
    fn same_entry(self, a: &Descriptor, b: &Descriptor) -> bool {
        self.counterpart(a) == self.counterpart(b)
            && match self {
                RegistryKind::Requests => true,
                RegistryKind::Receivals => a.consumer_buffer() == b.consumer_buffer(),
            }
    }
}

/// Outcome of an insertion.
///
/// A rejected duplicate is handed back so the caller decides what to do
/// with it; nothing is silently dropped.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    Inserted,
    Duplicate(Descriptor),
}

impl Insertion {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Insertion::Inserted)
    }
}

#[derive(Debug, Clone)]
struct Link {
    descriptor: Descriptor,
    next: Option<usize>,
}

/// Arena-backed ordered chain of descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    kind: RegistryKind,
    slots: Vec<Option<Link>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl DescriptorRegistry {
    pub fn new(kind: RegistryKind) -> Self {
        DescriptorRegistry {
            kind,
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn requests() -> Self {
        Self::new(RegistryKind::Requests)
    }

    pub fn receivals() -> Self {
        Self::new(RegistryKind::Receivals)
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a standing request, ordered by supplier quantity.
    ///
    /// # Panics
    /// Panics if this is not a request registry.
    pub fn insert_request(&mut self, descriptor: Descriptor) -> Insertion {
        assert_eq!(
            self.kind,
            RegistryKind::Requests,
            "insert_request on a receival registry"
        );
        self.insert(descriptor)
    }

    /// Insert a delivery, ordered by consumer quantity.
    ///
    /// # Panics
    /// Panics if this is not a receival registry.
    pub fn insert_receival(&mut self, descriptor: Descriptor) -> Insertion {
        assert_eq!(
            self.kind,
            RegistryKind::Receivals,
            "insert_receival on a request registry"
        );
        self.insert(descriptor)
    }

    fn insert(&mut self, mut descriptor: Descriptor) -> Insertion {
        let kind = self.kind;
        let key = kind.key(&descriptor);

        let Some(head) = self.head else {
            let slot = self.alloc(descriptor, None);
            self.head = Some(slot);
            self.tail = Some(slot);
            return Insertion::Inserted;
        };

        if key < kind.key(self.descriptor_at(head)) {
            let slot = self.alloc(descriptor, Some(head));
            self.head = Some(slot);
            return Insertion::Inserted;
        }

        // Walk to the last node whose key is below ours.
        let mut cursor = head;
        while let Some(next) = self.next_of(cursor) {
            if kind.key(self.descriptor_at(next)) < key {
                cursor = next;
            } else {
                break;
            }
        }

        // Scan the run sharing our key; the same entry is a duplicate.
        let mut insert_after = cursor;
        let mut scan = if kind.key(self.descriptor_at(cursor)) == key {
            Some(cursor)
        } else {
            self.next_of(cursor)
        };
        while let Some(p) = scan {
            let existing = self.descriptor_at(p);
            if kind.key(existing) != key {
                break;
            }
            if kind.same_entry(existing, &descriptor) {
                descriptor.set_in_use(false);
                return Insertion::Duplicate(descriptor);
            }
            insert_after = p;
            scan = self.next_of(p);
        }

        let successor = self.next_of(insert_after);
        let slot = self.alloc(descriptor, successor);
        self.link_mut(insert_after).next = Some(slot);
        if self.tail == Some(insert_after) {
            self.tail = Some(slot);
        }
        Insertion::Inserted
    }

    /// Detach and return the head of the chain.
    pub fn pop_front(&mut self) -> Option<Descriptor> {
        let head = self.head?;
        Some(self.unlink(None, head))
    }

    /// Detach the first entry (from the head) whose timestamp is `<= now`.
    pub fn remove_first_ready(&mut self, now: VirtualTime) -> Option<Descriptor> {
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            if self.descriptor_at(slot).timestamp() <= now {
                return Some(self.unlink(prev, slot));
            }
            prev = Some(slot);
            cursor = self.next_of(slot);
        }
        None
    }

    /// Detach the entry with this key and counterpart, if registered.
    pub fn remove(&mut self, key: QuantityId, counterpart: ProcessId) -> Option<Descriptor> {
        let kind = self.kind;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let d = self.descriptor_at(slot);
            let k = kind.key(d);
            if k > key {
                return None;
            }
            if k == key && kind.counterpart(d) == counterpart {
                return Some(self.unlink(prev, slot));
            }
            prev = Some(slot);
            cursor = self.next_of(slot);
        }
        None
    }

    /// Whether an entry with this key and counterpart is registered.
    pub fn contains(&self, key: QuantityId, counterpart: ProcessId) -> bool {
        self.iter()
            .any(|d| self.kind.key(d) == key && self.kind.counterpart(d) == counterpart)
    }

    /// Earliest timestamp among the entries.
    pub fn earliest_timestamp(&self) -> Option<VirtualTime> {
        self.iter().map(Descriptor::timestamp).min()
    }

    /// Iterate in chain order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            registry: self,
            cursor: self.head,
        }
    }

    /// Contiguous runs of entries sharing a key, in ascending key order.
    pub fn groups(&self) -> Vec<(QuantityId, Vec<&Descriptor>)> {
        let mut groups: Vec<(QuantityId, Vec<&Descriptor>)> = Vec::new();
        for d in self.iter() {
            let key = self.kind.key(d);
            match groups.last_mut() {
                Some((k, members)) if *k == key => members.push(d),
                _ => groups.push((key, vec![d])),
            }
        }
        groups
    }

    /// Drop every entry. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let released = self.len;
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        released
    }

    // ── Arena plumbing ────────────────────────────────────────

    fn alloc(&mut self, mut descriptor: Descriptor, next: Option<usize>) -> usize {
        descriptor.set_in_use(true);
        let link = Link { descriptor, next };
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(link);
                slot
            }
            None => {
                self.slots.push(Some(link));
                self.slots.len() - 1
            }
        }
    }

    fn unlink(&mut self, prev: Option<usize>, slot: usize) -> Descriptor {
        let Link {
            mut descriptor,
            next,
        } = self.slots[slot]
            .take()
            .unwrap_or_else(|| panic!("registry slot {slot} is vacant"));
        match prev {
            Some(p) => self.link_mut(p).next = next,
            None => self.head = next,
        }
        if self.tail == Some(slot) {
            self.tail = prev;
        }
        self.free.push(slot);
        self.len -= 1;
        descriptor.set_in_use(false);
        descriptor
    }

    fn link(&self, slot: usize) -> &Link {
        self.slots[slot]
            .as_ref()
            .unwrap_or_else(|| panic!("registry slot {slot} is vacant"))
    }

    fn link_mut(&mut self, slot: usize) -> &mut Link {
        self.slots[slot]
            .as_mut()
            .unwrap_or_else(|| panic!("registry slot {slot} is vacant"))
    }

    fn descriptor_at(&self, slot: usize) -> &Descriptor {
        &self.link(slot).descriptor
    }

    fn next_of(&self, slot: usize) -> Option<usize> {
        self.link(slot).next
    }
}

/// Chain-order iterator over a registry.
pub struct Iter<'a> {
    registry: &'a DescriptorRegistry,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Descriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let link = self.registry.link(slot);
        self.cursor = link.next;
        Some(&link.descriptor)
    }
}

impl<'a> IntoIterator for &'a DescriptorRegistry {
    type Item = &'a Descriptor;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
