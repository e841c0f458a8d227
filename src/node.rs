//! Recursive van Emde Boas node.
//!
//! A node over width `K` covers keys in `[0, 2^K)`. Width 1 is a [`Leaf`]
//! whose whole state is its extrema. Wider nodes are [`Branch`]es: a key is
//! split into `ceil(K/2)` high bits selecting a child and `floor(K/2)` low
//! bits stored inside that child, and a summary node (`aux`) records which
//! children are non-empty.
//!
//! The minimum of a node lives only in its [`Bounds`]; it is never pushed
//! into a child. Every other element, the maximum included, is also stored
//! below. Children and `aux` are allocated on first use and never freed
//! before the owning node is dropped, so a present child is never empty.

use std::mem;

use tracing::trace;

/// Minimum and maximum held directly at one level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Bounds {
    min: Option<u32>,
    max: Option<u32>,
}

/// Outcome of recording a key in a node's [`Bounds`].
enum Absorb {
    /// Key equals the stored min or max.
    Present,
    /// Node was empty; the key is now both min and max.
    Stored,
    /// Extrema updated; this key still has to go into a child.
    PushDown(u32),
}

impl Bounds {
    #[inline]
    fn is_empty(self) -> bool {
        self.min.is_none()
    }

    #[inline]
    fn holds(self, key: u32) -> bool {
        self.min == Some(key) || self.max == Some(key)
    }

    /// Records `key` at this level. When `key` undercuts the current
    /// minimum the two swap roles: `key` is kept here and the old minimum
    /// is the one handed down.
    fn absorb(&mut self, key: u32) -> Absorb {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            self.min = Some(key);
            self.max = Some(key);
            return Absorb::Stored;
        };
        if key == min || key == max {
            return Absorb::Present;
        }

        let mut key = key;
        if key < min {
            self.min = Some(key);
            key = min;
        }
        if key > max {
            self.max = Some(key);
        }
        Absorb::PushDown(key)
    }
}

/// Width-1 node: the set is a subset of `{0, 1}`.
#[derive(Clone, Debug, Default)]
pub(crate) struct Leaf {
    bounds: Bounds,
}

impl Leaf {
    fn insert(&mut self, key: u32) -> bool {
        debug_assert!(key <= 1);
        // With only two keys in the universe, the extrema are the set.
        !matches!(self.bounds.absorb(key), Absorb::Present)
    }

    fn find_next(&self, key: u32) -> Option<u32> {
        let (min, max) = (self.bounds.min?, self.bounds.max?);
        if key <= min {
            Some(min)
        } else if key == max {
            Some(max)
        } else {
            None
        }
    }
}

/// Node over width `bits >= 2`.
#[derive(Clone, Debug)]
pub(crate) struct Branch {
    bits: u32,
    bounds: Bounds,
    /// `2^high_bits` slots, allocated on the first push-down.
    children: Option<Box<[Option<Box<Node>>]>>,
    /// Over width `high_bits`; member `i` iff `children[i]` is non-empty.
    aux: Option<Box<Node>>,
}

impl Branch {
    fn new(bits: u32) -> Self {
        debug_assert!(bits >= 2);
        Self {
            bits,
            bounds: Bounds::default(),
            children: None,
            aux: None,
        }
    }

    #[inline]
    fn low_bits(&self) -> u32 {
        self.bits / 2
    }

    #[inline]
    fn high_bits(&self) -> u32 {
        self.bits - self.low_bits()
    }

    #[inline]
    fn high(&self, key: u32) -> u32 {
        key >> self.low_bits()
    }

    #[inline]
    fn low(&self, key: u32) -> u32 {
        key & ((1u32 << self.low_bits()) - 1)
    }

    #[inline]
    fn merge(&self, high: u32, low: u32) -> u32 {
        (high << self.low_bits()) | low
    }

    #[inline]
    fn child(&self, high: u32) -> Option<&Node> {
        self.children
            .as_deref()
            .and_then(|slots| slots.get(high as usize))
            .and_then(|slot| slot.as_deref())
    }

    fn insert(&mut self, key: u32) -> bool {
        let key = match self.bounds.absorb(key) {
            Absorb::Present => return false,
            Absorb::Stored => return true,
            Absorb::PushDown(key) => key,
        };

        let (high, low) = (self.high(key), self.low(key));
        let (bits, low_bits, high_bits) = (self.bits, self.low_bits(), self.high_bits());

        let slots = self.children.get_or_insert_with(|| {
            let len = 1usize << high_bits;
            trace!(bits, slots = len, "allocating child table");
            std::iter::repeat_with(|| None).take(len).collect()
        });
        let child = slots[high as usize].get_or_insert_with(|| Box::new(Node::new(low_bits)));

        // The child is about to become non-empty; record that in the summary
        // exactly once, while its extrema still say "empty".
        if child.is_empty() {
            let aux = self.aux.get_or_insert_with(|| {
                trace!(bits, aux_bits = high_bits, "allocating summary");
                Box::new(Node::new(high_bits))
            });
            aux.insert(high);
        }
        child.insert(low)
    }

    fn contains(&self, key: u32) -> bool {
        if self.bounds.holds(key) {
            return true;
        }
        self.child(self.high(key))
            .is_some_and(|child| child.contains(self.low(key)))
    }

    fn find_next(&self, key: u32) -> Option<u32> {
        let (min, max) = (self.bounds.min?, self.bounds.max?);
        if key <= min {
            return Some(min);
        }
        if key > max {
            return None;
        }

        let (high, low) = (self.high(key), self.low(key));
        if let Some(child) = self.child(high) {
            if child.max().is_some_and(|child_max| low <= child_max) {
                return child.find_next(low).map(|next| self.merge(high, next));
            }
        }

        // Nothing left in this block: the answer is the minimum of the next
        // non-empty block, if any.
        let next_high = self.aux.as_deref()?.find_next(high + 1)?;
        let next_low = self.child(next_high)?.min()?;
        Some(self.merge(next_high, next_low))
    }

    fn heap_bytes(&self) -> usize {
        let table = self
            .children
            .as_deref()
            .map_or(0, |slots| mem::size_of_val(slots));
        let children: usize = self
            .children
            .iter()
            .flat_map(|slots| slots.iter().flatten())
            .map(|child| mem::size_of::<Node>() + child.heap_bytes())
            .sum();
        let aux = self
            .aux
            .as_deref()
            .map_or(0, |aux| mem::size_of::<Node>() + aux.heap_bytes());
        table + children + aux
    }

    #[cfg(test)]
    pub(crate) fn aux(&self) -> Option<&Node> {
        self.aux.as_deref()
    }

    /// Allocated children with their slot index.
    #[cfg(test)]
    pub(crate) fn children(&self) -> impl Iterator<Item = (u32, &Node)> + '_ {
        self.children.iter().flat_map(|slots| {
            slots
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.as_deref().map(|child| (i as u32, child)))
        })
    }

    #[cfg(test)]
    pub(crate) fn split(&self, key: u32) -> (u32, u32) {
        (self.high(key), self.low(key))
    }

    #[cfg(test)]
    pub(crate) fn table_len(&self) -> Option<usize> {
        self.children.as_deref().map(<[_]>::len)
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Leaf(Leaf),
    Branch(Branch),
}

impl Node {
    /// Empty node over `[0, 2^bits)`.
    pub(crate) fn new(bits: u32) -> Self {
        if bits <= 1 {
            Node::Leaf(Leaf::default())
        } else {
            Node::Branch(Branch::new(bits))
        }
    }

    #[inline]
    fn bounds(&self) -> Bounds {
        match self {
            Node::Leaf(leaf) => leaf.bounds,
            Node::Branch(branch) => branch.bounds,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.bounds().is_empty()
    }

    #[inline]
    pub(crate) fn min(&self) -> Option<u32> {
        self.bounds().min
    }

    #[inline]
    pub(crate) fn max(&self) -> Option<u32> {
        self.bounds().max
    }

    /// Inserts `key`, returning `false` if it was already present.
    pub(crate) fn insert(&mut self, key: u32) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.insert(key),
            Node::Branch(branch) => branch.insert(key),
        }
    }

    pub(crate) fn contains(&self, key: u32) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.bounds.holds(key),
            Node::Branch(branch) => branch.contains(key),
        }
    }

    /// Smallest stored key `>= key`.
    pub(crate) fn find_next(&self, key: u32) -> Option<u32> {
        match self {
            Node::Leaf(leaf) => leaf.find_next(key),
            Node::Branch(branch) => branch.find_next(key),
        }
    }

    /// Bytes held on the heap by this node's descendants and child table.
    pub(crate) fn heap_bytes(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Branch(branch) => branch.heap_bytes(),
        }
    }

    #[cfg(test)]
    pub(crate) fn as_branch(&self) -> Option<&Branch> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(branch) => Some(branch),
        }
    }

    #[cfg(test)]
    pub(crate) fn bits(&self) -> u32 {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(branch) => branch.bits,
        }
    }
}
