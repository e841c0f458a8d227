//! # veb-tree
//!
//! An ordered set of integers drawn from a fixed universe `[0, 2^BITS)`,
//! stored in a van Emde Boas tree. Insertion, membership and successor
//! queries take `O(log log U)` steps where `U = 2^BITS`.
//!
//! Nodes are allocated lazily, so memory grows with the keys actually
//! inserted rather than with the size of the universe.
//!
//! ## Example
//!
//! ```rust
//! use veb_tree::VebTree;
//!
//! let mut tree: VebTree<32> = VebTree::new();
//! tree.insert(5);
//! tree.insert(10);
//! tree.insert(3);
//!
//! assert!(tree.contains(5));
//! assert!(!tree.contains(15));
//! assert_eq!(tree.find_next(4), Some(5));
//! assert_eq!(tree.find_next(100), None);
//! ```

use std::fmt;
use std::iter::FusedIterator;

use tracing::debug;

mod error;
mod node;

pub use error::{Result, VebError};

use node::Node;

/// Set of `u32` keys in `[0, 2^BITS)`, with `1 <= BITS <= 32`.
///
/// "No element" and "no successor" are reported as `None`. Keys outside the
/// universe are a caller error: the `try_*` methods return
/// [`VebError::OutOfRange`], the plain methods panic.
pub struct VebTree<const BITS: u32> {
    root: Node,
    len: usize,
}

impl<const BITS: u32> VebTree<BITS> {
    /// Width of a key in bits.
    pub const WIDTH: u32 = BITS;

    /// Number of representable keys, `2^BITS`.
    pub const UNIVERSE: u64 = 1u64 << BITS;

    const VALID_WIDTH: () = assert!(BITS >= 1 && BITS <= 32, "VebTree width must be in 1..=32");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_WIDTH;
        Self {
            root: Node::new(BITS),
            len: 0,
        }
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Size of the universe, `2^BITS`.
    pub fn universe(&self) -> u64 {
        Self::UNIVERSE
    }

    /// Smallest stored key.
    pub fn min(&self) -> Option<u32> {
        self.root.min()
    }

    /// Largest stored key.
    pub fn max(&self) -> Option<u32> {
        self.root.max()
    }

    /// Approximate heap usage in bytes, excluding the root node itself.
    pub fn memory_usage(&self) -> usize {
        self.root.heap_bytes()
    }

    #[inline]
    fn check(key: u32) -> Result<()> {
        if u64::from(key) < Self::UNIVERSE {
            Ok(())
        } else {
            Err(VebError::OutOfRange { key, bits: BITS })
        }
    }

    /// Adds `key`, returning whether it was newly inserted.
    ///
    /// Inserting a key that is already present leaves the set unchanged.
    pub fn try_insert(&mut self, key: u32) -> Result<bool> {
        Self::check(key)?;
        let added = self.root.insert(key);
        if added {
            self.len += 1;
        }
        Ok(added)
    }

    /// Returns whether `key` is stored.
    pub fn try_contains(&self, key: u32) -> Result<bool> {
        Self::check(key)?;
        Ok(self.root.contains(key))
    }

    /// Returns the smallest stored key that is `>= key`, or `None` if there
    /// is none.
    pub fn try_find_next(&self, key: u32) -> Result<Option<u32>> {
        Self::check(key)?;
        Ok(self.root.find_next(key))
    }

    /// Adds `key`, returning whether it was newly inserted.
    ///
    /// # Panics
    ///
    /// Panics if `key >= 2^BITS`.
    pub fn insert(&mut self, key: u32) -> bool {
        match self.try_insert(key) {
            Ok(added) => added,
            Err(err) => panic!("{err}"),
        }
    }

    /// Returns whether `key` is stored.
    ///
    /// # Panics
    ///
    /// Panics if `key >= 2^BITS`.
    pub fn contains(&self, key: u32) -> bool {
        match self.try_contains(key) {
            Ok(found) => found,
            Err(err) => panic!("{err}"),
        }
    }

    /// Successor query: the smallest stored key that is `>= key`.
    ///
    /// # Panics
    ///
    /// Panics if `key >= 2^BITS`.
    pub fn find_next(&self, key: u32) -> Option<u32> {
        match self.try_find_next(key) {
            Ok(next) => next,
            Err(err) => panic!("{err}"),
        }
    }

    /// Removes every key and releases all nodes.
    pub fn clear(&mut self) {
        debug!(bits = BITS, len = self.len, "clearing tree");
        self.root = Node::new(BITS);
        self.len = 0;
    }

    /// Iterates over the stored keys in ascending order.
    pub fn iter(&self) -> Iter<'_, BITS> {
        Iter {
            tree: self,
            from: self.min(),
            remaining: self.len,
        }
    }
}

impl<const BITS: u32> Default for VebTree<BITS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BITS: u32> Clone for VebTree<BITS> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<const BITS: u32> fmt::Debug for VebTree<BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<const BITS: u32> PartialEq for VebTree<BITS> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<const BITS: u32> Eq for VebTree<BITS> {}

impl<const BITS: u32> Extend<u32> for VebTree<BITS> {
    /// # Panics
    ///
    /// Panics on the first key `>= 2^BITS`.
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<const BITS: u32> FromIterator<u32> for VebTree<BITS> {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, const BITS: u32> IntoIterator for &'a VebTree<BITS> {
    type Item = u32;
    type IntoIter = Iter<'a, BITS>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over a [`VebTree`], driven by successor queries.
pub struct Iter<'a, const BITS: u32> {
    tree: &'a VebTree<BITS>,
    /// Next key to search from; `None` once the universe is exhausted.
    from: Option<u32>,
    remaining: usize,
}

impl<'a, const BITS: u32> Iterator for Iter<'a, BITS> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let from = self.from.take()?;
        let found = self.tree.root.find_next(from)?;
        self.from = found
            .checked_add(1)
            .filter(|&next| u64::from(next) < VebTree::<BITS>::UNIVERSE);
        self.remaining = self.remaining.saturating_sub(1);
        Some(found)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, const BITS: u32> ExactSizeIterator for Iter<'a, BITS> {}

impl<'a, const BITS: u32> FusedIterator for Iter<'a, BITS> {}
