//! Height-balanced binary search tree over owned subtrees.
//!
//! Nodes own their children through `Option<Box<Node>>` and carry no parent
//! pointer. Every mutating helper takes a subtree by value and hands back the
//! new subtree root, so a rotation never has to patch a parent link in place.
//!
//! Keys are unique. Callers that need duplicate primary keys fold an
//! insertion sequence into the key (see [`super::PriorityKey`]).
//!
//! # Complexity
//! Insert, remove, point lookup and neighbour queries are O(log n).
//! A pruned range scan is O(log n + k) for k hits.
//!
//! # Reference
//! Adelson-Velsky & Landis (1962); Knuth, TAOCP Vol. 3, §6.2.3

use std::cmp::Ordering;

type Link<K, V> = Option<Box<Node<K, V>>>;

/// A tree node.
#[derive(Debug, Clone)]
pub struct Node<K, V> {
    key: K,
    value: V,
    height: u32,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Box<Self> {
        Box::new(Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        })
    }

    /// Ordering key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Stored payload.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Cached subtree height (a leaf has height 1).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Left child.
    pub fn left(&self) -> Option<&Node<K, V>> {
        self.left.as_deref()
    }

    /// Right child.
    pub fn right(&self) -> Option<&Node<K, V>> {
        self.right.as_deref()
    }

    /// Balance factor: height(left) - height(right).
    fn balance(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }
}

fn height<K, V>(link: &Link<K, V>) -> u32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn rotate_left<K, V>(mut z: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut y) = z.right.take() else {
        return z;
    };
    z.right = y.left.take();
    z.update_height();
    y.left = Some(z);
    y.update_height();
    y
}

fn rotate_right<K, V>(mut z: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut y) = z.left.take() else {
        return z;
    };
    z.left = y.right.take();
    z.update_height();
    y.right = Some(z);
    y.update_height();
    y
}

/// Restores the AVL property at `node`, assuming both children are valid
/// AVL trees whose heights differ by at most 2.
fn rebalance<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        // Left-right case needs the child straightened first.
        if node.left.as_ref().is_some_and(|left| left.balance() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|right| right.balance() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

fn insert_into<K: Ord, V>(link: Link<K, V>, key: K, value: V) -> (Box<Node<K, V>>, Option<V>) {
    let Some(mut node) = link else {
        return (Node::leaf(key, value), None);
    };

    let replaced = match key.cmp(&node.key) {
        Ordering::Less => {
            let (child, replaced) = insert_into(node.left.take(), key, value);
            node.left = Some(child);
            replaced
        }
        Ordering::Greater => {
            let (child, replaced) = insert_into(node.right.take(), key, value);
            node.right = Some(child);
            replaced
        }
        Ordering::Equal => {
            let old = std::mem::replace(&mut node.value, value);
            return (node, Some(old));
        }
    };

    (rebalance(node), replaced)
}

/// Detaches the minimum node of a subtree, returning the rebalanced rest.
fn remove_min<K, V>(mut node: Box<Node<K, V>>) -> (Link<K, V>, Box<Node<K, V>>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = remove_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn remove_from<K: Ord, V>(link: Link<K, V>, key: &K) -> (Link<K, V>, Option<(K, V)>) {
    let Some(mut node) = link else {
        return (None, None);
    };

    let removed = match key.cmp(&node.key) {
        Ordering::Less => {
            let (child, removed) = remove_from(node.left.take(), key);
            node.left = child;
            removed
        }
        Ordering::Greater => {
            let (child, removed) = remove_from(node.right.take(), key);
            node.right = child;
            removed
        }
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, only) | (only, None) => {
                let Node { key, value, .. } = *node;
                return (only, Some((key, value)));
            }
            (Some(left), Some(right)) => {
                // The in-order successor's payload moves into this slot.
                let (rest, successor) = remove_min(right);
                let Node {
                    key: next_key,
                    value: next_value,
                    ..
                } = *successor;
                node.left = Some(left);
                node.right = rest;
                let old_key = std::mem::replace(&mut node.key, next_key);
                let old_value = std::mem::replace(&mut node.value, next_value);
                Some((old_key, old_value))
            }
        },
    };

    (Some(rebalance(node)), removed)
}

fn collect_range<'a, K: Ord, V>(
    link: Option<&'a Node<K, V>>,
    lo: &K,
    hi: &K,
    out: &mut Vec<(&'a K, &'a V)>,
) {
    let Some(node) = link else {
        return;
    };
    if *lo < node.key {
        collect_range(node.left(), lo, hi, out);
    }
    if *lo <= node.key && node.key <= *hi {
        out.push((&node.key, &node.value));
    }
    if node.key < *hi {
        collect_range(node.right(), lo, hi, out);
    }
}

/// AVL tree mapping unique keys to values.
///
/// # Example
/// ```
/// use gator_delivery::index::AvlTree;
///
/// let mut tree = AvlTree::new();
/// for k in [5, 3, 8, 1, 4] {
///     tree.insert(k, k * 10);
/// }
/// assert_eq!(tree.predecessor(&5).map(|(k, _)| *k), Some(4));
/// assert_eq!(tree.successor(&5).map(|(k, _)| *k), Some(8));
/// assert_eq!(tree.range(&2, &5).len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> AvlTree<K, V> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the whole tree (0 when empty).
    pub fn height(&self) -> u32 {
        height(&self.root)
    }

    /// Root node, for structural inspection.
    pub fn root(&self) -> Option<&Node<K, V>> {
        self.root.as_deref()
    }

    /// Ascending in-order iterator.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            stack: Vec::new(),
            remaining: self.len,
        };
        iter.push_left(self.root());
        iter
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Inserts an entry, returning the previous value if the key was present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, replaced) = insert_into(self.root.take(), key, value);
        self.root = Some(root);
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    /// Removes the entry with `key`.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let (root, removed) = remove_from(self.root.take(), key);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut cursor = self.root();
        while let Some(node) = cursor {
            cursor = match key.cmp(&node.key) {
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    /// Mutable lookup. The key itself cannot be changed through this.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let mut cursor = self.root.as_deref_mut();
        while let Some(node) = cursor {
            match key.cmp(&node.key) {
                Ordering::Less => cursor = node.left.as_deref_mut(),
                Ordering::Greater => cursor = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            }
        }
        None
    }

    /// Greatest entry whose key is strictly less than `key`.
    ///
    /// `key` need not be present in the tree.
    pub fn predecessor(&self, key: &K) -> Option<(&K, &V)> {
        let mut best = None;
        let mut cursor = self.root();
        while let Some(node) = cursor {
            if node.key < *key {
                best = Some(node);
                cursor = node.right();
            } else {
                cursor = node.left();
            }
        }
        best.map(|node| (&node.key, &node.value))
    }

    /// Smallest entry whose key is strictly greater than `key`.
    pub fn successor(&self, key: &K) -> Option<(&K, &V)> {
        let mut best = None;
        let mut cursor = self.root();
        while let Some(node) = cursor {
            if node.key > *key {
                best = Some(node);
                cursor = node.left();
            } else {
                cursor = node.right();
            }
        }
        best.map(|node| (&node.key, &node.value))
    }

    /// All entries with `lo <= key <= hi`, ascending.
    ///
    /// Subtrees that lie entirely outside the range are never visited.
    pub fn range(&self, lo: &K, hi: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if lo <= hi {
            collect_range(self.root(), lo, hi, &mut out);
        }
        out
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over an [`AvlTree`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut link: Option<&'a Node<K, V>>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right());
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    /// Returns the real height, asserting balance and cached heights on the way.
    fn assert_avl<K: Ord, V>(node: Option<&Node<K, V>>) -> u32 {
        let Some(node) = node else {
            return 0;
        };
        let lh = assert_avl(node.left());
        let rh = assert_avl(node.right());
        assert!(lh.abs_diff(rh) <= 1, "unbalanced node");
        assert_eq!(node.height(), 1 + lh.max(rh), "stale height");
        if let Some(left) = node.left() {
            assert!(left.key() < node.key());
        }
        if let Some(right) = node.right() {
            assert!(right.key() > node.key());
        }
        1 + lh.max(rh)
    }

    #[test]
    fn test_empty_tree() {
        let tree: AvlTree<i32, ()> = AvlTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.predecessor(&0).is_none());
        assert!(tree.successor(&0).is_none());
        assert!(tree.range(&i32::MIN, &i32::MAX).is_empty());
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_ascending_inserts_stay_balanced() {
        let mut tree = AvlTree::new();
        for k in 0..1024 {
            tree.insert(k, ());
        }
        assert_eq!(tree.len(), 1024);
        // A perfectly balanced tree of 1024 nodes has height 11.
        assert!(tree.height() <= 11);
        assert_avl(tree.root());
    }

    #[test]
    fn test_insert_replaces_equal_key() {
        let mut tree = AvlTree::new();
        assert_eq!(tree.insert(1, "a"), None);
        assert_eq!(tree.insert(1, "b"), Some("a"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&1), Some(&"b"));
    }

    #[test]
    fn test_remove_two_child_node_keeps_order() {
        let mut tree = AvlTree::new();
        for k in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert(k, k);
        }
        // 50 is the root with two children; its successor 60 takes its place.
        assert_eq!(tree.remove(&50), Some((50, 50)));
        assert_eq!(tree.root().map(|n| *n.key()), Some(60));
        let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![20, 30, 40, 60, 70, 80]);
        assert_avl(tree.root());
    }

    #[test]
    fn test_remove_missing_key() {
        let mut tree = AvlTree::new();
        tree.insert(1, ());
        assert!(tree.remove(&2).is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_neighbours_of_absent_key() {
        let mut tree = AvlTree::new();
        for k in [10, 20, 30] {
            tree.insert(k, ());
        }
        assert_eq!(tree.predecessor(&25).map(|(k, _)| *k), Some(20));
        assert_eq!(tree.successor(&25).map(|(k, _)| *k), Some(30));
        assert!(tree.predecessor(&10).is_none());
        assert!(tree.successor(&30).is_none());
    }

    #[test]
    fn test_get_mut_updates_value() {
        let mut tree = AvlTree::new();
        tree.insert(3, 0);
        if let Some(v) = tree.get_mut(&3) {
            *v = 42;
        }
        assert_eq!(tree.get(&3), Some(&42));
        assert!(tree.get_mut(&4).is_none());
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut tree = AvlTree::new();
        tree.insert(5, ());
        assert!(tree.range(&9, &1).is_empty());
    }

    #[test]
    fn test_random_operations_match_btreemap() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut tree = AvlTree::new();
        let mut model = BTreeMap::new();

        for _ in 0..4000 {
            let key: i32 = rng.random_range(0..500);
            if rng.random_bool(0.6) {
                assert_eq!(tree.insert(key, key * 2), model.insert(key, key * 2));
            } else {
                assert_eq!(tree.remove(&key).map(|(_, v)| v), model.remove(&key));
            }
        }

        assert_eq!(tree.len(), model.len());
        assert_avl(tree.root());
        let ours: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        let theirs: Vec<(i32, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(ours, theirs);

        for _ in 0..200 {
            let a: i32 = rng.random_range(-10..510);
            let b: i32 = rng.random_range(-10..510);
            let (lo, hi) = (a.min(b), a.max(b));
            let ours: Vec<i32> = tree.range(&lo, &hi).into_iter().map(|(k, _)| *k).collect();
            let theirs: Vec<i32> = model.range(lo..=hi).map(|(k, _)| *k).collect();
            assert_eq!(ours, theirs);

            assert_eq!(
                tree.predecessor(&a).map(|(k, _)| *k),
                model.range(..a).next_back().map(|(k, _)| *k)
            );
            assert_eq!(
                tree.successor(&a).map(|(k, _)| *k),
                model.range(a + 1..).next().map(|(k, _)| *k)
            );
        }
    }
}
