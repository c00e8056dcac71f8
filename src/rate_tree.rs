//! Rate-weighted category index.
//!
//! An AVL tree keyed by category, where every node carries its own firing
//! rate and the sum of rates in its subtree. The subtree totals make
//! [`RateTree::locate`] an O(log n) mapping from a point in `[0, total)` to
//! the category whose cumulative-rate interval contains that point, which is
//! what lets the scheduler draw a rate-weighted category among thousands
//! without a linear scan.

use std::cmp::Ordering;

type Link<K> = Option<Box<RateNode<K>>>;

struct RateNode<K> {
    key: K,
    rate: f64,
    total: f64,
    height: i32,
    low: Link<K>,
    high: Link<K>,
}

impl<K> RateNode<K> {
    fn new(key: K, rate: f64) -> Self {
        Self {
            key,
            rate,
            total: rate,
            height: 1,
            low: None,
            high: None,
        }
    }

    /// Recompute the augmented fields from the children.
    fn refresh(&mut self) {
        // NOTE: summed in a fixed order; the test validator must add in the
        // same order or float rounding makes the comparison flaky.
        self.total = self.rate + total(&self.low) + total(&self.high);
        self.height = 1 + height(&self.low).max(height(&self.high));
    }

    fn balance(&self) -> i32 {
        height(&self.high) - height(&self.low)
    }
}

fn height<K>(link: &Link<K>) -> i32 {
    link.as_deref().map_or(0, |node| node.height)
}

fn total<K>(link: &Link<K>) -> f64 {
    link.as_deref().map_or(0.0, |node| node.total)
}

/// Self-balancing ordered map from category to rate, augmented with subtree
/// rate sums.
///
/// Rates are positive finite reals; a category with rate zero is simply not
/// in the tree. All mutating operations rebalance bottom-up, so the AVL
/// bound and the subtree totals hold after every call.
pub struct RateTree<K> {
    root: Link<K>,
    count: usize,
}

impl<K> Default for RateTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RateTree<K> {
    pub fn new() -> Self {
        Self {
            root: None,
            count: 0,
        }
    }

    /// Number of categories currently stored.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Sum of all stored rates; 0.0 when empty.
    pub fn total(&self) -> f64 {
        total(&self.root)
    }
}

impl<K: Ord> RateTree<K> {
    pub fn exists(&self, key: &K) -> bool {
        let mut link = &self.root;
        while let Some(node) = link.as_deref() {
            match key.cmp(&node.key) {
                Ordering::Equal => return true,
                Ordering::Less => link = &node.low,
                Ordering::Greater => link = &node.high,
            }
        }
        false
    }

    /// Stored rate for `key`, or 0.0 when absent.
    pub fn rate_of(&self, key: &K) -> f64 {
        let mut link = &self.root;
        while let Some(node) = link.as_deref() {
            match key.cmp(&node.key) {
                Ordering::Equal => return node.rate,
                Ordering::Less => link = &node.low,
                Ordering::Greater => link = &node.high,
            }
        }
        0.0
    }

    /// Insert `key` with `rate`, or overwrite the stored rate. O(log n).
    ///
    /// `rate` must be positive and finite; use [`RateTree::erase`] to remove
    /// a category.
    pub fn upsert(&mut self, key: K, rate: f64) {
        debug_assert!(rate.is_finite() && rate > 0.0, "upsert with rate {rate}");
        if upsert_rec(&mut self.root, key, rate) {
            self.count += 1;
        }
    }

    /// Like [`RateTree::upsert`], but the new rate is derived from the
    /// current one (or from 0.0 when the key is absent).
    pub fn update(&mut self, key: K, update: impl FnOnce(f64) -> f64) {
        if update_rec(&mut self.root, key, update) {
            self.count += 1;
        }
    }

    /// Remove `key` if present. O(log n).
    pub fn erase(&mut self, key: &K) {
        if erase_rec(&mut self.root, key) {
            self.count -= 1;
        }
    }

    /// Map a point in `[0, total())` to the category whose cumulative-rate
    /// interval contains it. O(log n).
    ///
    /// With in-order keys `k1..kn` and rates `r1..rn`, `locate(x)` returns
    /// `ki` iff `r1 + .. + r(i-1) <= x < r1 + .. + ri`. The interval bounds
    /// are not hard-enforced: accumulated subtraction error can push a point
    /// slightly past a subtree total, so a point at or beyond the last
    /// node's interval resolves to that node rather than panicking.
    ///
    /// Panics when the tree is empty.
    pub fn locate(&self, point: f64) -> &K {
        debug_assert!(
            point >= 0.0 && point < self.total(),
            "locate({point}) outside [0, {})",
            self.total()
        );
        let mut node = self
            .root
            .as_deref()
            .expect("locate called on an empty tree");
        let mut point = point;
        loop {
            // The interval splits into three parts: low subtree, this node,
            // high subtree.
            if let Some(low) = node.low.as_deref() {
                if point < low.total {
                    node = low;
                    continue;
                }
                point -= low.total;
            }
            // NOTE: Checking for a high child first absorbs precision error
            // that leaves point >= rate at the rightmost node.
            if node.high.is_none() || point < node.rate {
                return &node.key;
            }
            point -= node.rate;
            node = node.high.as_deref().expect("checked above");
        }
    }
}

/// Returns true when a new node was created.
fn upsert_rec<K: Ord>(link: &mut Link<K>, key: K, rate: f64) -> bool {
    let created = match link {
        None => {
            *link = Some(Box::new(RateNode::new(key, rate)));
            true
        }
        Some(node) => match key.cmp(&node.key) {
            Ordering::Equal => {
                node.rate = rate;
                false
            }
            Ordering::Less => upsert_rec(&mut node.low, key, rate),
            Ordering::Greater => upsert_rec(&mut node.high, key, rate),
        },
    };
    rebalance(link);
    created
}

fn update_rec<K: Ord>(link: &mut Link<K>, key: K, update: impl FnOnce(f64) -> f64) -> bool {
    let created = match link {
        None => {
            *link = Some(Box::new(RateNode::new(key, update(0.0))));
            true
        }
        Some(node) => match key.cmp(&node.key) {
            Ordering::Equal => {
                node.rate = update(node.rate);
                false
            }
            Ordering::Less => update_rec(&mut node.low, key, update),
            Ordering::Greater => update_rec(&mut node.high, key, update),
        },
    };
    rebalance(link);
    created
}

/// Returns true when a node was removed.
fn erase_rec<K: Ord>(link: &mut Link<K>, key: &K) -> bool {
    let ord = match link.as_deref() {
        None => return false,
        Some(node) => key.cmp(&node.key),
    };
    let removed = match ord {
        Ordering::Equal => {
            remove_node(link);
            true
        }
        Ordering::Less => match link.as_deref_mut() {
            Some(node) => erase_rec(&mut node.low, key),
            None => false,
        },
        Ordering::Greater => match link.as_deref_mut() {
            Some(node) => erase_rec(&mut node.high, key),
            None => false,
        },
    };
    rebalance(link);
    removed
}

/// Splice out the node at `link`, grafting its children onto a replacement
/// drawn from the taller subtree.
fn remove_node<K: Ord>(link: &mut Link<K>) {
    let Some(mut node) = link.take() else { return };
    let replacement = if node.balance() < 0 {
        take_highest(&mut node.low)
    } else {
        take_lowest(&mut node.high)
    };
    *link = match replacement {
        Some(mut new_root) => {
            new_root.low = node.low.take();
            new_root.high = node.high.take();
            new_root.refresh();
            Some(new_root)
        }
        // Taller-side subtree empty means both are: the node was a leaf.
        None => None,
    };
}

fn take_lowest<K>(link: &mut Link<K>) -> Link<K> {
    let descend = link
        .as_deref()
        .map_or(false, |node| node.low.is_some());
    if descend {
        let removed = match link.as_deref_mut() {
            Some(node) => take_lowest(&mut node.low),
            None => None,
        };
        rebalance(link);
        removed
    } else {
        let mut removed = link.take();
        if let Some(node) = removed.as_deref_mut() {
            *link = node.high.take();
        }
        removed
    }
}

fn take_highest<K>(link: &mut Link<K>) -> Link<K> {
    let descend = link
        .as_deref()
        .map_or(false, |node| node.high.is_some());
    if descend {
        let removed = match link.as_deref_mut() {
            Some(node) => take_highest(&mut node.high),
            None => None,
        };
        rebalance(link);
        removed
    } else {
        let mut removed = link.take();
        if let Some(node) = removed.as_deref_mut() {
            *link = node.low.take();
        }
        removed
    }
}

/// Refresh the augmented fields and rotate when the AVL bound is violated.
fn rebalance<K>(link: &mut Link<K>) {
    let balance = match link.as_deref_mut() {
        None => return,
        Some(node) => {
            node.refresh();
            node.balance()
        }
    };
    if balance > 1 {
        pivot_low(link);
    } else if balance < -1 {
        pivot_high(link);
    }
}

/// Rotate the high child into this position (single or double rotation).
fn pivot_low<K>(link: &mut Link<K>) {
    let mut node = link.take().expect("pivot on an empty link");
    // A negative-balance high child would rotate into a new violation, so
    // straighten it first (the double-rotation case).
    if node.high.as_deref().map_or(false, |high| high.balance() < 0) {
        pivot_high(&mut node.high);
    }
    let mut new_root = node.high.take().expect("pivot_low keeps a high child");
    node.high = new_root.low.take();
    node.refresh();
    new_root.low = Some(node);
    new_root.refresh();
    *link = Some(new_root);
}

/// Rotate the low child into this position (single or double rotation).
fn pivot_high<K>(link: &mut Link<K>) {
    let mut node = link.take().expect("pivot on an empty link");
    if node.low.as_deref().map_or(false, |low| low.balance() > 0) {
        pivot_low(&mut node.low);
    }
    let mut new_root = node.low.take().expect("pivot_high keeps a low child");
    node.low = new_root.high.take();
    node.refresh();
    new_root.high = Some(node);
    new_root.refresh();
    *link = Some(new_root);
}

#[cfg(test)]
impl<K: Ord> RateTree<K> {
    /// Walk the whole tree checking BST order, the AVL bound, and the
    /// augmented fields. Test-only.
    fn check_invariants(&self) {
        fn walk<K: Ord>(link: &Link<K>) -> usize {
            let Some(node) = link.as_deref() else { return 0 };
            if let Some(low) = node.low.as_deref() {
                assert!(low.key < node.key, "BST order violated on the low side");
            }
            if let Some(high) = node.high.as_deref() {
                assert!(high.key > node.key, "BST order violated on the high side");
            }
            let balance = height(&node.high) - height(&node.low);
            assert!(balance.abs() <= 1, "AVL balance {balance}");
            assert_eq!(
                node.height,
                1 + height(&node.low).max(height(&node.high)),
                "stale height"
            );
            // Must add in refresh() order, or rounding differences show up
            // as false positives.
            let expected = node.rate + total(&node.low) + total(&node.high);
            assert_eq!(node.total, expected, "stale subtree total");
            1 + walk(&node.low) + walk(&node.high)
        }
        assert_eq!(walk(&self.root), self.count, "stale node count");
    }
}
