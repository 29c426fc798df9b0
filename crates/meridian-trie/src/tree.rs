//! The Merkle state tree.
//!
//! A persistent binary search tree over `([u8; 32], Vec<u8>)` pairs. Nodes
//! are heap-ordered on `blake3(key)` priorities, so the shape — and with it
//! the root hash — is a pure function of the key set: identical `(k, v)`
//! sets give identical roots on every node regardless of insertion order.
//! Snapshots share unchanged subtrees through `Arc`, making clones cheap
//! and updates O(log n) expected.
//!
//! Node hash: BLAKE3(key ‖ value ‖ left_root ‖ right_root), with the
//! 32-byte zero constant for an absent child; the empty tree's root is that
//! same zero constant.

use std::sync::Arc;

use meridian_core::constants::EMPTY_TREE_ROOT;

/// Fixed-width tree key: account public keys, oracle identifiers, query
/// ids, commitments and namehashes are all 32 bytes.
pub type TreeKey = [u8; 32];

#[derive(Debug)]
struct Node {
    key: TreeKey,
    value: Vec<u8>,
    priority: [u8; 32],
    hash: [u8; 32],
    size: u64,
    left: Option<Arc<Node>>,
    right: Option<Arc<Node>>,
}

fn child_hash(child: &Option<Arc<Node>>) -> [u8; 32] {
    child.as_ref().map(|n| n.hash).unwrap_or(EMPTY_TREE_ROOT)
}

fn child_size(child: &Option<Arc<Node>>) -> u64 {
    child.as_ref().map(|n| n.size).unwrap_or(0)
}

fn priority_of(key: &TreeKey) -> [u8; 32] {
    *blake3::hash(key).as_bytes()
}

fn mk(
    key: TreeKey,
    value: Vec<u8>,
    priority: [u8; 32],
    left: Option<Arc<Node>>,
    right: Option<Arc<Node>>,
) -> Arc<Node> {
    let mut h = blake3::Hasher::new();
    h.update(&key);
    h.update(&value);
    h.update(&child_hash(&left));
    h.update(&child_hash(&right));
    let hash = *h.finalize().as_bytes();
    let size = 1 + child_size(&left) + child_size(&right);
    Arc::new(Node { key, value, priority, hash, size, left, right })
}

fn insert_node(
    node: &Option<Arc<Node>>,
    key: TreeKey,
    value: Vec<u8>,
    priority: [u8; 32],
) -> Arc<Node> {
    match node {
        None => mk(key, value, priority, None, None),
        Some(n) => match key.cmp(&n.key) {
            std::cmp::Ordering::Equal => mk(key, value, priority, n.left.clone(), n.right.clone()),
            std::cmp::Ordering::Less => {
                let left = insert_node(&n.left, key, value, priority);
                if left.priority > n.priority {
                    // Rotate right to restore the heap order.
                    let right =
                        mk(n.key, n.value.clone(), n.priority, left.right.clone(), n.right.clone());
                    mk(left.key, left.value.clone(), left.priority, left.left.clone(), Some(right))
                } else {
                    mk(n.key, n.value.clone(), n.priority, Some(left), n.right.clone())
                }
            }
            std::cmp::Ordering::Greater => {
                let right = insert_node(&n.right, key, value, priority);
                if right.priority > n.priority {
                    // Rotate left.
                    let left =
                        mk(n.key, n.value.clone(), n.priority, n.left.clone(), right.left.clone());
                    mk(right.key, right.value.clone(), right.priority, Some(left), right.right.clone())
                } else {
                    mk(n.key, n.value.clone(), n.priority, n.left.clone(), Some(right))
                }
            }
        },
    }
}

/// Merge two trees where every key in `a` is smaller than every key in `b`.
fn merge(a: &Option<Arc<Node>>, b: &Option<Arc<Node>>) -> Option<Arc<Node>> {
    match (a, b) {
        (None, other) | (other, None) => other.clone(),
        (Some(l), Some(r)) => {
            if l.priority > r.priority {
                Some(mk(l.key, l.value.clone(), l.priority, l.left.clone(), merge(&l.right, b)))
            } else {
                Some(mk(r.key, r.value.clone(), r.priority, merge(a, &r.left), r.right.clone()))
            }
        }
    }
}

fn delete_node(node: &Option<Arc<Node>>, key: &TreeKey) -> (Option<Arc<Node>>, bool) {
    match node {
        None => (None, false),
        Some(n) => match key.cmp(&n.key) {
            std::cmp::Ordering::Equal => (merge(&n.left, &n.right), true),
            std::cmp::Ordering::Less => {
                let (left, removed) = delete_node(&n.left, key);
                if !removed {
                    return (Some(n.clone()), false);
                }
                (Some(mk(n.key, n.value.clone(), n.priority, left, n.right.clone())), true)
            }
            std::cmp::Ordering::Greater => {
                let (right, removed) = delete_node(&n.right, key);
                if !removed {
                    return (Some(n.clone()), false);
                }
                (Some(mk(n.key, n.value.clone(), n.priority, n.left.clone(), right)), true)
            }
        },
    }
}

// ── MerkleTree ───────────────────────────────────────────────────────────────

/// Immutable Merkle key/value tree. All mutating operations return a new
/// tree; the receiver is untouched.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    root: Option<Arc<Node>>,
}

impl MerkleTree {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Insert or update `key`.
    pub fn insert(&self, key: TreeKey, value: Vec<u8>) -> Self {
        let priority = priority_of(&key);
        Self { root: Some(insert_node(&self.root, key, value, priority)) }
    }

    /// Remove `key` if present.
    pub fn delete(&self, key: &TreeKey) -> Self {
        let (root, _) = delete_node(&self.root, key);
        Self { root }
    }

    pub fn get(&self, key: &TreeKey) -> Option<&[u8]> {
        let mut cursor = self.root.as_ref();
        while let Some(n) = cursor {
            cursor = match key.cmp(&n.key) {
                std::cmp::Ordering::Equal => return Some(n.value.as_slice()),
                std::cmp::Ordering::Less => n.left.as_ref(),
                std::cmp::Ordering::Greater => n.right.as_ref(),
            };
        }
        None
    }

    pub fn contains_key(&self, key: &TreeKey) -> bool {
        self.get(key).is_some()
    }

    /// Root commitment over the full contents; the zero constant when empty.
    pub fn root_hash(&self) -> [u8; 32] {
        child_hash(&self.root)
    }

    pub fn len(&self) -> u64 {
        child_size(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Fold over entries in ascending key order.
    pub fn fold<A, F>(&self, init: A, f: &mut F) -> A
    where
        F: FnMut(A, &TreeKey, &[u8]) -> A,
    {
        fn walk<A, F>(node: &Option<Arc<Node>>, acc: A, f: &mut F) -> A
        where
            F: FnMut(A, &TreeKey, &[u8]) -> A,
        {
            match node {
                None => acc,
                Some(n) => {
                    let acc = walk(&n.left, acc, f);
                    let acc = f(acc, &n.key, &n.value);
                    walk(&n.right, acc, f)
                }
            }
        }
        walk(&self.root, init, f)
    }

    /// All entries in ascending key order.
    pub fn entries(&self) -> Vec<(TreeKey, Vec<u8>)> {
        self.fold(Vec::with_capacity(self.len() as usize), &mut |mut acc, k, v| {
            acc.push((*k, v.to_vec()));
            acc
        })
    }

    /// Rebuild the canonical shape from scratch. The shape is already a
    /// function of the key set, so the result is structurally identical;
    /// exposed for store-compaction paths.
    pub fn rebalance(&self) -> Self {
        self.entries()
            .into_iter()
            .fold(Self::new(), |tree, (k, v)| tree.insert(k, v))
    }
}
