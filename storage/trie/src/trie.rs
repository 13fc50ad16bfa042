// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `Mutable`, the trie a `Transition` writes into, and `Snapshot`, the
//! immutable, cheaply-cloned commitment it produces. Both share the
//! insert/delete/lookup logic in this module; `Mutable` just additionally
//! tracks `&mut self` so callers can keep writing.

use crate::node::{self, Link, Node};
use crate::store::NodeStore;
use bc_crypto::HashValue;
use bc_failure_ext::Result;
use bc_nibble::NibblePath;
use std::sync::Arc;

/// A trie a `Transition` (or any other world-state writer) mutates in
/// place. Reads against an unset key return `None`; there is no notion of
/// a deleted-but-tombstoned entry.
pub struct Mutable {
    root: Option<Link>,
    store: Arc<dyn NodeStore>,
}

/// An immutable, content-addressed commitment produced by
/// [`Mutable::get_snapshot`]. Cloning a `Snapshot` is an `Arc` clone of
/// its root, never a deep copy, so holding on to many historical
/// snapshots is cheap as long as their subtries are shared.
#[derive(Clone)]
pub struct Snapshot {
    root: Option<Link>,
    store: Arc<dyn NodeStore>,
}

impl Mutable {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { root: None, store }
    }

    /// Opens a trie rooted at an already-persisted hash.
    pub fn from_root_hash(root_hash: HashValue, store: Arc<dyn NodeStore>) -> Self {
        if root_hash.is_zero() {
            Self { root: None, store }
        } else {
            Self { root: Some(Link::Hash(root_hash)), store }
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        get(&self.root, key, &*self.store)
    }

    /// Setting an empty value is equivalent to [`Mutable::delete`].
    pub fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        if value.is_empty() {
            return self.delete(key);
        }
        let path = NibblePath::from_key(key);
        self.root = Some(insert(self.root.take(), &path, value, &*self.store)?);
        Ok(())
    }

    /// Removes `key` if present. A delete of a key that was never set is a
    /// no-op, not an error.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        if let Some(link) = self.root.take() {
            let path = NibblePath::from_key(key);
            self.root = delete(link, &path, &*self.store)?;
        }
        Ok(())
    }

    /// Recomputes the root hash, lazily and bottom-up, over whatever part
    /// of the tree is dirty (in-memory). Already-hashed subtrees
    /// (`Link::Hash`) contribute their hash directly with no re-walk.
    pub fn root_hash(&self) -> HashValue {
        root_hash(&self.root)
    }

    pub fn get_snapshot(&self) -> Snapshot {
        Snapshot { root: self.root.clone(), store: self.store.clone() }
    }

    /// Resets this trie to a previously taken snapshot, discarding any
    /// writes made since.
    pub fn reset(&mut self, snapshot: &Snapshot) {
        self.root = snapshot.root.clone();
        self.store = snapshot.store.clone();
    }
}

impl Snapshot {
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        get(&self.root, key, &*self.store)
    }

    pub fn root_hash(&self) -> HashValue {
        root_hash(&self.root)
    }

    /// Walks the dirty (in-memory) part of the tree depth-first, writing
    /// `hash -> encoding` into the backing store, and returns the
    /// now-durable root hash. A no-op if the root was already a bare hash
    /// reference (nothing dirty to persist).
    pub fn flush(&self) -> Result<HashValue> {
        match &self.root {
            None => Ok(HashValue::zero()),
            Some(Link::Hash(hash)) => Ok(*hash),
            Some(Link::Owned(node)) => flush_node(node, &*self.store, true),
        }
    }
}

fn get(root: &Option<Link>, key: &[u8], store: &dyn NodeStore) -> Result<Option<Vec<u8>>> {
    match root {
        None => Ok(None),
        Some(link) => match node::load(link, store)? {
            None => Ok(None),
            Some(node) => node.get(&NibblePath::from_key(key), 0, store),
        },
    }
}

fn root_hash(root: &Option<Link>) -> HashValue {
    match root {
        None => HashValue::zero(),
        Some(link) => link.hash(),
    }
}

fn flush_node(node: &Node, store: &dyn NodeStore, force_store: bool) -> Result<HashValue> {
    flush_children(node, store)?;
    let encoding = node.encode();
    let hash = HashValue::sha3_256_of(&encoding);
    if force_store || encoding.len() >= node::INLINE_THRESHOLD {
        store.put(hash, encoding);
    }
    Ok(hash)
}

fn flush_children(node: &Node, store: &dyn NodeStore) -> Result<()> {
    match node {
        Node::Leaf { .. } => Ok(()),
        Node::Extension { child, .. } => flush_link(child, store),
        Node::Branch { children, .. } => {
            for link in children.iter().flatten() {
                flush_link(link, store)?;
            }
            Ok(())
        }
    }
}

fn flush_link(link: &Link, store: &dyn NodeStore) -> Result<()> {
    match link {
        Link::Hash(_) => Ok(()),
        Link::Owned(node) => flush_node(node, store, false).map(|_| ()),
    }
}

// --- insert -----------------------------------------------------------

fn insert(
    link: Option<Link>,
    remaining: &NibblePath,
    value: Vec<u8>,
    store: &dyn NodeStore,
) -> Result<Link> {
    let link = match link {
        None => return Ok(Link::Owned(Node::leaf(remaining.clone(), value))),
        Some(link) => link,
    };
    let node = node::load(&link, store)?
        .ok_or_else(|| bc_failure_ext::format_err!("dangling trie node reference"))?;

    match &*node {
        Node::Leaf { suffix, value: old_value } => {
            if suffix == remaining {
                return Ok(Link::Owned(Node::leaf(remaining.clone(), value)));
            }
            let common = suffix.common_prefix_len(remaining);
            let prefix = suffix.slice(0, common);
            let a_rest = suffix.slice(common, suffix.len());
            let b_rest = remaining.slice(common, remaining.len());
            Ok(wrap_with_prefix(
                prefix,
                branch_from_two(a_rest, old_value.clone(), b_rest, value),
            ))
        }
        Node::Extension { shared_prefix, child } => {
            let common = shared_prefix.common_prefix_len(remaining);
            if common == shared_prefix.len() {
                let rest = remaining.slice(common, remaining.len());
                let new_child = insert(Some(child.clone()), &rest, value, store)?;
                Ok(Link::Owned(Node::extension(shared_prefix.clone(), new_child)))
            } else {
                split_extension(shared_prefix, child.clone(), remaining, value, common)
            }
        }
        Node::Branch { children, value: branch_value } => {
            if remaining.is_empty() {
                let children = children.clone();
                Ok(Link::Owned(Node::branch(children, Some(value))))
            } else {
                let nibble = remaining.get(0) as usize;
                let rest = remaining.slice(1, remaining.len());
                let new_child = insert(children[nibble].clone(), &rest, value, store)?;
                let mut children = children.clone();
                children[nibble] = Some(new_child);
                Ok(Link::Owned(Node::branch(children, branch_value.clone())))
            }
        }
    }
}

fn split_extension(
    shared_prefix: &NibblePath,
    child: Link,
    remaining: &NibblePath,
    value: Vec<u8>,
    common: usize,
) -> Result<Link> {
    let prefix = shared_prefix.slice(0, common);
    let ext_rest = shared_prefix.slice(common, shared_prefix.len());
    let rem_rest = remaining.slice(common, remaining.len());

    let mut children: Box<[Option<Link>; 16]> = Box::new(Default::default());
    let ext_nibble = ext_rest.get(0) as usize;
    let ext_link = if ext_rest.len() == 1 {
        child
    } else {
        Link::Owned(Node::extension(ext_rest.slice(1, ext_rest.len()), child))
    };
    children[ext_nibble] = Some(ext_link);

    let branch_value = if rem_rest.is_empty() {
        Some(value)
    } else {
        let rem_nibble = rem_rest.get(0) as usize;
        children[rem_nibble] = Some(Link::Owned(Node::leaf(rem_rest.slice(1, rem_rest.len()), value)));
        None
    };

    Ok(wrap_with_prefix(prefix, Link::Owned(Node::branch(children, branch_value))))
}

fn branch_from_two(a_path: NibblePath, a_value: Vec<u8>, b_path: NibblePath, b_value: Vec<u8>) -> Link {
    let mut children: Box<[Option<Link>; 16]> = Box::new(Default::default());
    let mut branch_value = None;

    if a_path.is_empty() {
        branch_value = Some(a_value);
    } else {
        let nibble = a_path.get(0) as usize;
        children[nibble] = Some(Link::Owned(Node::leaf(a_path.slice(1, a_path.len()), a_value)));
    }
    if b_path.is_empty() {
        branch_value = Some(b_value);
    } else {
        let nibble = b_path.get(0) as usize;
        children[nibble] = Some(Link::Owned(Node::leaf(b_path.slice(1, b_path.len()), b_value)));
    }

    Link::Owned(Node::branch(children, branch_value))
}

fn wrap_with_prefix(prefix: NibblePath, inner: Link) -> Link {
    if prefix.is_empty() {
        inner
    } else {
        Link::Owned(Node::extension(prefix, inner))
    }
}

// --- delete -------------------------------------------------------------

fn delete(link: Link, remaining: &NibblePath, store: &dyn NodeStore) -> Result<Option<Link>> {
    let node = node::load(&link, store)?
        .ok_or_else(|| bc_failure_ext::format_err!("dangling trie node reference"))?;

    match &*node {
        Node::Leaf { suffix, .. } => {
            if suffix == remaining {
                Ok(None)
            } else {
                Ok(Some(link))
            }
        }
        Node::Extension { shared_prefix, child } => {
            if remaining.len() < shared_prefix.len()
                || remaining.slice(0, shared_prefix.len()) != *shared_prefix
            {
                return Ok(Some(link));
            }
            let rest = remaining.slice(shared_prefix.len(), remaining.len());
            match delete(child.clone(), &rest, store)? {
                None => Ok(None),
                Some(new_child) => merge_extension(shared_prefix, new_child, store),
            }
        }
        Node::Branch { children, value } => {
            if remaining.is_empty() {
                if value.is_none() {
                    return Ok(Some(link));
                }
                rebuild_branch(children.clone(), None, store)
            } else {
                let nibble = remaining.get(0) as usize;
                match &children[nibble] {
                    None => Ok(Some(link)),
                    Some(child_link) => {
                        let rest = remaining.slice(1, remaining.len());
                        let updated = delete(child_link.clone(), &rest, store)?;
                        let mut new_children = children.clone();
                        new_children[nibble] = updated;
                        rebuild_branch(new_children, value.clone(), store)
                    }
                }
            }
        }
    }
}

fn rebuild_branch(
    children: Box<[Option<Link>; 16]>,
    value: Option<Vec<u8>>,
    store: &dyn NodeStore,
) -> Result<Option<Link>> {
    let occupied: Vec<usize> = (0..16).filter(|&i| children[i].is_some()).collect();

    match (occupied.len(), &value) {
        (0, None) => Ok(None),
        (0, Some(_)) => {
            let value = value.expect("checked Some above");
            Ok(Some(Link::Owned(Node::leaf(NibblePath::empty(), value))))
        }
        (1, None) => {
            let nibble = occupied[0];
            let child_link = children[nibble].clone().expect("occupied slot");
            collapse_single_child(nibble as u8, child_link, store)
        }
        _ => Ok(Some(Link::Owned(Node::branch(children, value)))),
    }
}

fn collapse_single_child(nibble: u8, link: Link, store: &dyn NodeStore) -> Result<Option<Link>> {
    let node = node::load(&link, store)?
        .ok_or_else(|| bc_failure_ext::format_err!("dangling trie node reference"))?;
    match &*node {
        Node::Leaf { suffix, value } => {
            Ok(Some(Link::Owned(Node::leaf(prepend(nibble, suffix), value.clone()))))
        }
        Node::Extension { shared_prefix, child } => {
            Ok(Some(Link::Owned(Node::extension(prepend(nibble, shared_prefix), child.clone()))))
        }
        Node::Branch { .. } => {
            Ok(Some(Link::Owned(Node::extension(prepend(nibble, &NibblePath::empty()), link))))
        }
    }
}

fn merge_extension(shared_prefix: &NibblePath, new_child: Link, store: &dyn NodeStore) -> Result<Option<Link>> {
    let node = node::load(&new_child, store)?
        .ok_or_else(|| bc_failure_ext::format_err!("dangling trie node reference"))?;
    match &*node {
        Node::Leaf { suffix, value } => {
            Ok(Some(Link::Owned(Node::leaf(concat(shared_prefix, suffix), value.clone()))))
        }
        Node::Extension { shared_prefix: inner_prefix, child: inner_child } => Ok(Some(Link::Owned(
            Node::extension(concat(shared_prefix, inner_prefix), inner_child.clone()),
        ))),
        Node::Branch { .. } => Ok(Some(Link::Owned(Node::extension(shared_prefix.clone(), new_child)))),
    }
}

fn prepend(nibble: u8, path: &NibblePath) -> NibblePath {
    let mut out = NibblePath::empty();
    out.push(nibble);
    out.extend(path);
    out
}

fn concat(a: &NibblePath, b: &NibblePath) -> NibblePath {
    let mut out = a.clone();
    out.extend(b);
    out
}
