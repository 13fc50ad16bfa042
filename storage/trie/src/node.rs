// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trie node representation, canonical encoding and hashing.
//!
//! A node is one of `Leaf`, `Extension` or `Branch`. Each holds its
//! children as a [`Link`], which is either an owned, in-memory (and
//! therefore possibly-dirty) sub-node or a bare [`HashValue`] pointing at
//! an already-persisted node the caller hasn't loaded. Sharing an owned
//! node between two tries (e.g. a mutable trie and an earlier snapshot of
//! it) is a cheap `Arc` clone, never a deep copy.

use bc_crypto::HashValue;
use bc_nibble::NibblePath;
use std::sync::Arc;

/// The inline-vs-hash threshold below which a child's own encoding is
/// embedded directly in its parent rather than addressed by hash. Below
/// 32 bytes a hash reference is no smaller than the content itself.
pub(crate) const INLINE_THRESHOLD: usize = HashValue::zero().as_bytes().len();

#[derive(Clone)]
pub enum Link {
    /// A child that lives only in the backing store; its content hasn't
    /// been loaded into this in-memory tree.
    Hash(HashValue),
    /// An in-memory child, shared (not copied) between any tries that
    /// still reference it.
    Owned(Arc<Node>),
}

impl Link {
    pub fn hash(&self) -> HashValue {
        match self {
            Link::Hash(h) => *h,
            Link::Owned(node) => node.hash(),
        }
    }
}

pub enum Node {
    Leaf {
        suffix: NibblePath,
        value: Vec<u8>,
    },
    Extension {
        shared_prefix: NibblePath,
        child: Link,
    },
    Branch {
        children: Box<[Option<Link>; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl Node {
    pub fn leaf(suffix: NibblePath, value: Vec<u8>) -> Arc<Node> {
        Arc::new(Node::Leaf { suffix, value })
    }

    pub fn extension(shared_prefix: NibblePath, child: Link) -> Arc<Node> {
        Arc::new(Node::Extension { shared_prefix, child })
    }

    pub fn branch(children: Box<[Option<Link>; 16]>, value: Option<Vec<u8>>) -> Arc<Node> {
        Arc::new(Node::Branch { children, value })
    }

    /// The node's canonical byte encoding. Child links under
    /// [`INLINE_THRESHOLD`] bytes are embedded by value; larger ones are
    /// embedded by their 32-byte hash, matching [`child_ref`].
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Node::Leaf { suffix, value } => {
                out.push(0u8);
                write_bytes(&mut out, &suffix.to_hex_prefix(true));
                write_bytes(&mut out, value);
            }
            Node::Extension { shared_prefix, child } => {
                out.push(1u8);
                write_bytes(&mut out, &shared_prefix.to_hex_prefix(false));
                write_child_ref(&mut out, child);
            }
            Node::Branch { children, value } => {
                out.push(2u8);
                for slot in children.iter() {
                    match slot {
                        None => out.push(0),
                        Some(link) => {
                            out.push(1);
                            write_child_ref(&mut out, link);
                        }
                    }
                }
                match value {
                    None => out.push(0),
                    Some(v) => {
                        out.push(1);
                        write_bytes(&mut out, v);
                    }
                }
            }
        }
        out
    }

    pub fn hash(&self) -> HashValue {
        HashValue::sha3_256_of(&self.encode())
    }

    /// Looks up `path[depth..]` under this node, loading hash-only
    /// children from `store` on the way down.
    pub fn get(
        &self,
        path: &NibblePath,
        depth: usize,
        store: &dyn crate::store::NodeStore,
    ) -> bc_failure_ext::Result<Option<Vec<u8>>> {
        match self {
            Node::Leaf { suffix, value } => {
                if nibbles_equal(path, depth, suffix) {
                    Ok(Some(value.clone()))
                } else {
                    Ok(None)
                }
            }
            Node::Extension { shared_prefix, child } => {
                if nibbles_equal_prefix(path, depth, shared_prefix) {
                    let next = depth + shared_prefix.len();
                    load(child, store)?
                        .as_ref()
                        .map(|node| node.get(path, next, store))
                        .unwrap_or(Ok(None))
                } else {
                    Ok(None)
                }
            }
            Node::Branch { children, value } => {
                if depth == path.len() {
                    return Ok(value.clone());
                }
                let nibble = path.get(depth) as usize;
                match &children[nibble] {
                    None => Ok(None),
                    Some(link) => load(link, store)?
                        .as_ref()
                        .map(|node| node.get(path, depth + 1, store))
                        .unwrap_or(Ok(None)),
                }
            }
        }
    }
}

pub(crate) fn load(
    link: &Link,
    store: &dyn crate::store::NodeStore,
) -> bc_failure_ext::Result<Option<Arc<Node>>> {
    match link {
        Link::Owned(node) => Ok(Some(node.clone())),
        Link::Hash(hash) => match store.get(hash)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(Arc::new(crate::codec::decode_node(&bytes)?))),
        },
    }
}

fn nibbles_equal(path: &NibblePath, depth: usize, suffix: &NibblePath) -> bool {
    path.len() - depth == suffix.len() && path.slice(depth, path.len()) == *suffix
}

fn nibbles_equal_prefix(path: &NibblePath, depth: usize, prefix: &NibblePath) -> bool {
    path.len() - depth >= prefix.len() && path.slice(depth, depth + prefix.len()) == *prefix
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

fn write_child_ref(out: &mut Vec<u8>, link: &Link) {
    match child_ref(link) {
        ChildRef::Inline(bytes) => {
            out.push(0);
            write_bytes(out, &bytes);
        }
        ChildRef::Hashed(hash) => {
            out.push(1);
            out.extend_from_slice(hash.as_bytes());
        }
    }
}

pub enum ChildRef {
    Inline(Vec<u8>),
    Hashed(HashValue),
}

/// Decides how `link` is embedded in its parent's encoding: loaded/owned
/// children under the inline threshold are embedded by value, everything
/// else by hash.
pub fn child_ref(link: &Link) -> ChildRef {
    match link {
        Link::Hash(hash) => ChildRef::Hashed(*hash),
        Link::Owned(node) => {
            let encoding = node.encode();
            if encoding.len() < INLINE_THRESHOLD {
                ChildRef::Inline(encoding)
            } else {
                ChildRef::Hashed(HashValue::sha3_256_of(&encoding))
            }
        }
    }
}

pub(crate) fn nibble_path_from_slice(path: &NibblePath, start: usize, end: usize) -> NibblePath {
    path.slice(start, end)
}
