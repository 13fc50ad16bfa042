// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Decodes the byte format `Node::encode` produces, the inverse half of
//! the codec. Kept separate from `node.rs` since encoding is a method on
//! `Node` but decoding has no `self` to hang off of.

use crate::node::{Link, Node};
use bc_crypto::HashValue;
use bc_failure_ext::{ensure, format_err, Result};
use bc_nibble::NibblePath;
use std::convert::{TryFrom, TryInto};
use std::sync::Arc;

pub fn decode_node(bytes: &[u8]) -> Result<Node> {
    let mut cursor = Cursor { bytes, pos: 0 };
    let node = decode_node_from(&mut cursor)?;
    ensure!(cursor.pos == cursor.bytes.len(), "trailing bytes in node encoding");
    Ok(node)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        ensure!(self.pos + n <= self.bytes.len(), "unexpected end of node encoding");
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_bytes(&mut self) -> Result<Vec<u8>> {
        let len_bytes: [u8; 4] = self.take(4)?.try_into().expect("slice of length 4");
        let len = u32::from_le_bytes(len_bytes) as usize;
        Ok(self.take(len)?.to_vec())
    }
}

fn decode_node_from(cursor: &mut Cursor<'_>) -> Result<Node> {
    match cursor.take_u8()? {
        0 => {
            let hex_prefix = cursor.take_bytes()?;
            let value = cursor.take_bytes()?;
            let (suffix, is_leaf) = NibblePath::from_hex_prefix(&hex_prefix);
            ensure!(is_leaf, "leaf tag but hex-prefix flag says extension");
            Ok(Node::Leaf { suffix, value })
        }
        1 => {
            let hex_prefix = cursor.take_bytes()?;
            let (shared_prefix, is_leaf) = NibblePath::from_hex_prefix(&hex_prefix);
            ensure!(!is_leaf, "extension tag but hex-prefix flag says leaf");
            let child = decode_child_ref(cursor)?;
            Ok(Node::Extension { shared_prefix, child })
        }
        2 => {
            let mut children: Box<[Option<Link>; 16]> = Box::new(Default::default());
            for slot in children.iter_mut() {
                if cursor.take_u8()? == 1 {
                    *slot = Some(decode_child_ref(cursor)?);
                }
            }
            let value = if cursor.take_u8()? == 1 {
                Some(cursor.take_bytes()?)
            } else {
                None
            };
            Ok(Node::Branch { children, value })
        }
        tag => Err(format_err!("unknown node tag {}", tag)),
    }
}

fn decode_child_ref(cursor: &mut Cursor<'_>) -> Result<Link> {
    match cursor.take_u8()? {
        0 => {
            let bytes = cursor.take_bytes()?;
            Ok(Link::Owned(Arc::new(decode_node(&bytes)?)))
        }
        1 => {
            let bytes = cursor.take(32)?;
            Ok(Link::Hash(HashValue::try_from(bytes)?))
        }
        tag => Err(format_err!("unknown child-ref tag {}", tag)),
    }
}
