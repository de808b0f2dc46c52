//! Order-preserving tuple encoding for keys.
//!
//! Packed tuples compare byte-wise in the same order as their elements
//! compare element-wise, which is what makes range scans over a composite
//! key such as `(count, code)` return entries in numeric order.
//!
//! Wire format per element:
//! - string: `0x02`, UTF-8 bytes with `0x00` escaped as `0x00 0xFF`, `0x00`
//! - unsigned integer: `0x15`, 8 bytes big-endian

use crate::error::{Result, StoreError};
use std::fmt::Display;

const STRING_CODE: u8 = 0x02;
const U64_CODE: u8 = 0x15;
const NUL: u8 = 0x00;
const ESCAPE: u8 = 0xFF;

/// A single tuple element.
///
/// Strings sort before integers because of their type code ordering, but
/// the keyspace never mixes the two at the same position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Str(String),
    U64(u64),
}

impl Element {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Element::Str(s) => Some(s),
            Element::U64(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Element::U64(n) => Some(*n),
            Element::Str(_) => None,
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Str(s) => write!(f, "{s:?}"),
            Element::U64(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::Str(value.to_string())
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::Str(value)
    }
}

impl From<u64> for Element {
    fn from(value: u64) -> Self {
        Element::U64(value)
    }
}

/// Packs `elements` into a key.
pub fn pack(elements: &[Element]) -> Vec<u8> {
    let mut out = Vec::new();
    for element in elements {
        pack_into(&mut out, element);
    }
    out
}

/// Appends the encoding of one element to `out`.
pub fn pack_into(out: &mut Vec<u8>, element: &Element) {
    match element {
        Element::Str(s) => {
            out.push(STRING_CODE);
            for &byte in s.as_bytes() {
                out.push(byte);
                if byte == NUL {
                    out.push(ESCAPE);
                }
            }
            out.push(NUL);
        }
        Element::U64(n) => {
            out.push(U64_CODE);
            out.extend_from_slice(&n.to_be_bytes());
        }
    }
}

/// Decodes a key produced by [`pack`].
pub fn unpack(mut bytes: &[u8]) -> Result<Vec<Element>> {
    let mut elements = Vec::new();
    while let Some((&code, rest)) = bytes.split_first() {
        let (element, rest) = match code {
            STRING_CODE => unpack_str(rest)?,
            U64_CODE => unpack_u64(rest)?,
            other => {
                return Err(StoreError::InvalidKey(format!(
                    "unknown type code {other:#04x}"
                )))
            }
        };
        elements.push(element);
        bytes = rest;
    }
    Ok(elements)
}

fn unpack_str(bytes: &[u8]) -> Result<(Element, &[u8])> {
    let mut raw = Vec::new();
    let mut i = 0;
    loop {
        match bytes.get(i) {
            None => {
                return Err(StoreError::InvalidKey(
                    "unterminated string element".to_string(),
                ))
            }
            Some(&NUL) if bytes.get(i + 1) == Some(&ESCAPE) => {
                raw.push(NUL);
                i += 2;
            }
            Some(&NUL) => break,
            Some(&byte) => {
                raw.push(byte);
                i += 1;
            }
        }
    }
    let s = String::from_utf8(raw)
        .map_err(|e| StoreError::InvalidKey(format!("string element is not UTF-8: {e}")))?;
    Ok((Element::Str(s), &bytes[i + 1..]))
}

fn unpack_u64(bytes: &[u8]) -> Result<(Element, &[u8])> {
    if bytes.len() < 8 {
        return Err(StoreError::InvalidKey(format!(
            "integer element needs 8 bytes, found {}",
            bytes.len()
        )));
    }
    let (head, rest) = bytes.split_at(8);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(head);
    Ok((Element::U64(u64::from_be_bytes(buf)), rest))
}
