//! Canonical CBOR encoding for entries and filters.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//!
//! Entry bytes are the filter key, so two peers must produce identical
//! bytes for equal entries. An entry always encodes as a three-element map
//! whose header byte is `0xa3`; the key therefore never starts with a zero
//! byte and stripping right-alignment padding cannot eat into it.
//!
//! A filter encodes as an array of cell records, one per cell, each a map
//! `{0: key bytes, 1: signature, 2: count}`.

use ciborium::value::{Integer, Value};
use std::io::Cursor;

use crate::cell::Cell;
use crate::entry::RouteEntry;
use crate::error::CoreError;
use crate::filter::Filter;
use crate::name::Name;

/// Entry field keys.
mod entry_keys {
    pub const DESTINATION: u64 = 0;
    pub const NEXT_HOP: u64 = 1;
    pub const COST: u64 = 2;
}

/// Cell record field keys.
mod cell_keys {
    pub const KEY: u64 = 0;
    pub const SIGNATURE: u64 = 1;
    pub const COUNT: u64 = 2;
}

/// Encode an entry to canonical CBOR bytes.
pub fn entry_bytes(entry: &RouteEntry) -> Vec<u8> {
    encode_cbor_value_canonical(&entry_to_cbor_value(entry))
}

/// Parse canonical entry bytes.
///
/// Input that decodes but does not re-encode to the same bytes (trailing
/// data, non-minimal integers, unsorted keys) is rejected.
pub fn parse_entry(bytes: &[u8]) -> Result<RouteEntry, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::MalformedEntry("empty".into()));
    }

    let value: Value = ciborium::from_reader(Cursor::new(bytes))
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let entry = cbor_value_to_entry(&value)?;

    if entry_bytes(&entry) != bytes {
        return Err(CoreError::MalformedEntry("non-canonical encoding".into()));
    }
    Ok(entry)
}

/// Encode a filter to its wire form.
pub fn filter_bytes(filter: &Filter) -> Vec<u8> {
    let cells = filter.cells().iter().map(cell_to_cbor_value).collect();
    encode_cbor_value_canonical(&Value::Array(cells))
}

/// Decode a filter from its wire form.
pub fn decode_filter(bytes: &[u8]) -> Result<Filter, CoreError> {
    let value: Value = ciborium::from_reader(Cursor::new(bytes))
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let records = match value {
        Value::Array(items) => items,
        _ => return Err(CoreError::MalformedFilter("expected array of cells".into())),
    };

    let cells = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            cbor_value_to_cell(record)
                .map_err(|e| CoreError::MalformedFilter(format!("cell {}: {}", i, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Filter::from_cells(cells))
}

fn name_to_cbor_value(name: &Name) -> Value {
    Value::Array(name.components().iter().map(|c| Value::Text(c.clone())).collect())
}

fn entry_to_cbor_value(entry: &RouteEntry) -> Value {
    Value::Map(vec![
        (
            Value::Integer(entry_keys::DESTINATION.into()),
            name_to_cbor_value(&entry.destination),
        ),
        (
            Value::Integer(entry_keys::NEXT_HOP.into()),
            name_to_cbor_value(&entry.next_hop),
        ),
        (Value::Integer(entry_keys::COST.into()), Value::Integer(entry.cost.into())),
    ])
}

fn cell_to_cbor_value(cell: &Cell) -> Value {
    Value::Map(vec![
        (Value::Integer(cell_keys::KEY.into()), Value::Bytes(cell.key().to_vec())),
        (
            Value::Integer(cell_keys::SIGNATURE.into()),
            Value::Integer(cell.signature().into()),
        ),
        (Value::Integer(cell_keys::COUNT.into()), Value::Integer(cell.count().into())),
    ])
}

/// Look up a map value by integer key.
fn map_get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == i128::from(key)))
        .map(|(_, v)| v)
}

fn as_map(value: &Value) -> Result<&[(Value, Value)], CoreError> {
    match value {
        Value::Map(m) => Ok(m),
        _ => Err(CoreError::MalformedEntry("expected map".into())),
    }
}

fn cbor_value_to_name(value: Option<&Value>, field: &str) -> Result<Name, CoreError> {
    let items = match value {
        Some(Value::Array(items)) => items,
        _ => return Err(CoreError::MalformedEntry(format!("missing {}", field))),
    };

    let mut components = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Text(s) => components.push(s.clone()),
            _ => {
                return Err(CoreError::MalformedEntry(format!(
                    "non-text component in {}",
                    field
                )))
            }
        }
    }
    Name::from_components(components)
        .map_err(|e| CoreError::MalformedEntry(format!("{}: {}", field, e)))
}

fn integer_to_u64(i: Integer, field: &str) -> Result<u64, CoreError> {
    u64::try_from(i128::from(i))
        .map_err(|_| CoreError::MalformedEntry(format!("{} out of range", field)))
}

fn cbor_value_to_entry(value: &Value) -> Result<RouteEntry, CoreError> {
    let map = as_map(value)?;
    if map.len() != 3 {
        return Err(CoreError::MalformedEntry(format!(
            "expected 3 fields, got {}",
            map.len()
        )));
    }

    let destination = cbor_value_to_name(map_get(map, entry_keys::DESTINATION), "destination")?;
    let next_hop = cbor_value_to_name(map_get(map, entry_keys::NEXT_HOP), "next_hop")?;

    let cost = match map_get(map, entry_keys::COST) {
        Some(Value::Integer(i)) => integer_to_u64(*i, "cost")?,
        _ => return Err(CoreError::MalformedEntry("missing cost".into())),
    };

    Ok(RouteEntry {
        destination,
        next_hop,
        cost,
    })
}

fn cbor_value_to_cell(value: &Value) -> Result<Cell, CoreError> {
    let map = as_map(value)?;

    let key = match map_get(map, cell_keys::KEY) {
        Some(Value::Bytes(b)) => b.clone(),
        _ => return Err(CoreError::MalformedFilter("missing key".into())),
    };

    let signature = match map_get(map, cell_keys::SIGNATURE) {
        Some(Value::Integer(i)) => integer_to_u64(*i, "signature")?,
        _ => return Err(CoreError::MalformedFilter("missing signature".into())),
    };

    let count = match map_get(map, cell_keys::COUNT) {
        Some(Value::Integer(i)) => i64::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedFilter("count out of range".into()))?,
        _ => return Err(CoreError::MalformedFilter("missing count".into())),
    };

    Ok(Cell::from_parts(key, signature, count))
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
///
/// Only the value kinds built by this module are supported; anything else
/// is written as null.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        _ => buf.push(0xf6),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n = i128::from(i);
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map with keys sorted by their encoded bytes.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
