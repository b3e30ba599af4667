//! Minimal decoder for the base64 XDR `ScVal`s that `getEvents` returns by
//! default for event topics and payloads.
//!
//! Only the shapes the ledger contract publishes are understood. Anything
//! else (vectors, 256-bit integers, muxed addresses) decodes to
//! `None` and the caller falls back to treating the raw string as opaque.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

// `ScValType` discriminants.
const SCV_BOOL: u32 = 0;
const SCV_VOID: u32 = 1;
const SCV_U32: u32 = 3;
const SCV_I32: u32 = 4;
const SCV_U64: u32 = 5;
const SCV_I64: u32 = 6;
const SCV_TIMEPOINT: u32 = 7;
const SCV_DURATION: u32 = 8;
const SCV_U128: u32 = 9;
const SCV_I128: u32 = 10;
const SCV_STRING: u32 = 14;
const SCV_SYMBOL: u32 = 15;
const SCV_MAP: u32 = 17;
const SCV_ADDRESS: u32 = 18;

const SC_ADDRESS_TYPE_ACCOUNT: u32 = 0;
const SC_ADDRESS_TYPE_CONTRACT: u32 = 1;
const PUBLIC_KEY_TYPE_ED25519: u32 = 0;

// Strkey version bytes: `G...` accounts and `C...` contracts.
const STRKEY_ACCOUNT: u8 = 6 << 3;
const STRKEY_CONTRACT: u8 = 2 << 3;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Nesting limit for maps.
const MAX_DEPTH: u8 = 8;

/// A decoded `ScVal`, flattened to what the indexer stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScVal {
    Void,
    Bool(bool),
    /// Every integer width up to 128 bits.
    Int(i128),
    Symbol(String),
    Str(String),
    /// Strkey form (`G...` / `C...`).
    Address(String),
    Map(Vec<(ScVal, ScVal)>),
}

impl ScVal {
    /// Map entry under the symbol key `key`.
    pub fn get(&self, key: &str) -> Option<&ScVal> {
        match self {
            ScVal::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                ScVal::Symbol(s) if s == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    /// First of `keys` present in the map, rendered as a string.
    pub fn field(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key)?.as_plain_string())
    }

    /// Scalar rendered the way the `events` table stores it.
    pub fn as_plain_string(&self) -> Option<String> {
        match self {
            ScVal::Bool(b) => Some(b.to_string()),
            ScVal::Int(n) => Some(n.to_string()),
            ScVal::Symbol(s) | ScVal::Str(s) | ScVal::Address(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Decode one base64 XDR `ScVal`. Trailing bytes make the input invalid.
pub fn decode(raw: &str) -> Option<ScVal> {
    let bytes = BASE64.decode(raw).ok()?;
    let mut reader = Reader { bytes: &bytes, pos: 0 };
    let val = read_val(&mut reader, 0)?;
    (reader.pos == bytes.len()).then_some(val)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u32(&mut self) -> Option<u32> {
        Some(u32::from_be_bytes(self.take(4)?.try_into().ok()?))
    }

    fn u64(&mut self) -> Option<u64> {
        Some(u64::from_be_bytes(self.take(8)?.try_into().ok()?))
    }

    /// Variable-length opaque: length prefix, data, zero padding to 4 bytes.
    fn opaque(&mut self) -> Option<&'a [u8]> {
        let len = self.u32()? as usize;
        let data = self.take(len)?;
        self.take((4 - len % 4) % 4)?;
        Some(data)
    }

    /// XDR optional: a 0/1 flag, then the value when present.
    fn present(&mut self) -> Option<bool> {
        match self.u32()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

fn read_val(r: &mut Reader<'_>, depth: u8) -> Option<ScVal> {
    if depth > MAX_DEPTH {
        return None;
    }
    let val = match r.u32()? {
        SCV_BOOL => ScVal::Bool(r.u32()? != 0),
        SCV_VOID => ScVal::Void,
        SCV_U32 => ScVal::Int(r.u32()?.into()),
        SCV_I32 => ScVal::Int((r.u32()? as i32).into()),
        SCV_U64 | SCV_TIMEPOINT | SCV_DURATION => ScVal::Int(r.u64()?.into()),
        SCV_I64 => ScVal::Int((r.u64()? as i64).into()),
        SCV_U128 => {
            let hi = r.u64()?;
            let lo = r.u64()?;
            ScVal::Int(i128::try_from((u128::from(hi) << 64) | u128::from(lo)).ok()?)
        }
        SCV_I128 => {
            let hi = r.u64()? as i64;
            let lo = r.u64()?;
            ScVal::Int((i128::from(hi) << 64) | i128::from(lo))
        }
        SCV_STRING => ScVal::Str(String::from_utf8(r.opaque()?.to_vec()).ok()?),
        SCV_SYMBOL => {
            let symbol = r.opaque()?;
            if !symbol.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_') {
                return None;
            }
            ScVal::Symbol(String::from_utf8(symbol.to_vec()).ok()?)
        }
        SCV_MAP => {
            let mut entries = Vec::new();
            if r.present()? {
                for _ in 0..r.u32()? {
                    let key = read_val(r, depth + 1)?;
                    let val = read_val(r, depth + 1)?;
                    entries.push((key, val));
                }
            }
            ScVal::Map(entries)
        }
        SCV_ADDRESS => ScVal::Address(read_address(r)?),
        _ => return None,
    };
    Some(val)
}

fn read_address(r: &mut Reader<'_>) -> Option<String> {
    match r.u32()? {
        SC_ADDRESS_TYPE_ACCOUNT => {
            if r.u32()? != PUBLIC_KEY_TYPE_ED25519 {
                return None;
            }
            Some(strkey(STRKEY_ACCOUNT, r.take(32)?))
        }
        SC_ADDRESS_TYPE_CONTRACT => Some(strkey(STRKEY_CONTRACT, r.take(32)?)),
        _ => None,
    }
}

/// Stellar strkey: base32 of version byte, key, and CRC16-XModem (little-endian).
fn strkey(version: u8, key: &[u8]) -> String {
    let mut payload = Vec::with_capacity(key.len() + 3);
    payload.push(version);
    payload.extend_from_slice(key);
    let checksum = crc16_xmodem(&payload);
    payload.extend_from_slice(&checksum.to_le_bytes());
    base32(&payload)
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= u16::from(*byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// RFC 4648 base32 without padding.
fn base32(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for byte in data {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}
