use std::borrow::Cow;

use solana_address::Address;
use thiserror::Error;

pub const PUBKEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("buffer too short: {needed} bytes needed at offset {offset}, {available} available")]
    BufferTooShort {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("value {value} cannot be represented as {codec}")]
    ValueOutOfRange { codec: &'static str, value: String },
    #[error("text of {len} bytes exceeds span of {span} bytes")]
    RangeExceeded { len: usize, span: usize },
    #[error("expected a {expected} value, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("record size mismatch: expected {expected} bytes, got {actual}")]
    RecordSizeMismatch { expected: usize, actual: usize },
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}`: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<LayoutError>,
    },
    #[error("layout offset overflow")]
    MathOverflow,
}

impl LayoutError {
    pub fn in_field(self, field: &'static str) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }

    /// Innermost error with any field context stripped.
    pub fn root_cause(&self) -> &LayoutError {
        match self {
            Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A fixed-width wire codec.
///
/// `decode` reads exactly `span()` bytes at `offset` and `encode` always
/// writes exactly `span()` bytes, returning that count.
pub trait Codec {
    type Value;

    fn span(&self) -> usize;

    fn decode(&self, data: &[u8], offset: usize) -> Result<Self::Value, LayoutError>;

    fn encode(&self, value: &Self::Value, data: &mut [u8], offset: usize)
        -> Result<usize, LayoutError>;
}

fn window(data: &[u8], offset: usize, span: usize) -> Result<&[u8], LayoutError> {
    let end = offset.checked_add(span).ok_or(LayoutError::MathOverflow)?;
    data.get(offset..end).ok_or(LayoutError::BufferTooShort {
        offset,
        needed: span,
        available: data.len().saturating_sub(offset),
    })
}

fn window_mut(data: &mut [u8], offset: usize, span: usize) -> Result<&mut [u8], LayoutError> {
    let end = offset.checked_add(span).ok_or(LayoutError::MathOverflow)?;
    let available = data.len().saturating_sub(offset);
    data.get_mut(offset..end).ok_or(LayoutError::BufferTooShort {
        offset,
        needed: span,
        available,
    })
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], LayoutError> {
    let mut out = [0u8; N];
    out.copy_from_slice(window(data, offset, N)?);
    Ok(out)
}

fn write_array<const N: usize>(
    data: &mut [u8],
    offset: usize,
    value: &[u8; N],
) -> Result<usize, LayoutError> {
    window_mut(data, offset, N)?.copy_from_slice(value);
    Ok(N)
}

macro_rules! le_codec {
    ($name:ident, $ty:ty, $len:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl Codec for $name {
            type Value = $ty;

            fn span(&self) -> usize {
                $len
            }

            fn decode(&self, data: &[u8], offset: usize) -> Result<$ty, LayoutError> {
                read_array::<$len>(data, offset).map(<$ty>::from_le_bytes)
            }

            fn encode(
                &self,
                value: &$ty,
                data: &mut [u8],
                offset: usize,
            ) -> Result<usize, LayoutError> {
                write_array(data, offset, &value.to_le_bytes())
            }
        }
    };
}

le_codec!(U8, u8, 1);
le_codec!(U32, u32, 4);
le_codec!(U64, u64, 8);
// Two's-complement comes for free from the native signed conversions.
le_codec!(I64, i64, 8);

/// Single-byte boolean: any nonzero byte decodes as `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bool;

impl Codec for Bool {
    type Value = bool;

    fn span(&self) -> usize {
        1
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<bool, LayoutError> {
        Ok(U8.decode(data, offset)? != 0)
    }

    fn encode(&self, value: &bool, data: &mut [u8], offset: usize) -> Result<usize, LayoutError> {
        U8.encode(&(*value as u8), data, offset)
    }
}

/// UTF-8 text stored in exactly `n` bytes.
///
/// Decoding trims trailing NUL padding only. Anything else in the span,
/// including spaces or bytes after an embedded NUL, is returned as-is.
/// Encoding zero-fills whatever the text does not cover and rejects text
/// ending in NUL, which decode could not give back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedUtf8(pub usize);

impl Codec for FixedUtf8 {
    type Value = String;

    fn span(&self) -> usize {
        self.0
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<String, LayoutError> {
        let raw = window(data, offset, self.0)?;
        let used = raw.iter().rposition(|byte| *byte != 0).map_or(0, |last| last + 1);
        Ok(match String::from_utf8_lossy(&raw[..used]) {
            Cow::Borrowed(text) => text.to_owned(),
            Cow::Owned(text) => text,
        })
    }

    fn encode(&self, value: &String, data: &mut [u8], offset: usize) -> Result<usize, LayoutError> {
        let bytes = value.as_bytes();
        if bytes.len() > self.0 {
            return Err(LayoutError::RangeExceeded {
                len: bytes.len(),
                span: self.0,
            });
        }
        if bytes.last() == Some(&0) {
            return Err(LayoutError::ValueOutOfRange {
                codec: "fixed utf8",
                value: format!("{value:?}"),
            });
        }
        let target = window_mut(data, offset, self.0)?;
        target[..bytes.len()].copy_from_slice(bytes);
        target[bytes.len()..].fill(0);
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicKeyId;

impl Codec for PublicKeyId {
    type Value = Address;

    fn span(&self) -> usize {
        PUBKEY_LEN
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<Address, LayoutError> {
        read_array::<PUBKEY_LEN>(data, offset).map(Address::new_from_array)
    }

    fn encode(
        &self,
        value: &Address,
        data: &mut [u8],
        offset: usize,
    ) -> Result<usize, LayoutError> {
        write_array(data, offset, &value.to_bytes())
    }
}

/// Opaque byte run of a fixed length. Used for reserved regions and for
/// payloads the owning record parses itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob(pub usize);

impl Codec for Blob {
    type Value = Vec<u8>;

    fn span(&self) -> usize {
        self.0
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<Vec<u8>, LayoutError> {
        window(data, offset, self.0).map(<[u8]>::to_vec)
    }

    fn encode(
        &self,
        value: &Vec<u8>,
        data: &mut [u8],
        offset: usize,
    ) -> Result<usize, LayoutError> {
        if value.len() > self.0 {
            return Err(LayoutError::RangeExceeded {
                len: value.len(),
                span: self.0,
            });
        }
        let target = window_mut(data, offset, self.0)?;
        target[..value.len()].copy_from_slice(value);
        target[value.len()..].fill(0);
        Ok(self.0)
    }
}
