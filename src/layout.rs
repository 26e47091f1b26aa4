use std::collections::BTreeMap;

use solana_address::Address;

use crate::{
    account_layouts::squad_layout,
    codec::{Blob, Bool, Codec, FixedUtf8, LayoutError, PublicKeyId, I64, U32, U64, U8},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U32(u32),
    U64(u64),
    I64(i64),
    Text(String),
    PublicKey(Address),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::Text(_) => "text",
            Value::PublicKey(_) => "public key",
            Value::Bytes(_) => "bytes",
        }
    }

    fn integer(&self) -> Option<i128> {
        match self {
            Value::U8(v) => Some(i128::from(*v)),
            Value::U32(v) => Some(i128::from(*v)),
            Value::U64(v) => Some(i128::from(*v)),
            Value::I64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }
}

/// Decoded fields keyed by name. Padding never appears here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<&'static str, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: Value) -> Option<Value> {
        self.0.insert(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn take(&mut self, name: &'static str) -> Result<Value, LayoutError> {
        self.0.remove(name).ok_or(LayoutError::MissingField(name))
    }

    pub fn take_bool(&mut self, name: &'static str) -> Result<bool, LayoutError> {
        match self.take(name)? {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other).in_field(name)),
        }
    }

    pub fn take_u8(&mut self, name: &'static str) -> Result<u8, LayoutError> {
        match self.take(name)? {
            Value::U8(v) => Ok(v),
            other => Err(mismatch("u8", &other).in_field(name)),
        }
    }

    pub fn take_u32(&mut self, name: &'static str) -> Result<u32, LayoutError> {
        match self.take(name)? {
            Value::U32(v) => Ok(v),
            other => Err(mismatch("u32", &other).in_field(name)),
        }
    }

    pub fn take_i64(&mut self, name: &'static str) -> Result<i64, LayoutError> {
        match self.take(name)? {
            Value::I64(v) => Ok(v),
            other => Err(mismatch("i64", &other).in_field(name)),
        }
    }

    pub fn take_text(&mut self, name: &'static str) -> Result<String, LayoutError> {
        match self.take(name)? {
            Value::Text(v) => Ok(v),
            other => Err(mismatch("text", &other).in_field(name)),
        }
    }

    pub fn take_public_key(&mut self, name: &'static str) -> Result<Address, LayoutError> {
        match self.take(name)? {
            Value::PublicKey(v) => Ok(v),
            other => Err(mismatch("public key", &other).in_field(name)),
        }
    }

    pub fn take_bytes(&mut self, name: &'static str) -> Result<Vec<u8>, LayoutError> {
        match self.take(name)? {
            Value::Bytes(v) => Ok(v),
            other => Err(mismatch("bytes", &other).in_field(name)),
        }
    }
}

impl FromIterator<(&'static str, Value)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (&'static str, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> LayoutError {
    LayoutError::TypeMismatch {
        expected,
        actual: actual.kind(),
    }
}

/// Wire type of a single layout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCodec {
    Bool,
    U8,
    U32,
    U64,
    I64,
    FixedUtf8(usize),
    PublicKey,
    Blob(usize),
}

impl FieldCodec {
    pub fn span(&self) -> usize {
        match self {
            FieldCodec::Bool => Bool.span(),
            FieldCodec::U8 => U8.span(),
            FieldCodec::U32 => U32.span(),
            FieldCodec::U64 => U64.span(),
            FieldCodec::I64 => I64.span(),
            FieldCodec::FixedUtf8(len) => FixedUtf8(*len).span(),
            FieldCodec::PublicKey => PublicKeyId.span(),
            FieldCodec::Blob(len) => Blob(*len).span(),
        }
    }

    pub fn decode_value(&self, data: &[u8], offset: usize) -> Result<Value, LayoutError> {
        Ok(match self {
            FieldCodec::Bool => Value::Bool(Bool.decode(data, offset)?),
            FieldCodec::U8 => Value::U8(U8.decode(data, offset)?),
            FieldCodec::U32 => Value::U32(U32.decode(data, offset)?),
            FieldCodec::U64 => Value::U64(U64.decode(data, offset)?),
            FieldCodec::I64 => Value::I64(I64.decode(data, offset)?),
            FieldCodec::FixedUtf8(len) => Value::Text(FixedUtf8(*len).decode(data, offset)?),
            FieldCodec::PublicKey => Value::PublicKey(PublicKeyId.decode(data, offset)?),
            FieldCodec::Blob(len) => Value::Bytes(Blob(*len).decode(data, offset)?),
        })
    }

    /// Integer values are accepted across widths as long as they fit.
    pub fn encode_value(
        &self,
        value: &Value,
        data: &mut [u8],
        offset: usize,
    ) -> Result<usize, LayoutError> {
        match (self, value) {
            (FieldCodec::Bool, Value::Bool(v)) => Bool.encode(v, data, offset),
            (FieldCodec::U8, v) => U8.encode(&narrow(v, "u8")?, data, offset),
            (FieldCodec::U32, v) => U32.encode(&narrow(v, "u32")?, data, offset),
            (FieldCodec::U64, v) => U64.encode(&narrow(v, "u64")?, data, offset),
            (FieldCodec::I64, v) => I64.encode(&narrow(v, "i64")?, data, offset),
            (FieldCodec::FixedUtf8(len), Value::Text(v)) => FixedUtf8(*len).encode(v, data, offset),
            (FieldCodec::PublicKey, Value::PublicKey(v)) => PublicKeyId.encode(v, data, offset),
            (FieldCodec::Blob(len), Value::Bytes(v)) => Blob(*len).encode(v, data, offset),
            (codec, other) => Err(mismatch(codec.kind(), other)),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FieldCodec::Bool => "bool",
            FieldCodec::U8 => "u8",
            FieldCodec::U32 => "u32",
            FieldCodec::U64 => "u64",
            FieldCodec::I64 => "i64",
            FieldCodec::FixedUtf8(_) => "text",
            FieldCodec::PublicKey => "public key",
            FieldCodec::Blob(_) => "bytes",
        }
    }
}

fn narrow<T: TryFrom<i128>>(value: &Value, codec: &'static str) -> Result<T, LayoutError> {
    let wide = value.integer().ok_or_else(|| mismatch(codec, value))?;
    T::try_from(wide).map_err(|_| LayoutError::ValueOutOfRange {
        codec,
        value: wide.to_string(),
    })
}

/// One slot of a [`StructLayout`]. Anonymous slots are padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: Option<&'static str>,
    pub codec: FieldCodec,
    pub offset: usize,
}

impl FieldSpec {
    pub const fn named(name: &'static str, codec: FieldCodec) -> Self {
        Self {
            name: Some(name),
            codec,
            offset: 0,
        }
    }

    pub const fn padding(len: usize) -> Self {
        Self {
            name: None,
            codec: FieldCodec::Blob(len),
            offset: 0,
        }
    }
}

/// Ordered fixed-span composition of field codecs.
///
/// Offsets are the running sum of the preceding spans; there is no implicit
/// alignment, so every gap must be declared as padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    fields: Vec<FieldSpec>,
    span: usize,
}

impl StructLayout {
    pub fn new(specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        let mut offset = 0usize;
        let mut fields = Vec::new();
        for mut spec in specs {
            spec.offset = offset;
            offset += spec.codec.span();
            fields.push(spec);
        }
        Self {
            fields,
            span: offset,
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == Some(name))
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.field(name).map(|spec| spec.offset)
    }

    pub fn decode(&self, data: &[u8]) -> Result<FieldMap, LayoutError> {
        if data.len() < self.span {
            return Err(LayoutError::RecordSizeMismatch {
                expected: self.span,
                actual: data.len(),
            });
        }

        let mut out = FieldMap::new();
        for spec in &self.fields {
            match spec.name {
                Some(name) => {
                    let value = spec
                        .codec
                        .decode_value(data, spec.offset)
                        .map_err(|err| err.in_field(name))?;
                    out.insert(name, value);
                }
                None => {
                    spec.codec.decode_value(data, spec.offset)?;
                }
            }
        }
        Ok(out)
    }

    pub fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>, LayoutError> {
        let mut data = vec![0u8; self.span];
        self.encode_into(fields, &mut data)?;
        Ok(data)
    }

    /// Writes every slot into `data`; padding slots are zero-filled.
    pub fn encode_into(&self, fields: &FieldMap, data: &mut [u8]) -> Result<(), LayoutError> {
        if data.len() < self.span {
            return Err(LayoutError::BufferTooShort {
                offset: 0,
                needed: self.span,
                available: data.len(),
            });
        }

        for spec in &self.fields {
            match spec.name {
                Some(name) => {
                    let value = fields.get(name).ok_or(LayoutError::MissingField(name))?;
                    spec.codec
                        .encode_value(value, data, spec.offset)
                        .map_err(|err| err.in_field(name))?;
                }
                None => {
                    let zeros = Value::Bytes(Vec::new());
                    spec.codec.encode_value(&zeros, data, spec.offset)?;
                }
            }
        }
        Ok(())
    }
}

/// Record kinds with a registered layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaId {
    Squad,
}

impl SchemaId {
    pub fn layout(self) -> &'static StructLayout {
        match self {
            SchemaId::Squad => squad_layout(),
        }
    }
}
