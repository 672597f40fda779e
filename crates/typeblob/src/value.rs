//! Value descriptors and the structural serializer seam.

use std::convert::Infallible;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use typeblob_core::{alloc_zeroed, ElementType, Error, Result};

use crate::header::element_count;

/// Primitive element that maps onto an [`ElementType`].
pub trait Element: Copy + sealed::Sealed {
    /// Element type tag.
    const TYPE: ElementType;

    #[doc(hidden)]
    fn write_ne(self, out: &mut [u8]);

    #[doc(hidden)]
    fn read_ne(bytes: &[u8]) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const TYPE: ElementType = ElementType::$variant;

                #[inline]
                fn write_ne(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn read_ne(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }
            }
        )*
    };
}

impl_element! {
    f64 => Float64,
    f32 => Float32,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
}

/// Storage class of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeComplexity {
    /// No elements.
    Empty,
    /// Scalar, or a character vector.
    Simple,
    /// Two-dimensional with a singleton axis.
    SimpleVector,
    /// Any other flat array.
    SimpleArray,
    /// Needs the structural serializer.
    Composite,
    /// Cannot be stored.
    Unsupported,
}

/// Flat, typed, multi-dimensional array.
///
/// Element bytes are kept in host byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedArray {
    element_type: ElementType,
    dims: Vec<usize>,
    data: Vec<u8>,
}

impl TypedArray {
    /// Wrap raw element bytes, checking them against the shape.
    pub fn new(element_type: ElementType, dims: Vec<usize>, data: Vec<u8>) -> Result<Self> {
        let expected = element_count(&dims)?
            .checked_mul(element_type.size())
            .ok_or_else(|| Error::InvalidShape("payload size overflows".into()))?;
        if data.len() != expected {
            return Err(Error::InvalidShape(format!(
                "{} {} elements of shape {:?} need {} bytes, got {}",
                element_count(&dims)?,
                element_type.name(),
                dims,
                expected,
                data.len()
            )));
        }
        Ok(TypedArray {
            element_type,
            dims,
            data,
        })
    }

    /// Build an array from typed elements.
    pub fn from_slice<T: Element>(dims: Vec<usize>, values: &[T]) -> Result<Self> {
        let size = T::TYPE.size();
        let mut data = alloc_zeroed(values.len() * size)?;
        for (v, slot) in values.iter().zip(data.chunks_exact_mut(size)) {
            v.write_ne(slot);
        }
        TypedArray::new(T::TYPE, dims, data)
    }

    /// Build a 1x1 array.
    pub fn scalar<T: Element>(value: T) -> Result<Self> {
        TypedArray::from_slice(vec![1, 1], &[value])
    }

    /// Build a logical array.
    pub fn from_bools(dims: Vec<usize>, values: &[bool]) -> Result<Self> {
        let data = values.iter().map(|&b| u8::from(b)).collect();
        TypedArray::new(ElementType::Logical, dims, data)
    }

    /// Build a 1xN character row from UTF-16 code units.
    pub fn from_text(text: &str) -> Result<Self> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let data = units.iter().flat_map(|u| u.to_ne_bytes()).collect();
        TypedArray::new(ElementType::Char, vec![1, units.len()], data)
    }

    /// Build a 1xN byte stream tagged as opaque.
    pub fn opaque(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        TypedArray::new(ElementType::Opaque, vec![1, len], bytes)
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Raw element bytes in host byte order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.element_type.size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy the elements out as `T`, failing on a type mismatch.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::TYPE != self.element_type {
            return Err(Error::unsupported_type(format!(
                "array holds {}, requested {}",
                self.element_type.name(),
                T::TYPE.name()
            )));
        }
        Ok(self
            .data
            .chunks_exact(T::TYPE.size())
            .map(T::read_ne)
            .collect())
    }

    /// Decode a character array.
    pub fn to_text(&self) -> Result<String> {
        if self.element_type != ElementType::Char {
            return Err(Error::unsupported_type(format!(
                "array holds {}, not char",
                self.element_type.name()
            )));
        }
        let units: Vec<u16> = self
            .data
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Storage class of this array.
    ///
    /// Opaque arrays are pre-serialized streams; they are composite when
    /// byte-stream storage is enabled and unsupported otherwise.
    pub fn complexity(&self, byte_stream: bool) -> TypeComplexity {
        if self.is_empty() {
            return TypeComplexity::Empty;
        }
        let scalar = self.len() == 1;
        let vector = self.dims.len() == 2 && self.dims[0].min(self.dims[1]) == 1;
        match self.element_type {
            ElementType::Opaque if byte_stream => TypeComplexity::Composite,
            ElementType::Opaque => TypeComplexity::Unsupported,
            ElementType::Char if scalar || vector => TypeComplexity::Simple,
            ElementType::Char => TypeComplexity::SimpleArray,
            _ if scalar => TypeComplexity::Simple,
            _ if vector => TypeComplexity::SimpleVector,
            _ => TypeComplexity::SimpleArray,
        }
    }
}

/// Value handed to or returned from the pipelines.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<C = Infallible> {
    /// Flat typed array.
    Array(TypedArray),
    /// Structured value carried through the serializer.
    Composite(C),
}

impl<C> Value<C> {
    /// Storage class of this value.
    pub fn complexity(&self, byte_stream: bool) -> TypeComplexity {
        match self {
            Value::Array(array) => array.complexity(byte_stream),
            Value::Composite(_) => TypeComplexity::Composite,
        }
    }

    pub fn as_array(&self) -> Option<&TypedArray> {
        match self {
            Value::Array(array) => Some(array),
            Value::Composite(_) => None,
        }
    }

    pub fn into_array(self) -> Option<TypedArray> {
        match self {
            Value::Array(array) => Some(array),
            Value::Composite(_) => None,
        }
    }

    pub fn into_composite(self) -> Option<C> {
        match self {
            Value::Array(_) => None,
            Value::Composite(c) => Some(c),
        }
    }
}

impl<C> From<TypedArray> for Value<C> {
    fn from(array: TypedArray) -> Self {
        Value::Array(array)
    }
}

/// Flattens structured values into byte streams and back.
pub trait ArraySerializer {
    /// Structured value type.
    type Composite;

    /// Flatten a value.
    fn serialize(&self, value: &Self::Composite) -> Result<Vec<u8>>;

    /// Restore a value from [`serialize`](Self::serialize) output.
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Composite>;
}

/// Serializer for pipelines that only carry flat arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSerializer;

impl ArraySerializer for NoSerializer {
    type Composite = Infallible;

    fn serialize(&self, value: &Infallible) -> Result<Vec<u8>> {
        match *value {}
    }

    fn deserialize(&self, _bytes: &[u8]) -> Result<Infallible> {
        Err(Error::unsupported_type(
            "blob holds a serialized value and no serializer is available",
        ))
    }
}

/// JSON serializer for any serde type.
pub struct JsonSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
    pub fn new() -> Self {
        JsonSerializer {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonSerializer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonSerializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonSerializer")
    }
}

impl<T: Serialize + DeserializeOwned> ArraySerializer for JsonSerializer<T> {
    type Composite = T;

    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}
