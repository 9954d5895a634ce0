//! Typed argument storage.
//!
//! Every argument is a vector of elements of one scalar type; scalars are
//! one-element vectors. Elements are big-endian on the wire.

use super::arg_type::{ArgType, ScalarType};
use crate::error::{Result, RpcError};

fn to_array<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(chunk);
    out
}

macro_rules! impl_values {
    ($($variant:ident($rust:ty) => $ctor:ident, $get:ident, $get_slice:ident;)*) => {
        /// One argument location.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Value {
            $($variant(Vec<$rust>),)*
        }

        impl Value {
            $(
                pub fn $ctor(v: $rust) -> Self {
                    Value::$variant(vec![v])
                }

                /// Scalar accessor; `None` for other types or arrays.
                pub fn $get(&self) -> Option<$rust> {
                    match self {
                        Value::$variant(v) if v.len() == 1 => Some(v[0]),
                        _ => None,
                    }
                }

                pub fn $get_slice(&self) -> Option<&[$rust]> {
                    match self {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            )*

            pub fn scalar_type(&self) -> ScalarType {
                match self {
                    $(Value::$variant(_) => ScalarType::$variant,)*
                }
            }

            /// Number of elements.
            pub fn len(&self) -> usize {
                match self {
                    $(Value::$variant(v) => v.len(),)*
                }
            }

            /// Write elements big-endian into `out`, which must hold them all.
            pub(crate) fn encode_into(&self, out: &mut [u8]) {
                match self {
                    $(Value::$variant(v) => {
                        let chunks = out.chunks_exact_mut(std::mem::size_of::<$rust>());
                        for (chunk, x) in chunks.zip(v) {
                            chunk.copy_from_slice(&x.to_be_bytes());
                        }
                    })*
                }
            }

            /// Read the elements `ty` describes from `bytes`.
            pub(crate) fn decode(ty: &ArgType, bytes: &[u8]) -> Self {
                match ty.scalar {
                    $(ScalarType::$variant => Value::$variant(
                        bytes
                            .chunks_exact(std::mem::size_of::<$rust>())
                            .take(ty.element_count())
                            .map(|c| <$rust>::from_be_bytes(to_array(c)))
                            .collect(),
                    ),)*
                }
            }
        }
    };
}

impl_values! {
    Char(i8) => char, as_char, as_chars;
    Short(i16) => short, as_short, as_shorts;
    Int(i32) => int, as_int, as_ints;
    Long(i64) => long, as_long, as_longs;
    Double(f64) => double, as_double, as_doubles;
    Float(f32) => float, as_float, as_floats;
}

impl Value {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All-zero value shaped like `ty`, for OUTPUT slots.
    pub fn zeroed(ty: &ArgType) -> Self {
        Value::decode(ty, &vec![0u8; ty.wire_length()])
    }

    /// Check that this value can be packed under `ty`.
    pub fn check(&self, ty: &ArgType) -> Result<()> {
        ty.validate()?;
        if self.scalar_type() != ty.scalar {
            return Err(RpcError::InvalidArgs(format!(
                "{ty} given a {:?} value",
                self.scalar_type()
            )));
        }
        if self.len() != ty.element_count() {
            return Err(RpcError::InvalidArgs(format!(
                "{ty} given {} elements",
                self.len()
            )));
        }
        Ok(())
    }
}
