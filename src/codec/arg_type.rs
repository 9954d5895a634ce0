//! Argument descriptors.
//!
//! On the wire a descriptor is one big-endian 32-bit integer:
//! ```text
//! bit 31      INPUT
//! bit 30      OUTPUT
//! bits 16-23  scalar type code
//! bits 0-15   array length (0 = scalar)
//! ```
//! Inside the crate it is the closed type [`ArgType`]; raw integers only
//! exist at the wire boundary.

use std::fmt;

use crate::error::{Result, RpcError};

/// INPUT direction bit.
pub const ARG_INPUT: u32 = 1 << 31;
/// OUTPUT direction bit.
pub const ARG_OUTPUT: u32 = 1 << 30;

const TYPE_SHIFT: u32 = 16;
const TYPE_MASK: u32 = 0xFF << TYPE_SHIFT;
const LENGTH_MASK: u32 = 0xFFFF;

/// Element type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Char,
    Short,
    Int,
    Long,
    Double,
    Float,
}

impl ScalarType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarType::Char => 1,
            ScalarType::Short => 2,
            ScalarType::Int | ScalarType::Float => 4,
            ScalarType::Long | ScalarType::Double => 8,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            ScalarType::Char => 1,
            ScalarType::Short => 2,
            ScalarType::Int => 3,
            ScalarType::Long => 4,
            ScalarType::Double => 5,
            ScalarType::Float => 6,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            1 => ScalarType::Char,
            2 => ScalarType::Short,
            3 => ScalarType::Int,
            4 => ScalarType::Long,
            5 => ScalarType::Double,
            6 => ScalarType::Float,
            _ => return None,
        })
    }
}

/// Which way an argument's bytes travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server only.
    Input,
    /// Server to client only.
    Output,
    /// Both ways.
    InOut,
}

impl Direction {
    fn bits(self) -> u32 {
        match self {
            Direction::Input => ARG_INPUT,
            Direction::Output => ARG_OUTPUT,
            Direction::InOut => ARG_INPUT | ARG_OUTPUT,
        }
    }

    fn from_bits(bits: u32) -> Option<Self> {
        match (bits & ARG_INPUT != 0, bits & ARG_OUTPUT != 0) {
            (true, true) => Some(Direction::InOut),
            (true, false) => Some(Direction::Input),
            (false, true) => Some(Direction::Output),
            (false, false) => None,
        }
    }

    /// Whether an argument with this direction takes part in a `pass`.
    #[inline]
    pub fn includes(self, pass: Direction) -> bool {
        self.bits() & pass.bits() != 0
    }
}

/// Scalar or fixed-length array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    /// Always at least one element.
    Array(u16),
}

/// Descriptor for one argument: type, direction and shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgType {
    pub scalar: ScalarType,
    pub direction: Direction,
    pub shape: Shape,
}

impl ArgType {
    pub fn new(scalar: ScalarType, direction: Direction) -> Self {
        Self {
            scalar,
            direction,
            shape: Shape::Scalar,
        }
    }

    pub fn input(scalar: ScalarType) -> Self {
        Self::new(scalar, Direction::Input)
    }

    pub fn output(scalar: ScalarType) -> Self {
        Self::new(scalar, Direction::Output)
    }

    pub fn inout(scalar: ScalarType) -> Self {
        Self::new(scalar, Direction::InOut)
    }

    /// Turn this descriptor into an array of `len` elements.
    ///
    /// A length of zero means scalar, as on the wire.
    pub fn array(mut self, len: u16) -> Self {
        self.shape = match len {
            0 => Shape::Scalar,
            n => Shape::Array(n),
        };
        self
    }

    /// Number of elements the argument holds.
    #[inline]
    pub fn element_count(&self) -> usize {
        match self.shape {
            Shape::Scalar => 1,
            Shape::Array(n) => n as usize,
        }
    }

    /// Bytes this argument occupies on the wire.
    #[inline]
    pub fn wire_length(&self) -> usize {
        self.scalar.size() * self.element_count()
    }

    #[inline]
    pub fn is_input(&self) -> bool {
        self.direction.includes(Direction::Input)
    }

    #[inline]
    pub fn is_output(&self) -> bool {
        self.direction.includes(Direction::Output)
    }

    /// Encode to the 32-bit wire form. Never zero.
    pub fn to_raw(&self) -> u32 {
        let len = match self.shape {
            Shape::Scalar => 0,
            Shape::Array(n) => n as u32,
        };
        self.direction.bits() | (self.scalar.code() << TYPE_SHIFT) | len
    }

    /// Reject shapes the wire form cannot carry.
    ///
    /// `Shape::Array(0)` would be sent as a scalar, so the two ends would
    /// disagree on the argument's size.
    pub fn validate(&self) -> Result<()> {
        if self.shape == Shape::Array(0) {
            return Err(RpcError::InvalidArgs(format!(
                "{:?} {:?} array has no elements",
                self.direction, self.scalar
            )));
        }
        Ok(())
    }

    /// Decode the 32-bit wire form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgs` for a missing direction or unknown type code.
    pub fn from_raw(raw: u32) -> Result<Self> {
        let direction = Direction::from_bits(raw).ok_or_else(|| {
            RpcError::InvalidArgs(format!("descriptor {raw:#010x} has no direction"))
        })?;
        let code = (raw & TYPE_MASK) >> TYPE_SHIFT;
        let scalar = ScalarType::from_code(code).ok_or_else(|| {
            RpcError::InvalidArgs(format!("descriptor {raw:#010x} has unknown type {code}"))
        })?;
        Ok(Self::new(scalar, direction).array((raw & LENGTH_MASK) as u16))
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.direction, self.scalar)?;
        if let Shape::Array(n) = self.shape {
            write!(f, "[{n}]")?;
        }
        Ok(())
    }
}

/// Decode a raw, zero-terminated descriptor list.
///
/// Reading stops at the first zero; a list without a sentinel is read to
/// its end.
pub fn arg_types_from_raw(raw: &[i32]) -> Result<Vec<ArgType>> {
    raw.iter()
        .take_while(|r| **r != 0)
        .map(|r| ArgType::from_raw(*r as u32))
        .collect()
}
