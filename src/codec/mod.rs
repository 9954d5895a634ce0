//! Codec module - argument descriptors, values and marshalling.
//!
//! - [`ArgType`] - closed descriptor type (scalar type, direction, shape)
//! - [`Value`] - caller-owned typed argument storage
//! - [`pack_args`] / [`unpack_args`] - direction-filtered encoding into a packet
//!
//! # Example
//!
//! ```
//! use dynrpc_client::codec::{pack_args, unpack_args, total_wire_length, ArgType, Direction, ScalarType, Value};
//! use dynrpc_client::protocol::Packet;
//!
//! let types = [ArgType::input(ScalarType::Int), ArgType::input(ScalarType::Int)];
//! let values = [Value::int(3), Value::int(4)];
//!
//! let mut packet = Packet::with_body_capacity(total_wire_length(&types)).unwrap();
//! pack_args(&mut packet, 0, &types, &values, Direction::Input).unwrap();
//!
//! let mut out = [Value::int(0), Value::int(0)];
//! unpack_args(&packet, 0, &types, &mut out, Direction::Input).unwrap();
//! assert_eq!(out, values);
//! ```

mod arg_type;
mod marshal;
mod value;

pub use arg_type::{arg_types_from_raw, ArgType, Direction, ScalarType, Shape, ARG_INPUT, ARG_OUTPUT};
pub use marshal::{pack_args, total_wire_length, unpack_args};
pub use value::Value;
