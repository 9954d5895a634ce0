//! Type-driven argument marshalling.
//!
//! [`pack_args`] and [`unpack_args`] walk the descriptor list with the
//! same offset iterator: only arguments taking part in the pass occupy
//! space, laid out back to back from the starting offset. Because both
//! sides share the walk, one fixed starting offset serves the outbound
//! INPUT pass and the inbound OUTPUT pass.

use super::arg_type::{ArgType, Direction};
use super::value::Value;
use crate::error::{Result, RpcError};
use crate::protocol::Packet;

/// Total wire bytes of every argument, regardless of direction.
pub fn total_wire_length(types: &[ArgType]) -> usize {
    types.iter().map(ArgType::wire_length).sum()
}

/// `(index, offset, len)` for each argument in `pass`.
fn slots(
    types: &[ArgType],
    offset: usize,
    pass: Direction,
) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
    types
        .iter()
        .enumerate()
        .filter(move |(_, ty)| ty.direction.includes(pass))
        .scan(offset, |next, (index, ty)| {
            let at = *next;
            *next += ty.wire_length();
            Some((index, at, ty.wire_length()))
        })
}

fn check_counts(types: &[ArgType], values: usize) -> Result<()> {
    if types.len() != values {
        return Err(RpcError::InvalidArgs(format!(
            "{} descriptors but {} values",
            types.len(),
            values
        )));
    }
    Ok(())
}

/// Encode the arguments in `pass` into `packet` starting at `offset`.
///
/// Returns the offset just past the last packed argument. Values are
/// checked against their descriptors before anything is written.
pub fn pack_args(
    packet: &mut Packet,
    offset: usize,
    types: &[ArgType],
    values: &[Value],
    pass: Direction,
) -> Result<usize> {
    check_counts(types, values.len())?;
    for (index, _, _) in slots(types, offset, pass) {
        values[index].check(&types[index])?;
    }

    let mut end = offset;
    for (index, at, len) in slots(types, offset, pass) {
        values[index].encode_into(packet.field_mut(at, len)?);
        end = at + len;
    }
    Ok(end)
}

/// Decode the arguments in `pass` from `packet` starting at `offset`.
///
/// Uses the same layout as [`pack_args`]. Every slot is decoded before
/// any value is replaced, so on error `values` is left as it was.
pub fn unpack_args(
    packet: &Packet,
    offset: usize,
    types: &[ArgType],
    values: &mut [Value],
    pass: Direction,
) -> Result<usize> {
    check_counts(types, values.len())?;

    let mut end = offset;
    let mut decoded = Vec::new();
    for (index, at, len) in slots(types, offset, pass) {
        let bytes = packet.field(at, len).ok_or(RpcError::PacketOverflow {
            offset: at,
            len,
            capacity: packet.body_capacity(),
        })?;
        decoded.push((index, Value::decode(&types[index], bytes)));
        end = at + len;
    }

    for (index, value) in decoded {
        values[index] = value;
    }
    Ok(end)
}
