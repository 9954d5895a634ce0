//! Typed views of each message kind.
//!
//! Each schema owns the offsets of its phase, so callers never poke raw
//! offsets. Request encoders clear the packet first: the binder and
//! server layouts differ, and bytes left over from one phase must not
//! show up in the other.

use super::packet::Packet;
use super::wire_format::{
    binder_packet_length, exec_args_offset, server_packet_length, BINDER_LOC_MSG_HOST,
    BINDER_LOC_MSG_LEN, BINDER_LOC_MSG_PORT, CLIENT_EXEC_MSG_ARGS, CLIENT_EXEC_MSG_NAME,
    CLIENT_EXEC_MSG_RESULT, CLIENT_LOC_MSG_ARGS, CLIENT_LOC_MSG_NAME, INT_SIZE, MAX_HOST_LENGTH,
    MAX_NAME_LENGTH, MAX_PORT_LENGTH, SERVER_EXEC_FAIL_CAUSE,
};
use crate::codec::{pack_args, total_wire_length, unpack_args, ArgType, Direction, Value};
use crate::error::{Result, RpcError};

fn write_name(packet: &mut Packet, offset: usize, name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LENGTH {
        return Err(RpcError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_LENGTH,
        });
    }
    packet.set_field(offset, name.as_bytes())
}

/// Descriptors followed by the zero sentinel.
fn write_types(packet: &mut Packet, offset: usize, types: &[ArgType]) -> Result<()> {
    for (i, ty) in types.iter().enumerate() {
        packet.set_field(offset + INT_SIZE * i, &ty.to_raw().to_be_bytes())?;
    }
    packet.set_i32(offset + INT_SIZE * types.len(), 0)
}

fn read_types(packet: &Packet, offset: usize) -> Result<Vec<ArgType>> {
    let mut types = Vec::new();
    loop {
        let at = offset + INT_SIZE * types.len();
        match packet.get_i32(at) {
            Some(0) => return Ok(types),
            Some(raw) => types.push(ArgType::from_raw(raw as u32)?),
            None => {
                return Err(RpcError::InvalidArgs(
                    "descriptor list has no terminator".to_string(),
                ))
            }
        }
    }
}

/// Procedure name and descriptors as read back from a request.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSignature {
    pub name: String,
    pub types: Vec<ArgType>,
}

/// Client → binder: where is `name`?
#[derive(Debug, Clone, Copy)]
pub struct LocationRequest<'a> {
    pub name: &'a str,
    pub types: &'a [ArgType],
}

impl<'a> LocationRequest<'a> {
    pub fn new(name: &'a str, types: &'a [ArgType]) -> Self {
        Self { name, types }
    }

    pub fn body_length(&self) -> usize {
        binder_packet_length(self.types.len())
    }

    /// Clear `packet` and write this request. Returns the body length.
    pub fn encode(&self, packet: &mut Packet) -> Result<usize> {
        packet.clear();
        write_name(packet, CLIENT_LOC_MSG_NAME, self.name)?;
        write_types(packet, CLIENT_LOC_MSG_ARGS, self.types)?;
        Ok(self.body_length())
    }

    pub fn decode(packet: &Packet) -> Result<CallSignature> {
        Ok(CallSignature {
            name: packet.get_str(CLIENT_LOC_MSG_NAME, MAX_NAME_LENGTH),
            types: read_types(packet, CLIENT_LOC_MSG_ARGS)?,
        })
    }
}

/// Binder → client: the server that offers the procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReply {
    pub host: String,
    pub port: String,
}

impl LocationReply {
    pub const BODY_LENGTH: usize = BINDER_LOC_MSG_LEN;

    /// Host and port are separate fields and are read into separate strings.
    pub fn decode(packet: &Packet) -> Self {
        Self {
            host: packet.get_str(BINDER_LOC_MSG_HOST, MAX_HOST_LENGTH),
            port: packet.get_str(BINDER_LOC_MSG_PORT, MAX_PORT_LENGTH),
        }
    }

    pub fn encode(&self, packet: &mut Packet) -> Result<usize> {
        if self.host.len() > MAX_HOST_LENGTH || self.port.len() > MAX_PORT_LENGTH {
            return Err(RpcError::InvalidArgs(format!(
                "location {}:{} does not fit the reply fields",
                self.host, self.port
            )));
        }
        packet.clear();
        packet.set_field(BINDER_LOC_MSG_HOST, self.host.as_bytes())?;
        packet.set_field(BINDER_LOC_MSG_PORT, self.port.as_bytes())?;
        Ok(Self::BODY_LENGTH)
    }
}

/// Client → server: run `name` with the INPUT arguments.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteRequest<'a> {
    pub name: &'a str,
    pub types: &'a [ArgType],
    pub values: &'a [Value],
}

impl<'a> ExecuteRequest<'a> {
    pub fn new(name: &'a str, types: &'a [ArgType], values: &'a [Value]) -> Self {
        Self {
            name,
            types,
            values,
        }
    }

    pub fn body_length(&self) -> usize {
        server_packet_length(self.types.len(), total_wire_length(self.types))
    }

    /// Clear `packet`, write name and descriptors at the execute offsets
    /// and pack INPUT arguments after the descriptors.
    pub fn encode(&self, packet: &mut Packet) -> Result<usize> {
        packet.clear();
        write_name(packet, CLIENT_EXEC_MSG_NAME, self.name)?;
        write_types(packet, CLIENT_EXEC_MSG_ARGS, self.types)?;
        pack_args(
            packet,
            exec_args_offset(self.types.len()),
            self.types,
            self.values,
            Direction::Input,
        )?;
        Ok(self.body_length())
    }

    pub fn decode(packet: &Packet) -> Result<CallSignature> {
        Ok(CallSignature {
            name: packet.get_str(CLIENT_EXEC_MSG_NAME, MAX_NAME_LENGTH),
            types: read_types(packet, CLIENT_EXEC_MSG_ARGS)?,
        })
    }
}

/// Server → client. Same layout as [`ExecuteRequest`], with the result
/// slot filled in and OUTPUT arguments packed where the inputs were.
pub struct ExecuteReply;

impl ExecuteReply {
    /// Smallest body that still carries a result or failure cause.
    pub const MIN_BODY_LENGTH: usize = INT_SIZE;

    pub fn result(packet: &Packet) -> Option<i32> {
        packet.get_i32(CLIENT_EXEC_MSG_RESULT)
    }

    pub fn failure_cause(packet: &Packet) -> Option<i32> {
        packet.get_i32(SERVER_EXEC_FAIL_CAUSE)
    }

    /// Decode OUTPUT arguments into `values`; untouched on error.
    pub fn unpack_outputs(packet: &Packet, types: &[ArgType], values: &mut [Value]) -> Result<()> {
        unpack_args(
            packet,
            exec_args_offset(types.len()),
            types,
            values,
            Direction::Output,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ScalarType;

    fn add_types() -> [ArgType; 3] {
        [
            ArgType::input(ScalarType::Int),
            ArgType::input(ScalarType::Int),
            ArgType::output(ScalarType::Int),
        ]
    }

    #[test]
    fn test_location_request_layout() {
        let types = add_types();
        let request = LocationRequest::new("Add", &types);
        let mut packet = Packet::with_body_capacity(request.body_length()).unwrap();

        assert_eq!(request.encode(&mut packet).unwrap(), 64 + 4 * 4);
        assert_eq!(&packet.body()[..4], b"Add\0");
        let first = u32::from_be_bytes(packet.body()[64..68].try_into().unwrap());
        assert_eq!(first, types[0].to_raw());
        assert_eq!(packet.get_i32(64 + 12), Some(0));

        let decoded = LocationRequest::decode(&packet).unwrap();
        assert_eq!(decoded.name, "Add");
        assert_eq!(decoded.types, types.to_vec());
    }

    #[test]
    fn test_name_too_long_rejected() {
        let name = "x".repeat(MAX_NAME_LENGTH + 1);
        let request = LocationRequest::new(&name, &[]);
        let mut packet = Packet::with_body_capacity(256).unwrap();

        let err = request.encode(&mut packet).unwrap_err();
        assert_eq!(err.code(), crate::error::NAME_TOO_LONG);

        // exactly the limit fits
        let name = "y".repeat(MAX_NAME_LENGTH);
        assert!(LocationRequest::new(&name, &[]).encode(&mut packet).is_ok());
    }

    #[test]
    fn test_location_reply_fields_are_separate() {
        let reply = LocationReply {
            host: "server.local".to_string(),
            port: "40123".to_string(),
        };
        let mut packet = Packet::with_body_capacity(LocationReply::BODY_LENGTH).unwrap();
        reply.encode(&mut packet).unwrap();

        let decoded = LocationReply::decode(&packet);
        assert_eq!(decoded.host, "server.local");
        assert_eq!(decoded.port, "40123");
    }

    #[test]
    fn test_location_reply_rejects_oversized_fields() {
        let reply = LocationReply {
            host: "h".repeat(MAX_HOST_LENGTH + 1),
            port: "1".to_string(),
        };
        let mut packet = Packet::with_body_capacity(LocationReply::BODY_LENGTH).unwrap();
        assert!(reply.encode(&mut packet).is_err());
    }

    #[test]
    fn test_execute_request_layout() {
        let types = add_types();
        let values = [Value::int(3), Value::int(4), Value::int(0)];
        let request = ExecuteRequest::new("Add", &types, &values);
        assert_eq!(request.body_length(), 68 + 16 + 12);

        let mut packet = Packet::with_body_capacity(request.body_length()).unwrap();
        request.encode(&mut packet).unwrap();

        assert_eq!(ExecuteReply::result(&packet), Some(0));
        assert_eq!(&packet.body()[4..8], b"Add\0");
        // inputs back to back after the sentinel
        assert_eq!(packet.get_i32(84), Some(3));
        assert_eq!(packet.get_i32(88), Some(4));
        assert_eq!(packet.get_i32(92), Some(0));

        let decoded = ExecuteRequest::decode(&packet).unwrap();
        assert_eq!(decoded.name, "Add");
        assert_eq!(decoded.types, types.to_vec());
    }

    #[test]
    fn test_execute_request_clears_previous_phase() {
        let types = add_types();
        let values = [Value::int(3), Value::int(4), Value::int(0)];
        let execute = ExecuteRequest::new("Add", &types, &values);
        let mut packet = Packet::with_body_capacity(execute.body_length()).unwrap();

        LocationRequest::new("Add", &types).encode(&mut packet).unwrap();
        execute.encode(&mut packet).unwrap();

        // location-phase descriptors at offset 64 must be gone
        assert_eq!(&packet.body()[..4], &[0, 0, 0, 0]);
        assert_eq!(packet.get_str(CLIENT_EXEC_MSG_NAME, MAX_NAME_LENGTH), "Add");
        assert_eq!(packet.get_i32(64), Some(0));
    }

    #[test]
    fn test_execute_reply_outputs() {
        let types = add_types();
        let mut packet = Packet::with_body_capacity(96).unwrap();
        packet.set_i32(84, 7).unwrap();

        let mut values = vec![Value::int(3), Value::int(4), Value::int(0)];
        ExecuteReply::unpack_outputs(&packet, &types, &mut values).unwrap();
        assert_eq!(values[2].as_int(), Some(7));
        assert_eq!(values[0].as_int(), Some(3));
    }

    #[test]
    fn test_read_types_without_sentinel() {
        let mut packet = Packet::with_body_capacity(CLIENT_LOC_MSG_ARGS + 4).unwrap();
        packet
            .set_field(CLIENT_LOC_MSG_ARGS, &add_types()[0].to_raw().to_be_bytes())
            .unwrap();
        assert!(LocationRequest::decode(&packet).is_err());
    }
}
