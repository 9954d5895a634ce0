//! Protocol module - wire format, packet buffer and message schemas.
//!
//! This module implements the binary protocol shared with the binder and
//! the server:
//! - 8-byte header encoding/decoding
//! - Offset-addressed packet buffer
//! - One encoder/decoder per message kind

mod message;
mod packet;
mod wire_format;

pub use message::{CallSignature, ExecuteReply, ExecuteRequest, LocationReply, LocationRequest};
pub use packet::Packet;
pub use wire_format::{
    binder_packet_length, exec_args_offset, server_packet_length, Header, MessageKind,
    BINDER_LOC_MSG_HOST, BINDER_LOC_MSG_LEN, BINDER_LOC_MSG_PORT, CLIENT_EXEC_MSG_ARGS,
    CLIENT_EXEC_MSG_NAME, CLIENT_EXEC_MSG_RESULT, CLIENT_LOC_MSG_ARGS, CLIENT_LOC_MSG_NAME,
    HEADER_SIZE, INT_SIZE, MAX_HOST_LENGTH, MAX_NAME_LENGTH, MAX_PORT_LENGTH,
    SERVER_EXEC_FAIL_CAUSE,
};
