//! The demonstration server's wire protocol: one op byte, a length-prefixed
//! key, and (for `SET`) a length-prefixed payload. Deliberately minimal —
//! this framing exists only so the workspace runs end to end over a real
//! socket; `blockkv-core` has no notion of it.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use blockkv_core::{ConnectionHandle, Status};

/// Request opcodes, one byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get = 0,
    Set = 1,
    Del = 2,
}

impl Op {
    fn from_byte(b: u8) -> io::Result<Self> {
        match b {
            0 => Ok(Self::Get),
            1 => Ok(Self::Set),
            2 => Ok(Self::Del),
            other => Err(io::Error::new(io::ErrorKind::InvalidData, format!("unknown opcode {other}"))),
        }
    }
}

/// A decoded request header: opcode, key, and (for `SET`) the payload
/// length still to be streamed off the connection.
pub struct Header {
    pub op: Op,
    pub key: Box<[u8]>,
    pub payload_len: u32,
}

/// Reads one request header: `[op: u8][key_len: u32][key bytes][payload_len: u32 if SET]`.
pub fn read_header(stream: &mut TcpStream) -> io::Result<Header> {
    let mut op_byte = [0u8; 1];
    stream.read_exact(&mut op_byte)?;
    let op = Op::from_byte(op_byte[0])?;

    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let key_len = u32::from_be_bytes(len_buf) as usize;
    let mut key = vec![0u8; key_len];
    stream.read_exact(&mut key)?;

    let payload_len = if op == Op::Set {
        stream.read_exact(&mut len_buf)?;
        u32::from_be_bytes(len_buf)
    } else {
        0
    };

    Ok(Header { op, key: key.into_boxed_slice(), payload_len })
}

/// Adapts a `TcpStream` to [`ConnectionHandle`]: `read_payload` continues
/// reading the SET body already framed by [`read_header`]; `send_response`
/// writes `[status: u8][value_len: u32][value bytes]`.
pub struct TcpConnection<'a> {
    pub stream: &'a mut TcpStream,
}

impl ConnectionHandle for TcpConnection<'_> {
    fn read_payload(&mut self, len: usize, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(&mut buf[..len])
    }

    fn send_response(&mut self, status: Status, value: Option<&[u8]>) -> io::Result<()> {
        let code: u8 = match status {
            Status::Ok => 0,
            Status::KeyError => 1,
            Status::StoreError => 2,
        };
        self.stream.write_all(&[code])?;
        let value = value.unwrap_or(&[]);
        self.stream.write_all(&(value.len() as u32).to_be_bytes())?;
        self.stream.write_all(value)?;
        self.stream.flush()
    }
}
