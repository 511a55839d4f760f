//! GET/SET/DEL request handlers over a [`ConnectionHandle`] abstraction.
//!
//! The excerpt's handlers talk directly to a raw socket fd; here the
//! socket is an associated collaborator behind a trait (spec.md §6's
//! external interface made explicit) so the handler logic is testable
//! without a real `TcpStream` and the wire framing lives entirely in the
//! `blockkv-server` binary.

use crate::error::{KvError, KvResult};
use crate::table::HashTable;

/// Status codes returned to the caller, matching the excerpt's
/// `OK` / `KEY_ERROR` / `STORE_ERROR` response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    KeyError,
    StoreError,
}

/// A parsed request, independent of wire framing.
pub struct Request {
    pub key: Box<[u8]>,
    /// Length of the SET payload still to be read from the connection.
    /// Unused by GET/DEL.
    pub msg_len: usize,
    /// Set by a handler when the connection must be torn down (a read
    /// error mid-payload, matching the excerpt's `connection_close = 1`).
    pub connection_close: bool,
}

impl Request {
    /// A GET/DEL request carrying only a key.
    #[must_use]
    pub fn keyed(key: Box<[u8]>) -> Self {
        Self { key, msg_len: 0, connection_close: false }
    }
}

/// The connection-side collaborator a handler needs: read a SET payload,
/// send a response. Implemented for the real wire protocol by
/// `blockkv-server`.
pub trait ConnectionHandle {
    /// Reads up to `len` remaining payload bytes into `buf`, returning the
    /// number of bytes actually read (0 or a short read signals the
    /// connection should close, matching the excerpt's `read_payload`).
    fn read_payload(&mut self, len: usize, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Sends a framed response: status plus an optional value body.
    fn send_response(&mut self, status: Status, value: Option<&[u8]>) -> std::io::Result<()>;
}

/// `GET`: look up `request.key`, send its value or `KEY_ERROR`.
pub fn get_request(table: &HashTable, conn: &mut impl ConnectionHandle, request: &Request) -> std::io::Result<()> {
    match table.get(&request.key) {
        Ok(value) => {
            blockkv_log::debug!(key_len = request.key.len(), value_len = value.len(), "GET ok");
            conn.send_response(Status::Ok, Some(&value))
        }
        Err(KvError::KeyNotFound) => conn.send_response(Status::KeyError, None),
        Err(err) => {
            blockkv_log::warn!(%err, "GET failed");
            conn.send_response(Status::StoreError, None)
        }
    }
}

/// `SET`: read `request.msg_len` payload bytes, then install them as
/// `request.key`'s value. Mirrors the excerpt's read-before-lock ordering:
/// the payload is fully read off the connection before either the bucket
/// mutex or the item's write lock is touched.
pub fn set_request(
    table: &HashTable,
    conn: &mut impl ConnectionHandle,
    request: &mut Request,
) -> KvResult<std::io::Result<()>> {
    let mut buf = vec![0u8; request.msg_len];
    let mut got = 0usize;
    while got < request.msg_len {
        let n = conn
            .read_payload(request.msg_len - got, &mut buf[got..])
            .map_err(|err| {
                request.connection_close = true;
                let err = KvError::Protocol(format!("short read on SET payload: {err}"));
                blockkv_log::warn!(%err, "SET failed");
                err
            })?;
        if n == 0 {
            request.connection_close = true;
            let err = KvError::Protocol("connection closed mid-payload".into());
            blockkv_log::warn!(%err, "SET failed");
            return Err(err);
        }
        got += n;
    }

    table.set(&request.key, buf.into_boxed_slice());
    blockkv_log::debug!(key_len = request.key.len(), value_len = request.msg_len, "SET ok");
    Ok(conn.send_response(Status::Ok, None))
}

/// `DEL`: remove `request.key`, send `OK` or `KEY_ERROR`.
pub fn del_request(table: &HashTable, conn: &mut impl ConnectionHandle, request: &Request) -> std::io::Result<()> {
    match table.del(&request.key) {
        Ok(()) => {
            blockkv_log::debug!(key_len = request.key.len(), "DEL ok");
            conn.send_response(Status::Ok, None)
        }
        Err(KvError::KeyNotFound) => conn.send_response(Status::KeyError, None),
        Err(err) => {
            blockkv_log::warn!(%err, "DEL failed");
            conn.send_response(Status::StoreError, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    struct RecordingConn {
        payload: Vec<u8>,
        sent: Vec<(Status, Option<Vec<u8>>)>,
    }

    impl ConnectionHandle for RecordingConn {
        fn read_payload(&mut self, len: usize, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = len.min(self.payload.len());
            buf[..n].copy_from_slice(&self.payload[..n]);
            self.payload.drain(..n);
            Ok(n)
        }

        fn send_response(&mut self, status: Status, value: Option<&[u8]>) -> std::io::Result<()> {
            self.sent.push((status, value.map(<[u8]>::to_vec)));
            Ok(())
        }
    }

    #[test]
    fn get_on_missing_key_sends_key_error() {
        let table = HashTable::new(Config::default());
        let mut conn = RecordingConn { payload: vec![], sent: vec![] };
        get_request(&table, &mut conn, &Request::keyed(b"nope".to_vec().into_boxed_slice())).unwrap();
        assert_eq!(conn.sent, vec![(Status::KeyError, None)]);
    }

    #[test]
    fn set_then_get_round_trips_through_handlers() {
        let table = HashTable::new(Config::default());
        let mut conn = RecordingConn { payload: b"value".to_vec(), sent: vec![] };
        let mut req = Request { key: b"k".to_vec().into_boxed_slice(), msg_len: 5, connection_close: false };
        set_request(&table, &mut conn, &mut req).unwrap().unwrap();
        assert_eq!(conn.sent, vec![(Status::Ok, None)]);

        conn.sent.clear();
        get_request(&table, &mut conn, &Request::keyed(b"k".to_vec().into_boxed_slice())).unwrap();
        assert_eq!(conn.sent, vec![(Status::Ok, Some(b"value".to_vec()))]);
    }

    #[test]
    fn del_then_get_sends_key_error() {
        let table = HashTable::new(Config::default());
        table.set(b"k", b"v".to_vec().into_boxed_slice());
        let mut conn = RecordingConn { payload: vec![], sent: vec![] };
        del_request(&table, &mut conn, &Request::keyed(b"k".to_vec().into_boxed_slice())).unwrap();
        assert_eq!(conn.sent, vec![(Status::Ok, None)]);

        conn.sent.clear();
        get_request(&table, &mut conn, &Request::keyed(b"k".to_vec().into_boxed_slice())).unwrap();
        assert_eq!(conn.sent, vec![(Status::KeyError, None)]);
    }

    #[test]
    fn set_with_zero_length_payload_clears_to_empty_value() {
        let table = HashTable::new(Config::default());
        let mut conn = RecordingConn { payload: vec![], sent: vec![] };
        let mut req = Request { key: b"k".to_vec().into_boxed_slice(), msg_len: 0, connection_close: false };
        set_request(&table, &mut conn, &mut req).unwrap().unwrap();
        assert_eq!(&*table.get(b"k").unwrap(), b"");
    }
}
