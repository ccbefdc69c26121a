//! Memcached text protocol request builder.
//!
//! Encodes the client side of the three commands the benchmark issues:
//! - Storage: add
//! - Retrieval: get
//! - Deletion: delete
//!
//! Responses are never parsed. Readers size their buffers from the limits
//! defined here and accept whatever a single read returns.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt::Write;

/// Key every benchmark cycle operates on
pub const BENCH_KEY: &str = "foo";

/// Leading bytes of every generated payload
pub const PAYLOAD_PREFIX: &[u8] = b"hello";

/// Smallest payload the generator produces
pub const MIN_PAYLOAD_SIZE: usize = PAYLOAD_PREFIX.len();

/// Read buffer size for single-line status responses (add, delete).
///
/// Longer responses are not drained; the remainder stays in the socket.
pub const STATUS_READ_SIZE: usize = 512;

/// A client request in memcached text protocol
#[derive(Debug, Clone, PartialEq)]
pub enum Request<'a> {
    /// Store a value only if the key doesn't exist
    Add {
        key: &'a str,
        flags: u32,
        exptime: u64,
        data: &'a [u8],
    },

    /// Retrieve a value
    Get { key: &'a str },

    /// Remove a value
    Delete { key: &'a str },
}

impl<'a> Request<'a> {
    /// `add <key> 0 0 <len>` carrying `data`
    pub fn add(key: &'a str, data: &'a [u8]) -> Self {
        Request::Add {
            key,
            flags: 0,
            exptime: 0,
            data,
        }
    }

    pub fn get(key: &'a str) -> Self {
        Request::Get { key }
    }

    pub fn delete(key: &'a str) -> Self {
        Request::Delete { key }
    }

    /// Number of bytes `encode` appends
    pub fn encoded_len(&self) -> usize {
        match self {
            Request::Add {
                key,
                flags,
                exptime,
                data,
            } => {
                // add <key> <flags> <exptime> <bytes>\r\n<data>\r\n
                "add ".len()
                    + key.len()
                    + 1
                    + decimal_len(u64::from(*flags))
                    + 1
                    + decimal_len(*exptime)
                    + 1
                    + decimal_len(data.len() as u64)
                    + 2
                    + data.len()
                    + 2
            }
            Request::Get { key } => "get ".len() + key.len() + 2,
            Request::Delete { key } => "delete ".len() + key.len() + 2,
        }
    }

    /// Append the wire form of this request to `buf`
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        match self {
            Request::Add {
                key,
                flags,
                exptime,
                data,
            } => {
                // The length field is always derived from the data itself
                let _ = write!(buf, "add {} {} {} {}\r\n", key, flags, exptime, data.len());
                buf.put_slice(data);
                buf.put_slice(b"\r\n");
            }
            Request::Get { key } => {
                buf.put_slice(b"get ");
                buf.put_slice(key.as_bytes());
                buf.put_slice(b"\r\n");
            }
            Request::Delete { key } => {
                buf.put_slice(b"delete ");
                buf.put_slice(key.as_bytes());
                buf.put_slice(b"\r\n");
            }
        }
    }

    /// Encode into a standalone frozen buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// Number of ASCII digits in `n`
fn decimal_len(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Generate the benchmark payload: `hello` followed by zero padding.
///
/// Sizes below `MIN_PAYLOAD_SIZE` are raised to it.
pub fn payload(memory_size: usize) -> Bytes {
    let size = memory_size.max(MIN_PAYLOAD_SIZE);
    let mut buf = BytesMut::with_capacity(size);
    buf.put_slice(PAYLOAD_PREFIX);
    buf.put_bytes(0, size - PAYLOAD_PREFIX.len());
    buf.freeze()
}

/// Build the complete `add` message for the benchmark key
pub fn add_message(memory_size: usize) -> Bytes {
    let data = payload(memory_size);
    Request::add(BENCH_KEY, &data).to_bytes()
}
