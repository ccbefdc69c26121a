//! add/get/delete round-trip benchmark loop.
//!
//! Each repetition runs strictly in order, one request in flight:
//!
//! ```text
//! add foo 0 0 <n>\r\n<data>\r\n   -> read up to 512 bytes
//! get foo\r\n                     -> read up to len(add message) bytes
//! delete foo\r\n                  -> read up to 512 bytes
//! ```
//!
//! Every response is consumed with a single read into a fixed-size buffer.
//! Nothing is parsed or validated, and a response longer than the buffer is
//! left partially unread.

use crate::config::Config;
use crate::connection::Connection;
use crate::protocol::{self, Request, BENCH_KEY, STATUS_READ_SIZE};
use bytes::Bytes;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use tracing::{info, trace};

/// Wall-clock stopwatch around a block of work
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Timer {
            start: Instant::now(),
        }
    }

    /// Stop the timer and return the time since `start`
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

/// Outcome of a completed benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Completed add/get/delete cycles
    pub requests: u64,
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub elapsed: Duration,
}

impl Report {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Cycles per second, 0 for an empty or instantaneous run
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            self.requests as f64 / secs
        } else {
            0.0
        }
    }
}

/// Connect to the configured server and run the whole benchmark.
///
/// Writes `connect ok`, the responses when verbose, then the elapsed
/// seconds as the final line. A failed connect writes nothing and no cycle
/// is attempted.
pub fn execute(config: &Config, out: &mut dyn Write) -> io::Result<Report> {
    let add_msg = protocol::add_message(config.memory_size);

    let mut conn = Connection::open(&config.host, config.port).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to connect to {}:{}: {}", config.host, config.port, e),
        )
    })?;
    writeln!(out, "connect ok")?;

    let echo: Option<&mut dyn Write> = if config.verbose {
        Some(&mut *out)
    } else {
        None
    };
    let report = run(&mut conn, &add_msg, config.requests, echo)?;

    writeln!(out, "{}", report.elapsed_secs())?;

    info!(
        peer = %conn.peer_addr(),
        requests = report.requests,
        messages = report.messages_sent,
        bytes_sent = report.bytes_sent,
        bytes_received = report.bytes_received,
        elapsed_ms = report.elapsed.as_millis() as u64,
        ops_per_sec = report.ops_per_sec(),
        "Benchmark complete"
    );

    Ok(report)
}

/// Run `requests` add/get/delete cycles over `stream`.
///
/// When `echo` is set every response is written to it as text, one per line.
/// The first I/O error aborts the run; no partial report is produced.
pub fn run<S: Read + Write>(
    stream: &mut S,
    add_msg: &Bytes,
    requests: u64,
    mut echo: Option<&mut dyn Write>,
) -> io::Result<Report> {
    let get_msg = Request::get(BENCH_KEY).to_bytes();
    let delete_msg = Request::delete(BENCH_KEY).to_bytes();

    let mut status_buf = vec![0u8; STATUS_READ_SIZE];
    let mut value_buf = vec![0u8; add_msg.len()];

    let mut bytes_received = 0u64;

    let timer = Timer::start();

    for i in 0..requests {
        trace!(iteration = i, "Cycle start");

        stream.write_all(add_msg)?;
        bytes_received += recv(stream, &mut status_buf, &mut echo)? as u64;

        stream.write_all(&get_msg)?;
        bytes_received += recv(stream, &mut value_buf, &mut echo)? as u64;

        stream.write_all(&delete_msg)?;
        bytes_received += recv(stream, &mut status_buf, &mut echo)? as u64;
    }

    let elapsed = timer.stop();

    let bytes_per_cycle = (add_msg.len() + get_msg.len() + delete_msg.len()) as u64;

    Ok(Report {
        requests,
        messages_sent: requests * 3,
        bytes_sent: requests * bytes_per_cycle,
        bytes_received,
        elapsed,
    })
}

/// Single read of at most `buf.len()` bytes.
///
/// A zero-length read means the server hung up and is reported as EOF.
fn recv<S: Read>(
    stream: &mut S,
    buf: &mut [u8],
    echo: &mut Option<&mut dyn Write>,
) -> io::Result<usize> {
    let n = stream.read(buf)?;
    if n == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "server closed the connection",
        ));
    }

    if let Some(out) = echo.as_mut() {
        writeln!(out, "{}", String::from_utf8_lossy(&buf[..n]))?;
    }

    Ok(n)
}
