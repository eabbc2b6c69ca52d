#![allow(dead_code)]

pub mod sync;

use std::cell::RefCell;
use std::cmp::min;
use std::io::{Error, ErrorKind};
use std::rc::Rc;

use optolink_proto::Port;

pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;

/// Controller side of a successful handshake: wake ack, sync ack.
pub const HANDSHAKE_OK: [u8; 2] = [0x05, 0x06];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A frame `41 <len> <payload> <checksum>`.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut data = vec![0x41, payload.len() as u8];
    data.extend_from_slice(payload);
    let sum = payload
        .iter()
        .fold(payload.len() as u32, |acc, b| acc + *b as u32);
    data.push((sum % 256) as u8);
    data
}

/// ACK followed by a response frame.
pub fn ack_frame(payload: &[u8]) -> Vec<u8> {
    let mut data = vec![ACK];
    data.extend(frame(payload));
    data
}

pub fn read_reply(address: u16, data: &[u8]) -> Vec<u8> {
    let [hi, lo] = address.to_be_bytes();
    let mut payload = vec![0x01, 0x01, hi, lo, data.len() as u8];
    payload.extend_from_slice(data);
    payload
}

pub fn write_reply(address: u16, len: u8) -> Vec<u8> {
    let [hi, lo] = address.to_be_bytes();
    vec![0x01, 0x02, hi, lo, len]
}

/// Scripted serial line. Reads return the canned `rx` bytes, one call at a
/// time, and report a timeout (0 bytes) once they run out. Writes are logged.
pub struct SerialInterface {
    rx: Vec<u8>,
    rx_pos: usize,
    stale: Vec<u8>,
    pub tx: Vec<u8>,
    pub discards: usize,
    write_limit: Option<usize>,
    do_read_error: bool,
    do_write_error: bool,
    timeout_as_error: bool,
}

pub struct SerialIOPlane(Rc<RefCell<SerialInterface>>);

impl SerialIOPlane {
    pub fn new(serial_if: &Rc<RefCell<SerialInterface>>) -> SerialIOPlane {
        SerialIOPlane(serial_if.clone())
    }
}

impl SerialInterface {
    pub fn new(rx: &[u8]) -> Rc<RefCell<SerialInterface>> {
        Rc::new(RefCell::new(SerialInterface {
            rx: rx.to_vec(),
            rx_pos: 0,
            stale: Vec::new(),
            tx: Vec::new(),
            discards: 0,
            write_limit: None,
            do_read_error: false,
            do_write_error: false,
            timeout_as_error: false,
        }))
    }

    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend_from_slice(data);
    }

    /// Bytes waiting in the input buffer until the next `discard_input()`.
    pub fn set_stale(&mut self, data: &[u8]) {
        self.stale = data.to_vec();
    }

    /// Accept at most `limit` bytes per write call.
    pub fn limit_writes(&mut self, limit: usize) {
        self.write_limit = Some(limit);
    }

    pub fn trigger_write_error(&mut self) {
        self.do_write_error = true;
    }

    pub fn trigger_read_error(&mut self) {
        self.do_read_error = true;
    }

    /// Report exhausted input as `ErrorKind::TimedOut`, like a real serial port.
    pub fn timeout_as_error(&mut self) {
        self.timeout_as_error = true;
    }

    pub fn rx_remaining(&self) -> usize {
        self.rx.len() - self.rx_pos
    }
}

impl std::io::Read for SerialIOPlane {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if inner.do_read_error {
            inner.do_read_error = false;
            return Err(Error::new(ErrorKind::PermissionDenied, "IO read error"));
        }
        if !inner.stale.is_empty() {
            let len = min(buf.len(), inner.stale.len());
            let stale: Vec<u8> = inner.stale.drain(..len).collect();
            buf[..len].copy_from_slice(&stale);
            return Ok(len);
        }
        let old_pos = inner.rx_pos;
        inner.rx_pos = min(old_pos + buf.len(), inner.rx.len());
        let len = inner.rx_pos - old_pos;
        if len == 0 && inner.timeout_as_error {
            return Err(Error::new(ErrorKind::TimedOut, "Operation timed out"));
        }
        buf[..len].copy_from_slice(&inner.rx[old_pos..inner.rx_pos]);
        Ok(len)
    }
}

impl std::io::Write for SerialIOPlane {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if inner.do_write_error {
            inner.do_write_error = false;
            return Err(Error::new(ErrorKind::PermissionDenied, "IO write error"));
        }
        let len = min(buf.len(), inner.write_limit.unwrap_or(buf.len()));
        inner.tx.extend_from_slice(&buf[..len]);
        Ok(len)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Port for SerialIOPlane {
    fn discard_input(&mut self) -> std::io::Result<()> {
        let mut inner = self.0.borrow_mut();
        inner.stale.clear();
        inner.discards += 1;
        Ok(())
    }
}
