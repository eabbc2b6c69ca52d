use std::collections::VecDeque;
use std::io::{Error, ErrorKind};
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use optolink_proto::Port;

type RxT = Arc<Mutex<VecDeque<u8>>>;

/// A simulated point-to-point optical link between the client and the controller.
#[derive(Default)]
pub struct OptoLink {
    to_client: RxT,
    to_controller: RxT,
    client_data_available: Arc<Condvar>,
    controller_data_available: Arc<Condvar>,
    eof: AtomicBool,
}

impl OptoLink {
    pub fn new() -> Arc<OptoLink> {
        Default::default()
    }

    pub fn disconnect(&self) {
        self.eof.store(true, SeqCst);
        self.client_data_available.notify_all();
        self.controller_data_available.notify_all();
    }

    pub fn client_interface(self: &Arc<Self>) -> LinkInterface {
        LinkInterface::new(Arc::clone(self), true)
    }

    pub fn controller_interface(self: &Arc<Self>) -> LinkInterface {
        LinkInterface::new(Arc::clone(self), false)
    }
}

pub struct LinkInterface {
    link: Arc<OptoLink>,
    is_client: bool,
    pub timeout: Duration,
}

impl LinkInterface {
    fn new(link: Arc<OptoLink>, is_client: bool) -> LinkInterface {
        LinkInterface {
            link,
            is_client,
            timeout: Duration::from_millis(100),
        }
    }

    fn rx(&self) -> (&RxT, &Condvar) {
        if self.is_client {
            (&self.link.to_client, &self.link.client_data_available)
        } else {
            (&self.link.to_controller, &self.link.controller_data_available)
        }
    }

    fn tx(&self) -> (&RxT, &Condvar) {
        if self.is_client {
            (&self.link.to_controller, &self.link.controller_data_available)
        } else {
            (&self.link.to_client, &self.link.client_data_available)
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.link.eof.load(SeqCst)
    }
}

impl std::io::Read for LinkInterface {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            panic!("Testsuite called read with zero length buffer.")
        }
        let (rx, condvar) = self.rx();
        let mut rx = rx.lock().expect("Read mutex is poisoned");

        if rx.is_empty() && !self.link.eof.load(SeqCst) {
            rx = condvar
                .wait_timeout(rx, self.timeout)
                .expect("Mutex lock failed")
                .0;
        }
        if let Some(byte) = rx.pop_front() {
            buf[0] = byte;
            Ok(1)
        } else if self.link.eof.load(SeqCst) {
            Ok(0)
        } else {
            Err(Error::new(ErrorKind::TimedOut, "IO read timeout"))
        }
    }
}

impl std::io::Write for LinkInterface {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let (tx, condvar) = self.tx();
        tx.lock().expect("Write mutex is poisoned").extend(buf);
        condvar.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Port for LinkInterface {
    fn discard_input(&mut self) -> std::io::Result<()> {
        let (rx, _) = self.rx();
        rx.lock().expect("Read mutex is poisoned").clear();
        Ok(())
    }
}
