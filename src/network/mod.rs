//! Network Layer: Transport boundary
//!
//! Driver menyerahkan setiap encoded batch ke sebuah [`Transport`].
//! Interpretasi response/status dan retry bukan urusan layer ini.

mod connection;

use std::io;

use crate::protocol::EncodedMessage;

pub use connection::TcpTransport;

/// Tujuan pengiriman encoded batch
pub trait Transport {
    fn send(&mut self, message: &EncodedMessage) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &EncodedMessage) -> io::Result<()> {
        (**self).send(message)
    }
}

/// Transport yang hanya menghitung (dry run, test)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NullTransport {
    pub messages: u64,
    pub bytes: u64,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for NullTransport {
    fn send(&mut self, message: &EncodedMessage) -> io::Result<()> {
        self.messages += 1;
        self.bytes += message.len() as u64;
        Ok(())
    }
}
