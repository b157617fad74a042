//! TCP transport ke remote service
//!
//! Non-blocking mio stream. `send` menulis seluruh buffer, menunggu
//! writability lewat `Poll` sampai `write_timeout` habis. Tidak ada retry.
//!
//! Write yang gagal setelah sebagian frame terkirim menutup koneksi: peer
//! tidak bisa lagi menemukan batas frame berikutnya.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream as StdTcpStream};
use std::time::Instant;

use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, warn};

use super::Transport;
use crate::config::TransportConfig;
use crate::protocol::EncodedMessage;

const STREAM_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 16;

/// Koneksi TCP yang mengirim encoded message apa adanya
pub struct TcpTransport {
    stream: TcpStream,
    poll: Poll,
    events: Events,
    config: TransportConfig,
    peer: SocketAddr,
    messages_sent: u64,
    bytes_sent: u64,
    broken: bool,
}

impl TcpTransport {
    /// Connect (blocking, dibatasi `write_timeout`) lalu pindah ke non-blocking.
    pub fn connect(addr: SocketAddr, config: TransportConfig) -> io::Result<Self> {
        let stream = StdTcpStream::connect_timeout(&addr, config.write_timeout)?;

        // Disable Nagle's algorithm untuk lower latency
        stream.set_nodelay(config.nodelay)?;
        stream.set_nonblocking(true)?;

        let mut stream = TcpStream::from_std(stream);
        if let Some(size) = config.send_buffer_bytes {
            set_send_buffer(&stream, size);
        }

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut stream, STREAM_TOKEN, Interest::WRITABLE)?;

        debug!(%addr, nodelay = config.nodelay, "transport connected");

        Ok(Self {
            stream,
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            config,
            peer: addr,
            messages_sent: 0,
            bytes_sent: 0,
            broken: false,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// `true` setelah write gagal di tengah frame. Semua `send` berikutnya
    /// gagal dengan `NotConnected`.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Tulis seluruh `data`, menunggu socket writable bila perlu.
    ///
    /// Timeout sebelum satu byte pun terkirim tidak merusak stream. Error
    /// lain, atau error apa pun setelah sebagian `data` terkirim, mematikan
    /// transport.
    pub fn send_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        if self.broken {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport closed after a failed write",
            ));
        }

        let before = self.bytes_sent;
        let result = self.write_before_deadline(data);
        if let Err(ref e) = result {
            let written = self.bytes_sent - before;
            if written > 0 || e.kind() != io::ErrorKind::TimedOut {
                self.close(e, written);
            }
        }
        result
    }

    fn close(&mut self, cause: &io::Error, written: u64) {
        self.broken = true;
        // Peer mungkin sudah menutup duluan
        let _ = self.stream.shutdown(Shutdown::Both);
        let _ = self.poll.registry().deregister(&mut self.stream);
        warn!(
            peer = %self.peer,
            error = %cause,
            written,
            "write failed, transport closed"
        );
    }

    fn write_before_deadline(&mut self, mut data: &[u8]) -> io::Result<()> {
        let deadline = Instant::now() + self.config.write_timeout;

        while !data.is_empty() {
            match self.stream.write(data) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "Connection closed",
                    ))
                }
                Ok(n) => {
                    data = &data[n..];
                    self.bytes_sent += n as u64;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "write timed out",
                        ));
                    }
                    self.poll.poll(&mut self.events, Some(deadline - now))?;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, message: &EncodedMessage) -> io::Result<()> {
        self.send_bytes(message.as_bytes())?;
        self.messages_sent += 1;
        Ok(())
    }
}

/// Perbesar SO_SNDBUF untuk throughput.
/// Error diabaikan - tidak semua platform mendukung.
#[cfg(unix)]
fn set_send_buffer(stream: &TcpStream, size: usize) {
    use std::os::unix::io::AsRawFd;

    let fd = stream.as_raw_fd();
    let optval = size.min(libc::c_int::MAX as usize) as libc::c_int;
    unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}

#[cfg(not(unix))]
fn set_send_buffer(_stream: &TcpStream, _size: usize) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Fields, LengthOnly, Update};
    use crate::protocol::MessageEncoder;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_send_encoded_message() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).unwrap();
            received
        });

        let updates: Vec<_> = (0..16)
            .map(|i| {
                Update::new(
                    "usertable",
                    format!("user{}", i),
                    Fields::new().with("field0", LengthOnly(100)),
                )
            })
            .collect();
        let message = MessageEncoder::default().encode(&updates).unwrap();

        let mut transport = TcpTransport::connect(addr, TransportConfig::default()).unwrap();
        transport.send(&message).unwrap();
        transport.send(&message).unwrap();
        assert_eq!(transport.messages_sent(), 2);
        assert_eq!(transport.bytes_sent(), 2 * message.len() as u64);
        drop(transport);

        let received = reader.join().unwrap();
        assert_eq!(received.len(), 2 * message.len());
        assert_eq!(&received[..message.len()], message.as_bytes());
        assert_eq!(&received[message.len()..], message.as_bytes());
    }

    #[test]
    fn test_timeout_mid_frame_closes_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        // Peer lambat: belum membaca apa pun sampai jauh setelah timeout
        let reader = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(800));
            let mut received = Vec::new();
            let _ = stream.read_to_end(&mut received);
            received
        });

        let updates = vec![Update::new(
            "usertable",
            "user1",
            Fields::new().with("field0", LengthOnly(8 * 1024 * 1024)),
        )];
        let message = MessageEncoder::default().encode(&updates).unwrap();

        let config = TransportConfig {
            write_timeout: Duration::from_millis(100),
            ..TransportConfig::default()
        };
        let mut transport = TcpTransport::connect(addr, config).unwrap();

        let err = transport.send(&message).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(transport.is_broken());
        let written = transport.bytes_sent();
        assert!(written > 0 && written < message.len() as u64);

        // Frame berikutnya tidak boleh menempel ke frame yang terpotong
        let err = transport.send(&message).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert_eq!(transport.bytes_sent(), written);
        assert_eq!(transport.messages_sent(), 0);
        drop(transport);

        let received = reader.join().unwrap();
        assert_eq!(received.len() as u64, written);
        assert_eq!(&received[..], &message.as_bytes()[..received.len()]);
    }
}
