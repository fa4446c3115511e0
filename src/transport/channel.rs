//! One-shot request channel over the ADB host protocol.
//!
//! Every request opens a fresh TCP connection to the ADB server, selects
//! the target device, issues a single service command and then reads the
//! response until the server closes the connection.

use super::{ProtocolError, TransportConfig};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Instant;

/// Status token sent by the server when a request was accepted.
pub const STATUS_OKAY: &[u8; 4] = b"OKAY";
/// Status token sent by the server when a request was rejected.
pub const STATUS_FAIL: &[u8; 4] = b"FAIL";

/// A request channel addressing one device through the ADB server.
///
/// The channel holds no connection between requests; each call to
/// [`TransportChannel::request`] owns its stream for the duration of the
/// call, so the connection is closed on every exit path.
#[derive(Debug, Clone)]
pub struct TransportChannel {
    config: TransportConfig,
    serial: String,
}

impl TransportChannel {
    /// Creates a channel for the device with the given serial.
    pub fn new(config: TransportConfig, serial: impl Into<String>) -> Self {
        Self {
            config,
            serial: serial.into(),
        }
    }

    /// Returns the serial of the addressed device.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Sends `service` to the device and returns the full response payload.
    pub fn request(&self, service: &str) -> Result<Vec<u8>, ProtocolError> {
        let start = Instant::now();
        let mut stream = self.connect()?;

        send_message(&mut stream, &format!("host:transport:{}", self.serial))?;
        read_status(&mut stream)?;

        send_message(&mut stream, service)?;
        read_status(&mut stream)?;

        let payload = read_to_eof(&mut stream, self.config.max_response_bytes)?;

        tracing::debug!(
            service,
            bytes = payload.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transport request completed"
        );

        Ok(payload)
    }

    fn connect(&self) -> Result<TcpStream, ProtocolError> {
        let addr = self
            .config
            .server_addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ProtocolError::Unresolvable(self.config.server_addr.clone()))?;

        let stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout())?;
        stream.set_read_timeout(Some(self.config.io_timeout()))?;
        stream.set_write_timeout(Some(self.config.io_timeout()))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Writes a host message: four lowercase hex digits of length, then the payload.
pub fn send_message<W: Write>(writer: &mut W, message: &str) -> Result<(), ProtocolError> {
    if message.len() > 0xFFFF {
        return Err(ProtocolError::MessageTooLong(message.len()));
    }
    let framed = format!("{:04x}{}", message.len(), message);
    writer.write_all(framed.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads a status token, turning `FAIL` into [`ProtocolError::Failed`].
pub fn read_status<R: Read>(reader: &mut R) -> Result<(), ProtocolError> {
    let mut status = [0u8; 4];
    reader.read_exact(&mut status).map_err(truncated_as_closed)?;

    match &status {
        STATUS_OKAY => Ok(()),
        STATUS_FAIL => Err(ProtocolError::Failed(read_failure_reason(reader))),
        other => Err(ProtocolError::UnexpectedStatus(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

/// Reads the length-prefixed reason that follows a `FAIL` token.
///
/// The reason is informational; a malformed or missing one degrades to
/// whatever could be read.
fn read_failure_reason<R: Read>(reader: &mut R) -> String {
    let mut len_hex = [0u8; 4];
    if reader.read_exact(&mut len_hex).is_err() {
        return String::from("<no reason given>");
    }

    let len = std::str::from_utf8(&len_hex)
        .ok()
        .and_then(|s| usize::from_str_radix(s, 16).ok());

    match len {
        Some(len) => {
            let mut reason = vec![0u8; len];
            match reader.read_exact(&mut reason) {
                Ok(()) => String::from_utf8_lossy(&reason).into_owned(),
                Err(_) => String::from("<truncated reason>"),
            }
        }
        // Older servers send the bare message without a length prefix.
        None => {
            let mut rest = Vec::new();
            if let Err(e) = reader.read_to_end(&mut rest) {
                tracing::debug!(error = %e, read = rest.len(), "Failure reason cut short");
            }
            let mut reason = String::from_utf8_lossy(&len_hex).into_owned();
            reason.push_str(&String::from_utf8_lossy(&rest));
            reason
        }
    }
}

/// Reads until EOF, refusing to buffer more than `limit` bytes.
pub fn read_to_eof<R: Read>(reader: &mut R, limit: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut buffer = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buffer)?;

    if buffer.len() > limit {
        return Err(ProtocolError::ResponseTooLarge { limit });
    }
    Ok(buffer)
}

fn truncated_as_closed(err: std::io::Error) -> ProtocolError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(err)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// What the fake server does after receiving the transport selection.
    #[derive(Clone)]
    pub(crate) enum Reply {
        Okay(Vec<u8>),
        FailTransport(&'static str),
        FailService(&'static str),
        Garbage,
    }

    fn read_host_message(stream: &mut TcpStream) -> String {
        let mut len_hex = [0u8; 4];
        stream.read_exact(&mut len_hex).unwrap();
        let len = usize::from_str_radix(std::str::from_utf8(&len_hex).unwrap(), 16).unwrap();
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).unwrap();
        String::from_utf8(body).unwrap()
    }

    fn write_fail(stream: &mut TcpStream, reason: &str) {
        stream.write_all(STATUS_FAIL).unwrap();
        stream
            .write_all(format!("{:04x}{}", reason.len(), reason).as_bytes())
            .unwrap();
    }

    /// Starts a single-connection fake ADB server; the join handle yields
    /// the two host messages it received.
    pub(crate) fn fake_server(reply: Reply) -> (TransportConfig, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = vec![read_host_message(&mut stream)];

            match reply {
                Reply::FailTransport(reason) => {
                    write_fail(&mut stream, reason);
                    return received;
                }
                Reply::Garbage => {
                    stream.write_all(b"WHAT").unwrap();
                    return received;
                }
                _ => stream.write_all(STATUS_OKAY).unwrap(),
            }

            received.push(read_host_message(&mut stream));
            match reply {
                Reply::Okay(payload) => {
                    stream.write_all(STATUS_OKAY).unwrap();
                    stream.write_all(&payload).unwrap();
                }
                Reply::FailService(reason) => write_fail(&mut stream, reason),
                _ => unreachable!(),
            }
            received
        });

        let config = TransportConfig {
            server_addr: addr.to_string(),
            ..TransportConfig::default()
        };
        (config, handle)
    }

    #[test]
    fn test_request_returns_payload_until_eof() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let (config, server) = fake_server(Reply::Okay(payload.clone()));

        let channel = TransportChannel::new(config, "192.168.1.20:5555");
        let response = channel.request("framebuffer:").unwrap();

        assert_eq!(response, payload);
        let received = server.join().unwrap();
        assert_eq!(
            received,
            vec!["host:transport:192.168.1.20:5555", "framebuffer:"]
        );
    }

    #[test]
    fn test_transport_failure_surfaces_reason() {
        let (config, server) = fake_server(Reply::FailTransport("device offline"));

        let channel = TransportChannel::new(config, "emulator-5554");
        let err = channel.request("framebuffer:").unwrap_err();

        assert!(matches!(err, ProtocolError::Failed(ref reason) if reason == "device offline"));
        server.join().unwrap();
    }

    #[test]
    fn test_service_failure_surfaces_reason() {
        let (config, server) = fake_server(Reply::FailService("closed"));

        let channel = TransportChannel::new(config, "emulator-5554");
        let err = channel.request("exec:screencap -p").unwrap_err();

        assert!(matches!(err, ProtocolError::Failed(ref reason) if reason == "closed"));
        assert_eq!(server.join().unwrap().len(), 2);
    }

    #[test]
    fn test_unexpected_status_rejected() {
        let (config, server) = fake_server(Reply::Garbage);

        let channel = TransportChannel::new(config, "emulator-5554");
        let err = channel.request("framebuffer:").unwrap_err();

        assert!(matches!(err, ProtocolError::UnexpectedStatus(ref s) if s == "WHAT"));
        server.join().unwrap();
    }

    #[test]
    fn test_send_message_prefixes_hex_length() {
        let mut out = Vec::new();
        send_message(&mut out, "host:transport:abc").unwrap();
        assert_eq!(out, b"0012host:transport:abc");
    }

    #[test]
    fn test_read_to_eof_enforces_limit() {
        let mut reader = Cursor::new(vec![7u8; 11]);
        assert!(matches!(
            read_to_eof(&mut reader, 10),
            Err(ProtocolError::ResponseTooLarge { limit: 10 })
        ));

        let mut reader = Cursor::new(vec![7u8; 10]);
        assert_eq!(read_to_eof(&mut reader, 10).unwrap().len(), 10);
    }

    #[test]
    fn test_failure_reason_without_length_prefix() {
        let mut reader = Cursor::new(b"FAILdevice not found".to_vec());
        assert!(matches!(
            read_status(&mut reader),
            Err(ProtocolError::Failed(ref reason)) if reason == "device not found"
        ));
    }

    #[test]
    fn test_failure_reason_read_error_keeps_partial_text() {
        struct Broken(Cursor<Vec<u8>>);

        impl Read for Broken {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                match self.0.read(buf)? {
                    0 => Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
                    n => Ok(n),
                }
            }
        }

        let mut reader = Broken(Cursor::new(b"FAILno such device".to_vec()));
        assert!(matches!(
            read_status(&mut reader),
            Err(ProtocolError::Failed(ref reason)) if reason.starts_with("no s")
        ));
    }

    #[test]
    fn test_short_status_is_connection_closed() {
        let mut reader = Cursor::new(b"OK".to_vec());
        assert!(matches!(
            read_status(&mut reader),
            Err(ProtocolError::ConnectionClosed)
        ));
    }
}
