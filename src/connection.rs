//! RESP connection
//!
//! A TCP stream plus read buffer speaking request/reply RESP. Used both for
//! the short-lived sentinel dialogues and as the long-lived data connection
//! to the master.

use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::protocol::{Parser, RespValue, encode_command};

/// Initial read buffer capacity
const READ_BUFFER_SIZE: usize = 4096;

pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        // Command/reply traffic is latency bound
        let _ = stream.set_nodelay(true);

        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
        }
    }

    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Send a command frame (RESP array of bulk strings)
    pub async fn send_command(&mut self, parts: &[&str]) -> Result<()> {
        let buf = encode_command(parts);
        self.stream.write_all(&buf).await?;
        Ok(())
    }

    /// Read the next complete reply
    ///
    /// Drains any bytes left over from a previous read before touching the
    /// socket again. EOF mid-reply is `Error::ConnectionClosed`.
    pub async fn read_reply(&mut self) -> Result<RespValue> {
        loop {
            if let Some(value) = Parser::parse(&mut self.buffer)? {
                return Ok(value);
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }

    /// One command, one reply
    pub async fn round_trip(&mut self, parts: &[&str]) -> Result<RespValue> {
        self.send_command(parts).await?;
        self.read_reply().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_round_trip_ping() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"*1\r\n$4\r\nPING\r\n");
            socket.write_all(b"+PONG\r\n").await.unwrap();
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut conn = Connection::new(stream);
        let reply = conn.round_trip(&["PING"]).await.unwrap();
        assert_eq!(reply.as_str(), Some("PONG"));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_reply_split_across_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"$11\r\nhello").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            socket.write_all(b" world\r\n").await.unwrap();
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut conn = Connection::new(stream);
        let reply = conn.read_reply().await.unwrap();
        assert_eq!(reply.as_str(), Some("hello world"));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_eof_is_connection_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut conn = Connection::new(stream);
        let err = conn.read_reply().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));

        server.await.unwrap();
    }
}
