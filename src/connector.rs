//! Guarded connection primitive
//!
//! Every network attempt in the discovery flow goes through here: one TCP
//! connect raced against an optional deadline. The deadline is scoped to a
//! single attempt; dropping the losing side guarantees at most one outcome.

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

/// Timeout value that disables the deadline
pub const NO_TIMEOUT: f64 = 0.0;

/// Connect to `host:port`, optionally bounded by a deadline.
///
/// `timeout_secs` semantics:
/// - `0.0` disables the deadline entirely
/// - positive values arm a deadline for that many seconds
/// - negative values arm a degenerate deadline that expires immediately,
///   so the attempt resolves as a timeout before the connect can finish
///
/// Ordinary network failure (refused, unreachable, deadline expiry) is an
/// `Err`; expiry is reported as `io::ErrorKind::TimedOut`. A connect that
/// would have completed after the deadline fired is cancelled with the
/// dropped future and never observed.
pub async fn connect_with_timeout(
    host: &str,
    port: u16,
    timeout_secs: f64,
) -> io::Result<TcpStream> {
    let addr = format!("{}:{}", host, port);

    if timeout_secs == NO_TIMEOUT {
        return TcpStream::connect(&addr).await;
    }

    let deadline = if timeout_secs < 0.0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(timeout_secs)
    };

    match timeout(deadline, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timeout")),
    }
}

/// Split a `host:port` endpoint string.
///
/// Splits on the last colon so IPv6 forms like `[::1]:6379` keep their
/// host part intact. Returns None when the port is missing or unparseable.
pub fn split_endpoint(endpoint: &str) -> Option<(&str, u16)> {
    let (host, port) = endpoint.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port: u16 = port.parse().ok()?;
    Some((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_split_endpoint() {
        assert_eq!(split_endpoint("127.0.0.1:26379"), Some(("127.0.0.1", 26379)));
        assert_eq!(split_endpoint("localhost:6379"), Some(("localhost", 6379)));
        assert_eq!(split_endpoint("[::1]:6379"), Some(("[::1]", 6379)));
        assert_eq!(split_endpoint("no-port"), None);
        assert_eq!(split_endpoint(":6379"), None);
        assert_eq!(split_endpoint("host:notaport"), None);
    }

    #[tokio::test]
    async fn test_connect_success_without_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = connect_with_timeout("127.0.0.1", port, NO_TIMEOUT).await;
        assert!(stream.is_ok());
    }

    #[tokio::test]
    async fn test_connect_success_within_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = connect_with_timeout("127.0.0.1", port, 5.0).await;
        assert!(stream.is_ok());
    }

    #[tokio::test]
    async fn test_connect_refused_is_err_not_panic() {
        // Bind then drop so the port is known to be closed
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect_with_timeout("127.0.0.1", port, 5.0).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_negative_deadline_times_out_against_reachable_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = connect_with_timeout("127.0.0.1", port, -1.0).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
