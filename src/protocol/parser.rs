use bytes::{Buf, Bytes, BytesMut};

use super::types::RespValue;
use crate::error::{Error, Result};

/// Incremental RESP reply parser
/// Parses server replies with minimal allocations
pub struct Parser;

impl Parser {
    /// Parse a complete RESP reply from buffer.
    /// Returns None if buffer doesn't contain a complete reply.
    /// Advances buffer past the parsed data.
    #[inline]
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>> {
        if buf.is_empty() {
            return Ok(None);
        }

        match Self::parse_value(buf) {
            Ok(Some((value, consumed))) => {
                buf.advance(consumed);
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Parse value, returning (value, bytes_consumed) or None if incomplete
    fn parse_value(buf: &[u8]) -> Result<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        match buf[0] {
            b'+' => Self::parse_simple_string(buf),
            b'-' => Self::parse_error(buf),
            b':' => Self::parse_integer(buf),
            b'$' => Self::parse_bulk_string(buf),
            b'*' => Self::parse_array(buf),
            other => Err(Error::Protocol(format!(
                "unexpected reply type byte {:#04x}",
                other
            ))),
        }
    }

    /// Find \r\n in buffer, return position of \r
    #[inline]
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        memchr::memchr(b'\r', buf).and_then(|pos| {
            if pos + 1 < buf.len() && buf[pos + 1] == b'\n' {
                Some(pos)
            } else {
                None
            }
        })
    }

    fn parse_simple_string(buf: &[u8]) -> Result<Option<(RespValue, usize)>> {
        match Self::find_crlf(buf) {
            Some(pos) => {
                let s = Bytes::copy_from_slice(&buf[1..pos]);
                Ok(Some((RespValue::SimpleString(s), pos + 2)))
            }
            None => Ok(None),
        }
    }

    fn parse_error(buf: &[u8]) -> Result<Option<(RespValue, usize)>> {
        match Self::find_crlf(buf) {
            Some(pos) => {
                let s = Bytes::copy_from_slice(&buf[1..pos]);
                Ok(Some((RespValue::Error(s), pos + 2)))
            }
            None => Ok(None),
        }
    }

    fn parse_integer(buf: &[u8]) -> Result<Option<(RespValue, usize)>> {
        match Self::find_crlf(buf) {
            Some(pos) => {
                let s = std::str::from_utf8(&buf[1..pos])
                    .map_err(|_| Error::Protocol("invalid integer".into()))?;
                let n: i64 = s
                    .parse()
                    .map_err(|_| Error::Protocol("invalid integer".into()))?;
                Ok(Some((RespValue::Integer(n), pos + 2)))
            }
            None => Ok(None),
        }
    }

    fn parse_bulk_string(buf: &[u8]) -> Result<Option<(RespValue, usize)>> {
        let crlf_pos = match Self::find_crlf(buf) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let len_str = std::str::from_utf8(&buf[1..crlf_pos])
            .map_err(|_| Error::Protocol("invalid bulk length".into()))?;
        let len: i64 = len_str
            .parse()
            .map_err(|_| Error::Protocol("invalid bulk length".into()))?;

        if len == -1 {
            return Ok(Some((RespValue::Null, crlf_pos + 2)));
        }

        let len = len as usize;
        let data_start = crlf_pos + 2;
        let data_end = data_start + len;
        let total_len = data_end + 2; // +2 for trailing \r\n

        if buf.len() < total_len {
            return Ok(None);
        }

        let data = Bytes::copy_from_slice(&buf[data_start..data_end]);
        Ok(Some((RespValue::BulkString(data), total_len)))
    }

    fn parse_array(buf: &[u8]) -> Result<Option<(RespValue, usize)>> {
        let crlf_pos = match Self::find_crlf(buf) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let len_str = std::str::from_utf8(&buf[1..crlf_pos])
            .map_err(|_| Error::Protocol("invalid array length".into()))?;
        let len: i64 = len_str
            .parse()
            .map_err(|_| Error::Protocol("invalid array length".into()))?;

        if len == -1 {
            return Ok(Some((RespValue::NullArray, crlf_pos + 2)));
        }

        let len = len as usize;
        let mut items = Vec::with_capacity(len);
        let mut offset = crlf_pos + 2;

        for _ in 0..len {
            match Self::parse_value(&buf[offset..])? {
                Some((value, consumed)) => {
                    items.push(value);
                    offset += consumed;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((RespValue::Array(items), offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_string() {
        let mut buf = BytesMut::from("+OK\r\n");
        let value = Parser::parse(&mut buf).unwrap().unwrap();
        assert_eq!(value, RespValue::SimpleString(Bytes::from_static(b"OK")));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_parse_error_reply() {
        let mut buf = BytesMut::from("-IDONTKNOW\r\n");
        let value = Parser::parse(&mut buf).unwrap().unwrap();
        assert_eq!(value, RespValue::Error(Bytes::from_static(b"IDONTKNOW")));
    }

    #[test]
    fn test_parse_master_addr_reply() {
        let mut buf = BytesMut::from("*2\r\n$9\r\n127.0.0.1\r\n$4\r\n6379\r\n");
        let value = Parser::parse(&mut buf).unwrap().unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_str(), Some("127.0.0.1"));
        assert_eq!(items[1].as_int(), Some(6379));
    }

    #[test]
    fn test_parse_null_bulk() {
        let mut buf = BytesMut::from("$-1\r\n");
        let value = Parser::parse(&mut buf).unwrap().unwrap();
        assert_eq!(value, RespValue::Null);
    }

    #[test]
    fn test_parse_null_array() {
        let mut buf = BytesMut::from("*-1\r\n");
        let value = Parser::parse(&mut buf).unwrap().unwrap();
        assert_eq!(value, RespValue::NullArray);
    }

    #[test]
    fn test_parse_incomplete_returns_none() {
        let mut buf = BytesMut::from("*2\r\n$9\r\n127.0.");
        assert!(Parser::parse(&mut buf).unwrap().is_none());
        // Buffer untouched so the caller can read more bytes into it
        assert_eq!(&buf[..4], b"*2\r\n");
    }

    #[test]
    fn test_parse_nested_sentinel_list() {
        // SENTINEL SENTINELS reply: array of flat key/value arrays
        let mut buf = BytesMut::from(
            "*1\r\n*4\r\n$4\r\nname\r\n$15\r\n127.0.0.1:26379\r\n$2\r\nip\r\n$9\r\n127.0.0.1\r\n",
        );
        let value = Parser::parse(&mut buf).unwrap().unwrap();
        let outer = value.as_array().unwrap();
        let inner = outer[0].as_array().unwrap();
        assert_eq!(inner[0].as_str(), Some("name"));
        assert_eq!(inner[1].as_str(), Some("127.0.0.1:26379"));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        let mut buf = BytesMut::from("hello\r\n");
        assert!(Parser::parse(&mut buf).is_err());
    }
}
