//! Sentinel reply extraction
//!
//! `SENTINEL SENTINELS <name>` replies are an array of flat key/value
//! bulk-string arrays, one per known peer:
//!
//! ```text
//! "name", "10.10.10.10:26379", "ip", "10.10.10.10", "port", "26379",
//! "runid", "7ae5839dec4c...", "flags", "sentinel", ...
//! ```
//!
//! The connectable address is the `name` field. `GET-MASTER-ADDR-BY-NAME`
//! replies are either Null, a sentinel error token, or a two-element
//! `(host, port)` array.

use crate::protocol::RespValue;

/// Extract peer sentinel addresses from a `SENTINEL SENTINELS` reply.
///
/// A Null or otherwise non-array reply means "no additional sentinels
/// known" and yields an empty list. Malformed entries are skipped.
pub fn peer_addresses(reply: &RespValue) -> Vec<String> {
    let mut peers = Vec::new();

    let Some(entries) = reply.as_array() else {
        return peers;
    };

    for entry in entries {
        let Some(fields) = entry.as_array() else {
            continue;
        };

        for pair in fields.chunks_exact(2) {
            if pair[0].as_str() == Some("name") {
                if let Some(addr) = pair[1].as_str() {
                    peers.push(addr.to_string());
                }
                break;
            }
        }
    }

    peers
}

/// Extract the master address from a `GET-MASTER-ADDR-BY-NAME` reply.
///
/// Null replies, sentinel error tokens (e.g. `-IDONTKNOW`) and anything
/// not shaped like `(host, port)` all mean this sentinel cannot answer
/// authoritatively.
pub fn master_address(reply: &RespValue) -> Option<(String, u16)> {
    let items = reply.as_array()?;
    if items.len() != 2 {
        return None;
    }

    let host = items[0].as_str()?.to_string();
    let port = u16::try_from(items[1].as_int()?).ok()?;

    Some((host, port))
}
