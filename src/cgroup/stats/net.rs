use std::fmt;
use std::io::BufRead;

use super::StatParseError;

/// Byte counters of the interface carrying the default route, as reported in
/// `/sys/class/net/<iface>/statistics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct NetworkStat {
    /// Bytes received.
    pub rx_bytes: u64,
    /// Bytes transmitted.
    pub tx_bytes: u64,
}

impl fmt::Display for NetworkStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RxBytes: {}, TxBytes: {}", self.rx_bytes, self.tx_bytes)
    }
}

/// Destination and mask of a default route in `/proc/net/route` (hex, host byte order).
const ANY_ADDRESS: &str = "00000000";

/// The IPv4 default route from `/proc/net/route`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRoute {
    /// Name of the outgoing interface, e.g. `eth0`.
    pub interface: String,
}

/// Parses one routing table row into `(iface, destination, mask)`.
///
/// Returns `None` if the row has fewer than the eight columns up to `Mask`.
fn parse_route_line(line: &str) -> Option<(&str, &str, &str)> {
    let mut fields = line.split_whitespace();
    let iface = fields.next()?;
    let destination = fields.next()?;
    let mask = fields.nth(5)?;
    Some((iface, destination, mask))
}

impl DefaultRoute {
    /// Finds the first default route in `/proc/net/route` content.
    ///
    /// The header line is skipped. Returns `Ok(None)` if no row has both an
    /// all-zero destination and an all-zero mask.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading fails.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Option<Self>, StatParseError> {
        let mut line = String::new();

        // Skip header
        buf.read_line(&mut line)?;
        line.clear();

        while buf.read_line(&mut line)? != 0 {
            if let Some((iface, destination, mask)) = parse_route_line(&line) {
                if destination == ANY_ADDRESS && mask == ANY_ADDRESS {
                    return Ok(Some(Self {
                        interface: iface.to_owned(),
                    }));
                }
            }
            line.clear();
        }

        Ok(None)
    }
}
