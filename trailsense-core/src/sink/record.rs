use std::fmt;
use std::net::Ipv4Addr;

use crate::trail::TrailKind;

/// One alert: a trail match found while decoding a captured frame.
///
/// Field order and semantics match spec §3's tuple
/// `(sec, usec, src_ip, src_port, dst_ip, dst_port, transport, trail_kind,
/// trail_value, indicator, source)` exactly; ports are `None` for
/// non-TCP/UDP transports and rendered as the `-` sentinel by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRecord {
    pub sec: u32,
    pub usec: u32,
    pub src_ip: Ipv4Addr,
    pub src_port: Option<u16>,
    pub dst_ip: Ipv4Addr,
    pub dst_port: Option<u16>,
    pub transport: String,
    pub trail_kind: TrailKind,
    pub trail_value: String,
    pub indicator: String,
    pub source: String,
}

fn port_or_dash(port: Option<u16>) -> String {
    match port {
        Some(p) => p.to_string(),
        None => "-".to_string(),
    }
}

impl fmt::Display for AlertRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {} {} {}",
            self.sec,
            self.usec,
            self.src_ip,
            port_or_dash(self.src_port),
            self.dst_ip,
            port_or_dash(self.dst_port),
            self.transport,
            self.trail_kind,
            self.trail_value,
            self.indicator,
            self.source,
        )
    }
}
