use super::dns;
use super::ipv4::Ipv4Header;
use super::tcp::match_ip_trail;
use crate::heuristics::NxdomainCounters;
use crate::sink::AlertRecord;
use crate::trail::Snapshot;

const UDP_HEADER_LEN: usize = 4; // src(2) dst(2); length/checksum not needed
const DNS_PORT: u16 = 53;

/// Decode the UDP path (spec §4.3 "UDP path"). The two checks below are
/// independent, not mutually exclusive — a query sent *to* port 53 has
/// `src_port != 53`, so it runs the IP-trail match *and* is handed to
/// [`dns::process`] for the same frame (confirmed against the
/// `src_port != 53` / `dst_port == 53 || src_port == 53` pair of separate
/// `if` statements in the original sensor this spec was distilled from).
#[allow(clippy::too_many_arguments)]
pub fn process(
    frame: &[u8],
    iph: &Ipv4Header,
    sec: u32,
    usec: u32,
    eth_length: usize,
    snapshot: &Snapshot,
    hs: &mut NxdomainCounters,
    nxdomain_threshold: u32,
    out: &mut Vec<AlertRecord>,
) {
    let i = eth_length + iph.iph_length;
    let Some(header) = frame.get(i..i + UDP_HEADER_LEN) else {
        return;
    };
    let src_port = u16::from_be_bytes([header[0], header[1]]);
    let dst_port = u16::from_be_bytes([header[2], header[3]]);

    if src_port != DNS_PORT {
        if let Some(alert) = match_ip_trail(
            sec,
            usec,
            iph,
            Some(src_port),
            Some(dst_port),
            "UDP",
            snapshot,
        ) {
            out.push(alert);
        }
    }

    if dst_port == DNS_PORT || src_port == DNS_PORT {
        let dns_offset = i + 8;
        let payload = frame.get(dns_offset..).unwrap_or(&[]);
        dns::process(
            payload,
            sec,
            usec,
            iph,
            src_port,
            dst_port,
            snapshot,
            hs,
            nxdomain_threshold,
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::{SnapshotBuilder, Trail, TrailKind};
    use std::net::Ipv4Addr;

    fn iph(src: Ipv4Addr, dst: Ipv4Addr) -> Ipv4Header {
        Ipv4Header { iph_length: 20, protocol: 17, src_ip: src, dst_ip: dst }
    }

    fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
        let mut v = vec![0u8; 14 + 20];
        v.extend_from_slice(&src_port.to_be_bytes());
        v.extend_from_slice(&dst_port.to_be_bytes());
        v.extend_from_slice(&[0u8; 4]); // length/checksum, unused
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn non_dns_udp_matches_ip_trail() {
        let mut b = SnapshotBuilder::new();
        b.insert(TrailKind::Ip, "1.2.3.4", Trail::new("badhost", "feedA"));
        let snap = b.build();
        let header = iph(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(1, 2, 3, 4));
        let frame = udp_frame(12345, 5000, &[]);
        let mut out = Vec::new();
        let mut hs = NxdomainCounters::new();
        process(&frame, &header, 1000, 0, 14, &snap, &mut hs, 10, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].transport, "UDP");
    }

    #[test]
    fn dns_port_dispatches_to_dns_decoder() {
        let mut b = SnapshotBuilder::new();
        b.insert(TrailKind::Dns, "bad.example", Trail::new("pY", "sY"));
        let snap = b.build();
        let header = iph(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(8, 8, 8, 8));

        let mut dns_msg = vec![0u8; 12];
        dns_msg[2] = 0x01;
        dns_msg[4..6].copy_from_slice(&1u16.to_be_bytes());
        for label in ["bad", "example"] {
            dns_msg.push(label.len() as u8);
            dns_msg.extend_from_slice(label.as_bytes());
        }
        dns_msg.push(0);
        dns_msg.extend_from_slice(&1u16.to_be_bytes()); // TYPE A
        dns_msg.extend_from_slice(&1u16.to_be_bytes()); // CLASS IN

        let frame = udp_frame(55555, 53, &dns_msg);
        let mut out = Vec::new();
        let mut hs = NxdomainCounters::new();
        process(&frame, &header, 1000, 0, 14, &snap, &mut hs, 10, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].trail_value, "bad.example");
    }

    #[test]
    fn dns_query_can_also_match_ip_trail_on_the_same_frame() {
        // A query's src_port != 53, so the IP-trail check runs independently
        // of the DNS dispatch below (both conditions are separate `if`s, not
        // an if/else) — this frame hits both.
        let mut b = SnapshotBuilder::new();
        b.insert(TrailKind::Ip, "8.8.8.8", Trail::new("badresolver", "feedB"));
        b.insert(TrailKind::Dns, "bad.example", Trail::new("pY", "sY"));
        let snap = b.build();
        let header = iph(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(8, 8, 8, 8));

        let mut dns_msg = vec![0u8; 12];
        dns_msg[2] = 0x01;
        dns_msg[4..6].copy_from_slice(&1u16.to_be_bytes());
        for label in ["bad", "example"] {
            dns_msg.push(label.len() as u8);
            dns_msg.extend_from_slice(label.as_bytes());
        }
        dns_msg.push(0);
        dns_msg.extend_from_slice(&1u16.to_be_bytes()); // TYPE A
        dns_msg.extend_from_slice(&1u16.to_be_bytes()); // CLASS IN

        let frame = udp_frame(55555, 53, &dns_msg);
        let mut out = Vec::new();
        let mut hs = NxdomainCounters::new();
        process(&frame, &header, 1000, 0, 14, &snap, &mut hs, 10, &mut out);

        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|a| a.trail_kind == TrailKind::Ip && a.trail_value == "8.8.8.8"));
        assert!(out.iter().any(|a| a.trail_kind == TrailKind::Dns && a.trail_value == "bad.example"));
    }

    #[test]
    fn too_short_is_none() {
        let header = iph(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(8, 8, 8, 8));
        let frame = vec![0u8; 14 + 20 + 2]; // short of 4-byte UDP header
        let mut out = Vec::new();
        let mut hs = NxdomainCounters::new();
        process(&frame, &header, 1000, 0, 14, &SnapshotBuilder::new().build(), &mut hs, 10, &mut out);
        assert!(out.is_empty());
    }
}
