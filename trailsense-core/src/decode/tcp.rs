use super::http;
use super::ipv4::Ipv4Header;
use crate::sink::AlertRecord;
use crate::trail::{Snapshot, TrailKind};

const TCP_HEADER_LEN: usize = 14; // src(2) dst(2) seq(4) ack(4) doff_reserved(1) flags(1)
const SYN: u8 = 0x02;
const PSH: u8 = 0x08;

/// Decode the TCP path (spec §4.3 "TCP path"): the SYN-only IP-trail match
/// and the PSH HTTP extractor dispatch. Appends any emitted alert to
/// `out`.
pub fn process(
    frame: &[u8],
    iph: &Ipv4Header,
    sec: u32,
    usec: u32,
    eth_length: usize,
    snapshot: &Snapshot,
    out: &mut Vec<AlertRecord>,
) {
    let i = eth_length + iph.iph_length;
    let Some(header) = frame.get(i..i + TCP_HEADER_LEN) else {
        return;
    };

    let src_port = u16::from_be_bytes([header[0], header[1]]);
    let dst_port = u16::from_be_bytes([header[2], header[3]]);
    let doff_reserved = header[12];
    let flags = header[13];

    if flags == SYN {
        if let Some(alert) = match_ip_trail(
            sec,
            usec,
            iph,
            Some(src_port),
            Some(dst_port),
            "TCP",
            snapshot,
        ) {
            out.push(alert);
        }
    }

    if flags & PSH != 0 {
        let tcph_length = ((doff_reserved >> 4) as usize) << 2;
        let data_offset = eth_length + iph.iph_length + tcph_length;
        let payload = frame.get(data_offset..).unwrap_or(&[]);

        if dst_port == 80 && !payload.is_empty() {
            if let Some((trail_value, trail)) = http::extract_match(payload, snapshot) {
                out.push(AlertRecord {
                    sec,
                    usec,
                    src_ip: iph.src_ip,
                    src_port: Some(src_port),
                    dst_ip: iph.dst_ip,
                    dst_port: Some(dst_port),
                    transport: "TCP".to_string(),
                    trail_kind: TrailKind::Url,
                    trail_value,
                    indicator: trail.indicator,
                    source: trail.source,
                });
            }
        }
    }
}

/// Shared `dst_ip`-preferred-over-`src_ip` IP-trail match used by the
/// TCP-SYN path, the non-DNS UDP path, and the other-IP-protocols path
/// (spec §4.3). `dst_ip` is checked first; never both are emitted.
pub fn match_ip_trail(
    sec: u32,
    usec: u32,
    iph: &Ipv4Header,
    src_port: Option<u16>,
    dst_port: Option<u16>,
    transport: &str,
    snapshot: &Snapshot,
) -> Option<AlertRecord> {
    let dst_key = iph.dst_ip.to_string();
    if let Some(trail) = snapshot.get(TrailKind::Ip, &dst_key) {
        return Some(AlertRecord {
            sec,
            usec,
            src_ip: iph.src_ip,
            src_port,
            dst_ip: iph.dst_ip,
            dst_port,
            transport: transport.to_string(),
            trail_kind: TrailKind::Ip,
            trail_value: dst_key,
            indicator: trail.indicator.clone(),
            source: trail.source.clone(),
        });
    }
    let src_key = iph.src_ip.to_string();
    if let Some(trail) = snapshot.get(TrailKind::Ip, &src_key) {
        return Some(AlertRecord {
            sec,
            usec,
            src_ip: iph.src_ip,
            src_port,
            dst_ip: iph.dst_ip,
            dst_port,
            transport: transport.to_string(),
            trail_kind: TrailKind::Ip,
            trail_value: src_key,
            indicator: trail.indicator.clone(),
            source: trail.source.clone(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::{SnapshotBuilder, Trail};
    use std::net::Ipv4Addr;

    fn iph(src: Ipv4Addr, dst: Ipv4Addr) -> Ipv4Header {
        Ipv4Header { iph_length: 20, protocol: 6, src_ip: src, dst_ip: dst }
    }

    fn tcp_frame(src_port: u16, dst_port: u16, flags: u8) -> Vec<u8> {
        let mut v = vec![0u8; 14 + 20];
        v.extend_from_slice(&src_port.to_be_bytes());
        v.extend_from_slice(&dst_port.to_be_bytes());
        v.extend_from_slice(&[0u8; 8]); // seq/ack
        v.push(0x50); // doff_reserved: data offset 5 (20 bytes), no options
        v.push(flags);
        v
    }

    #[test]
    fn syn_only_matches_dst_ip_preferred() {
        let mut b = SnapshotBuilder::new();
        b.insert(TrailKind::Ip, "1.2.3.4", Trail::new("badhost", "feedA"));
        let snap = b.build();

        let header = iph(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(1, 2, 3, 4));
        let frame = tcp_frame(55555, 80, 0x02);
        let mut out = Vec::new();
        process(&frame, &header, 1000, 0, 14, &snap, &mut out);

        assert_eq!(out.len(), 1);
        let a = &out[0];
        assert_eq!(a.trail_value, "1.2.3.4");
        assert_eq!(a.src_port, Some(55555));
        assert_eq!(a.dst_port, Some(80));
    }

    #[test]
    fn syn_ack_does_not_match() {
        let mut b = SnapshotBuilder::new();
        b.insert(TrailKind::Ip, "1.2.3.4", Trail::new("badhost", "feedA"));
        let snap = b.build();

        let header = iph(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(1, 2, 3, 4));
        let frame = tcp_frame(55555, 80, 0x12); // SYN+ACK
        let mut out = Vec::new();
        process(&frame, &header, 1000, 0, 14, &snap, &mut out);
        assert!(out.is_empty());
    }
}
