use super::ipv4::Ipv4Header;
use crate::heuristics::NxdomainCounters;
use crate::sink::AlertRecord;
use crate::trail::{Snapshot, TrailKind};

const QUESTION_OFFSET: usize = 12;
const STANDARD_QUERY: u8 = 0x01;
const RESPONSE_NAME_ERROR_LO: u8 = 0x83;
const RESPONSE_RECURSION_AVAILABLE_HI: u8 = 0x80;
const PTR_TYPE: u16 = 12;
const CLASS_IN: u16 = 1;

/// Decode the question name starting at [`QUESTION_OFFSET`] using
/// label-length prefixes. No DNS name compression (`0xC0` pointer) handling
/// is attempted — a compressed name is treated as malformed and aborts
/// (spec §9 known limitation).
///
/// Returns the dotted name (trailing dot stripped) and the offset of the
/// root-label null byte, or `None` if the message runs out of bytes before
/// a terminator is found.
fn parse_question_name(data: &[u8]) -> Option<(String, usize)> {
    let mut offset = QUESTION_OFFSET;
    let mut query = String::new();
    loop {
        let length = *data.get(offset)? as usize;
        if length == 0 {
            if query.ends_with('.') {
                query.pop();
            }
            return Some((query, offset));
        }
        let label = data.get(offset + 1..offset + 1 + length)?;
        query.push_str(&String::from_utf8_lossy(label));
        query.push('.');
        offset += length + 1;
    }
}

/// Longest-to-shortest suffix match against `TS.DNS` (spec §4.3 "Standard
/// query"). Trail value formatting: the matched suffix itself if it equals
/// the full query, otherwise `"(<prefix>)<suffix>"` where `<prefix>`
/// includes the trailing dot between labels.
fn suffix_match(query: &str, snapshot: &Snapshot) -> Option<(String, crate::trail::Trail)> {
    if query.is_empty() {
        return None;
    }
    let parts: Vec<&str> = query.split('.').collect();
    for i in 0..parts.len() {
        let domain = parts[i..].join(".");
        if let Some(trail) = snapshot.get(TrailKind::Dns, &domain) {
            let trail_value = if domain == query {
                domain
            } else {
                let prefix = &query[..query.len() - domain.len()];
                format!("({prefix}){domain}")
            };
            return Some((trail_value, trail.clone()));
        }
    }
    None
}

/// Decode a DNS message (`payload` starts at the DNS header, i.e.
/// `ETH_LENGTH + iph_length + 8`) per spec §4.3's "UDP path" DNS branch.
/// Appends any emitted alert — a suffix-match hit for a standard query, or
/// a synthetic NXDOMAIN-flood heuristic alert — to `out`.
#[allow(clippy::too_many_arguments)]
pub fn process(
    payload: &[u8],
    sec: u32,
    usec: u32,
    iph: &Ipv4Header,
    src_port: u16,
    dst_port: u16,
    snapshot: &Snapshot,
    hs: &mut NxdomainCounters,
    nxdomain_threshold: u32,
    out: &mut Vec<AlertRecord>,
) {
    if payload.len() < 6 {
        return;
    }
    let qdcount = u16::from_be_bytes([payload[4], payload[5]]);
    if qdcount == 0 {
        return;
    }
    let Some((query, null_offset)) = parse_question_name(payload) else {
        return;
    };
    let flags_hi = payload[2];
    let flags_lo = payload[3];

    if flags_hi == STANDARD_QUERY {
        let Some(type_class) = payload.get(null_offset + 1..null_offset + 5) else {
            return;
        };
        let qtype = u16::from_be_bytes([type_class[0], type_class[1]]);
        let qclass = u16::from_be_bytes([type_class[2], type_class[3]]);
        if qtype != PTR_TYPE && qclass == CLASS_IN {
            if let Some((trail_value, trail)) = suffix_match(&query, snapshot) {
                out.push(AlertRecord {
                    sec,
                    usec,
                    src_ip: iph.src_ip,
                    src_port: Some(src_port),
                    dst_ip: iph.dst_ip,
                    dst_port: Some(dst_port),
                    transport: "UDP".to_string(),
                    trail_kind: TrailKind::Dns,
                    trail_value,
                    indicator: trail.indicator,
                    source: trail.source,
                });
            }
        }
    } else if (flags_hi & RESPONSE_RECURSION_AVAILABLE_HI != 0) && flags_lo == RESPONSE_NAME_ERROR_LO
    {
        if hs.observe(&query, sec, nxdomain_threshold) {
            out.push(AlertRecord {
                sec,
                usec,
                src_ip: iph.src_ip,
                src_port: Some(src_port),
                dst_ip: iph.dst_ip,
                dst_port: Some(dst_port),
                transport: "UDP".to_string(),
                trail_kind: TrailKind::Dns,
                trail_value: query,
                indicator: "suspicious no such name".to_string(),
                source: "(heuristic)".to_string(),
            });
        }
    }
}
