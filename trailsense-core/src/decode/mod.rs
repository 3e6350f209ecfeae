mod constants;
mod dns;
mod ethernet;
mod http;
mod ipv4;
mod tcp;
mod udp;

pub use constants::LinkType;
pub use ipv4::Ipv4Header;

use crate::heuristics::NxdomainCounters;
use crate::sink::AlertRecord;
use crate::trail::Snapshot;

const TCP_PROTO: u8 = 6;
const UDP_PROTO: u8 = 17;

/// Decode one captured frame (spec §4.3), appending any alert it produces
/// to `out`. Pure apart from the `TS` read through `snapshot` and the `HS`
/// mutation through `hs` — no I/O, no panics. Malformed or uninteresting
/// frames simply produce no alert (spec §7).
pub fn decode_frame(
    frame: &[u8],
    sec: u32,
    usec: u32,
    link_type: LinkType,
    snapshot: &Snapshot,
    hs: &mut NxdomainCounters,
    nxdomain_threshold: u32,
    out: &mut Vec<AlertRecord>,
) {
    let Some(frame) = ethernet::gate_ipv4(frame, link_type) else {
        return;
    };
    let Some((iph, frame)) = ipv4::parse(frame) else {
        return;
    };

    match iph.protocol {
        TCP_PROTO => tcp::process(
            frame,
            &iph,
            sec,
            usec,
            constants::ETH_LENGTH,
            snapshot,
            out,
        ),
        UDP_PROTO => udp::process(
            frame,
            &iph,
            sec,
            usec,
            constants::ETH_LENGTH,
            snapshot,
            hs,
            nxdomain_threshold,
            out,
        ),
        other => {
            if let Some(name) = constants::ip_proto_name(other) {
                if let Some(alert) = tcp::match_ip_trail(sec, usec, &iph, None, None, name, snapshot)
                {
                    out.push(alert);
                }
            }
        }
    }
}
