/// Length, in bytes, of the (post-LINUX_SLL-stripping) Ethernet header.
pub const ETH_LENGTH: usize = 14;

/// EtherType value for IPv4.
pub const IPPROTO_IPV4: u16 = 0x0800;

/// IANA protocol numbers this sensor resolves to a short name for the
/// "other IP protocols" alert path (spec §4.3). At minimum covers ICMP;
/// extend as needed without touching the decode logic itself.
pub fn ip_proto_name(protocol: u8) -> Option<&'static str> {
    match protocol {
        1 => Some("ICMP"),
        58 => Some("ICMPv6"),
        47 => Some("GRE"),
        50 => Some("ESP"),
        51 => Some("AH"),
        _ => None,
    }
}

/// Link type of the capture, as reported by the capture driver (spec §4.2,
/// §6). Only the two supported values are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// `EN10MB`
    Ethernet,
    /// `LINUX_SLL` cooked capture — carries a 2-byte pseudo-header before
    /// the Ethernet-shaped header.
    LinuxSll,
}
