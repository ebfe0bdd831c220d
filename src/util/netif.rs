//! Host network interfaces as subnet allow-lists.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6, UdpSocket};

/// An interface address together with its prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalNet {
    pub addr: IpAddr,
    pub prefix: u8,
}

impl LocalNet {
    pub fn new(addr: IpAddr, prefix: u8) -> Self {
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        Self {
            addr,
            prefix: prefix.min(max),
        }
    }

    /// Whether `ip` lies in the same subnet as this interface address.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = prefix_mask_u32(self.prefix);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = prefix_mask_u128(self.prefix);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl fmt::Display for LocalNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

fn prefix_mask_u32(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - p),
    }
}

fn prefix_mask_u128(prefix: u8) -> u128 {
    match prefix {
        0 => 0,
        p if p >= 128 => u128::MAX,
        p => u128::MAX << (128 - p),
    }
}

fn ipv4_prefix(mask: Ipv4Addr) -> u8 {
    u32::from(mask).count_ones() as u8
}

fn ipv6_prefix(mask: Ipv6Addr) -> u8 {
    u128::from(mask).count_ones() as u8
}

/// Enumerate the subnets of all configured interfaces.
///
/// Interfaces without an address or netmask are skipped.
pub fn local_networks() -> std::io::Result<Vec<LocalNet>> {
    let mut nets = Vec::new();
    let addrs = nix::ifaddrs::getifaddrs().map_err(std::io::Error::from)?;
    for ifaddr in addrs {
        let (Some(addr), Some(mask)) = (ifaddr.address, ifaddr.netmask) else {
            continue;
        };
        if let (Some(a), Some(m)) = (addr.as_sockaddr_in(), mask.as_sockaddr_in()) {
            let ip = *SocketAddrV4::from(*a).ip();
            let prefix = ipv4_prefix(*SocketAddrV4::from(*m).ip());
            nets.push(LocalNet::new(IpAddr::V4(ip), prefix));
        } else if let (Some(a), Some(m)) = (addr.as_sockaddr_in6(), mask.as_sockaddr_in6()) {
            let ip = *SocketAddrV6::from(*a).ip();
            let prefix = ipv6_prefix(*SocketAddrV6::from(*m).ip());
            nets.push(LocalNet::new(IpAddr::V6(ip), prefix));
        }
    }
    Ok(nets)
}

/// Best guess of the address other machines use to reach this host.
///
/// Connecting a UDP socket sends no packets; it only selects the outbound route.
pub fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|a| a.ip())
}
