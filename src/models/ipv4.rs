//! IPv4 address codec and CIDR block utilities.
//!
//! Provides [`AddressBlock`] for `addr/len` notation plus the integer codec
//! ([`parse_addr`] / [`format_addr`]) the range carver works on.

use crate::error::{TopologyError, TopologyResult};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 prefix (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Parse a dotted-quad address into its big-endian integer value.
///
/// Accepts exactly four dot-separated decimal octets, each in `[0, 255]`.
///
/// # Examples
/// ```
/// use vpc_topology_planner::models::parse_addr;
/// assert_eq!(parse_addr("174.66.173.168").unwrap(), 2923605416);
/// ```
pub fn parse_addr(text: &str) -> TopologyResult<u32> {
    let octets: Vec<&str> = text.split('.').collect();
    if octets.len() != 4 {
        return Err(TopologyError::InvalidAddress(text.to_string()));
    }

    octets.iter().try_fold(0u32, |acc, octet| {
        if octet.is_empty() || octet.len() > 3 || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TopologyError::InvalidAddress(text.to_string()));
        }
        let value: u32 = octet
            .parse()
            .map_err(|_| TopologyError::InvalidAddress(text.to_string()))?;
        if value > 255 {
            return Err(TopologyError::InvalidAddress(text.to_string()));
        }
        Ok((acc << 8) | value)
    })
}

/// Format an integer address as a canonical dotted quad.
pub fn format_addr(value: u32) -> String {
    Ipv4Addr::from(value).to_string()
}

/// Convert a prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use vpc_topology_planner::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> TopologyResult<u32> {
    if len > MAX_LENGTH {
        Err(TopologyError::InvalidCidr(format!(
            "network length /{len} is too long"
        )))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Number of addresses covered by a prefix length.
pub fn block_size(len: u8) -> u64 {
    1u64 << (MAX_LENGTH - len.min(MAX_LENGTH))
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> TopologyResult<Ipv4Addr> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Calculate the broadcast (highest) address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> TopologyResult<Ipv4Addr> {
    let mask = get_cidr_mask(len)?;
    let network_bits = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network_bits | !mask))
}

/// Returns the first address after the block containing `addr`, if any.
pub fn ip_after_subnet(addr: Ipv4Addr, len: u8) -> TopologyResult<Option<Ipv4Addr>> {
    let network = u32::from(cut_addr(addr, len)?) as u64;
    let next = network + block_size(len);
    Ok(u32::try_from(next).ok().map(Ipv4Addr::from))
}

/// Dash-separated form of a block for resource names.
///
/// `10.0.0.0/16` becomes `10-0-0-0-16`. Octet and prefix boundaries are kept,
/// so two distinct blocks never share a name.
pub fn cidr_slug(block: &AddressBlock) -> String {
    let [a, b, c, d] = block.addr.octets();
    format!("{a}-{b}-{c}-{d}-{}", block.mask)
}

/// IPv4 address block in CIDR notation.
#[derive(Eq, Ord, Debug, Copy, Clone, Hash, PartialEq, PartialOrd)]
pub struct AddressBlock {
    /// The network (or host) address as supplied.
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl Serialize for AddressBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AddressBlock {
    fn deserialize<D>(deserializer: D) -> Result<AddressBlock, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AddressBlock::new(&s).map_err(de::Error::custom)
    }
}

impl FromStr for AddressBlock {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressBlock::new(s)
    }
}

impl AddressBlock {
    /// Create a new [`AddressBlock`] from a CIDR string (e.g., "10.0.0.0/16").
    ///
    /// Host bits are allowed; use [`AddressBlock::is_network`] to check alignment.
    pub fn new(addr_cidr: &str) -> TopologyResult<AddressBlock> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| TopologyError::InvalidCidr(addr_cidr.to_string()))?;
        let addr = parse_addr(addr)?;
        if mask.is_empty() || !mask.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TopologyError::InvalidCidr(addr_cidr.to_string()));
        }
        let mask: u8 = mask
            .parse()
            .map_err(|_| TopologyError::InvalidCidr(addr_cidr.to_string()))?;
        if mask > MAX_LENGTH {
            return Err(TopologyError::InvalidCidr(addr_cidr.to_string()));
        }
        Ok(AddressBlock {
            addr: Ipv4Addr::from(addr),
            mask,
        })
    }

    /// Like [`AddressBlock::new`], but host bits are an error.
    pub fn new_network(addr_cidr: &str) -> TopologyResult<AddressBlock> {
        let block = AddressBlock::new(addr_cidr)?;
        if !block.is_network() {
            return Err(TopologyError::InvalidCidr(format!(
                "{block} has host bits set (did you mean {}?)",
                block.network()
            )));
        }
        Ok(block)
    }

    /// Build a block from an integer base address.
    pub fn from_u32(base: u32, mask: u8) -> AddressBlock {
        AddressBlock {
            addr: Ipv4Addr::from(base),
            mask,
        }
    }

    /// The block covering every IPv4 address.
    pub fn any_ipv4() -> AddressBlock {
        AddressBlock {
            addr: Ipv4Addr::UNSPECIFIED,
            mask: 0,
        }
    }

    /// Get the lowest (network) address in the block.
    pub fn lo(&self) -> Ipv4Addr {
        let mask = get_cidr_mask(self.mask).unwrap_or(u32::MAX);
        Ipv4Addr::from(u32::from(self.addr) & mask)
    }

    /// Get the highest (broadcast) address in the block.
    pub fn hi(&self) -> Ipv4Addr {
        let mask = get_cidr_mask(self.mask).unwrap_or(u32::MAX);
        Ipv4Addr::from((u32::from(self.addr) & mask) | !mask)
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        block_size(self.mask)
    }

    /// True when no host bits are set.
    pub fn is_network(&self) -> bool {
        self.addr == self.lo()
    }

    /// The block normalised to its network address.
    pub fn network(&self) -> AddressBlock {
        AddressBlock {
            addr: self.lo(),
            mask: self.mask,
        }
    }

    /// Check whether `ip` falls inside this block.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.lo() <= ip && ip <= self.hi()
    }

    /// Check whether `other` lies entirely inside this block.
    pub fn contains_block(&self, other: &AddressBlock) -> bool {
        self.contains(other.lo()) && self.contains(other.hi())
    }

    /// Check whether the two blocks share any address.
    pub fn overlaps(&self, other: &AddressBlock) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }
}

impl std::fmt::Display for AddressBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}
