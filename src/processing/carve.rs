//! Transit range carving.
//!
//! Transit subnets always come from the last 256 addresses of the parent
//! block, split into eight /27s, one per availability zone. Everything below
//! that window stays free for the primary layout.

use crate::config::{MAX_TRANSIT_SUBNETS, MIN_PARENT_MASK, TRANSIT_SUBNET_MASK, TRANSIT_WINDOW_SIZE};
use crate::error::{TopologyError, TopologyResult};
use crate::models::{block_size, format_addr, AddressBlock};

/// Base address (as integer) of the transit window inside `parent`.
fn transit_window_base(parent: &AddressBlock) -> TopologyResult<u64> {
    if parent.mask > MIN_PARENT_MASK {
        return Err(TopologyError::BlockTooSmall {
            cidr: parent.to_string(),
            min_mask: MIN_PARENT_MASK,
        });
    }
    let network_size = parent.size();
    let network_address = u32::from(parent.addr) as u64;

    // Normalise in case a host address was supplied
    let min_address = network_address - (network_address % network_size);

    Ok(min_address + network_size - TRANSIT_WINDOW_SIZE)
}

/// The /24 window reserved for transit subnets.
pub fn transit_window(parent: &AddressBlock) -> TopologyResult<AddressBlock> {
    let base = transit_window_base(parent)?;
    Ok(AddressBlock::from_u32(base as u32, MIN_PARENT_MASK))
}

/// Carve the eight transit blocks out of `parent`, in index order.
///
/// # Examples
/// ```
/// use vpc_topology_planner::models::AddressBlock;
/// use vpc_topology_planner::processing::transit_subnet_cidrs;
/// let parent = AddressBlock::new("10.0.0.0/16").unwrap();
/// let blocks = transit_subnet_cidrs(&parent).unwrap();
/// assert_eq!(blocks[0].to_string(), "10.0.255.0/27");
/// assert_eq!(blocks[7].to_string(), "10.0.255.224/27");
/// ```
pub fn transit_subnet_cidrs(parent: &AddressBlock) -> TopologyResult<Vec<AddressBlock>> {
    let max_address = transit_window_base(parent)?;
    let transit_size = block_size(TRANSIT_SUBNET_MASK);

    (0..MAX_TRANSIT_SUBNETS as u64)
        .map(|i| {
            let start = format_addr((max_address + transit_size * i) as u32);
            AddressBlock::new(&format!("{start}/{TRANSIT_SUBNET_MASK}"))
        })
        .collect()
}

/// String form of [`transit_subnet_cidrs`].
pub fn carve(parent_cidr: &str) -> TopologyResult<Vec<String>> {
    let parent = AddressBlock::new(parent_cidr)?;
    Ok(transit_subnet_cidrs(&parent)?
        .iter()
        .map(|b| b.to_string())
        .collect())
}
