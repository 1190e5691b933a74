//! Overlapping subnet detection.

use super::state::TopologyState;
use crate::error::{TopologyError, TopologyResult};
use itertools::Itertools;

/// Return an error if any two subnets of the network share an address.
pub fn check_for_overlapping_subnets(state: &TopologyState) -> TopologyResult<()> {
    let mut sorted: Vec<_> = state.subnets.iter().collect();
    sorted.sort_by_key(|s| s.cidr.lo());

    if let Some((a, b)) = sorted
        .iter()
        .tuple_combinations()
        .find(|(a, b)| a.cidr.overlaps(&b.cidr))
    {
        log::error!("Overlap found: {} {} / {} {}", a.id, a.cidr, b.id, b.cidr);
        return Err(TopologyError::AddressSpaceExhausted(format!(
            "subnet {} ({}) overlaps {} ({})",
            a.id, a.cidr, b.id, b.cidr
        )));
    }
    Ok(())
}
