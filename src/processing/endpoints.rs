//! Gateway endpoints shared by every route table.

use super::state::TopologyState;
use crate::error::TopologyResult;
use crate::provision::Resource;

/// Declare one gateway endpoint per service, each covering every route table
/// of every role. Returns the endpoint ids.
pub fn attach_gateway_endpoints<S: AsRef<str>>(
    state: &mut TopologyState,
    region: &str,
    services: &[S],
) -> TopologyResult<Vec<String>> {
    let route_table_ids = state.all_route_table_ids();
    let depends_on: Vec<&str> = route_table_ids.iter().map(|s| s.as_str()).collect();

    let mut ids = Vec::with_capacity(services.len());
    for service in services {
        let service = service.as_ref();
        let id = state.resource_id(&format!("endpoint-{service}"));
        state.plan.declare(
            &id,
            Resource::GatewayEndpoint {
                service_name: format!("com.amazonaws.{region}.{service}"),
                route_table_ids: route_table_ids.clone(),
            },
            &depends_on,
        )?;
        log::info!(
            "gateway endpoint {id} on {} route tables",
            route_table_ids.len()
        );
        ids.push(id);
    }
    Ok(ids)
}
