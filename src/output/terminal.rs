//! Terminal output utilities.

use crate::models::SubnetRole;
use crate::processing::TopologyState;
use colored::Colorize;

/// Format a value as a quoted, right-aligned field.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// One line per role plus the transit attachment and plan depth.
pub fn summary_lines(state: &TopologyState) -> Vec<String> {
    let mut lines = vec![format!(
        "# {} {} ({} resources in {} waves)",
        state.name.bold(),
        state.vpc_cidr,
        state.plan.len(),
        state.plan.waves().len()
    )];
    for (role, registry) in state.registries() {
        let label = match role {
            SubnetRole::Public => role.as_str().green(),
            SubnetRole::Private => role.as_str().yellow(),
            SubnetRole::Isolated => role.as_str().red(),
            SubnetRole::Transit => role.as_str().cyan(),
        };
        lines.push(format!(
            "#   {label:>8}: subnets={} route_tables={} acls={}",
            registry.subnet_ids.len(),
            registry.route_table_ids.len(),
            registry.acl_ids.len()
        ));
    }
    lines.push(match &state.transit_attachment_id {
        Some(id) => format!("#   transit attachment: {id}"),
        None => format!("#   transit attachment: {}", "none".dimmed()),
    });
    lines
}

/// Print the per-role summary to stdout.
pub fn print_summary(state: &TopologyState) {
    for line in summary_lines(state) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AddressBlock;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "    \"test\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "\"long_value\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 6), "  \"42\"");
    }

    #[test]
    fn test_summary_lines() {
        let state = TopologyState::new("net", AddressBlock::new("10.0.0.0/16").unwrap()).unwrap();
        let lines = summary_lines(&state);
        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("1 resources in 1 waves"), "{}", lines[0]);
        assert!(lines[1].contains("subnets=0"));
        assert!(lines[5].contains("transit attachment"));
    }
}
