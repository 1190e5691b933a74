//! Output formatting for planned topologies.
//!
//! This module handles formatting and outputting a [`TopologyState`](crate::processing::TopologyState):
//! - [`csv`] - CSV rows per subnet
//! - [`terminal`] - coloured terminal summary
//! - [`plan_file`] - dated JSON plan file

mod csv;
mod plan_file;
mod terminal;

pub use csv::{registry_print, registry_rows};
pub use plan_file::{plan_file_name, write_plan};
pub use terminal::{format_field, print_summary, summary_lines};
