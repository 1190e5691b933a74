use std::error::Error;
use std::path::Path;
use vpc_topology_planner::config::{load_plan_config, output_dir, plan_file_path};
use vpc_topology_planner::output::{print_summary, registry_print, write_plan};
use vpc_topology_planner::plan_topology;
use vpc_topology_planner::provision::{execute, AwsCliSecretResolver, DryRunApi};

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default())?;
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let config = load_plan_config(&plan_file_path())?;
    let state = plan_topology(&config, &AwsCliSecretResolver::default())?;

    registry_print(&state);
    print_summary(&state);

    let report = execute(&state.plan, &mut DryRunApi::default())?;
    log::info!("dry run submitted {} resources", report.created.len());

    let path = write_plan(&state, Path::new(&output_dir()))?;
    println!("# plan written to {}", path.display());

    Ok(())
}
