use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use mgmt_controller::{logging, ControllerConfig, ModelController};
use mgmt_model::OperationRequest;
use mgmt_service::InMemoryServiceContainer;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let cli = Command::new("mgmt-controller")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Apply management operations to an in-memory model")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Controller configuration (TOML)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("apply")
                .about("Execute a JSON list of operations in order")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file holding an array of operations"),
                )
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue)
                        .help("Continue after a failed operation"),
                ),
        )
        .subcommand(Command::new("describe").about("Print the registered resources and operations"));

    let matches = cli.get_matches();
    let config = ControllerConfig::load(
        matches
            .get_one::<PathBuf>("config")
            .map(PathBuf::as_path),
    )?;
    logging::init(&config);

    let container = Arc::new(InMemoryServiceContainer::new());
    let controller = ModelController::new(&config, container.clone())?;

    match matches.subcommand() {
        Some(("apply", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing operations file")?;
            let keep_going = args.get_flag("keep-going");
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let operations: Vec<OperationRequest> = serde_json::from_str(&raw)
                .with_context(|| format!("cannot parse {}", file.display()))?;

            let mut failures = 0usize;
            for operation in operations {
                let report = match controller.execute(operation.clone()) {
                    Ok(outcome) => outcome.to_json(),
                    Err(failed) => {
                        failures += 1;
                        failed.to_json()
                    }
                };
                println!(
                    "{}",
                    serde_json::json!({ "operation": operation, "response": report })
                );
                if failures > 0 && !keep_going {
                    break;
                }
            }

            let summary = serde_json::json!({
                "model": controller.dump_model(),
                "capabilities": controller.capabilities().describe(),
                "services": container.describe(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if failures > 0 {
                anyhow::bail!("{failures} operation(s) failed");
            }
        }
        Some(("describe", _)) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&controller.operations().describe())?
            );
        }
        _ => {}
    }
    Ok(())
}
