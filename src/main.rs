//! Bridgewire - Linux bridge control
//!
//! Command-line front end over the bridge manager.

mod cli;

use bridgewire::error::Result;
use bridgewire::network::BridgeManager;
use bridgewire::{config, logging, topology};
use bridgewire::topology::Action;
use cli::{Cli, Commands, LinkState};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    // Commands that don't require config
    if let Commands::Completion { shell } = cli.command {
        Cli::generate_completion(shell);
        return Ok(());
    }

    let config = config::load_or_default(&cli.config)?;
    logging::init(&config.logging, cli.verbose);

    let manager = BridgeManager::new().name_policy(config.names.policy);

    match cli.command {
        Commands::Addbr { bridge } => {
            manager.create_bridge(&bridge)?;
            println!("Created bridge '{}'", bridge);
        }
        Commands::Delbr { bridge, force } => {
            manager.destroy_bridge(&bridge, force)?;
            println!("Deleted bridge '{}'", bridge);
        }
        Commands::Addif { bridge, iface } => {
            manager.add_interface(&bridge, &iface)?;
            println!("Added '{}' to bridge '{}'", iface, bridge);
        }
        Commands::Delif { bridge, iface } => {
            manager.remove_interface(&bridge, &iface)?;
            println!("Removed '{}' from bridge '{}'", iface, bridge);
        }
        Commands::Show { bridge, json } => {
            let infos = match bridge {
                Some(name) => vec![manager.show(&name)?],
                None => manager.show_all()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else if infos.is_empty() {
                println!("No bridge interfaces found.");
            } else {
                println!("{:<16} INTERFACES", "BRIDGE");
                for info in infos {
                    if info.interfaces.is_empty() {
                        println!("{:<16} (no members)", info.name);
                    } else {
                        println!("{:<16} {}", info.name, info.interfaces.join(", "));
                    }
                }
            }
        }
        Commands::Link { iface, state } => {
            let up = state == LinkState::Up;
            manager.set_link_up(&iface, up)?;
            println!("Set '{}' {}", iface, if up { "up" } else { "down" });
        }
        Commands::Up { dry_run } => {
            let plan = topology::plan_up(&manager, &config.bridges)?;
            apply(&manager, &plan, dry_run)?;
        }
        Commands::Down { dry_run } => {
            let plan = topology::plan_down(&manager, &config.bridges)?;
            apply(&manager, &plan, dry_run)?;
        }
        Commands::Check => {
            let config = config::load(&cli.config)?;
            println!("Configuration is valid.");
            println!("  Name policy: {:?}", config.names.policy);
            println!("  Declared bridges: {}", config.bridges.len());
            for bridge in &config.bridges {
                println!("    {} ({} member(s))", bridge.name, bridge.members.len());
            }
        }
        Commands::Completion { shell } => Cli::generate_completion(shell),
    }

    Ok(())
}

/// Print or execute a topology plan
fn apply(manager: &BridgeManager, plan: &[Action], dry_run: bool) -> Result<()> {
    if plan.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    if dry_run {
        println!("Would apply:");
        for action in plan {
            println!("  {}", action);
        }
        return Ok(());
    }

    topology::execute(manager, plan)?;
    for action in plan {
        println!("Applied: {}", action);
    }
    Ok(())
}
