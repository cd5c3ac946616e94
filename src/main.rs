use clap::{Parser, Subcommand};
use l2lab::config::{self, ports, Config};
use l2lab::dataplane::{Dispatcher, Mode, PortRegistry};
use l2lab::telemetry::init_logging;
use l2lab::{transport, Error, Result};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "l2lab")]
#[command(about = "Link-layer lab elements: learning switch, VLAN switch, ARP endpoint")]
struct Cli {
    /// Path to an optional runtime config (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learning switch; ports are given as NAME
    Switch {
        #[arg(required = true, value_name = "NAME")]
        ports: Vec<String>,
    },
    /// 802.1Q switch; ports are NAME, NAME[U:v], NAME[T:v1,v2] or NAME[T:v1,v2;U:v]
    Vswitch {
        #[arg(required = true, value_name = "SPEC")]
        ports: Vec<String>,
    },
    /// ARP endpoint; ports are NAME[IPV4:A.B.C.D/BITS] with optional =MTU
    Arp {
        #[arg(required = true, value_name = "SPEC")]
        ports: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cmd_run(cli) {
        error!("{}", e);
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };

    let result = config::validate(&config);
    init_logging(Some(&config.logging));
    result.log_diagnostics();

    if result.has_errors() {
        return Err(Error::Config(result.errors.join("; ")));
    }
    Ok(config)
}

fn cmd_run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    let (mode, args) = match cli.command {
        Commands::Switch { ports } => (Mode::Switch, ports),
        Commands::Vswitch { ports } => (Mode::VSwitch, ports),
        Commands::Arp { ports } => (Mode::Arp, ports),
    };

    let specs = ports::parse_all(mode.spec_kind(), &args)?;
    let registry = PortRegistry::from_specs(specs)?;
    for port in registry.iter() {
        match port.ipv4 {
            Some(net) => info!(
                "Port {} ({}): {}, MTU {}",
                port.id,
                port.name,
                net,
                port.mtu.unwrap_or_default()
            ),
            None => info!("Port {} ({}): {}", port.id, port.name, port.vlans),
        }
    }

    let mut dispatcher = Dispatcher::new(mode, registry, &config.tables);

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(Error::Io)?;

    rt.block_on(async {
        let mut stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        transport::run(&mut dispatcher, &mut stdin, &mut stdout).await
    })
}
