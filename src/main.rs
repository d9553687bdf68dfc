//! Trajectory OSC Studio.
//!
//! `relay`: WebSocket-Relay für kollaborative Sessions inkl. UDP-Ausgabe.
//! `play`: Szene headless abspielen und Positionen per OSC senden.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use trajectory_osc_studio::net::{self, PlayConfig, Player};
use trajectory_osc_studio::osc::{EndpointFactory, EndpointPool, LogEndpointFactory, UdpEndpointFactory};
use trajectory_osc_studio::StudioOptions;

#[derive(Parser, Debug)]
#[command(name = "trajectory-osc-studio", version)]
struct Cli {
    /// Optionen-Datei (Standard: neben der Binary)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Relay-Server starten.
    Relay(RelayArgs),
    /// Szene ohne Relay abspielen.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct RelayArgs {
    /// Port des WebSocket-Servers.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Szenen-Snapshot (JSON).
    #[arg(long)]
    scene: PathBuf,

    /// UDP-Endpunkte und Routen (TOML).
    #[arg(long)]
    routes: Option<PathBuf>,

    /// Nichts senden, Pakete nur protokollieren.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    log::info!("Trajectory OSC Studio v{} startet...", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.unwrap_or_else(StudioOptions::config_path);
    let options = StudioOptions::load_from_file(&config_path);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Tokio-Runtime konnte nicht erstellt werden")?;

    match cli.cmd {
        Command::Relay(args) => {
            let port = args.port.unwrap_or(options.relay_port);
            runtime.block_on(net::serve(port, &options))
        }
        Command::Play(args) => runtime.block_on(cmd_play(args, &options)),
    }
}

async fn cmd_play(args: PlayArgs, options: &StudioOptions) -> anyhow::Result<()> {
    let scene = net::load_scene(&args.scene, options)?;
    let config = match &args.routes {
        Some(path) => PlayConfig::load_from_file(path)?,
        None => PlayConfig::from_options(options),
    };

    if args.dry_run {
        log::info!("Trockenlauf: es werden keine UDP-Pakete gesendet");
        play_with(LogEndpointFactory, scene, config, options).await
    } else {
        play_with(UdpEndpointFactory, scene, config, options).await
    }
}

async fn play_with<F: EndpointFactory>(
    factory: F,
    scene: trajectory_osc_studio::Scene,
    config: PlayConfig,
    options: &StudioOptions,
) -> anyhow::Result<()> {
    let pool = EndpointPool::new(factory);
    let mut player = Player::new(scene, config, pool, options, Instant::now());
    if player.pool().is_empty() {
        anyhow::bail!("Kein UDP-Port geöffnet, Wiedergabe abgebrochen");
    }
    player.run(options).await
}
