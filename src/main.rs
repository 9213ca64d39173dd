use clap::Parser;
use flightsim::{config::read_config, manager::Simulator, moving::aircraft::airline_name};
use log::{error, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::{signal, time::sleep};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
struct Args {
  #[arg(short)]
  config: Option<String>,

  /// Print the full flight snapshot as JSON on every report
  #[arg(long)]
  dump: bool,
}

async fn report(sim: &Simulator, dump: bool) {
  let summary = sim.summary().await;
  info!(
    "tick {}: {} flights ({} takeoff, {} enroute, {} landing)",
    summary.ticks, summary.flights, summary.takeoff, summary.enroute, summary.landing
  );

  for airport in sim.list_airports().await {
    let board = sim.traffic_board(&airport.id).await;
    if let Some(next) = board.first() {
      info!(
        "{}: {} movements, next {} ({}) {} eta {}",
        airport.id,
        board.len(),
        next.callsign,
        airline_name(&next.callsign).unwrap_or("unknown airline"),
        next.status,
        next.eta.format("%H:%M:%S")
      );
    }
  }

  if dump {
    match serde_json::to_string(&sim.list_flights().await) {
      Ok(data) => println!("{data}"),
      Err(err) => error!("error serializing flights: {err}"),
    }
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let args = Args::parse();
  let config = read_config(args.config.as_deref());

  TermLogger::init(
    config.log.level,
    Config::default(),
    TerminalMode::Stdout,
    ColorChoice::Auto,
  )?;

  info!("starting flightsim version {}", VERSION);
  config.validate()?;
  let sim = Simulator::new(&config)?;
  sim.start();

  loop {
    tokio::select! {
      res = signal::ctrl_c() => {
        if let Err(err) = res {
          error!("error waiting for ctrl-c: {err}");
        }
        break;
      }
      _ = sleep(config.report.period) => report(&sim, args.dump).await,
    }
  }

  sim.stop();
  info!("bye");
  Ok(())
}
