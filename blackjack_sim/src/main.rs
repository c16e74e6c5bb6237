use blackjack_sim::prelude::*;
use blackjack_sim::write::{write_report, write_report_json};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "blackjack_sim",
    about = "Simulate many rounds of blackjack and report per player win, push and loss rates"
)]
struct Cli {
    /// JSON simulation config, the flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of packs in the shoe
    #[arg(long)]
    decks: Option<usize>,

    /// Minimum bet at the table
    #[arg(long)]
    min_bet: Option<f64>,

    /// Dealer hits soft 17
    #[arg(long)]
    h17: bool,

    /// Number of rounds to play
    #[arg(long)]
    trials: Option<u64>,

    /// Rounds per session, chips are reset after each session
    #[arg(long)]
    session: Option<u64>,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// A seat at the table as NAME:STRATEGY[:BET], strategies: never-hit, threshold-N, basic
    #[arg(long = "player")]
    players: Vec<PlayerConfig>,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(
        self,
    ) -> Result<(BlackjackSimulatorConfig, Option<PathBuf>, bool), SimulationError> {
        let mut config = match self.config.as_ref() {
            Some(path) => BlackjackSimulatorConfig::from_json_file(path)?,
            None => BlackjackSimulatorConfig::default(),
        };

        if let Some(decks) = self.decks {
            config.rules.num_decks = decks;
        }
        if let Some(min_bet) = self.min_bet {
            config.rules.min_bet = min_bet;
        }
        if self.h17 {
            config.rules.hit_on_soft_17 = true;
        }
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(session) = self.session {
            config.rounds_per_session = session;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if !self.players.is_empty() {
            config.players = self.players;
        }
        Ok((config, self.output, self.json))
    }
}

fn run(cli: Cli) -> Result<(), SimulationError> {
    let (config, output, json) = cli.into_config()?;
    let report = run_simulation(&config)?;

    let writer: Box<dyn std::io::Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };
    if json {
        write_report_json(&report, writer)
    } else {
        write_report(&report, writer)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
