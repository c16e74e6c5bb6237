pub mod render;
pub mod stats;
pub mod write;

use blackjack_lib::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;

pub use stats::{PlayerReport, PlayerStats, SimulationReport, SimulationSummary};

pub mod prelude {
    pub use super::{
        render::TextRenderer, run_simulation, simulate, BlackjackSimulator,
        BlackjackSimulatorConfig, BlackjackSimulatorConfigBuilder, PlayerConfig, SimulationError,
        SimulationReport, SimulationSummary,
    };
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("game error: {0}")]
    GameError(#[from] BlackjackGameError),
    #[error("unable to send simulation data: {0}")]
    SendingError(String),
    #[error("unable to write simulation output: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("invalid simulation configuration: {0}")]
    ConfigError(String),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("simulation worker #{0} panicked")]
    WorkerPanicked(usize),
}

fn default_player_bet() -> f64 {
    10.0
}

/// A seat at the simulated table: who sits there, how they play and what they bet each round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub strategy: Strategy,
    #[serde(default = "default_player_bet")]
    pub bet: f64,
}

impl PlayerConfig {
    pub fn new<S: Into<String>>(name: S, strategy: Strategy, bet: f64) -> Self {
        PlayerConfig {
            name: name.into(),
            strategy,
            bet,
        }
    }
}

impl FromStr for PlayerConfig {
    type Err = SimulationError;

    /// Parses `NAME:STRATEGY[:BET]`, e.g. `alice:basic:25` or `bob:threshold-16`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (name, strategy) = match (parts.next(), parts.next()) {
            (Some(name), Some(strategy)) if !name.trim().is_empty() => (name.trim(), strategy),
            _ => {
                return Err(SimulationError::ConfigError(format!(
                    "expected NAME:STRATEGY[:BET], got {:?}",
                    s
                )))
            }
        };
        let strategy = strategy.parse::<Strategy>()?;
        let bet = match parts.next() {
            Some(bet) => bet.trim().parse::<f64>().map_err(|e| {
                SimulationError::ConfigError(format!("invalid bet {:?}: {}", bet, e))
            })?,
            None => default_player_bet(),
        };
        if parts.next().is_some() {
            return Err(SimulationError::ConfigError(format!(
                "expected NAME:STRATEGY[:BET], got {:?}",
                s
            )));
        }
        Ok(PlayerConfig::new(name, strategy, bet))
    }
}

/// Struct for configuring a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackjackSimulatorConfig {
    pub rules: Rules,
    pub starting_chips: f64,
    /// Total number of rounds to play
    pub trials: u64,
    /// Rounds played before every player's chips are reset to `starting_chips`
    pub rounds_per_session: u64,
    pub workers: usize,
    /// Seed for reproducible runs, worker `i` deals from a shoe seeded with `seed + i`.
    /// `run_simulation` picks a random one when it is not set.
    pub seed: Option<u64>,
    pub players: Vec<PlayerConfig>,
}

impl BlackjackSimulatorConfig {
    /// Associated method for returning a new `BlackjackSimulatorConfigBuilder` object, every option that is not set
    /// falls back to the standard configuration.
    pub fn new() -> BlackjackSimulatorConfigBuilder {
        BlackjackSimulatorConfigBuilder::default()
    }

    /// Loads a configuration from a JSON file. Missing fields take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: BlackjackSimulatorConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        self.rules.validate()?;
        if self.players.is_empty() {
            return Err(SimulationError::ConfigError(
                "at least one player is required".to_string(),
            ));
        }
        if self.rounds_per_session == 0 {
            return Err(SimulationError::ConfigError(
                "rounds_per_session must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(SimulationError::ConfigError(
                "workers must be at least 1".to_string(),
            ));
        }
        if !(self.starting_chips.is_finite() && self.starting_chips >= 0.0) {
            return Err(SimulationError::ConfigError(format!(
                "invalid starting chips {}",
                self.starting_chips
            )));
        }
        let mut names = HashSet::new();
        for player in self.players.iter() {
            if !names.insert(player.name.as_str()) {
                return Err(SimulationError::ConfigError(format!(
                    "player name {:?} is used more than once",
                    player.name
                )));
            }
        }
        Ok(())
    }

    /// Lengths of the sessions the run is split into, the last one may be shorter.
    pub fn sessions(&self) -> Vec<u64> {
        let per_session = self.rounds_per_session.max(1);
        let mut sessions = vec![per_session; (self.trials / per_session) as usize];
        if self.trials % per_session > 0 {
            sessions.push(self.trials % per_session);
        }
        sessions
    }
}

impl Default for BlackjackSimulatorConfig {
    /// Returns the standard configurations for a simulation.
    fn default() -> Self {
        BlackjackSimulatorConfig::new().build()
    }
}

/// Struct to implement builder pattern for `BlackjackSimulatorConfig`
#[derive(Debug, Clone, Default)]
pub struct BlackjackSimulatorConfigBuilder {
    rules: Option<Rules>,
    starting_chips: Option<f64>,
    trials: Option<u64>,
    rounds_per_session: Option<u64>,
    workers: Option<usize>,
    seed: Option<u64>,
    players: Vec<PlayerConfig>,
}

impl BlackjackSimulatorConfigBuilder {
    /// Method for setting the table rules.
    pub fn rules(&mut self, rules: Rules) -> &mut Self {
        self.rules = Some(rules);
        self
    }

    /// Method for changing the chips each player starts every session with.
    pub fn starting_chips(&mut self, chips: f64) -> &mut Self {
        self.starting_chips = Some(chips);
        self
    }

    /// Method for setting the total number of rounds played.
    pub fn trials(&mut self, trials: u64) -> &mut Self {
        self.trials = Some(trials);
        self
    }

    pub fn rounds_per_session(&mut self, rounds: u64) -> &mut Self {
        self.rounds_per_session = Some(rounds);
        self
    }

    /// Method for setting the number of threads the sessions are spread across.
    pub fn workers(&mut self, workers: usize) -> &mut Self {
        self.workers = Some(workers);
        self
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Method for seating a player, players are seated in the order they are added.
    pub fn player<S: Into<String>>(&mut self, name: S, strategy: Strategy, bet: f64) -> &mut Self {
        self.players.push(PlayerConfig::new(name, strategy, bet));
        self
    }

    /// Method for building a `BlackjackSimulatorConfig` object. Without any players the table seats the two
    /// threshold players, one hitting below 16 and one hitting below 17.
    pub fn build(&mut self) -> BlackjackSimulatorConfig {
        let players = if self.players.is_empty() {
            vec![
                PlayerConfig::new("simple", Strategy::SIMPLE, default_player_bet()),
                PlayerConfig::new("simple17", Strategy::DEALER, default_player_bet()),
            ]
        } else {
            std::mem::take(&mut self.players)
        };
        BlackjackSimulatorConfig {
            rules: self.rules.unwrap_or_default(),
            starting_chips: self.starting_chips.unwrap_or(500.0),
            trials: self.trials.unwrap_or(10_000),
            rounds_per_session: self.rounds_per_session.unwrap_or(50),
            workers: self.workers.unwrap_or(1),
            seed: self.seed,
            players,
        }
    }
}

/// Struct for running sessions of blackjack rounds at one table and recording the results.
/// Each worker thread owns one `BlackjackSimulator`, so no table state is ever shared between threads.
pub struct BlackjackSimulator {
    table: Table,
    starting_chips: f64,
}

impl BlackjackSimulator {
    /// Creates the simulator for worker `worker`. With a seed in `config` the worker's shoe is seeded
    /// with `seed + worker`, without one it is seeded from system entropy.
    pub fn new(config: &BlackjackSimulatorConfig, worker: usize) -> Result<Self, SimulationError> {
        let rules = config.rules;
        let shoe = match config.seed {
            Some(seed) => Shoe::with_seed(
                rules.num_decks,
                rules.shuffled,
                seed.wrapping_add(worker as u64),
            ),
            None => Shoe::new(rules.num_decks, rules.shuffled),
        };
        let players = config
            .players
            .iter()
            .map(|p| {
                Player::new(p.name.clone(), config.starting_chips, p.strategy).with_base_bet(p.bet)
            })
            .collect();
        Ok(BlackjackSimulator {
            table: Table::with_shoe(rules, players, shoe)?,
            starting_chips: config.starting_chips,
        })
    }

    /// Plays `rounds` rounds with every player betting its configured bet and following its own strategy,
    /// then resets the chips for the next session.
    pub fn run_session(&mut self, rounds: u64) -> Result<SimulationSummary, SimulationError> {
        let names = self.table.players().iter().map(|p| p.name.clone());
        let mut summary = SimulationSummary::new(names);
        for _ in 0..rounds {
            let result = self
                .table
                .play_round(&mut FlatBet, &mut StrategyDecisions, &mut NullRenderer)?;
            summary.record(&result);
        }
        self.reset();
        Ok(summary)
    }

    /// Method for resetting every player's chips, so the next session starts from the same balance.
    pub fn reset(&mut self) {
        let chips = self.starting_chips;
        for player in self.table.players_mut() {
            player.chips = chips;
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

fn spawn_worker(
    config: &BlackjackSimulatorConfig,
    id: usize,
    sessions: Vec<u64>,
    sender: Sender<(Option<SimulationSummary>, usize)>,
) -> Result<JoinHandle<Result<(), SimulationError>>, SimulationError> {
    // worker ids start at 1, seeds are offset by the zero based index
    let mut simulator = BlackjackSimulator::new(config, id - 1)?;
    Ok(thread::spawn(move || {
        for rounds in sessions {
            let summary = simulator.run_session(rounds)?;
            sender
                .send((Some(summary), id))
                .map_err(|e| SimulationError::SendingError(e.to_string()))?;
        }
        // Tell the collecting thread this worker is finished
        sender
            .send((None, id))
            .map_err(|e| SimulationError::SendingError(e.to_string()))?;
        Ok(())
    }))
}

/// Runs the simulation described by `config`.
///
/// The run is cut into sessions of `rounds_per_session` rounds which are dealt out to the workers round robin.
/// Every worker plays its sessions at its own table and sends a summary per session over a channel to a
/// collecting thread, which merges them in worker order once every worker is done.
pub fn run_simulation(
    config: &BlackjackSimulatorConfig,
) -> Result<SimulationReport, SimulationError> {
    config.validate()?;
    let start = Instant::now();
    let workers = config.workers;
    // an unseeded run still gets a seed, so it can be repeated from the report
    let seed = config.seed.unwrap_or_else(rand::random);
    let config = BlackjackSimulatorConfig {
        seed: Some(seed),
        ..config.clone()
    };
    log::info!(
        "running {} rounds for {} players on {} worker(s), seed {}",
        config.trials,
        config.players.len(),
        workers,
        seed
    );

    let mut assignments: Vec<Vec<u64>> = vec![Vec::new(); workers];
    for (i, rounds) in config.sessions().into_iter().enumerate() {
        assignments[i % workers].push(rounds);
    }

    let (sender, receiver) = mpsc::channel::<(Option<SimulationSummary>, usize)>();
    let ids: HashSet<usize> = (1..=workers).collect();
    let total = SimulationSummary::new(config.players.iter().map(|p| p.name.clone()));
    let collect_handle = thread::spawn(move || write::collect_summaries(receiver, ids, total));

    let mut handles = Vec::with_capacity(workers);
    for (i, sessions) in assignments.into_iter().enumerate() {
        handles.push(spawn_worker(&config, i + 1, sessions, sender.clone())?);
    }
    // only the workers hold senders now, so the collector notices if they all stop early
    drop(sender);

    for (i, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("simulation worker #{} failed: {}", i + 1, e);
                return Err(e);
            }
            Err(_) => return Err(SimulationError::WorkerPanicked(i + 1)),
        }
    }

    let summary = match collect_handle.join() {
        Ok(result) => result?,
        Err(_) => return Err(SimulationError::WorkerPanicked(0)),
    };

    let elapsed = start.elapsed().as_secs_f64();
    log::info!("simulation ran {} times in {:.3} seconds", summary.rounds, elapsed);
    Ok(SimulationReport::new(summary, workers, seed, elapsed))
}

/// Simulation entry point: plays `trials` rounds with `players` seated at a table using `rules`, where the
/// shoe size, minimum bet and the dealer's soft 17 rule are taken from the explicit arguments.
pub fn simulate(
    players: &[PlayerConfig],
    rules: Rules,
    num_decks: usize,
    min_bet: f64,
    hit_on_soft_17: bool,
    trials: u64,
) -> Result<SimulationReport, SimulationError> {
    let rules = Rules {
        num_decks,
        min_bet,
        hit_on_soft_17,
        ..rules
    };
    let mut builder = BlackjackSimulatorConfig::new();
    builder.rules(rules).trials(trials);
    for player in players {
        builder.player(player.name.clone(), player.strategy, player.bet);
    }
    run_simulation(&builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_config() {
        let p: PlayerConfig = "alice:basic:25".parse().unwrap();
        assert_eq!(p, PlayerConfig::new("alice", Strategy::Basic, 25.0));

        let p: PlayerConfig = "bob:threshold-15".parse().unwrap();
        assert_eq!(p.strategy, Strategy::Threshold(15));
        assert_eq!(p.bet, 10.0);

        assert!("bob".parse::<PlayerConfig>().is_err());
        assert!("bob:cheating".parse::<PlayerConfig>().is_err());
        assert!("bob:basic:lots".parse::<PlayerConfig>().is_err());
        assert!(":basic".parse::<PlayerConfig>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = BlackjackSimulatorConfig::default();
        assert_eq!(config.rules, Rules::default());
        assert_eq!(config.starting_chips, 500.0);
        assert_eq!(config.trials, 10_000);
        assert_eq!(config.rounds_per_session, 50);
        assert_eq!(config.workers, 1);
        assert_eq!(config.seed, None);
        assert_eq!(config.players.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sessions_cover_every_trial() {
        let config = BlackjackSimulatorConfig::new()
            .trials(120)
            .rounds_per_session(50)
            .build();
        assert_eq!(config.sessions(), vec![50, 50, 20]);
        let config = BlackjackSimulatorConfig::new().trials(0).build();
        assert!(config.sessions().is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = BlackjackSimulatorConfig::new()
            .player("a", Strategy::Basic, 10.0)
            .player("a", Strategy::SIMPLE, 10.0)
            .build();
        assert!(matches!(config.validate(), Err(SimulationError::ConfigError(_))));

        config.players.pop();
        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.rules.num_decks = 0;
        assert!(matches!(config.validate(), Err(SimulationError::GameError(_))));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "rules": { "num_decks": 2, "hit_on_soft_17": true },
            "trials": 200,
            "seed": 9,
            "players": [
                { "name": "alice", "strategy": "basic", "bet": 20 },
                { "name": "bob", "strategy": "threshold-16" }
            ]
        }"#;
        let config: BlackjackSimulatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.rules.num_decks, 2);
        assert!(config.rules.hit_on_soft_17);
        assert_eq!(config.rules.min_bet, 5.0);
        assert_eq!(config.trials, 200);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.starting_chips, 500.0);
        assert_eq!(config.players[0].bet, 20.0);
        assert_eq!(config.players[1].strategy, Strategy::SIMPLE);
        assert_eq!(config.players[1].bet, 10.0);
    }

    #[test]
    fn test_session_resets_chips() {
        let config = BlackjackSimulatorConfig::new()
            .player("alice", Strategy::Basic, 10.0)
            .seed(4)
            .build();
        let mut simulator = BlackjackSimulator::new(&config, 0).unwrap();
        let summary = simulator.run_session(25).unwrap();
        assert_eq!(summary.rounds, 25);
        assert_eq!(simulator.table().players()[0].chips, 500.0);
        assert_eq!(simulator.table().round(), 25);
    }

    #[test]
    fn test_simulate_counts_every_round() {
        let players = [
            PlayerConfig::new("simple", Strategy::SIMPLE, 10.0),
            PlayerConfig::new("never", Strategy::NeverHit, 10.0),
        ];
        let report = simulate(&players, Rules::default(), 4, 5.0, false, 300).unwrap();
        assert_eq!(report.trials, 300);
        for player in report.players.iter() {
            let stats = &player.stats;
            assert!(stats.hands + stats.sat_out >= 300);
            assert_eq!(stats.won + stats.pushed + stats.lost, stats.hands);
        }
    }
}
