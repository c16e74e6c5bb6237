use blackjack_lib::{GameResult, PlayerResult};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const WIDTH: usize = 80;
const TEXT_WIDTH: usize = "average winnings per hand".len() + 20;
const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;

/// Running totals for one player over any number of rounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub name: String,
    pub won: u64,
    pub pushed: u64,
    pub lost: u64,
    pub busted: u64,
    pub blackjacks: u64,
    pub hands: u64,
    /// Rounds skipped because the player could not cover the minimum bet
    pub sat_out: u64,
    pub net: f64,
}

impl PlayerStats {
    pub fn new<S: Into<String>>(name: S) -> Self {
        PlayerStats {
            name: name.into(),
            ..PlayerStats::default()
        }
    }

    /// Adds a single round's result.
    pub fn record(&mut self, result: &PlayerResult) {
        if result.sat_out {
            self.sat_out += 1;
            return;
        }
        self.won += result.hands_won as u64;
        self.pushed += result.hands_pushed as u64;
        self.lost += result.hands_lost as u64;
        self.busted += result.hands_busted as u64;
        self.blackjacks += result.blackjacks as u64;
        self.hands += result.hands_played as u64;
        self.net += result.net;
    }

    pub fn merge(&mut self, other: &PlayerStats) {
        self.won += other.won;
        self.pushed += other.pushed;
        self.lost += other.lost;
        self.busted += other.busted;
        self.blackjacks += other.blackjacks;
        self.hands += other.hands;
        self.sat_out += other.sat_out;
        self.net += other.net;
    }

    fn rate(&self, count: u64) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            count as f64 / self.hands as f64
        }
    }

    pub fn win_rate(&self) -> f64 {
        self.rate(self.won)
    }

    pub fn push_rate(&self) -> f64 {
        self.rate(self.pushed)
    }

    pub fn loss_rate(&self) -> f64 {
        self.rate(self.lost)
    }

    pub fn avg_net_per_hand(&self) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            self.net / self.hands as f64
        }
    }
}

impl Display for PlayerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = format!(
            "{}{}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}\n",
            "player: ",
            self.name,
            "hands won",
            self.won,
            "hands pushed",
            self.pushed,
            "hands lost",
            self.lost,
            "hands busted",
            self.busted,
            "number of player blackjacks",
            self.blackjacks,
            "total hands played",
            self.hands,
            "rounds sat out",
            self.sat_out,
            "winnings",
            self.net,
            "win percentage",
            self.win_rate(),
            "push percentage",
            self.push_rate(),
            "loss percentage",
            self.loss_rate(),
            "average winnings per hand",
            self.avg_net_per_hand(),
        );
        write!(f, "{}", body)
    }
}

/// Simple struct for recording the data points of a batch of rounds, one entry per seat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub rounds: u64,
    pub players: Vec<PlayerStats>,
}

impl SimulationSummary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SimulationSummary {
            rounds: 0,
            players: names.into_iter().map(PlayerStats::new).collect(),
        }
    }

    /// Adds a settled round. Player results are matched to seats by position.
    pub fn record(&mut self, result: &GameResult) {
        self.rounds += 1;
        for (stats, player) in self.players.iter_mut().zip(result.players.iter()) {
            stats.record(player);
        }
    }

    pub fn merge(&mut self, other: &SimulationSummary) {
        self.rounds += other.rounds;
        for (stats, theirs) in self.players.iter_mut().zip(other.players.iter()) {
            stats.merge(theirs);
        }
    }
}

/// Per player totals together with the derived rates, as exposed in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    #[serde(flatten)]
    pub stats: PlayerStats,
    pub win_rate: f64,
    pub push_rate: f64,
    pub loss_rate: f64,
    pub avg_net_per_hand: f64,
}

impl From<PlayerStats> for PlayerReport {
    fn from(stats: PlayerStats) -> Self {
        PlayerReport {
            win_rate: stats.win_rate(),
            push_rate: stats.push_rate(),
            loss_rate: stats.loss_rate(),
            avg_net_per_hand: stats.avg_net_per_hand(),
            stats,
        }
    }
}

/// Outcome of a finished simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Number of rounds played
    pub trials: u64,
    pub workers: usize,
    /// Seed the run can be repeated with
    pub seed: u64,
    /// Wall clock time of the run, in seconds
    pub elapsed: f64,
    pub players: Vec<PlayerReport>,
}

impl SimulationReport {
    pub fn new(summary: SimulationSummary, workers: usize, seed: u64, elapsed: f64) -> Self {
        SimulationReport {
            trials: summary.rounds,
            workers,
            seed,
            elapsed,
            players: summary.players.into_iter().map(PlayerReport::from).collect(),
        }
    }

    pub fn player(&self, name: &str) -> Option<&PlayerReport> {
        self.players.iter().find(|p| p.stats.name == name)
    }
}

impl Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Simulation ran {} times in {:.3} seconds",
            self.trials, self.elapsed
        )?;
        for player in self.players.iter() {
            writeln!(f, "{}", "-".repeat(WIDTH))?;
            write!(f, "{}", player.stats)?;
        }
        writeln!(f, "{}", "-".repeat(WIDTH))
    }
}
