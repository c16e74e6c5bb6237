use crate::card::Card;
use crate::result::GameResult;
use crate::table::Phase;
use serde::{Deserialize, Serialize};

/// Read-only projection of a hand slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandSnapshot {
    pub cards: Vec<Card>,
    pub value: u8,
    pub bet: f64,
    pub insurance: f64,
    pub busted: bool,
    pub stayed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub chips: f64,
    pub bet: f64,
    pub sitting_out: bool,
    pub hands: Vec<HandSnapshot>,
}

/// What a renderer is allowed to see. The dealer's hole card only appears once the round is being settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub round: u64,
    pub phase: Phase,
    pub dealer_cards: Vec<Card>,
    /// `None` while the hole card is hidden
    pub dealer_value: Option<u8>,
    pub players: Vec<PlayerSnapshot>,
    pub result: Option<GameResult>,
}

/// Presents table snapshots. Renderers never get mutable access to the table.
pub trait Renderer {
    fn render(&mut self, snapshot: &TableSnapshot);
}

/// Renderer that ignores everything, for headless play.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _snapshot: &TableSnapshot) {}
}
