//! Collaborator seams of the round engine. The table asks a `BetProvider` for every opening bet and a
//! `DecisionProvider` for every decision; both may be backed by a strategy, a script or a person.

use crate::card::Card;
use crate::participant::Player;
use crate::strategy::{Decision, HandView};
use std::collections::VecDeque;

/// Supplies the opening bet of a player. Out of range answers are rejected and asked for again.
pub trait BetProvider {
    fn get_bet(&mut self, player: &Player, min_bet: f64) -> f64;
}

/// Supplies decisions for a hand. Answers outside `legal` are rejected and asked for again.
pub trait DecisionProvider {
    fn get_decision(
        &mut self,
        view: &HandView<'_>,
        dealer_up_card: Card,
        legal: &[Decision],
    ) -> Decision;
}

/// Bets each player's `base_bet`, clamped to the table minimum and the player's chips.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatBet;

impl BetProvider for FlatBet {
    fn get_bet(&mut self, player: &Player, min_bet: f64) -> f64 {
        player.base_bet.max(min_bet).min(player.chips)
    }
}

/// Asks the deciding player's own `Strategy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyDecisions;

impl DecisionProvider for StrategyDecisions {
    fn get_decision(
        &mut self,
        view: &HandView<'_>,
        _dealer_up_card: Card,
        legal: &[Decision],
    ) -> Decision {
        view.strategy.decide(view, legal)
    }
}

/// Replays a fixed list of bets, then bets the table minimum.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBets {
    bets: VecDeque<f64>,
}

impl ScriptedBets {
    pub fn new<I: IntoIterator<Item = f64>>(bets: I) -> Self {
        ScriptedBets {
            bets: bets.into_iter().collect(),
        }
    }
}

impl BetProvider for ScriptedBets {
    fn get_bet(&mut self, _player: &Player, min_bet: f64) -> f64 {
        self.bets.pop_front().unwrap_or(min_bet)
    }
}

/// Replays a fixed list of decisions, then stays.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    decisions: VecDeque<Decision>,
    /// Every legal set the table offered, in order
    pub offered: Vec<Vec<Decision>>,
}

impl ScriptedDecisions {
    pub fn new<I: IntoIterator<Item = Decision>>(decisions: I) -> Self {
        ScriptedDecisions {
            decisions: decisions.into_iter().collect(),
            offered: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.decisions.len()
    }
}

impl DecisionProvider for ScriptedDecisions {
    fn get_decision(
        &mut self,
        _view: &HandView<'_>,
        _dealer_up_card: Card,
        legal: &[Decision],
    ) -> Decision {
        self.offered.push(legal.to_vec());
        self.decisions.pop_front().unwrap_or(Decision::Stay)
    }
}
