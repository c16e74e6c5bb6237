use crate::card::Card;
use crate::error::BlackjackGameError;
use crate::participant::{Dealer, Player};
use crate::provider::{BetProvider, DecisionProvider};
use crate::render::{HandSnapshot, PlayerSnapshot, Renderer, TableSnapshot};
use crate::result::{settle_hand, settle_insurance, GameResult, HandResult, PlayerResult};
use crate::rules::Rules;
use crate::shoe::Shoe;
use crate::strategy::{Decision, HandView};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Phases of a round, in the order the table moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Betting,
    InitialDeal,
    PlayerDecisions,
    DealerPlay,
    Settlement,
    Idle,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Betting => "betting",
            Phase::InitialDeal => "initial deal",
            Phase::PlayerDecisions => "player decisions",
            Phase::DealerPlay => "dealer play",
            Phase::Settlement => "settlement",
            Phase::Idle => "idle",
        };
        write!(f, "{}", name)
    }
}

/// Checks an opening bet against the table minimum and the player's chips.
pub fn validate_bet(amount: f64, min_bet: f64, chips: f64) -> Result<f64, BlackjackGameError> {
    if amount.is_finite() && amount >= min_bet && amount <= chips {
        Ok(amount)
    } else {
        Err(BlackjackGameError::InvalidBet {
            amount,
            min_bet,
            chips,
        })
    }
}

/// Checks a decision against the legal set offered for the hand.
pub fn validate_decision(
    decision: Decision,
    legal: &[Decision],
) -> Result<Decision, BlackjackGameError> {
    if legal.contains(&decision) {
        Ok(decision)
    } else {
        Err(BlackjackGameError::InvalidDecision {
            decision,
            legal: legal.to_vec(),
        })
    }
}

/// Struct for a blackjack table: the shoe, the dealer, the seated players and the round state machine.
///
/// A round runs `Betting -> InitialDeal -> PlayerDecisions -> DealerPlay -> Settlement -> Idle`.
/// `play_round` drives a whole round, the individual steps are public as well and refuse to run out of order.
#[derive(Debug, Clone)]
pub struct Table {
    shoe: Shoe,
    dealer: Dealer,
    players: Vec<Player>,
    rules: Rules,
    phase: Phase,
    round: u64,
    last_result: Option<GameResult>,
}

impl Table {
    /// Associated method for creating a table with a fresh shoe built from the rules.
    pub fn new(rules: Rules, players: Vec<Player>) -> Result<Table, BlackjackGameError> {
        let shoe = Shoe::new(rules.num_decks, rules.shuffled);
        Table::with_shoe(rules, players, shoe)
    }

    /// Creates a table dealing from `shoe`, e.g. a seeded or stacked one.
    pub fn with_shoe(
        rules: Rules,
        players: Vec<Player>,
        shoe: Shoe,
    ) -> Result<Table, BlackjackGameError> {
        rules.validate()?;
        Ok(Table {
            shoe,
            dealer: Dealer::new(rules.hit_on_soft_17),
            players,
            rules,
            phase: Phase::Idle,
            round: 0,
            last_result: None,
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn last_result(&self) -> Option<&GameResult> {
        self.last_result.as_ref()
    }

    /// Seats another player. Only possible between rounds.
    pub fn add_player(&mut self, player: Player) -> Result<(), BlackjackGameError> {
        self.expect_phase(Phase::Idle)?;
        self.players.push(player);
        Ok(())
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), BlackjackGameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(BlackjackGameError::WrongPhase {
                expected: expected.to_string(),
                actual: self.phase.to_string(),
            })
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        log::debug!("round {}: {} -> {}", self.round, self.phase, phase);
        self.phase = phase;
    }

    /// Plays one complete round and returns its result. If a provider keeps answering with invalid
    /// responses the round is abandoned, every stake is returned and the error is passed on.
    pub fn play_round(
        &mut self,
        bets: &mut dyn BetProvider,
        decisions: &mut dyn DecisionProvider,
        renderer: &mut dyn Renderer,
    ) -> Result<GameResult, BlackjackGameError> {
        self.start_round()?;
        match self.run_phases(bets, decisions, renderer) {
            Ok(result) => Ok(result),
            Err(e) => {
                log::warn!("round {} abandoned: {}", self.round, e);
                self.abandon_round();
                Err(e)
            }
        }
    }

    fn run_phases(
        &mut self,
        bets: &mut dyn BetProvider,
        decisions: &mut dyn DecisionProvider,
        renderer: &mut dyn Renderer,
    ) -> Result<GameResult, BlackjackGameError> {
        self.take_bets(bets)?;
        self.deal()?;
        renderer.render(&self.snapshot());
        self.play_players(decisions, renderer)?;
        self.play_dealer()?;
        let result = self.settle()?;
        renderer.render(&self.snapshot());
        Ok(result)
    }

    /// Clears the previous round and opens betting.
    pub fn start_round(&mut self) -> Result<(), BlackjackGameError> {
        self.expect_phase(Phase::Idle)?;
        if self.players.is_empty() {
            return Err(BlackjackGameError::NoPlayers);
        }
        for player in self.players.iter_mut() {
            player.reset();
        }
        self.dealer.reset();
        self.round += 1;
        self.set_phase(Phase::Betting);
        Ok(())
    }

    /// Returns every committed stake and puts the table back to idle.
    pub fn abandon_round(&mut self) {
        for player in self.players.iter_mut() {
            player.chips += player.bet() + player.insurance();
            player.reset();
        }
        self.dealer.reset();
        self.set_phase(Phase::Idle);
    }

    /// Collects an opening bet from every player. Players who cannot cover the minimum sit the round out.
    pub fn take_bets(&mut self, bets: &mut dyn BetProvider) -> Result<(), BlackjackGameError> {
        self.expect_phase(Phase::Betting)?;
        let min_bet = self.rules.min_bet;

        for i in 0..self.players.len() {
            if !self.players[i].continue_play(min_bet) {
                log::debug!("{} cannot cover the minimum bet, sitting out", self.players[i].name);
                self.players[i].sit_out();
                continue;
            }

            let mut attempts = 0;
            loop {
                let player = &self.players[i];
                let amount = bets.get_bet(player, min_bet);
                match validate_bet(amount, min_bet, player.chips) {
                    Ok(bet) => {
                        self.players[i].place_bet(bet);
                        break;
                    }
                    Err(e) => {
                        log::warn!("{}: {}", player.name, e);
                        attempts += 1;
                        if attempts >= self.rules.max_reprompts {
                            return Err(BlackjackGameError::TooManyInvalidResponses { attempts });
                        }
                    }
                }
            }
        }

        self.set_phase(Phase::InitialDeal);
        Ok(())
    }

    /// Deals two cards to every hand and two to the dealer, round robin: the players' first cards,
    /// the dealer's face up card, the players' second cards, then the dealer's hole card.
    pub fn deal(&mut self) -> Result<(), BlackjackGameError> {
        self.expect_phase(Phase::InitialDeal)?;

        for _ in 0..2 {
            for player in self.players.iter_mut().filter(|p| !p.sitting_out) {
                for slot in player.slots.iter_mut() {
                    slot.hand.push(self.shoe.draw());
                }
            }
            self.dealer.hand.push(self.shoe.draw());
        }

        for player in self.players.iter_mut().filter(|p| !p.sitting_out) {
            for slot in player.slots.iter_mut() {
                slot.status.blackjack = slot.hand.is_blackjack();
            }
        }

        self.set_phase(Phase::PlayerDecisions);
        Ok(())
    }

    fn dealer_up_card(&self) -> Result<Card, BlackjackGameError> {
        self.dealer
            .showing()
            .ok_or_else(|| BlackjackGameError::WrongPhase {
                expected: Phase::PlayerDecisions.to_string(),
                actual: self.phase.to_string(),
            })
    }

    /// Plays every player's hands in seat order. Split hands are played left to right, and a hand produced
    /// by a split may itself be split again while the table's hand limit allows it.
    pub fn play_players(
        &mut self,
        decisions: &mut dyn DecisionProvider,
        renderer: &mut dyn Renderer,
    ) -> Result<(), BlackjackGameError> {
        self.expect_phase(Phase::PlayerDecisions)?;
        let up = self.dealer_up_card()?;

        for p in 0..self.players.len() {
            if self.players[p].sitting_out {
                continue;
            }
            let mut idx = 0;
            while idx < self.players[p].slots.len() {
                self.play_slot(p, idx, up, decisions, renderer)?;
                idx += 1;
            }
        }

        self.set_phase(Phase::DealerPlay);
        Ok(())
    }

    fn play_slot(
        &mut self,
        p: usize,
        idx: usize,
        up: Card,
        decisions: &mut dyn DecisionProvider,
        renderer: &mut dyn Renderer,
    ) -> Result<(), BlackjackGameError> {
        loop {
            let slot = &self.players[p].slots[idx];
            if slot.is_resolved() {
                return Ok(());
            }

            if slot.hand.is_blackjack() {
                if self.insurance_offered(p, idx, up) {
                    let legal = [Decision::Insurance, Decision::Stay];
                    let decision = self.request_decision(p, idx, up, &legal, decisions)?;
                    if decision == Decision::Insurance {
                        self.players[p].insure(idx);
                    }
                }
                let slot = &mut self.players[p].slots[idx];
                slot.status.blackjack = true;
                slot.status.stayed = true;
                renderer.render(&self.snapshot());
                return Ok(());
            }

            let legal = self.legal_decisions(p, idx, up);
            let decision = self.request_decision(p, idx, up, &legal, decisions)?;
            self.apply_decision(p, idx, decision);
            renderer.render(&self.snapshot());
        }
    }

    fn insurance_offered(&self, p: usize, idx: usize, up: Card) -> bool {
        self.rules.insurance && up.is_ace() && self.players[p].can_insure(idx)
    }

    /// The decisions available for slot `idx` of player `p`. Options the player cannot fund are left out,
    /// so an accepted decision never overdraws the chip balance. Empty for a seat or slot that does not exist.
    pub fn legal_decisions(&self, p: usize, idx: usize, up: Card) -> Vec<Decision> {
        let player = match self.players.get(p) {
            Some(player) if idx < player.slots.len() => player,
            _ => return Vec::new(),
        };
        let mut legal = vec![Decision::Stay, Decision::Hit];
        if player.can_double_down(idx) {
            legal.push(Decision::DoubleDown);
        }
        if player.can_split(idx, self.rules.max_hands, self.rules.split_funding) {
            legal.push(Decision::Split);
        }
        if self.insurance_offered(p, idx, up) {
            legal.push(Decision::Insurance);
        }
        legal
    }

    fn view(&self, p: usize, idx: usize, up: Card) -> HandView<'_> {
        let player = &self.players[p];
        let slot = &player.slots[idx];
        let other_hands = self
            .players
            .iter()
            .enumerate()
            .filter(|(i, q)| *i != p && !q.sitting_out)
            .flat_map(|(_, q)| q.slots.iter().map(|s| &s.hand))
            .collect();
        HandView {
            player: &player.name,
            player_index: p,
            hand_index: idx,
            num_hands: player.slots.len(),
            hand: &slot.hand,
            bet: slot.bet,
            chips: player.chips,
            dealer_up_card: up,
            other_hands,
            strategy: &player.strategy,
        }
    }

    fn request_decision(
        &self,
        p: usize,
        idx: usize,
        up: Card,
        legal: &[Decision],
        decisions: &mut dyn DecisionProvider,
    ) -> Result<Decision, BlackjackGameError> {
        let view = self.view(p, idx, up);
        let mut attempts = 0;
        loop {
            let decision = decisions.get_decision(&view, up, legal);
            match validate_decision(decision, legal) {
                Ok(d) => return Ok(d),
                Err(e) => {
                    log::warn!("{} hand {}: {}", view.player, idx, e);
                    attempts += 1;
                    if attempts >= self.rules.max_reprompts {
                        return Err(BlackjackGameError::TooManyInvalidResponses { attempts });
                    }
                }
            }
        }
    }

    fn apply_decision(&mut self, p: usize, idx: usize, decision: Decision) {
        let player = &mut self.players[p];
        match decision {
            Decision::Stay => player.slots[idx].status.stayed = true,
            Decision::Hit => {
                let slot = &mut player.slots[idx];
                slot.hand.push(self.shoe.draw());
                if slot.check_bust() {
                    log::debug!("{} hand {} busted with {}", player.name, idx, slot.hand);
                }
            }
            Decision::DoubleDown => {
                let card = self.shoe.draw();
                player.double_down(idx, card);
                log::debug!("{} doubled down on hand {}", player.name, idx);
            }
            Decision::Split => {
                let (first, second) = (self.shoe.draw(), self.shoe.draw());
                if player.split(idx, self.rules.split_funding, first, second) {
                    log::debug!(
                        "{} split hand {} into {} hands",
                        player.name,
                        idx,
                        player.slots.len()
                    );
                }
            }
            Decision::Insurance => player.insure(idx),
        }
    }

    /// Draws the dealer's hand out, unless every player hand has already busted.
    pub fn play_dealer(&mut self) -> Result<(), BlackjackGameError> {
        self.expect_phase(Phase::DealerPlay)?;

        let any_live = self
            .players
            .iter()
            .filter(|p| !p.sitting_out)
            .flat_map(|p| p.slots.iter())
            .any(|s| !s.status.busted);

        if any_live {
            while self.dealer.should_draw() {
                self.dealer.hand.push(self.shoe.draw());
            }
        } else {
            log::debug!("round {}: every hand busted, dealer stands", self.round);
        }

        self.set_phase(Phase::Settlement);
        Ok(())
    }

    /// Settles every hand, pays the players and records the round's `GameResult`.
    pub fn settle(&mut self) -> Result<GameResult, BlackjackGameError> {
        self.expect_phase(Phase::Settlement)?;

        let dealer_hand = &self.dealer.hand;
        let payout = self.rules.blackjack_payout;
        let mut players = Vec::with_capacity(self.players.len());

        for player in self.players.iter_mut() {
            if player.sitting_out {
                players.push(PlayerResult::sat_out(player.name.clone(), player.chips));
                continue;
            }

            let mut hands = Vec::with_capacity(player.slots.len());
            for slot in player.slots.iter() {
                let (outcome, net) = settle_hand(&slot.hand, slot.bet, dealer_hand, payout);
                let insurance_net = settle_insurance(slot.insurance, dealer_hand);
                player.chips += slot.bet + net + slot.insurance + insurance_net;
                hands.push(HandResult {
                    cards: slot.hand.cards().to_vec(),
                    value: slot.hand.value(),
                    bet: slot.bet,
                    insurance: slot.insurance,
                    outcome,
                    net,
                    insurance_net,
                });
            }
            players.push(PlayerResult::from_hands(player.name.clone(), hands, player.chips));
        }

        let result = GameResult {
            round: self.round,
            dealer_cards: dealer_hand.cards().to_vec(),
            dealer_value: dealer_hand.value(),
            dealer_busted: dealer_hand.is_bust(),
            dealer_blackjack: dealer_hand.is_blackjack(),
            players,
        };

        self.last_result = Some(result.clone());
        self.set_phase(Phase::Idle);
        Ok(result)
    }

    /// Read-only projection of the table for a `Renderer`.
    pub fn snapshot(&self) -> TableSnapshot {
        let revealed = matches!(self.phase, Phase::Settlement | Phase::Idle);
        let dealer_cards = if revealed {
            self.dealer.hand.cards().to_vec()
        } else {
            self.dealer.showing().into_iter().collect()
        };
        let dealer_value = if revealed && !self.dealer.hand.is_empty() {
            Some(self.dealer.hand.value())
        } else {
            None
        };

        let players = self
            .players
            .iter()
            .map(|player| PlayerSnapshot {
                name: player.name.clone(),
                chips: player.chips,
                bet: player.bet(),
                sitting_out: player.sitting_out,
                hands: player
                    .slots
                    .iter()
                    .map(|slot| HandSnapshot {
                        cards: slot.hand.cards().to_vec(),
                        value: slot.hand.value(),
                        bet: slot.bet,
                        insurance: slot.insurance,
                        busted: slot.status.busted,
                        stayed: slot.status.stayed,
                    })
                    .collect(),
            })
            .collect();

        TableSnapshot {
            round: self.round,
            phase: self.phase,
            dealer_cards,
            dealer_value,
            players,
            result: if self.phase == Phase::Idle {
                self.last_result.clone()
            } else {
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};
    use crate::provider::{FlatBet, ScriptedBets, ScriptedDecisions, StrategyDecisions};
    use crate::render::NullRenderer;
    use crate::strategy::Strategy;

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Hearts)
    }

    fn stacked(ranks: &[Rank]) -> Shoe {
        Shoe::stacked(ranks.iter().map(|r| card(*r)).collect())
    }

    fn table(players: Vec<Player>, ranks: &[Rank]) -> Table {
        Table::with_shoe(Rules::default(), players, stacked(ranks)).unwrap()
    }

    #[test]
    fn test_validate_bet() {
        assert!(validate_bet(10.0, 5.0, 100.0).is_ok());
        assert!(matches!(
            validate_bet(4.0, 5.0, 100.0),
            Err(BlackjackGameError::InvalidBet { .. })
        ));
        assert!(validate_bet(101.0, 5.0, 100.0).is_err());
        assert!(validate_bet(f64::NAN, 5.0, 100.0).is_err());
    }

    #[test]
    fn test_validate_decision() {
        let legal = [Decision::Stay, Decision::Hit];
        assert_eq!(validate_decision(Decision::Hit, &legal), Ok(Decision::Hit));
        assert!(validate_decision(Decision::Split, &legal).is_err());
    }

    #[test]
    fn test_steps_refuse_to_run_out_of_order() {
        let mut t = table(vec![Player::new("a", 100.0, Strategy::SIMPLE)], &[]);
        assert!(matches!(t.deal(), Err(BlackjackGameError::WrongPhase { .. })));
        assert!(t.settle().is_err());
        t.start_round().unwrap();
        assert!(t.start_round().is_err());
        assert_eq!(t.phase(), Phase::Betting);
    }

    #[test]
    fn test_empty_table() {
        let mut t = table(vec![], &[]);
        assert_eq!(t.start_round(), Err(BlackjackGameError::NoPlayers));
    }

    #[test]
    fn test_deal_is_round_robin() {
        let players = vec![
            Player::new("a", 100.0, Strategy::NeverHit),
            Player::new("b", 100.0, Strategy::NeverHit),
        ];
        // a, b, dealer, a, b, dealer
        let mut t = table(
            players,
            &[Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven],
        );
        t.start_round().unwrap();
        t.take_bets(&mut FlatBet).unwrap();
        t.deal().unwrap();
        assert_eq!(t.players()[0].hand().cards(), &[card(Rank::Two), card(Rank::Five)]);
        assert_eq!(t.players()[1].hand().cards(), &[card(Rank::Three), card(Rank::Six)]);
        assert_eq!(t.dealer().hand.cards(), &[card(Rank::Four), card(Rank::Seven)]);
        assert_eq!(t.phase(), Phase::PlayerDecisions);
    }

    #[test]
    fn test_invalid_bet_is_reprompted() {
        let mut t = table(vec![Player::new("a", 100.0, Strategy::NeverHit)], &[]);
        t.start_round().unwrap();
        t.take_bets(&mut ScriptedBets::new([1.0, 500.0, 20.0])).unwrap();
        assert_eq!(t.players()[0].bet(), 20.0);
        assert_eq!(t.players()[0].chips, 80.0);
    }

    #[test]
    fn test_endless_invalid_bets_abandon_the_round() {
        let mut t = table(vec![Player::new("a", 100.0, Strategy::NeverHit)], &[]);
        let mut bets = ScriptedBets::new(std::iter::repeat(1.0).take(100));
        let result = t.play_round(&mut bets, &mut StrategyDecisions, &mut NullRenderer);
        assert!(matches!(
            result,
            Err(BlackjackGameError::TooManyInvalidResponses { .. })
        ));
        assert_eq!(t.phase(), Phase::Idle);
        assert_eq!(t.players()[0].chips, 100.0);
    }

    #[test]
    fn test_broke_player_sits_out() {
        let players = vec![
            Player::new("rich", 100.0, Strategy::NeverHit),
            Player::new("broke", 2.0, Strategy::NeverHit),
        ];
        let mut t = table(players, &[Rank::Ten, Rank::Nine, Rank::Ten, Rank::Eight]);
        let result = t
            .play_round(&mut FlatBet, &mut StrategyDecisions, &mut NullRenderer)
            .unwrap();
        let broke = result.player("broke").unwrap();
        assert!(broke.sat_out);
        assert_eq!(broke.hands_played, 0);
        assert_eq!(broke.chips_after, 2.0);
        assert_eq!(result.player("rich").unwrap().hands_won, 1);
    }

    #[test]
    fn test_illegal_decision_is_reprompted() {
        // player 10 7, dealer 10 8
        let mut t = table(
            vec![Player::new("a", 100.0, Strategy::NeverHit)],
            &[Rank::Ten, Rank::Ten, Rank::Seven, Rank::Eight],
        );
        let mut decisions = ScriptedDecisions::new([Decision::Split, Decision::Stay]);
        let result = t
            .play_round(&mut FlatBet, &mut decisions, &mut NullRenderer)
            .unwrap();
        assert_eq!(decisions.offered.len(), 2);
        assert!(!decisions.offered[0].contains(&Decision::Split));
        assert_eq!(result.players[0].hands_lost, 1);
    }

    #[test]
    fn test_snapshot_hides_hole_card() {
        let mut t = table(
            vec![Player::new("a", 100.0, Strategy::NeverHit)],
            &[Rank::Ten, Rank::Nine, Rank::Seven, Rank::Eight],
        );
        t.start_round().unwrap();
        t.take_bets(&mut FlatBet).unwrap();
        t.deal().unwrap();
        let snapshot = t.snapshot();
        assert_eq!(snapshot.dealer_cards, vec![card(Rank::Nine)]);
        assert_eq!(snapshot.dealer_value, None);
        assert!(snapshot.result.is_none());

        t.play_players(&mut StrategyDecisions, &mut NullRenderer).unwrap();
        t.play_dealer().unwrap();
        t.settle().unwrap();
        let snapshot = t.snapshot();
        assert_eq!(snapshot.dealer_cards.len(), 2);
        assert_eq!(snapshot.dealer_value, Some(17));
        assert!(snapshot.result.is_some());
    }

    #[test]
    fn test_legal_decisions_for_missing_slot_is_empty() {
        let mut t = table(
            vec![Player::new("a", 100.0, Strategy::NeverHit)],
            &[Rank::Two, Rank::Four, Rank::Five, Rank::Seven],
        );
        t.start_round().unwrap();
        t.take_bets(&mut FlatBet).unwrap();
        t.deal().unwrap();
        let up = card(Rank::Four);
        let legal = t.legal_decisions(0, 0, up);
        assert!(legal.contains(&Decision::Stay));
        assert!(legal.contains(&Decision::Hit));
        assert!(t.legal_decisions(0, 1, up).is_empty());
        assert!(t.legal_decisions(3, 0, up).is_empty());
    }

    #[test]
    fn test_add_player_between_rounds_only() {
        let mut t = table(vec![Player::new("a", 100.0, Strategy::NeverHit)], &[]);
        t.start_round().unwrap();
        assert!(t.add_player(Player::new("b", 100.0, Strategy::NeverHit)).is_err());
        t.abandon_round();
        assert!(t.add_player(Player::new("b", 100.0, Strategy::NeverHit)).is_ok());
        assert_eq!(t.players().len(), 2);
    }
}
