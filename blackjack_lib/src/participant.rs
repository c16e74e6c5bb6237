use crate::card::Card;
use crate::hand::Hand;
use crate::rules::SplitFunding;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};

/// Status flags of a single hand slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandStatus {
    pub stayed: bool,
    pub busted: bool,
    pub blackjack: bool,
    pub doubled: bool,
    pub insured: bool,
}

/// One independently played and independently bet hand. A player starts each round with a single slot,
/// splitting replaces a slot with two new ones. Slots never hold chips, every stake is funded by the owning player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandSlot {
    pub hand: Hand,
    pub bet: f64,
    pub insurance: f64,
    pub status: HandStatus,
    /// Number of splits that produced this slot
    pub splits: u32,
}

impl HandSlot {
    pub fn new(bet: f64) -> HandSlot {
        HandSlot {
            bet,
            ..HandSlot::default()
        }
    }

    /// A slot is resolved once nothing more can be done with it.
    pub fn is_resolved(&self) -> bool {
        self.status.stayed || self.status.busted
    }

    /// Marks the slot as busted if its hand is over 21. Returns true if it did bust.
    pub(crate) fn check_bust(&mut self) -> bool {
        if self.hand.is_bust() {
            self.status.busted = true;
            self.status.stayed = true;
        }
        self.status.busted
    }
}

/// Struct for a seated player. The player is the only owner of chips, its hand slots hold bets only.
///
/// Chips are taken off the balance as soon as a stake is committed and paid back at settlement,
/// so `chips` is always what the player could still put on the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub chips: f64,
    pub strategy: Strategy,
    /// The bet this player wants to make each round, used by `FlatBet`
    pub base_bet: f64,
    pub slots: Vec<HandSlot>,
    pub sitting_out: bool,
}

impl Player {
    /// Associated function to create a new `Player` with an empty hand and no bet.
    pub fn new<S: Into<String>>(name: S, chips: f64, strategy: Strategy) -> Player {
        Player {
            name: name.into(),
            chips,
            strategy,
            base_bet: 0.0,
            slots: vec![HandSlot::default()],
            sitting_out: false,
        }
    }

    pub fn with_base_bet(mut self, bet: f64) -> Player {
        self.base_bet = bet;
        self
    }

    /// Aggregate main bet across every hand slot.
    pub fn bet(&self) -> f64 {
        self.slots.iter().map(|s| s.bet).sum()
    }

    /// Aggregate insurance across every hand slot.
    pub fn insurance(&self) -> f64 {
        self.slots.iter().map(|s| s.insurance).sum()
    }

    pub fn is_split(&self) -> bool {
        self.slots.len() > 1
    }

    /// The hand of the first slot. After a split this is only the leftmost sub-hand.
    pub fn hand(&self) -> &Hand {
        &self.slots[0].hand
    }

    pub fn continue_play(&self, min_bet: f64) -> bool {
        self.chips >= min_bet
    }

    /// Commits the opening bet for the round. Assumes the bet was validated.
    pub(crate) fn place_bet(&mut self, bet: f64) {
        self.chips -= bet;
        self.slots = vec![HandSlot::new(bet)];
        self.sitting_out = false;
    }

    /// Leaves the player seated with an empty, unbet hand for this round.
    pub(crate) fn sit_out(&mut self) {
        self.slots = vec![HandSlot::default()];
        self.sitting_out = true;
    }

    pub fn can_double_down(&self, idx: usize) -> bool {
        let slot = &self.slots[idx];
        !slot.is_resolved() && slot.hand.len() == 2 && self.chips >= slot.bet
    }

    pub fn can_split(&self, idx: usize, max_hands: usize, funding: SplitFunding) -> bool {
        let slot = &self.slots[idx];
        let funded = match funding {
            SplitFunding::MatchBet => self.chips >= slot.bet,
            SplitFunding::DivideBet => true,
        };
        !slot.is_resolved() && slot.hand.is_splittable() && self.slots.len() < max_hands && funded
    }

    /// Insurance is only ever bought on the opening hand, once per round and before any split.
    pub fn can_insure(&self, idx: usize) -> bool {
        let slot = &self.slots[idx];
        self.slots.len() == 1
            && slot.splits == 0
            && !slot.status.insured
            && slot.hand.len() == 2
            && self.chips >= slot.bet / 2.0
    }

    /// Doubles the stake of slot `idx` and deals it exactly one card, after which the slot stays.
    pub(crate) fn double_down(&mut self, idx: usize, card: Card) {
        let stake = self.slots[idx].bet;
        self.chips -= stake;
        let slot = &mut self.slots[idx];
        slot.bet += stake;
        slot.status.doubled = true;
        slot.hand.push(card);
        slot.check_bust();
        slot.status.stayed = true;
    }

    /// Replaces slot `idx` with two slots, each seeded with one card of the pair plus one new card.
    /// Returns false and changes nothing if the slot holds no pair.
    pub(crate) fn split(
        &mut self,
        idx: usize,
        funding: SplitFunding,
        first_draw: Card,
        second_draw: Card,
    ) -> bool {
        let old = &mut self.slots[idx];
        let (first, second) = match old.hand.take_pair() {
            Some(pair) => pair,
            None => return false,
        };

        let bet = match funding {
            SplitFunding::MatchBet => {
                self.chips -= old.bet;
                old.bet
            }
            SplitFunding::DivideBet => old.bet / 2.0,
        };
        let splits = old.splits + 1;

        // an insurance stake bought before the split stays with the left hand
        let left = HandSlot {
            hand: Hand::from_cards(vec![first, first_draw]),
            bet,
            insurance: old.insurance,
            status: HandStatus::default(),
            splits,
        };
        let right = HandSlot {
            hand: Hand::from_cards(vec![second, second_draw]),
            bet,
            splits,
            ..HandSlot::default()
        };

        self.slots[idx] = left;
        self.slots.insert(idx + 1, right);
        true
    }

    /// Places an insurance bet of half the slot's original stake.
    pub(crate) fn insure(&mut self, idx: usize) {
        let slot = &mut self.slots[idx];
        let stake = slot.bet / 2.0;
        slot.insurance = stake;
        slot.status.insured = true;
        self.chips -= stake;
    }

    /// Clears hands and bets for the next round, chips carry over.
    pub fn reset(&mut self) {
        self.slots = vec![HandSlot::default()];
        self.sitting_out = false;
    }
}

/// The dealer: no chips and no bet, just a hand and a draw rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dealer {
    pub hand: Hand,
    pub hit_on_soft_17: bool,
}

impl Dealer {
    pub fn new(hit_on_soft_17: bool) -> Dealer {
        Dealer {
            hand: Hand::new(),
            hit_on_soft_17,
        }
    }

    /// The face up card, which is the first card dealt to the dealer.
    pub fn showing(&self) -> Option<Card> {
        self.hand.first()
    }

    /// Whether the dealer must draw another card.
    ///
    /// Under the standard rule the dealer draws below 17. With `hit_on_soft_17` the dealer also draws on a
    /// soft 17, so `A 6` draws again while a hard 17 stands under both rules.
    pub fn should_draw(&self) -> bool {
        let value = self.hand.value();
        if value < 17 {
            return true;
        }
        self.hit_on_soft_17 && value == 17 && self.hand.is_soft()
    }

    pub fn reset(&mut self) {
        self.hand.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Diamonds)
    }

    fn player_with(ranks: &[Rank], bet: f64, chips: f64) -> Player {
        let mut player = Player::new("p", chips + bet, Strategy::SIMPLE);
        player.place_bet(bet);
        for r in ranks {
            player.slots[0].hand.push(card(*r));
        }
        player
    }

    #[test]
    fn test_new_player() {
        let player = Player::new("Mike", 500.0, Strategy::SIMPLE);
        assert_eq!(player.bet(), 0.0);
        assert!(player.hand().is_empty());
        assert!(!player.is_split());
    }

    #[test]
    fn test_place_bet_takes_chips() {
        let player = player_with(&[], 20.0, 80.0);
        assert_eq!(player.chips, 80.0);
        assert_eq!(player.bet(), 20.0);
    }

    #[test]
    fn test_split_matching_bets() {
        let mut player = player_with(&[Rank::Two, Rank::Two], 20.0, 80.0);
        assert!(player.can_split(0, 4, SplitFunding::MatchBet));
        assert!(player.split(0, SplitFunding::MatchBet, card(Rank::Five), card(Rank::Nine)));
        assert_eq!(player.slots.len(), 2);
        assert_eq!(player.slots[0].bet, 20.0);
        assert_eq!(player.slots[1].bet, 20.0);
        assert_eq!(player.bet(), 40.0);
        assert_eq!(player.chips, 60.0);
        assert_eq!(player.slots[0].hand.value(), 7);
        assert_eq!(player.slots[1].hand.value(), 11);
    }

    #[test]
    fn test_split_dividing_bets() {
        let mut player = player_with(&[Rank::Two, Rank::Two], 20.0, 80.0);
        player.split(0, SplitFunding::DivideBet, card(Rank::Two), card(Rank::Nine));
        assert_eq!(player.slots[0].bet, 10.0);
        assert_eq!(player.slots[1].bet, 10.0);
        assert_eq!(player.chips, 80.0);

        // the first sub-hand drew another two, so it splits again
        assert!(player.can_split(0, 4, SplitFunding::DivideBet));
        player.split(0, SplitFunding::DivideBet, card(Rank::Four), card(Rank::Six));
        assert_eq!(player.slots.len(), 3);
        assert_eq!(player.slots[0].bet, 5.0);
        assert_eq!(player.slots[1].bet, 5.0);
        assert_eq!(player.slots[2].bet, 10.0);
        assert_eq!(player.bet(), 20.0);
        assert_eq!(player.slots[0].splits, 2);
    }

    #[test]
    fn test_split_respects_hand_limit_and_chips() {
        let player = player_with(&[Rank::Two, Rank::Two], 20.0, 10.0);
        assert!(!player.can_split(0, 4, SplitFunding::MatchBet));
        assert!(player.can_split(0, 4, SplitFunding::DivideBet));
        assert!(!player.can_split(0, 1, SplitFunding::DivideBet));
    }

    #[test]
    fn test_split_rejects_non_pair() {
        let mut player = player_with(&[Rank::Two, Rank::Three], 20.0, 80.0);
        assert!(!player.split(0, SplitFunding::MatchBet, card(Rank::Two), card(Rank::Two)));
        assert_eq!(player.slots.len(), 1);
        assert_eq!(player.chips, 80.0);
    }

    #[test]
    fn test_double_down() {
        let mut player = player_with(&[Rank::Five, Rank::Six], 10.0, 90.0);
        assert!(player.can_double_down(0));
        player.double_down(0, card(Rank::King));
        assert_eq!(player.bet(), 20.0);
        assert_eq!(player.chips, 80.0);
        assert!(player.slots[0].status.stayed);
        assert!(player.slots[0].status.doubled);
        assert_eq!(player.slots[0].hand.value(), 21);
    }

    #[test]
    fn test_cannot_double_without_chips() {
        let player = player_with(&[Rank::Five, Rank::Six], 10.0, 5.0);
        assert!(!player.can_double_down(0));
    }

    #[test]
    fn test_insurance_is_half_the_bet() {
        let mut player = player_with(&[Rank::Five, Rank::Six], 10.0, 90.0);
        assert!(player.can_insure(0));
        player.insure(0);
        assert_eq!(player.insurance(), 5.0);
        assert_eq!(player.chips, 85.0);
        assert!(!player.can_insure(0));
    }

    #[test]
    fn test_no_insurance_after_split() {
        let mut player = player_with(&[Rank::Eight, Rank::Eight], 10.0, 90.0);
        player.insure(0);
        player.split(0, SplitFunding::MatchBet, card(Rank::Two), card(Rank::Three));
        assert_eq!(player.slots[0].insurance, 5.0);
        assert_eq!(player.slots[1].insurance, 0.0);
        assert_eq!(player.insurance(), 5.0);
        assert!(!player.can_insure(0));
        assert!(!player.can_insure(1));

        let mut player = player_with(&[Rank::Eight, Rank::Eight], 10.0, 90.0);
        player.split(0, SplitFunding::MatchBet, card(Rank::Two), card(Rank::Three));
        assert!(!player.can_insure(0));
        assert!(!player.can_insure(1));
    }

    #[test]
    fn test_dealer_soft_seventeen() {
        let mut dealer = Dealer::new(true);
        dealer.hand.push(card(Rank::Ace));
        dealer.hand.push(card(Rank::Six));
        assert_eq!(dealer.hand.value(), 17);
        assert_eq!(dealer.hand.lowest_value(), 7);
        assert!(dealer.should_draw());

        dealer.hit_on_soft_17 = false;
        assert!(!dealer.should_draw());
    }

    #[test]
    fn test_dealer_stands_on_hard_seventeen() {
        let mut dealer = Dealer::new(true);
        dealer.hand.push(card(Rank::King));
        dealer.hand.push(card(Rank::Seven));
        assert!(!dealer.should_draw());
    }

    #[test]
    fn test_dealer_showing() {
        let mut dealer = Dealer::new(false);
        assert!(dealer.showing().is_none());
        dealer.hand.push(card(Rank::Ace));
        dealer.hand.push(card(Rank::King));
        assert_eq!(dealer.showing(), Some(card(Rank::Ace)));
    }

    #[test]
    fn test_reset_keeps_chips() {
        let mut player = player_with(&[Rank::Five, Rank::Six], 10.0, 90.0);
        player.reset();
        assert_eq!(player.chips, 90.0);
        assert_eq!(player.bet(), 0.0);
        assert!(player.hand().is_empty());
    }
}
