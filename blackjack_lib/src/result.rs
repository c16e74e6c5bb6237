use crate::card::Card;
use crate::hand::Hand;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandOutcome {
    Win,
    Blackjack,
    Push,
    Loss,
    Bust,
}

impl HandOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, HandOutcome::Win | HandOutcome::Blackjack)
    }

    pub fn is_loss(&self) -> bool {
        matches!(self, HandOutcome::Loss | HandOutcome::Bust)
    }
}

/// Settles one hand against the dealer. The first matching rule decides the outcome:
/// a bust hand loses, a dealer bust wins, a dealer blackjack beats everything but another blackjack,
/// a player blackjack pays `blackjack_payout`, and otherwise the higher value wins.
///
/// Returns the outcome and the net chip change of the main bet.
pub fn settle_hand(
    hand: &Hand,
    bet: f64,
    dealer: &Hand,
    blackjack_payout: f64,
) -> (HandOutcome, f64) {
    if hand.is_bust() {
        return (HandOutcome::Bust, -bet);
    }
    if dealer.is_bust() {
        return (HandOutcome::Win, bet);
    }
    if dealer.is_blackjack() {
        return if hand.is_blackjack() {
            (HandOutcome::Push, 0.0)
        } else {
            (HandOutcome::Loss, -bet)
        };
    }
    if hand.is_blackjack() {
        return (HandOutcome::Blackjack, bet * blackjack_payout);
    }

    let (value, dealer_value) = (hand.value(), dealer.value());
    if value == dealer_value {
        (HandOutcome::Push, 0.0)
    } else if value > dealer_value {
        (HandOutcome::Win, bet)
    } else {
        (HandOutcome::Loss, -bet)
    }
}

/// Insurance pays 2:1 when the dealer holds a blackjack, otherwise the stake is lost.
pub fn settle_insurance(stake: f64, dealer: &Hand) -> f64 {
    if stake <= 0.0 {
        0.0
    } else if dealer.is_blackjack() {
        2.0 * stake
    } else {
        -stake
    }
}

/// Settlement of a single hand slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandResult {
    pub cards: Vec<Card>,
    pub value: u8,
    pub bet: f64,
    pub insurance: f64,
    pub outcome: HandOutcome,
    pub net: f64,
    pub insurance_net: f64,
}

/// Everything that happened to one player in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub name: String,
    pub hands: Vec<HandResult>,
    pub hands_played: u32,
    pub hands_won: u32,
    pub hands_pushed: u32,
    pub hands_lost: u32,
    pub hands_busted: u32,
    pub blackjacks: u32,
    /// Net chip change across every hand, insurance included
    pub net: f64,
    pub chips_after: f64,
    pub sat_out: bool,
}

impl PlayerResult {
    pub(crate) fn from_hands(name: String, hands: Vec<HandResult>, chips_after: f64) -> Self {
        let count =
            |f: fn(&HandOutcome) -> bool| hands.iter().filter(|h| f(&h.outcome)).count() as u32;
        PlayerResult {
            hands_played: hands.len() as u32,
            hands_won: count(HandOutcome::is_win),
            hands_pushed: count(|o| *o == HandOutcome::Push),
            hands_lost: count(HandOutcome::is_loss),
            hands_busted: count(|o| *o == HandOutcome::Bust),
            blackjacks: count(|o| *o == HandOutcome::Blackjack),
            net: hands.iter().map(|h| h.net + h.insurance_net).sum(),
            name,
            hands,
            chips_after,
            sat_out: false,
        }
    }

    pub(crate) fn sat_out(name: String, chips_after: f64) -> Self {
        PlayerResult {
            sat_out: true,
            ..PlayerResult::from_hands(name, vec![], chips_after)
        }
    }
}

/// The immutable record of a settled round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub round: u64,
    pub dealer_cards: Vec<Card>,
    pub dealer_value: u8,
    pub dealer_busted: bool,
    pub dealer_blackjack: bool,
    pub players: Vec<PlayerResult>,
}

impl GameResult {
    pub fn player(&self, name: &str) -> Option<&PlayerResult> {
        self.players.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn hand(ranks: &[Rank]) -> Hand {
        Hand::from_cards(ranks.iter().map(|r| Card::new(*r, Suit::Spades)).collect())
    }

    #[test]
    fn test_bust_loses_against_anything() {
        let player = hand(&[Rank::King, Rank::Queen, Rank::Five]);
        let dealer_bust = hand(&[Rank::King, Rank::Six, Rank::Nine]);
        let dealer_bj = hand(&[Rank::Ace, Rank::King]);
        assert_eq!(settle_hand(&player, 10.0, &dealer_bust, 1.5), (HandOutcome::Bust, -10.0));
        assert_eq!(settle_hand(&player, 10.0, &dealer_bj, 1.5), (HandOutcome::Bust, -10.0));
    }

    #[test]
    fn test_dealer_bust_pays_even_money() {
        let player = hand(&[Rank::Ten, Rank::Two]);
        let dealer = hand(&[Rank::King, Rank::Six, Rank::Nine]);
        assert_eq!(settle_hand(&player, 10.0, &dealer, 1.5), (HandOutcome::Win, 10.0));
    }

    #[test]
    fn test_dealer_blackjack() {
        let dealer = hand(&[Rank::Ace, Rank::Queen]);
        let twenty_one = hand(&[Rank::Seven, Rank::Seven, Rank::Seven]);
        let blackjack = hand(&[Rank::King, Rank::Ace]);
        assert_eq!(settle_hand(&twenty_one, 10.0, &dealer, 1.5), (HandOutcome::Loss, -10.0));
        assert_eq!(settle_hand(&blackjack, 10.0, &dealer, 1.5), (HandOutcome::Push, 0.0));
    }

    #[test]
    fn test_player_blackjack_pays_three_to_two() {
        let dealer = hand(&[Rank::Ten, Rank::Five, Rank::Six]);
        let blackjack = hand(&[Rank::Ace, Rank::Jack]);
        assert_eq!(settle_hand(&blackjack, 10.0, &dealer, 1.5), (HandOutcome::Blackjack, 15.0));
    }

    #[test]
    fn test_value_comparison() {
        let dealer = hand(&[Rank::Ten, Rank::Eight]);
        let settle = |ranks: &[Rank]| settle_hand(&hand(ranks), 10.0, &dealer, 1.5);
        assert_eq!(settle(&[Rank::Ten, Rank::Eight]), (HandOutcome::Push, 0.0));
        assert_eq!(settle(&[Rank::Ten, Rank::Nine]), (HandOutcome::Win, 10.0));
        assert_eq!(settle(&[Rank::Ten, Rank::Seven]), (HandOutcome::Loss, -10.0));
    }

    #[test]
    fn test_insurance() {
        let dealer_bj = hand(&[Rank::Ace, Rank::King]);
        let dealer_twenty = hand(&[Rank::Ace, Rank::Nine]);
        assert_eq!(settle_insurance(5.0, &dealer_bj), 10.0);
        assert_eq!(settle_insurance(5.0, &dealer_twenty), -5.0);
        assert_eq!(settle_insurance(0.0, &dealer_bj), 0.0);

        // insuring a losing hand against a dealer blackjack breaks even
        let player = hand(&[Rank::Ten, Rank::Nine]);
        let (_, net) = settle_hand(&player, 10.0, &dealer_bj, 1.5);
        assert_eq!(net + settle_insurance(5.0, &dealer_bj), 0.0);
    }

    #[test]
    fn test_player_result_counts() {
        let mk = |outcome, net| HandResult {
            cards: vec![],
            value: 0,
            bet: 10.0,
            insurance: 0.0,
            outcome,
            net,
            insurance_net: 0.0,
        };
        let result = PlayerResult::from_hands(
            "p".to_string(),
            vec![
                mk(HandOutcome::Blackjack, 15.0),
                mk(HandOutcome::Bust, -10.0),
                mk(HandOutcome::Push, 0.0),
            ],
            105.0,
        );
        assert_eq!(result.hands_played, 3);
        assert_eq!(result.hands_won, 1);
        assert_eq!(result.hands_lost, 1);
        assert_eq!(result.hands_busted, 1);
        assert_eq!(result.hands_pushed, 1);
        assert_eq!(result.blackjacks, 1);
        assert_eq!(result.net, 5.0);
    }
}
