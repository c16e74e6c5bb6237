use crate::card::{Card, Rank};
use crate::error::BlackjackGameError;
use crate::hand::Hand;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// The choices a participant can make for the hand it is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Stay,
    Hit,
    DoubleDown,
    Split,
    Insurance,
}

impl Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Decision::Stay => "stay",
            Decision::Hit => "hit",
            Decision::DoubleDown => "double down",
            Decision::Split => "split",
            Decision::Insurance => "insurance",
        };
        write!(f, "{}", name)
    }
}

/// Everything a participant is allowed to see when deciding how to play a hand.
/// The dealer's hole card and the contents of the shoe are deliberately absent.
#[derive(Debug, Clone)]
pub struct HandView<'a> {
    pub player: &'a str,
    pub player_index: usize,
    pub hand_index: usize,
    pub num_hands: usize,
    pub hand: &'a Hand,
    pub bet: f64,
    pub chips: f64,
    pub dealer_up_card: Card,
    pub other_hands: Vec<&'a Hand>,
    pub strategy: &'a Strategy,
}

/// Dealer up card counted with aces low, the way the basic strategy tables are keyed.
fn up_card_key(card: Card) -> u8 {
    if card.is_ace() {
        1
    } else {
        card.value()
    }
}

lazy_static! {
    /// Hard totals, keyed by (hand value, dealer up card)
    static ref HARD_TOTALS: HashMap<(u8, u8), Decision> = {
        let mut hard_totals = HashMap::new();
        for i in 4..=21 {
            for j in 1..=10 {
                let decision = match i {
                    9 => match j {
                        3..=6 => Decision::DoubleDown,
                        _ => Decision::Hit,
                    },
                    10 => match j {
                        2..=9 => Decision::DoubleDown,
                        _ => Decision::Hit,
                    },
                    11 => Decision::DoubleDown,
                    12 => match j {
                        1..=3 | 7..=10 => Decision::Hit,
                        _ => Decision::Stay,
                    },
                    13..=16 => match j {
                        2..=6 => Decision::Stay,
                        _ => Decision::Hit,
                    },
                    17..=21 => Decision::Stay,
                    _ => Decision::Hit,
                };
                hard_totals.insert((i, j), decision);
            }
        }
        hard_totals
    };

    /// Soft totals, keyed by (hand value with aces low, dealer up card)
    static ref SOFT_TOTALS: HashMap<(u8, u8), Decision> = {
        let mut soft_totals = HashMap::new();
        for i in 2..=11 {
            for j in 1..=10 {
                let decision = match i {
                    2..=7 => Decision::Hit,
                    8 => match j {
                        2..=6 => Decision::DoubleDown,
                        7 | 8 => Decision::Stay,
                        _ => Decision::Hit,
                    },
                    9 => match j {
                        6 => Decision::DoubleDown,
                        _ => Decision::Stay,
                    },
                    _ => Decision::Stay,
                };
                soft_totals.insert((i, j), decision);
            }
        }
        soft_totals
    };

    /// Pairs worth splitting, keyed by (rank of the pair, dealer up card)
    static ref PAIR_SPLITS: HashMap<(Rank, u8), bool> = {
        let mut pair_splits = HashMap::new();
        for rank in Rank::ALL {
            for j in 1..=10 {
                let split = match rank {
                    Rank::Ace | Rank::Eight => true,
                    Rank::Two | Rank::Three | Rank::Seven => (2..=7).contains(&j),
                    Rank::Four => j == 5 || j == 6,
                    Rank::Six => (2..=6).contains(&j),
                    Rank::Nine => (2..=6).contains(&j) || j == 8 || j == 9,
                    _ => false,
                };
                pair_splits.insert((rank, j), split);
            }
        }
        pair_splits
    };
}

/// The built-in decision policies. Each one is a pure function of a `HandView` and the legal decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    /// Always stays.
    NeverHit,
    /// Hits while the hand is worth less than the threshold, then stays.
    Threshold(u8),
    /// Table driven basic strategy.
    Basic,
}

impl Strategy {
    /// The simple player heuristic: hit below 16.
    pub const SIMPLE: Strategy = Strategy::Threshold(16);
    /// The dealer's default policy: hit below 17.
    pub const DEALER: Strategy = Strategy::Threshold(17);

    /// Picks a decision for `view`. The result is always one of `legal`.
    pub fn decide(&self, view: &HandView<'_>, legal: &[Decision]) -> Decision {
        let wanted = match self {
            Strategy::NeverHit => Decision::Stay,
            Strategy::Threshold(n) => {
                if view.hand.value() < *n {
                    Decision::Hit
                } else {
                    Decision::Stay
                }
            }
            Strategy::Basic => Strategy::basic(view, legal),
        };

        if legal.contains(&wanted) {
            wanted
        } else if wanted != Decision::Stay && legal.contains(&Decision::Hit) {
            Decision::Hit
        } else {
            Decision::Stay
        }
    }

    fn basic(view: &HandView<'_>, legal: &[Decision]) -> Decision {
        let hand = view.hand;
        let up = up_card_key(view.dealer_up_card);

        if legal.contains(&Decision::Split) && hand.is_splittable() {
            let rank = hand.cards()[0].rank;
            if PAIR_SPLITS.get(&(rank, up)).copied().unwrap_or(false) {
                return Decision::Split;
            }
        }

        let decision = if hand.is_soft() {
            SOFT_TOTALS.get(&(hand.lowest_value(), up)).copied()
        } else {
            HARD_TOTALS.get(&(hand.value(), up)).copied()
        };

        match decision {
            Some(Decision::DoubleDown) if !legal.contains(&Decision::DoubleDown) => Decision::Hit,
            Some(d) => d,
            None if hand.value() < 9 => Decision::Hit,
            None => Decision::Stay,
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::NeverHit => write!(f, "never-hit"),
            Strategy::Threshold(n) => write!(f, "threshold-{}", n),
            Strategy::Basic => write!(f, "basic"),
        }
    }
}

impl FromStr for Strategy {
    type Err = BlackjackGameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "never-hit" | "neverhit" => return Ok(Strategy::NeverHit),
            "basic" => return Ok(Strategy::Basic),
            "simple" => return Ok(Strategy::SIMPLE),
            "dealer" | "simple17" => return Ok(Strategy::DEALER),
            _ => {}
        }
        name.strip_prefix("threshold-")
            .and_then(|n| n.parse::<u8>().ok())
            .map(Strategy::Threshold)
            .ok_or_else(|| {
                BlackjackGameError::InvalidConfig(format!("strategy not recognized: {}", s))
            })
    }
}

impl TryFrom<String> for Strategy {
    type Error = BlackjackGameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Strategy> for String {
    fn from(value: Strategy) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;

    const ALL_LEGAL: [Decision; 4] = [
        Decision::Stay,
        Decision::Hit,
        Decision::DoubleDown,
        Decision::Split,
    ];

    fn hand(ranks: &[Rank]) -> Hand {
        Hand::from_cards(ranks.iter().map(|r| Card::new(*r, Suit::Clubs)).collect())
    }

    fn view<'a>(hand: &'a Hand, up: Rank, strategy: &'a Strategy) -> HandView<'a> {
        HandView {
            player: "test",
            player_index: 0,
            hand_index: 0,
            num_hands: 1,
            hand,
            bet: 10.0,
            chips: 100.0,
            dealer_up_card: Card::new(up, Suit::Spades),
            other_hands: vec![],
            strategy,
        }
    }

    #[test]
    fn test_never_hit() {
        let s = Strategy::NeverHit;
        let h = hand(&[Rank::Two, Rank::Three]);
        assert_eq!(s.decide(&view(&h, Rank::Ten, &s), &ALL_LEGAL), Decision::Stay);
    }

    #[test]
    fn test_threshold() {
        let s = Strategy::SIMPLE;
        let low = hand(&[Rank::Ten, Rank::Five]);
        let high = hand(&[Rank::Ten, Rank::Six]);
        assert_eq!(s.decide(&view(&low, Rank::Ten, &s), &ALL_LEGAL), Decision::Hit);
        assert_eq!(s.decide(&view(&high, Rank::Ten, &s), &ALL_LEGAL), Decision::Stay);
    }

    #[test]
    fn test_threshold_respects_legal_set() {
        let s = Strategy::SIMPLE;
        let h = hand(&[Rank::Two, Rank::Three]);
        let legal = [Decision::Insurance, Decision::Stay];
        assert_eq!(s.decide(&view(&h, Rank::Ace, &s), &legal), Decision::Stay);
    }

    #[test]
    fn test_basic_doubles_eleven() {
        let s = Strategy::Basic;
        let h = hand(&[Rank::Six, Rank::Five]);
        assert_eq!(s.decide(&view(&h, Rank::Six, &s), &ALL_LEGAL), Decision::DoubleDown);
        let no_double = [Decision::Stay, Decision::Hit];
        assert_eq!(s.decide(&view(&h, Rank::Six, &s), &no_double), Decision::Hit);
    }

    #[test]
    fn test_basic_splits_eights() {
        let s = Strategy::Basic;
        let h = hand(&[Rank::Eight, Rank::Eight]);
        assert_eq!(s.decide(&view(&h, Rank::Ten, &s), &ALL_LEGAL), Decision::Split);
    }

    #[test]
    fn test_basic_never_splits_tens() {
        let s = Strategy::Basic;
        let h = hand(&[Rank::King, Rank::King]);
        assert_eq!(s.decide(&view(&h, Rank::Six, &s), &ALL_LEGAL), Decision::Stay);
    }

    #[test]
    fn test_basic_soft_totals() {
        let s = Strategy::Basic;
        let soft_18 = hand(&[Rank::Ace, Rank::Seven]);
        assert_eq!(s.decide(&view(&soft_18, Rank::Eight, &s), &ALL_LEGAL), Decision::Stay);
        assert_eq!(s.decide(&view(&soft_18, Rank::Nine, &s), &ALL_LEGAL), Decision::Hit);
        let soft_13 = hand(&[Rank::Ace, Rank::Two]);
        assert_eq!(s.decide(&view(&soft_13, Rank::Ten, &s), &ALL_LEGAL), Decision::Hit);
    }

    #[test]
    fn test_basic_stands_on_stiff_against_weak_dealer() {
        let s = Strategy::Basic;
        let h = hand(&[Rank::Ten, Rank::Three]);
        assert_eq!(s.decide(&view(&h, Rank::Five, &s), &ALL_LEGAL), Decision::Stay);
        assert_eq!(s.decide(&view(&h, Rank::Ace, &s), &ALL_LEGAL), Decision::Hit);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("never-hit".parse::<Strategy>().unwrap(), Strategy::NeverHit);
        assert_eq!("threshold-16".parse::<Strategy>().unwrap(), Strategy::Threshold(16));
        assert_eq!("Basic".parse::<Strategy>().unwrap(), Strategy::Basic);
        assert_eq!("simple".parse::<Strategy>().unwrap(), Strategy::SIMPLE);
        assert!("card-counter".parse::<Strategy>().is_err());
        assert!("threshold-x".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for s in [Strategy::NeverHit, Strategy::Threshold(12), Strategy::Basic] {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
    }
}
