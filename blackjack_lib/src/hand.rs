use crate::card::Card;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Computes the best blackjack total for `cards`.
///
/// Aces start at 11 and are reduced to 1 one at a time while the total is over 21. If every ace has been
/// reduced and the hand is still over 21, the all-aces-high total is returned instead, so a bust hand reports
/// the largest total it could have had.
pub fn calculate_hand_value(cards: &[Card]) -> u8 {
    let high: u16 = cards.iter().map(|c| c.value() as u16).sum();
    let mut total = high;
    let mut aces = cards.iter().filter(|c| c.is_ace()).count();

    while total > 21 && aces > 0 {
        total -= 10;
        aces -= 1;
    }

    let best = if total > 21 { high } else { total };
    u8::try_from(best).unwrap_or(u8::MAX)
}

/// Total with every ace counted as 1.
pub fn calculate_lowest_value(cards: &[Card]) -> u8 {
    let total: u16 = cards
        .iter()
        .map(|c| if c.is_ace() { 1 } else { c.value() as u16 })
        .sum();
    u8::try_from(total).unwrap_or(u8::MAX)
}

pub fn is_busted(cards: &[Card]) -> bool {
    calculate_hand_value(cards) > 21
}

/// 21 with exactly two cards.
pub fn is_blackjack(cards: &[Card]) -> bool {
    cards.len() == 2 && calculate_hand_value(cards) == 21
}

/// A hand is soft when it holds an ace that is still being counted as 11. A bust hand is never soft.
pub fn is_soft_hand(cards: &[Card]) -> bool {
    let value = calculate_hand_value(cards);
    value <= 21 && cards.iter().any(|c| c.is_ace()) && calculate_lowest_value(cards) < value
}

/// Exactly two cards of the same rank, so `K♠ Q♥` is not a pair even though both are worth ten.
pub fn can_split_cards(cards: &[Card]) -> bool {
    cards.len() == 2 && cards[0].rank == cards[1].rank
}

/// An ordered sequence of cards. Every derived quantity is recomputed from the cards on each call,
/// so the predicates can be asked at any point of a round without touching the hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand { cards: Vec::new() }
    }

    pub fn from_cards(cards: Vec<Card>) -> Hand {
        Hand { cards }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The first card dealt, which is the dealer's face up card.
    pub fn first(&self) -> Option<Card> {
        self.cards.first().copied()
    }

    pub fn value(&self) -> u8 {
        calculate_hand_value(&self.cards)
    }

    pub fn lowest_value(&self) -> u8 {
        calculate_lowest_value(&self.cards)
    }

    pub fn is_bust(&self) -> bool {
        is_busted(&self.cards)
    }

    pub fn is_blackjack(&self) -> bool {
        is_blackjack(&self.cards)
    }

    pub fn is_soft(&self) -> bool {
        is_soft_hand(&self.cards)
    }

    pub fn is_splittable(&self) -> bool {
        can_split_cards(&self.cards)
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Splits a pair into its two cards, leaving the hand empty. Returns `None` and leaves the hand
    /// untouched if it is not splittable.
    pub(crate) fn take_pair(&mut self) -> Option<(Card, Card)> {
        if !self.is_splittable() {
            return None;
        }
        let second = self.cards.pop()?;
        let first = self.cards.pop()?;
        Some((first, second))
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        write!(f, "{} ({})", cards, self.value())
    }
}
