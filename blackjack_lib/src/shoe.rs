use crate::card::{standard_pack, Card};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Struct for the multi-pack draw source used at the table. The top of the shoe is the end of `cards`.
///
/// A shoe never runs dry: when a draw is requested on an empty shoe it is rebuilt from `num_packs` fresh packs
/// and reshuffled (if the shoe was configured as shuffled) before the card is returned.
#[derive(Debug, Clone)]
pub struct Shoe {
    cards: Vec<Card>,
    num_packs: usize,
    shuffled: bool,
    rng: StdRng,
}

impl Shoe {
    /// Associated method for creating a new shoe of `num_packs` standard packs seeded from system entropy.
    pub fn new(num_packs: usize, shuffled: bool) -> Shoe {
        Shoe::from_rng(num_packs, shuffled, StdRng::from_entropy())
    }

    /// Creates a shoe whose shuffles are fully determined by `seed`.
    pub fn with_seed(num_packs: usize, shuffled: bool, seed: u64) -> Shoe {
        Shoe::from_rng(num_packs, shuffled, StdRng::seed_from_u64(seed))
    }

    /// Creates a shoe that deals `cards` in the given order. Once they are used up the shoe refills
    /// from a single shuffled pack like any other shoe.
    pub fn stacked(cards: Vec<Card>) -> Shoe {
        let mut cards = cards;
        cards.reverse();
        Shoe {
            cards,
            num_packs: 1,
            shuffled: true,
            rng: StdRng::from_entropy(),
        }
    }

    fn from_rng(num_packs: usize, shuffled: bool, rng: StdRng) -> Shoe {
        let mut shoe = Shoe {
            cards: Vec::with_capacity(num_packs.max(1) * 52),
            num_packs: num_packs.max(1),
            shuffled,
            rng,
        };
        shoe.refill();
        shoe
    }

    /// Rebuilds the shoe from fresh packs, discarding whatever was left in it.
    pub fn refill(&mut self) {
        self.cards.clear();
        for _ in 0..self.num_packs {
            self.cards.extend(standard_pack());
        }
        if self.shuffled {
            self.cards.shuffle(&mut self.rng);
        }
    }

    /// Removes and returns the top card, refilling the shoe first if it is empty.
    pub fn draw(&mut self) -> Card {
        loop {
            if let Some(card) = self.cards.pop() {
                return card;
            }
            log::debug!("shoe exhausted, refilling {} packs", self.num_packs);
            self.refill();
        }
    }

    /// Number of cards left before the next refill.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn num_packs(&self) -> usize {
        self.num_packs
    }
}
