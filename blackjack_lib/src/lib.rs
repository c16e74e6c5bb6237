//! Rules engine for a multi-player game of blackjack.
//!
//! A `Table` owns the shoe, the dealer and the seated players and plays rounds through the
//! `BetProvider` and `DecisionProvider` seams. Strategies, scripts or people can sit behind those seams,
//! and a `Renderer` can watch each round through read-only `TableSnapshot`s.

pub mod card;
pub mod error;
pub mod hand;
pub mod participant;
pub mod provider;
pub mod render;
pub mod result;
pub mod rules;
pub mod shoe;
pub mod strategy;
pub mod table;

pub use card::{standard_pack, Card, Rank, Suit};
pub use error::BlackjackGameError;
pub use hand::Hand;
pub use participant::{Dealer, HandSlot, HandStatus, Player};
pub use result::{GameResult, HandOutcome, HandResult, PlayerResult};
pub use rules::{Rules, SplitFunding};
pub use shoe::Shoe;
pub use strategy::{Decision, HandView, Strategy};
pub use table::{Phase, Table};

pub mod prelude {
    pub use super::{
        provider::{
            BetProvider, DecisionProvider, FlatBet, ScriptedBets, ScriptedDecisions,
            StrategyDecisions,
        },
        render::{NullRenderer, Renderer, TableSnapshot},
        BlackjackGameError, Card, Dealer, Decision, GameResult, Hand, HandOutcome, Phase, Player,
        PlayerResult, Rank, Rules, Shoe, SplitFunding, Strategy, Suit, Table,
    };
}
