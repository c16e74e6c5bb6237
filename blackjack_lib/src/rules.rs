use crate::error::BlackjackGameError;
use serde::{Deserialize, Serialize};

/// How the two hands created by a split are funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitFunding {
    /// Each new hand carries the pre-split bet, the extra stake comes out of the player's chips.
    MatchBet,
    /// The pre-split bet is divided evenly between the two new hands, no extra chips are staked.
    DivideBet,
}

/// Configurable table rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Number of 52 card packs in the shoe
    pub num_decks: usize,

    /// Shuffle the shoe whenever it is built
    pub shuffled: bool,

    /// Smallest accepted main bet
    pub min_bet: f64,

    /// Dealer hits a soft 17
    pub hit_on_soft_17: bool,

    /// Offer insurance when the dealer shows an ace
    pub insurance: bool,

    /// Maximum number of hands a player may hold after splitting
    pub max_hands: usize,

    pub split_funding: SplitFunding,

    /// Multiple of the bet won on a blackjack
    pub blackjack_payout: f64,

    /// Invalid responses tolerated from a provider before the round is abandoned.
    ///
    /// A rejected bet or decision is never fatal on its own, the provider is simply asked again. This cap
    /// is the one exception: once a single request has been rejected `max_reprompts` times the table
    /// refunds every stake, returns to `Idle` and reports `TooManyInvalidResponses`.
    pub max_reprompts: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            num_decks: 6,
            shuffled: true,
            min_bet: 5.0,
            hit_on_soft_17: false,
            insurance: true,
            max_hands: 4,
            split_funding: SplitFunding::MatchBet,
            blackjack_payout: 1.5,
            max_reprompts: 16,
        }
    }
}

impl Rules {
    /// Checks the rules for values no table could be run with.
    pub fn validate(&self) -> Result<(), BlackjackGameError> {
        if self.num_decks == 0 {
            return Err(BlackjackGameError::InvalidConfig(
                "the shoe needs at least one pack".to_string(),
            ));
        }
        if !(self.min_bet > 0.0) {
            return Err(BlackjackGameError::InvalidConfig(
                "minimum bet must be a positive amount".to_string(),
            ));
        }
        if self.max_hands == 0 {
            return Err(BlackjackGameError::InvalidConfig(
                "a player must be allowed at least one hand".to_string(),
            ));
        }
        if self.blackjack_payout < 0.0 {
            return Err(BlackjackGameError::InvalidConfig(
                "blackjack payout cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        let rules = Rules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.blackjack_payout, 1.5);
        assert!(!rules.hit_on_soft_17);
    }

    #[test]
    fn test_invalid_rules() {
        let rules = Rules {
            num_decks: 0,
            ..Rules::default()
        };
        assert!(rules.validate().is_err());

        let rules = Rules {
            min_bet: 0.0,
            ..Rules::default()
        };
        assert!(rules.validate().is_err());

        let rules = Rules {
            max_hands: 0,
            ..Rules::default()
        };
        assert!(rules.validate().is_err());
    }
}
