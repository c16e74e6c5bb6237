use crate::strategy::Decision;
use thiserror::Error;

/// Errors produced by the rules engine.
///
/// `InvalidBet` and `InvalidDecision` are recoverable: the table rejects the response and asks the provider
/// again. They only reach a caller once a provider has been re-prompted `Rules::max_reprompts` times.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlackjackGameError {
    #[error("invalid bet of {amount:.2}: minimum is {min_bet:.2} with {chips:.2} chips available")]
    InvalidBet { amount: f64, min_bet: f64, chips: f64 },
    #[error("invalid decision {decision}, legal decisions are {legal:?}")]
    InvalidDecision {
        decision: Decision,
        legal: Vec<Decision>,
    },
    #[error("provider gave {attempts} invalid responses in a row")]
    TooManyInvalidResponses { attempts: u32 },
    #[error("table is in the {actual} phase, expected {expected}")]
    WrongPhase { expected: String, actual: String },
    #[error("the table has no players")]
    NoPlayers,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
