//! Rate card pricing: client rate derivation from a desired margin, fixed
//! rate evaluation against a target margin, and the multi-position session.

pub mod domain;
pub mod engine;
pub mod format;
mod positions;
mod recommendation;
mod summary;

pub use domain::{sanitize_amount, Location, LocationMap, RateTable, RoleRecord, UnknownLocation};
pub use engine::{
    achieved_margin, client_rate, evaluate, evaluate_record, quote, quote_record, Calculation,
    CalculationError, CalculationInput, CalculationRequest, EvaluationResult, LocationEvaluation,
    LocationQuote, PricingMode, QuoteResult, UnknownPricingMode, ValidationError,
};
pub use format::{format_currency, format_percentage, format_rate_or_na, format_whole_percentage};
pub use positions::{Position, PositionBook};
pub use recommendation::recommend;
pub use summary::{LocationScenario, PortfolioSummary};
