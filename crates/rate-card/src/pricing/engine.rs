use super::domain::{Location, LocationMap, RateTable, RoleRecord, UnknownLocation};
use super::recommendation::recommend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which margin parameter a calculation is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Derive a client rate from cost and a desired margin.
    #[default]
    DesiredMargin,
    /// Evaluate a role's fixed client rate against a target margin.
    TargetMargin,
}

impl PricingMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DesiredMargin => "Desired Margin",
            Self::TargetMargin => "Target Margin",
        }
    }

    pub fn calculate(
        self,
        table: &RateTable,
        input: &CalculationInput,
    ) -> Result<Calculation, CalculationError> {
        match self {
            Self::DesiredMargin => quote(table, input).map(Calculation::Quote),
            Self::TargetMargin => evaluate(table, input).map(Calculation::Evaluation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pricing mode '{0}': expected desired_margin or target_margin")]
pub struct UnknownPricingMode(pub String);

impl FromStr for PricingMode {
    type Err = UnknownPricingMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "desired_margin" | "desired" => Ok(Self::DesiredMargin),
            "target_margin" | "target" => Ok(Self::TargetMargin),
            _ => Err(UnknownPricingMode(value.trim().to_string())),
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Form-level input prior to validation. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub hours: Option<f64>,
    #[serde(default)]
    pub margin: Option<f64>,
}

impl CalculationRequest {
    pub fn validate(&self) -> Result<CalculationInput, ValidationError> {
        let role = self
            .role
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .ok_or(ValidationError::MissingRole)?;
        let location = self
            .location
            .as_deref()
            .filter(|location| !location.trim().is_empty())
            .ok_or(ValidationError::MissingLocation)?
            .parse::<Location>()?;
        let hours = self.hours.ok_or(ValidationError::MissingHours)?;
        let margin = self.margin.ok_or(ValidationError::MissingMargin)?;

        CalculationInput::new(role, location, hours, margin)
    }
}

/// Validated calculation input. `margin` is the desired margin in
/// [`PricingMode::DesiredMargin`] and the target margin otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationInput {
    pub role: String,
    pub location: Location,
    pub hours: f64,
    pub margin: f64,
}

impl CalculationInput {
    pub fn new(
        role: impl Into<String>,
        location: Location,
        hours: f64,
        margin: f64,
    ) -> Result<Self, ValidationError> {
        let role = role.into().trim().to_string();
        if role.is_empty() {
            return Err(ValidationError::MissingRole);
        }
        if !hours.is_finite() || hours <= 0.0 {
            return Err(ValidationError::InvalidHours(hours));
        }
        if !margin.is_finite() || !(0.0..1.0).contains(&margin) {
            return Err(ValidationError::MarginOutOfRange(margin));
        }

        Ok(Self {
            role,
            location,
            hours,
            margin,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("role is required")]
    MissingRole,
    #[error("location is required")]
    MissingLocation,
    #[error(transparent)]
    UnknownLocation(#[from] UnknownLocation),
    #[error("hours are required")]
    MissingHours,
    #[error("hours must be a positive number, got {0}")]
    InvalidHours(f64),
    #[error("margin is required")]
    MissingMargin,
    #[error("margin must be at least 0 and below 1, got {0}")]
    MarginOutOfRange(f64),
    #[error("role '{0}' has no fixed client rate to evaluate")]
    MissingClientRate(String),
    #[error("malformed request body: {0}")]
    MalformedRequest(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("role '{0}' not found in rate table")]
    RoleNotFound(String),
}

/// Client rate that yields `desired_margin` over `cost`. Locations with no
/// cost are not offered and price at zero.
pub fn client_rate(cost: f64, desired_margin: f64) -> f64 {
    if cost > 0.0 {
        cost / (1.0 - desired_margin)
    } else {
        0.0
    }
}

/// Margin retained at `rate`, or `None` when there is no rate to divide by.
pub fn achieved_margin(rate: f64, cost: f64) -> Option<f64> {
    (rate > 0.0).then(|| (rate - cost) / rate)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationQuote {
    pub cost: f64,
    pub client_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achieved_margin: Option<f64>,
}

/// Desired-margin calculation for one role at one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteResult {
    pub role: String,
    pub location: Location,
    pub hours: f64,
    pub desired_margin: f64,
    pub cost: f64,
    pub client_rate: f64,
    pub total_cost: f64,
    pub comparison: LocationMap<LocationQuote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationEvaluation {
    pub cost: f64,
    pub margin: f64,
    pub meets_target: bool,
}

/// Target-margin evaluation of a role's fixed client rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub role: String,
    pub location: Location,
    pub hours: f64,
    pub target_margin: f64,
    pub client_rate: f64,
    pub cost: f64,
    pub margin: f64,
    pub meets_target: bool,
    /// Hours times the selected location's cost, not the client rate.
    pub total_cost: f64,
    pub comparison: LocationMap<LocationEvaluation>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Calculation {
    #[serde(rename = "desired_margin")]
    Quote(QuoteResult),
    #[serde(rename = "target_margin")]
    Evaluation(EvaluationResult),
}

pub fn quote(table: &RateTable, input: &CalculationInput) -> Result<QuoteResult, CalculationError> {
    let record = lookup(table, &input.role)?;
    Ok(quote_record(record, input))
}

pub fn evaluate(
    table: &RateTable,
    input: &CalculationInput,
) -> Result<EvaluationResult, CalculationError> {
    let record = lookup(table, &input.role)?;
    evaluate_record(record, input)
}

pub fn quote_record(record: &RoleRecord, input: &CalculationInput) -> QuoteResult {
    let desired_margin = input.margin;
    let comparison = record.costs.map(|_, &cost| {
        let rate = client_rate(cost, desired_margin);
        LocationQuote {
            cost,
            client_rate: rate,
            achieved_margin: achieved_margin(rate, cost),
        }
    });
    let selected = *comparison.get(input.location);

    QuoteResult {
        role: record.role.clone(),
        location: input.location,
        hours: input.hours,
        desired_margin,
        cost: selected.cost,
        client_rate: selected.client_rate,
        total_cost: input.hours * selected.client_rate,
        comparison,
    }
}

pub fn evaluate_record(
    record: &RoleRecord,
    input: &CalculationInput,
) -> Result<EvaluationResult, CalculationError> {
    let client_rate = record
        .client_rate
        .filter(|rate| *rate > 0.0)
        .ok_or_else(|| ValidationError::MissingClientRate(record.role.clone()))?;
    let target_margin = input.margin;

    let comparison = record.costs.map(|_, &cost| {
        let margin = (client_rate - cost) / client_rate;
        LocationEvaluation {
            cost,
            margin,
            meets_target: margin >= target_margin && cost > 0.0,
        }
    });

    let meets_target = comparison.map(|_, entry| entry.meets_target);
    let margins = comparison.map(|_, entry| entry.margin);
    let recommendation = recommend(&meets_target, &margins, target_margin);
    let selected = *comparison.get(input.location);

    Ok(EvaluationResult {
        role: record.role.clone(),
        location: input.location,
        hours: input.hours,
        target_margin,
        client_rate,
        cost: selected.cost,
        margin: selected.margin,
        meets_target: selected.meets_target,
        total_cost: input.hours * selected.cost,
        comparison,
        recommendation,
    })
}

fn lookup<'a>(table: &'a RateTable, role: &str) -> Result<&'a RoleRecord, CalculationError> {
    table
        .find(role)
        .ok_or_else(|| CalculationError::RoleNotFound(role.to_string()))
}
