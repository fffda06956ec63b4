use super::domain::{Location, LocationMap};
use super::engine::{achieved_margin, client_rate};
use super::positions::Position;
use serde::Serialize;

/// What the whole book would bill if every position were staffed from one
/// location at its own desired margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LocationScenario {
    pub total: f64,
    /// Mean achieved margin over positions offered at this location; zero
    /// when none are.
    pub average_margin: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub positions: usize,
    pub total_hours: f64,
    /// Unweighted mean of per-position client rates.
    pub average_client_rate: f64,
    pub average_desired_margin: f64,
    pub selected_total: f64,
    pub scenarios: LocationMap<LocationScenario>,
}

impl PortfolioSummary {
    pub fn from_positions(positions: &[Position]) -> Self {
        if positions.is_empty() {
            return Self::default();
        }

        let count = positions.len() as f64;
        let total_hours = positions.iter().map(|p| p.quote.hours).sum();
        let average_client_rate =
            positions.iter().map(|p| p.quote.client_rate).sum::<f64>() / count;
        let average_desired_margin =
            positions.iter().map(|p| p.quote.desired_margin).sum::<f64>() / count;
        let selected_total = positions.iter().map(|p| p.quote.total_cost).sum();

        let scenarios = LocationMap::from_fn(|location| scenario(positions, location));

        Self {
            positions: positions.len(),
            total_hours,
            average_client_rate,
            average_desired_margin,
            selected_total,
            scenarios,
        }
    }
}

fn scenario(positions: &[Position], location: Location) -> LocationScenario {
    let mut total = 0.0;
    let mut margin_sum = 0.0;
    let mut offered = 0usize;

    for position in positions {
        let cost = position.record.cost(location);
        let rate = client_rate(cost, position.quote.desired_margin);
        total += position.quote.hours * rate;

        if let Some(margin) = achieved_margin(rate, cost) {
            margin_sum += margin;
            offered += 1;
        }
    }

    LocationScenario {
        total,
        average_margin: if offered > 0 {
            margin_sum / offered as f64
        } else {
            0.0
        },
    }
}
