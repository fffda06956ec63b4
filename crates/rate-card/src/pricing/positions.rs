use super::domain::{RateTable, RoleRecord};
use super::engine::{quote_record, CalculationError, CalculationInput, QuoteResult};
use super::summary::PortfolioSummary;
use serde::Serialize;

/// A priced line item in a multi-position session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub id: u64,
    #[serde(flatten)]
    pub quote: QuoteResult,
    /// Rates the position was priced against, kept so table refreshes do not
    /// reprice existing positions.
    #[serde(skip)]
    pub(crate) record: RoleRecord,
}

impl Position {
    pub fn record(&self) -> &RoleRecord {
        &self.record
    }
}

/// Session-scoped, ordered collection of positions. Ids increase
/// monotonically for the lifetime of the book, including across `clear`.
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: Vec<Position>,
    last_id: u64,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price `input` against `table` and append it. Nothing is recorded when
    /// the lookup fails.
    pub fn add(
        &mut self,
        table: &RateTable,
        input: &CalculationInput,
    ) -> Result<&Position, CalculationError> {
        let record = table
            .find(&input.role)
            .ok_or_else(|| CalculationError::RoleNotFound(input.role.clone()))?;
        let quote = quote_record(record, input);

        self.last_id += 1;
        self.positions.push(Position {
            id: self.last_id,
            quote,
            record: record.clone(),
        });

        Ok(&self.positions[self.positions.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Option<Position> {
        let index = self.positions.iter().position(|position| position.id == id)?;
        Some(self.positions.remove(index))
    }

    /// Drop every position, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.positions.len();
        self.positions.clear();
        removed
    }

    pub fn get(&self, id: u64) -> Option<&Position> {
        self.positions.iter().find(|position| position.id == id)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::from_positions(&self.positions)
    }
}
