use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;

use crate::data::Table;

#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("The dataset contains no rows")]
    EmptyDataset,

    #[error("Column '{column}' contains no numeric values")]
    InsufficientData { column: String },
}

/// One (date, value) pair taken from the first and last columns of a row
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Observation {
    /// Column 0 as displayed (ISO date when dates were parsed)
    pub label: String,
    pub date: Option<NaiveDate>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryStats {
    pub minimum: f64,
    pub maximum: f64,
    pub average: f64,
    /// Sample standard deviation (N-1); absent with fewer than 2 values
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct YearlyAverage {
    pub year: i32,
    pub average: f64,
    pub count: usize,
}

/// Per-calendar-year means, years strictly ascending
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct YearlyAggregate {
    pub entries: Vec<YearlyAverage>,
}

impl YearlyAggregate {
    pub fn years(&self) -> Vec<i32> {
        self.entries.iter().map(|e| e.year).collect()
    }

    pub fn averages(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.average).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CurrentSnapshot {
    pub value: f64,
    pub label: String,
    pub date: Option<NaiveDate>,
    /// Second-to-last value; absent when there is no previous period
    pub previous: Option<f64>,
    pub delta: Option<f64>,
}

/// Everything derived from a table in one pass
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Summary {
    pub current: CurrentSnapshot,
    pub stats: SummaryStats,
    pub yearly: Option<YearlyAggregate>,
    pub observations: Vec<Observation>,
    /// Rows skipped because their value cell was not numeric
    pub skipped_rows: usize,
}

/// Compute the snapshot, statistics and yearly view for a table
#[instrument(skip(table), fields(rows = table.len()))]
pub fn summarize(table: &Table) -> Result<Summary, AggregateError> {
    if table.is_empty() {
        return Err(AggregateError::EmptyDataset);
    }

    let observations = observations(table);
    let skipped_rows = table.len() - observations.len();
    if skipped_rows > 0 {
        warn!(
            "Ignoring {} rows without a numeric value in column '{}'",
            skipped_rows,
            table.value_header()
        );
    }

    let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
    let stats = summary_stats(&values).ok_or_else(|| AggregateError::InsufficientData {
        column: table.value_header().to_string(),
    })?;
    let current =
        current_snapshot(&observations).ok_or_else(|| AggregateError::InsufficientData {
            column: table.value_header().to_string(),
        })?;

    let yearly = if table.dates_parsed() {
        yearly_averages(&observations)
    } else {
        None
    };
    if yearly.is_none() {
        warn!(
            "No yearly aggregation: column '{}' holds no parseable dates",
            table.date_header()
        );
    }

    debug!(
        "Summarized {} observations (min={:.4}, max={:.4}, avg={:.4})",
        observations.len(),
        stats.minimum,
        stats.maximum,
        stats.average
    );

    Ok(Summary {
        current,
        stats,
        yearly,
        observations,
        skipped_rows,
    })
}

/// Zip the date column with the value column, skipping non-numeric values
pub fn observations(table: &Table) -> Vec<Observation> {
    let date_col = table.date_column().index();
    let value_col = table.value_column().index();

    table
        .rows()
        .iter()
        .filter_map(|row| {
            let value = row[value_col].as_f64()?;
            Some(Observation {
                label: row[date_col].to_string(),
                date: row[date_col].as_date(),
                value,
            })
        })
        .collect()
}

/// Minimum, maximum, mean and sample standard deviation; `None` for no values
pub fn summary_stats(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }

    let minimum = Statistics::min(values);
    let maximum = Statistics::max(values);
    // Running mean can drift an ulp past the extremes
    let average = Statistics::mean(values).clamp(minimum, maximum);
    let std_dev = (values.len() > 1).then(|| Statistics::std_dev(values));

    Some(SummaryStats {
        minimum,
        maximum,
        average,
        std_dev,
    })
}

/// Last observation, with the one before it as the previous period
pub fn current_snapshot(observations: &[Observation]) -> Option<CurrentSnapshot> {
    let (last, rest) = observations.split_last()?;
    let previous = rest.last().map(|o| o.value);

    Some(CurrentSnapshot {
        value: last.value,
        label: last.label.clone(),
        date: last.date,
        previous,
        delta: previous.map(|p| last.value - p),
    })
}

/// Mean value per calendar year; `None` when no observation carries a date
pub fn yearly_averages(observations: &[Observation]) -> Option<YearlyAggregate> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for obs in observations {
        if let Some(date) = obs.date {
            by_year.entry(date.year()).or_default().push(obs.value);
        }
    }

    if by_year.is_empty() {
        return None;
    }

    let entries = by_year
        .into_iter()
        .map(|(year, values)| YearlyAverage {
            year,
            average: Statistics::mean(&values),
            count: values.len(),
        })
        .collect();

    Some(YearlyAggregate { entries })
}
