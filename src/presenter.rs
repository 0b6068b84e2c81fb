use serde::Serialize;
use utoipa::ToSchema;

use crate::aggregator::{Summary, SummaryStats};
use crate::data::{DateCoercion, Table};

pub const DASHBOARD_TITLE: &str = "WACC Analysis Dashboard";

/// Direction of the change since the previous period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// How a change should be coloured. Colours are inverted: a rising cost of
/// capital is unfavourable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Favorable,
    Unfavorable,
    Neutral,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Headline {
    pub label: String,
    pub value: f64,
    pub display: String,
    pub as_of: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChangeIndicator {
    pub label: String,
    pub previous: f64,
    pub delta: f64,
    pub display: String,
    pub trend: Trend,
    pub tone: Tone,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatRow {
    pub metric: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimeSeries {
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct YearlyBars {
    pub years: Vec<i32>,
    pub averages: Vec<f64>,
}

/// Everything the dashboard page needs to render
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardView {
    pub title: String,
    pub source_file: String,
    pub headline: Headline,
    pub change: Option<ChangeIndicator>,
    pub summary_table: Vec<StatRow>,
    pub series: TimeSeries,
    pub yearly: Option<YearlyBars>,
    pub date_column: String,
    pub value_column: String,
    pub columns: Vec<String>,
    /// Degraded states the page should surface instead of failing
    pub warnings: Vec<String>,
}

impl DashboardView {
    pub fn build(table: &Table, summary: &Summary) -> Self {
        let current = &summary.current;
        let source_file = table
            .source()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let headline = Headline {
            label: "Current WACC".to_string(),
            value: current.value,
            display: format_metric(current.value),
            as_of: current.label.clone(),
        };

        let change = current
            .previous
            .zip(current.delta)
            .map(|(previous, delta)| {
                let trend = trend_of(delta);
                ChangeIndicator {
                    label: "Change from Previous".to_string(),
                    previous,
                    delta,
                    display: format_metric(delta),
                    trend,
                    tone: inverse_tone(trend),
                }
            });

        let mut warnings = Vec::new();
        if change.is_none() {
            warnings.push(
                "Only one WACC value is available, so there is no previous period to compare against."
                    .to_string(),
            );
        }
        if summary.skipped_rows > 0 {
            warnings.push(format!(
                "{} row(s) without a numeric value in column '{}' were ignored.",
                summary.skipped_rows,
                table.value_header()
            ));
        }
        match table.date_coercion() {
            DateCoercion::Failed { row, value } => warnings.push(format!(
                "Column '{}' could not be read as dates (row {}: '{}'); the yearly comparison is unavailable.",
                table.date_header(),
                row,
                value
            )),
            DateCoercion::Parsed if summary.yearly.is_none() => warnings.push(format!(
                "Column '{}' contains no dates; the yearly comparison is unavailable.",
                table.date_header()
            )),
            DateCoercion::Parsed => {}
        }

        Self {
            title: DASHBOARD_TITLE.to_string(),
            source_file,
            headline,
            change,
            summary_table: stat_rows(&summary.stats),
            series: TimeSeries {
                dates: summary.observations.iter().map(|o| o.label.clone()).collect(),
                values: summary.observations.iter().map(|o| o.value).collect(),
            },
            yearly: summary.yearly.as_ref().map(|y| YearlyBars {
                years: y.years(),
                averages: y.averages(),
            }),
            date_column: table.date_header().to_string(),
            value_column: table.value_header().to_string(),
            columns: table.headers().to_vec(),
            warnings,
        }
    }
}

/// Four decimal places, no percentage sign
pub fn format_metric(value: f64) -> String {
    format!("{value:.4}")
}

fn stat_rows(stats: &SummaryStats) -> Vec<StatRow> {
    let row = |metric: &str, value: String| StatRow {
        metric: metric.to_string(),
        value,
    };
    vec![
        row("Minimum", format_metric(stats.minimum)),
        row("Maximum", format_metric(stats.maximum)),
        row("Average", format_metric(stats.average)),
        row(
            "Std Dev",
            stats.std_dev.map_or_else(|| "n/a".to_string(), format_metric),
        ),
    ]
}

fn trend_of(delta: f64) -> Trend {
    if delta > 0.0 {
        Trend::Up
    } else if delta < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    }
}

fn inverse_tone(trend: Trend) -> Tone {
    match trend {
        Trend::Up => Tone::Unfavorable,
        Trend::Down => Tone::Favorable,
        Trend::Flat => Tone::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::summarize;
    use crate::data::Cell;

    fn table(rows: &[(&str, f64)]) -> Table {
        Table::new(
            "data/wacc.xlsx",
            vec!["Date".into(), "Cost of Debt".into(), "WACC".into()],
            rows.iter()
                .map(|(d, v)| vec![Cell::Text(d.to_string()), Cell::Number(0.05), Cell::Number(*v)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_full_view() {
        let t = table(&[("2023-01-01", 0.08), ("2023-06-01", 0.09), ("2024-01-01", 0.10)]);
        let view = DashboardView::build(&t, &summarize(&t).unwrap());

        assert_eq!(view.title, DASHBOARD_TITLE);
        assert_eq!(view.source_file, "wacc.xlsx");
        assert_eq!(view.headline.display, "0.1000");
        assert_eq!(view.headline.as_of, "2024-01-01");

        let change = view.change.unwrap();
        assert_eq!(change.display, "0.0100");
        assert_eq!(change.trend, Trend::Up);
        assert_eq!(change.tone, Tone::Unfavorable);

        let metrics: Vec<&str> = view.summary_table.iter().map(|r| r.metric.as_str()).collect();
        assert_eq!(metrics, vec!["Minimum", "Maximum", "Average", "Std Dev"]);
        assert_eq!(view.summary_table[0].value, "0.0800");
        assert_eq!(view.summary_table[3].value, "0.0100");

        assert_eq!(view.series.dates, vec!["2023-01-01", "2023-06-01", "2024-01-01"]);
        assert_eq!(view.yearly.unwrap().years, vec![2023, 2024]);
        assert_eq!(view.columns, vec!["Date", "Cost of Debt", "WACC"]);
        assert_eq!(view.value_column, "WACC");
        assert!(view.warnings.is_empty());
    }

    #[test]
    fn test_falling_wacc_is_favorable() {
        let t = table(&[("2023-01-01", 0.09), ("2023-02-01", 0.08)]);
        let view = DashboardView::build(&t, &summarize(&t).unwrap());

        let change = view.change.unwrap();
        assert_eq!(change.trend, Trend::Down);
        assert_eq!(change.tone, Tone::Favorable);
        assert_eq!(change.display, "-0.0100");
    }

    #[test]
    fn test_degraded_states_become_warnings() {
        let t = table(&[("FY2023", 0.09)]);
        let view = DashboardView::build(&t, &summarize(&t).unwrap());

        assert!(view.change.is_none());
        assert!(view.yearly.is_none());
        assert_eq!(view.summary_table[3].value, "n/a");
        assert_eq!(view.warnings.len(), 2);
        assert!(view.warnings[0].contains("no previous period"));
        assert!(view.warnings[1].contains("FY2023"));
    }

    #[test]
    fn test_view_serializes_lowercase_enums() {
        let t = table(&[("2023-01-01", 0.08), ("2023-02-01", 0.08)]);
        let view = DashboardView::build(&t, &summarize(&t).unwrap());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["change"]["trend"], "flat");
        assert_eq!(json["change"]["tone"], "neutral");
    }
}
