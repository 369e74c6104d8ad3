//! Filtering, aggregation and reshaping of the population table.
//!
//! All functions here are pure: they take the loaded table and the current
//! selection and return owned values scoped to one pass.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::dataset::{PopulationRecord, Sex};

/// The user's current filter: a set of prefectures and exactly one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub prefectures: BTreeSet<String>,
    pub year: i32,
}

impl Selection {
    pub fn new<I, S>(prefectures: I, year: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection {
            prefectures: prefectures.into_iter().map(Into::into).collect(),
            year,
        }
    }
}

/// The values the sidebar offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Distinct names in first-appearance order.
    pub prefectures: Vec<String>,
    /// Distinct years, ascending.
    pub years: Vec<i32>,
}

impl FilterOptions {
    pub fn from_records(records: &[PopulationRecord]) -> Self {
        let mut prefectures: Vec<String> = Vec::new();
        for record in records {
            if !prefectures.contains(&record.prefecture) {
                prefectures.push(record.prefecture.clone());
            }
        }
        let years = records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        FilterOptions { prefectures, years }
    }

    /// First prefecture and the earliest year; `None` for an empty table.
    pub fn default_selection(&self) -> Option<Selection> {
        let prefecture = self.prefectures.first()?;
        let year = *self.years.first()?;
        Some(Selection::new([prefecture.as_str()], year))
    }
}

/// Records matching both the prefecture set and the year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilteredView {
    pub records: Vec<PopulationRecord>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn filter(table: &[PopulationRecord], selection: &Selection) -> FilteredView {
    let records = table
        .iter()
        .filter(|r| selection.prefectures.contains(&r.prefecture) && r.year == selection.year)
        .cloned()
        .collect();
    FilteredView { records }
}

/// Column sums over a view; missing cells count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total: f64,
    pub male: f64,
    pub female: f64,
}

impl Totals {
    pub fn of(view: &FilteredView) -> Self {
        let sum = |pick: fn(&PopulationRecord) -> Option<f64>| {
            view.records.iter().filter_map(pick).sum::<f64>()
        };
        Totals {
            total: sum(|r| r.total),
            male: sum(|r| r.male),
            female: sum(|r| r.female),
        }
    }
}

/// One un-pivoted cell: a record's male or female population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRow {
    pub prefecture: String,
    pub sex: Sex,
    pub population: Option<f64>,
}

/// Two rows per record, male then female, in record order.
pub fn to_long_form(view: &FilteredView) -> Vec<LongRow> {
    view.records
        .iter()
        .flat_map(|record| {
            Sex::ALL.into_iter().map(move |sex| LongRow {
                prefecture: record.prefecture.clone(),
                sex,
                population: record.population(sex),
            })
        })
        .collect()
}

/// Every year's records for the selected prefectures. Ignores the year filter.
pub fn trend_slice(
    table: &[PopulationRecord],
    prefectures: &BTreeSet<String>,
) -> Vec<PopulationRecord> {
    table
        .iter()
        .filter(|r| prefectures.contains(&r.prefecture))
        .cloned()
        .collect()
}

/// One line of the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub prefecture: String,
    /// `(year, total)` sorted by year.
    pub points: Vec<(i32, f64)>,
}

/// Group a trend slice into one series per prefecture. Records with a missing
/// total leave a gap.
pub fn trend_series(slice: &[PopulationRecord]) -> Vec<TrendSeries> {
    let mut series: Vec<TrendSeries> = Vec::new();
    for record in slice {
        let index = match series.iter().position(|s| s.prefecture == record.prefecture) {
            Some(index) => index,
            None => {
                series.push(TrendSeries {
                    prefecture: record.prefecture.clone(),
                    points: Vec::new(),
                });
                series.len() - 1
            }
        };
        if let Some(total) = record.total {
            series[index].points.push((record.year, total));
        }
    }
    for s in &mut series {
        s.points.sort_by_key(|&(year, _)| year);
    }
    series
}
