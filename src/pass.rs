//! One rendering pass: load, filter, aggregate, reshape.

use serde::Serialize;
use tracing::debug;

use crate::csv_reader::TableSource;
use crate::dataset::PopulationRecord;
use crate::error::LoadError;
use crate::view::{
    filter, to_long_form, trend_series, trend_slice, FilterOptions, FilteredView, LongRow,
    Selection, Totals, TrendSeries,
};

/// Everything a renderer needs for one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub selection: Selection,
    #[serde(skip)]
    pub options: FilterOptions,
    pub totals: Totals,
    pub filtered: FilteredView,
    pub long_form: Vec<LongRow>,
    pub trend: Vec<PopulationRecord>,
    pub trend_series: Vec<TrendSeries>,
}

pub fn compute(table: &[PopulationRecord], selection: &Selection) -> Dashboard {
    let filtered = filter(table, selection);
    let totals = Totals::of(&filtered);
    let long_form = to_long_form(&filtered);
    let trend = trend_slice(table, &selection.prefectures);
    let trend_series = trend_series(&trend);
    debug!(
        rows = table.len(),
        filtered = filtered.len(),
        trend = trend.len(),
        "computed pass"
    );
    Dashboard {
        selection: selection.clone(),
        options: FilterOptions::from_records(table),
        totals,
        filtered,
        long_form,
        trend,
        trend_series,
    }
}

/// Reload the table and recompute everything for `selection`.
pub fn run_pass<S: TableSource + ?Sized>(
    source: &S,
    selection: &Selection,
) -> Result<Dashboard, LoadError> {
    let table = source.load()?;
    Ok(compute(&table, selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting {
        loads: Cell<usize>,
        table: Vec<PopulationRecord>,
    }

    impl TableSource for Counting {
        fn load(&self) -> Result<Vec<PopulationRecord>, LoadError> {
            self.loads.set(self.loads.get() + 1);
            Ok(self.table.clone())
        }
    }

    fn rec(pref: &str, year: i32, total: f64) -> PopulationRecord {
        PopulationRecord {
            prefecture: pref.to_string(),
            year,
            total: Some(total),
            male: Some(total / 2.0),
            female: Some(total / 2.0),
        }
    }

    #[test]
    fn every_pass_reloads() {
        let source = Counting {
            loads: Cell::new(0),
            table: vec![rec("Tokyo", 2020, 100.0)],
        };
        let selection = Selection::new(["Tokyo"], 2020);
        run_pass(&source, &selection).unwrap();
        run_pass(&source, &selection).unwrap();
        assert_eq!(source.loads.get(), 2);
    }

    #[test]
    fn dashboard_combines_view_and_trend() {
        let table = vec![
            rec("Tokyo", 2015, 90.0),
            rec("Tokyo", 2020, 100.0),
            rec("Osaka", 2020, 80.0),
        ];
        let dashboard = compute(&table, &Selection::new(["Tokyo"], 2020));

        assert_eq!(dashboard.filtered.len(), 1);
        assert_eq!(dashboard.totals.total, 100.0);
        assert_eq!(dashboard.long_form.len(), 2);
        assert_eq!(dashboard.trend.len(), 2);
        assert_eq!(dashboard.trend_series[0].points, vec![(2015, 90.0), (2020, 100.0)]);
        assert_eq!(dashboard.options.prefectures, ["Tokyo", "Osaka"]);
    }

    #[test]
    fn serializes_for_the_report() {
        let table = vec![rec("Tokyo", 2020, 100.0)];
        let dashboard = compute(&table, &Selection::new(["Tokyo"], 2020));
        let json = serde_json::to_value(&dashboard).unwrap();

        assert_eq!(json["totals"]["total"], 100.0);
        assert_eq!(json["long_form"][1]["sex"], "female");
        assert_eq!(json["filtered"][0]["prefecture"], "Tokyo");
        assert!(json.get("options").is_none());
    }
}
