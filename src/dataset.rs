use std::fmt;

use serde::Serialize;

pub const PREFECTURE_COLUMN: &str = "都道府県名";
pub const YEAR_COLUMN: &str = "西暦（年）";
pub const TOTAL_COLUMN: &str = "人口（総数）";
pub const MALE_COLUMN: &str = "人口（男）";
pub const FEMALE_COLUMN: &str = "人口（女）";

/// Column order used by the data table and the text report.
pub const COLUMNS: &[&str] = &[
    PREFECTURE_COLUMN,
    YEAR_COLUMN,
    TOTAL_COLUMN,
    MALE_COLUMN,
    FEMALE_COLUMN,
];

/// One row of the population table. `None` marks a cell that did not coerce
/// to a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationRecord {
    pub prefecture: String,
    pub year: i32,
    pub total: Option<f64>,
    pub male: Option<f64>,
    pub female: Option<f64>,
}

impl PopulationRecord {
    pub fn population(&self, sex: Sex) -> Option<f64> {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }

    /// Cell texts in [`COLUMNS`] order, missing values rendered empty.
    pub fn cells(&self) -> [String; 5] {
        let show = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        [
            self.prefecture.clone(),
            self.year.to_string(),
            show(self.total),
            show(self.male),
            show(self.female),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// The source column a long-form row was un-pivoted from.
    pub fn column(self) -> &'static str {
        match self {
            Sex::Male => MALE_COLUMN,
            Sex::Female => FEMALE_COLUMN,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "男",
            Sex::Female => "女",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_leave_missing_values_blank() {
        let record = PopulationRecord {
            prefecture: "東京都".to_string(),
            year: 2020,
            total: Some(100.0),
            male: None,
            female: Some(50.5),
        };
        assert_eq!(record.cells(), ["東京都", "2020", "100", "", "50.5"]);
        assert_eq!(record.population(Sex::Male), None);
        assert_eq!(record.population(Sex::Female), Some(50.5));
    }
}
