use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::Deserialize;
use tracing::{debug, info};

use crate::dataset::PopulationRecord;
use crate::error::LoadError;

/// Where a pass gets its table from. Every call is a fresh load.
pub trait TableSource {
    fn load(&self) -> Result<Vec<PopulationRecord>, LoadError>;
}

/// A delimited file on disk in a fixed text encoding.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
    pub encoding: &'static Encoding,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, encoding: &'static Encoding) -> Self {
        CsvSource {
            path: path.into(),
            encoding,
        }
    }
}

impl TableSource for CsvSource {
    fn load(&self) -> Result<Vec<PopulationRecord>, LoadError> {
        load_population_csv(&self.path, self.encoding)
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "都道府県名")]
    prefecture: String,
    #[serde(rename = "西暦（年）")]
    year: String,
    #[serde(rename = "人口（総数）")]
    total: String,
    #[serde(rename = "人口（男）")]
    male: String,
    #[serde(rename = "人口（女）")]
    female: String,
}

/// Coerce a population cell. Any finite number is kept as is, sentinels such
/// as `-` or `…` become `None`.
pub fn coerce_population(cell: &str) -> Option<f64> {
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Load the whole table. Decoding is strict: a byte sequence that is not
/// valid in `encoding` fails the load instead of being replaced.
pub fn load_population_csv(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<Vec<PopulationRecord>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(LoadError::Encoding {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        });
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut records = Vec::<PopulationRecord>::new();
    let mut missing_cells = 0usize;
    for (index, result) in rdr.deserialize::<RawRow>().enumerate() {
        let raw = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let year = raw.year.parse::<i32>().map_err(|_| LoadError::InvalidYear {
            path: path.to_path_buf(),
            record: index + 1,
            value: raw.year.clone(),
        })?;
        let record = PopulationRecord {
            prefecture: raw.prefecture,
            year,
            total: coerce_population(&raw.total),
            male: coerce_population(&raw.male),
            female: coerce_population(&raw.female),
        };
        missing_cells += [record.total, record.male, record.female]
            .iter()
            .filter(|v| v.is_none())
            .count();
        records.push(record);
    }

    info!(path = %path.display(), rows = records.len(), "loaded population table");
    if missing_cells > 0 {
        debug!(missing_cells, "population cells coerced to missing");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_8};
    use std::io::Write;

    const HEADER: &str = "都道府県コード,都道府県名,元号,和暦（年）,西暦（年）,注,人口（総数）,人口（男）,人口（女）";

    fn write_sjis(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("c01.csv");
        let (bytes, _, unmappable) = SHIFT_JIS.encode(body);
        assert!(!unmappable);
        fs::File::create(&path).unwrap().write_all(&bytes).unwrap();
        path
    }

    #[test]
    fn coerces_numbers_and_sentinels() {
        assert_eq!(coerce_population("12345"), Some(12345.0));
        assert_eq!(coerce_population(" 42 "), Some(42.0));
        assert_eq!(coerce_population("1000.0"), Some(1000.0));
        assert_eq!(coerce_population("12.5"), Some(12.5));
        assert_eq!(coerce_population("-3"), Some(-3.0));
        assert_eq!(coerce_population("-"), None);
        assert_eq!(coerce_population("…"), None);
        assert_eq!(coerce_population(""), None);
        assert_eq!(coerce_population("1,234"), None);
        assert_eq!(coerce_population("NaN"), None);
        assert_eq!(coerce_population("inf"), None);
    }

    #[test]
    fn huge_cells_keep_their_magnitude() {
        assert_eq!(coerce_population("1e30"), Some(1e30));
        assert_eq!(
            coerce_population("18446744073709551615"),
            Some(18446744073709551615.0)
        );
    }

    #[test]
    fn loads_shift_jis_file_by_header_name() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\n13,東京都,令和,2,2020,,14047594,6898388,7149206\n27,大阪府,令和,2,2020,,8837685,4235956,4601729\n"
        );
        let path = write_sjis(&dir, &body);

        let records = load_population_csv(&path, SHIFT_JIS).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            PopulationRecord {
                prefecture: "東京都".to_string(),
                year: 2020,
                total: Some(14047594.0),
                male: Some(6898388.0),
                female: Some(7149206.0),
            }
        );
        assert_eq!(records[1].prefecture, "大阪府");
    }

    #[test]
    fn sentinel_cells_become_missing_without_failing_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\n01,北海道,大正,9,1920,,2359183,-,…\n");
        let path = write_sjis(&dir, &body);

        let records = load_population_csv(&path, SHIFT_JIS).unwrap();
        assert_eq!(records[0].total, Some(2359183.0));
        assert_eq!(records[0].male, None);
        assert_eq!(records[0].female, None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_population_csv(&dir.path().join("absent.csv"), SHIFT_JIS).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn wrong_encoding_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\n13,東京都,令和,2,2020,,1,1,0\n");
        let path = write_sjis(&dir, &body);

        let err = load_population_csv(&path, UTF_8).unwrap_err();
        assert!(matches!(err, LoadError::Encoding { encoding: "UTF-8", .. }));
    }

    #[test]
    fn unparseable_year_names_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\n13,東京都,令和,2,2020,,1,1,0\n13,東京都,令和,3,不詳,,1,1,0\n");
        let path = write_sjis(&dir, &body);

        match load_population_csv(&path, SHIFT_JIS).unwrap_err() {
            LoadError::InvalidYear { record, value, .. } => {
                assert_eq!(record, 2);
                assert_eq!(value, "不詳");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sjis(&dir, "都道府県名,西暦（年）\n東京都,2020\n");

        let err = load_population_csv(&path, SHIFT_JIS).unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utf8.csv");
        let body = format!("\u{feff}都道府県名,西暦（年）,人口（総数）,人口（男）,人口（女）\n沖縄県,2020,1467480,723560,743920\n");
        fs::write(&path, body).unwrap();

        let records = CsvSource::new(&path, UTF_8).load().unwrap();
        assert_eq!(records[0].prefecture, "沖縄県");
        assert_eq!(records[0].total, Some(1467480.0));
    }
}
