//! Tabular housing data in comma-separated form.
//!
//! Columns are matched by header name, so their order is free and extra
//! columns are ignored. The training target `median_house_value` is kept
//! when present for offline evaluation.

use crate::error::{InferenceError, Result};
use crate::record::{
    parse_numeric, Category, HousingRecord, CATEGORICAL_FIELD, NUMERIC_FIELDS, TARGET_FIELD,
};
use std::io::{Read, Write};

/// Records parsed from a tabular file.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<HousingRecord>,

    /// Target values, when the file carries the target column
    pub targets: Option<Vec<f64>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn csv_error(e: csv::Error) -> InferenceError {
    InferenceError::InvalidInput(e.to_string())
}

/// Parse a CSV document with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| InferenceError::malformed(0, format!("missing column `{name}`")))
    };
    let mut numeric_idx = [0usize; 8];
    for (slot, name) in numeric_idx.iter_mut().zip(NUMERIC_FIELDS) {
        *slot = column(name)?;
    }
    let category_idx = column(CATEGORICAL_FIELD)?;
    let target_idx = headers.iter().position(|h| h == TARGET_FIELD);

    let mut dataset = Dataset {
        records: Vec::new(),
        targets: target_idx.map(|_| Vec::new()),
    };

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let mut numeric = [f64::NAN; 8];
        for ((value, &idx), name) in numeric.iter_mut().zip(&numeric_idx).zip(NUMERIC_FIELDS) {
            *value = parse_numeric(name, cell(idx)).map_err(|e| e.at_row(row))?;
        }
        let category = Category::parse_required(cell(category_idx)).map_err(|e| e.at_row(row))?;
        dataset
            .records
            .push(HousingRecord::from_values(numeric, category));

        if let (Some(idx), Some(targets)) = (target_idx, dataset.targets.as_mut()) {
            targets.push(parse_target(cell(idx)).map_err(|e| e.at_row(row))?);
        }
    }

    Ok(dataset)
}

/// Targets are never imputed: a blank or `NaN` cell is a malformed row.
fn parse_target(raw: &str) -> Result<f64> {
    let value = parse_numeric(TARGET_FIELD, raw)?;
    if value.is_nan() {
        return Err(InferenceError::malformed(0, format!("missing target `{TARGET_FIELD}`")));
    }
    Ok(value)
}

/// Write `row,predicted_value` lines with a header.
pub fn write_predictions<W: Write>(writer: W, predictions: &[f64]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["row", "predicted_value"]).map_err(csv_error)?;
    for (row, value) in predictions.iter().enumerate() {
        wtr.write_record([row.to_string(), format!("{value:.2}")])
            .map_err(csv_error)?;
    }
    wtr.flush()
        .map_err(|e| InferenceError::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::OceanProximity;

    const HEADER: &str = "longitude,latitude,housing_median_age,total_rooms,total_bedrooms,\
                          population,households,median_income,median_house_value,ocean_proximity";

    #[test]
    fn test_read_csv_with_target() {
        let data = format!(
            "{HEADER}\n-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,NEAR BAY\n\
             -122.22,37.86,21.0,7099.0,1106.0,2401.0,1138.0,8.3014,358500.0,NEAR BAY\n"
        );
        let ds = read_csv(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].total_rooms, 7099.0);
        assert_eq!(ds.records[0].ocean_proximity, Category::Known(OceanProximity::NearBay));
        assert_eq!(ds.targets, Some(vec![452600.0, 358500.0]));
    }

    #[test]
    fn test_read_csv_reordered_without_target() {
        let data = "ocean_proximity,median_income,households,population,total_bedrooms,\
                    total_rooms,housing_median_age,latitude,longitude,id\n\
                    INLAND,3.2,750,1800,800,4500,15,36.78,-119.56,a1\n";
        let ds = read_csv(data.as_bytes()).unwrap();
        assert!(ds.targets.is_none());
        let r = &ds.records[0];
        assert_eq!(r.longitude, -119.56);
        assert_eq!(r.median_income, 3.2);
        assert_eq!(r.ocean_proximity, Category::Known(OceanProximity::Inland));
    }

    #[test]
    fn test_read_csv_empty_cell_is_missing() {
        let data =
            format!("{HEADER}\n-122.23,37.88,41.0,880.0,,322.0,126.0,8.3252,452600.0,NEAR BAY\n");
        let ds = read_csv(data.as_bytes()).unwrap();
        assert!(ds.records[0].total_bedrooms.is_nan());
    }

    #[test]
    fn test_read_csv_blank_target_is_malformed() {
        for target in ["", "NaN"] {
            let data = format!(
                "{HEADER}\n-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,NEAR BAY\n\
                 -122.22,37.86,21.0,7099.0,1106.0,2401.0,1138.0,8.3014,{target},NEAR BAY\n"
            );
            match read_csv(data.as_bytes()).unwrap_err() {
                InferenceError::MalformedRecord { row, reason } => {
                    assert_eq!(row, 1);
                    assert!(reason.contains("missing target"), "{reason}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_read_csv_blank_category_is_malformed() {
        let data =
            format!("{HEADER}\n-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,\n");
        let err = read_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedRecord { row: 0, .. }));
    }

    #[test]
    fn test_read_csv_infinite_cell_is_malformed() {
        let data = format!(
            "{HEADER}\n-122.23,37.88,41.0,880.0,129.0,inf,126.0,8.3252,452600.0,NEAR BAY\n"
        );
        let err = read_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedRecord { row: 0, .. }));
    }

    #[test]
    fn test_read_csv_missing_column() {
        let data = "longitude,latitude\n1,2\n";
        match read_csv(data.as_bytes()).unwrap_err() {
            InferenceError::MalformedRecord { reason, .. } => {
                assert!(reason.contains("housing_median_age"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_csv_bad_cell_reports_row() {
        let data = format!(
            "{HEADER}\n-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,NEAR BAY\n\
             -122.22,37.86,old,7099.0,1106.0,2401.0,1138.0,8.3014,358500.0,NEAR BAY\n"
        );
        let err = read_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedRecord { row: 1, .. }));
    }

    #[test]
    fn test_read_csv_ragged_row_is_invalid() {
        let data = format!("{HEADER}\n1,2,3\n");
        assert!(matches!(read_csv(data.as_bytes()), Err(InferenceError::InvalidInput(_))));
    }

    #[test]
    fn test_write_predictions() {
        let mut out = Vec::new();
        write_predictions(&mut out, &[452600.0, 1.25]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "row,predicted_value\n0,452600.00\n1,1.25\n");
    }
}
