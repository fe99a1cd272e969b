//! Table IO: Parquet and CSV sources, CSV outputs

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use super::{DatasetError, RawRow};

/// Read a source table; `.parquet` files use the Parquet reader, anything else is CSV
pub fn read_table(path: &Path) -> Result<Vec<RawRow>, DatasetError> {
    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));

    let rows = if is_parquet {
        read_parquet(path)?
    } else {
        read_csv_rows(path)?
    };

    tracing::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_error(path: &Path, e: impl std::fmt::Display) -> DatasetError {
    DatasetError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> DatasetError {
    DatasetError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn field_value(field: &Field) -> Option<String> {
    match field {
        Field::Null => None,
        Field::Str(s) => Some(s.clone()),
        Field::Bytes(b) => Some(String::from_utf8_lossy(b.data()).into_owned()),
        other => Some(other.to_string()),
    }
}

fn read_parquet(path: &Path) -> Result<Vec<RawRow>, DatasetError> {
    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let reader = SerializedFileReader::new(file).map_err(|e| read_error(path, e))?;

    let mut rows = Vec::new();
    for row in reader.get_row_iter(None).map_err(|e| read_error(path, e))? {
        let row = row.map_err(|e| read_error(path, e))?;
        rows.push(
            row.get_column_iter()
                .map(|(name, field)| (name.clone(), field_value(field)))
                .collect(),
        );
    }

    Ok(rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>, DatasetError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| read_error(path, e))?;
    let headers = reader.headers().map_err(|e| read_error(path, e))?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| read_error(path, e))?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| {
                    let value = (!value.is_empty()).then(|| value.to_string());
                    (name.to_string(), value)
                })
                .collect(),
        );
    }

    Ok(rows)
}

/// Deserialize every row of a headed CSV file
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| read_error(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| read_error(path, e))
}

/// Write rows with a header line, creating parent directories
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| write_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ProductRecord;
    use tempfile::TempDir;

    #[test]
    fn test_csv_table_empty_fields_are_null() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("products.csv");
        std::fs::write(&path, "product_id,product_title\nB1,Dye\nB2,\n").unwrap();

        let rows = read_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["product_title"].as_deref(), Some("Dye"));
        assert_eq!(rows[1]["product_title"], None);
    }

    #[test]
    fn test_write_then_read_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/products.csv");
        let records = vec![ProductRecord {
            product_id: "B1".to_string(),
            product_title: Some("Black, glossy \"dye\"".to_string()),
            product_description: None,
            product_bullet_point: None,
            product_brand: Some("Revlon".to_string()),
            product_color: None,
            product_locale: Some("us".to_string()),
        }];

        write_csv(&path, &records).unwrap();
        let loaded: Vec<ProductRecord> = read_csv(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_missing_file() {
        let err = read_table(Path::new("/nonexistent/products.parquet")).unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
    }
}
