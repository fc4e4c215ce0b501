use crate::domain::model::VinRecord;
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const VIN_COLUMN: &str = "VIN";

/// Streams `VinRecord`s from a CSV source with a header row.
pub struct VinReader<R: Read> {
    reader: csv::Reader<R>,
    vin_index: usize,
}

impl VinReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            EtlError::input(format!("cannot open '{}': {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }
}

impl<R: Read> VinReader<R> {
    pub fn from_reader(source: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| EtlError::input(format!("cannot read header row: {}", e)))?;

        let vin_index = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == VIN_COLUMN)
            .ok_or_else(|| {
                EtlError::input(format!("header row has no '{}' column", VIN_COLUMN))
            })?;

        tracing::debug!("VIN column found at index {}", vin_index);

        Ok(Self { reader, vin_index })
    }

    /// Lazy, single-pass iterator over the data rows in file order.
    pub fn records(self) -> impl Iterator<Item = Result<VinRecord>> {
        let vin_index = self.vin_index;
        self.reader.into_records().map(move |row| {
            let row = row.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                EtlError::input(format!("malformed CSV at line {}: {}", line, e))
            })?;
            let vin = row.get(vin_index).unwrap_or("").trim();
            Ok(VinRecord::new(vin))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn collect(csv: &str) -> Result<Vec<String>> {
        VinReader::from_reader(csv.as_bytes())?
            .records()
            .map(|r| r.map(|rec| rec.vin))
            .collect()
    }

    #[test]
    fn test_reads_vins_in_file_order() {
        let vins = collect("VIN\n1N4AZ0CP5DC310000\n1FA6P8TH5K5100000\n").unwrap();
        assert_eq!(vins, vec!["1N4AZ0CP5DC310000", "1FA6P8TH5K5100000"]);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let vins = collect("Owner,VIN,Color\nalice, 5YJ3E1EA7KF000001 ,red\nbob,JTDKARFU0K3000002,blue\n")
            .unwrap();
        assert_eq!(vins, vec!["5YJ3E1EA7KF000001", "JTDKARFU0K3000002"]);
    }

    #[test]
    fn test_missing_vin_column_is_input_error() {
        let err = VinReader::from_reader("Serial,Make\n1,Ford\n".as_bytes())
            .err()
            .unwrap();
        assert!(matches!(err, EtlError::InputError { .. }));
    }

    #[test]
    fn test_byte_order_mark_on_header() {
        let vins = collect("\u{feff}VIN\nWBA000000000000\n").unwrap();
        assert_eq!(vins, vec!["WBA000000000000"]);
    }

    #[test]
    fn test_header_only_yields_nothing() {
        assert!(collect("VIN\n").unwrap().is_empty());
    }

    #[test]
    fn test_open_missing_file_is_input_error() {
        let err = VinReader::open("/definitely/not/here/VIN_List.csv")
            .err()
            .unwrap();
        assert!(matches!(err, EtlError::InputError { .. }));
    }

    #[test]
    fn test_open_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"VIN\nABC\nDEF\n").unwrap();

        let count = VinReader::open(file.path()).unwrap().records().count();
        assert_eq!(count, 2);
    }
}
