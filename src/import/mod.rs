mod csv_export;
mod csv_import;

pub(crate) use csv_export::export_to_csv;
pub(crate) use csv_import::{skip_duplicates, CsvImporter};
