//! Spreadsheet output boundary.

use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::models::ManifestRow;

use super::ManifestError;

/// Writes a header row plus manifest rows as a single-sheet table.
pub trait TabularWriter: Send + Sync {
    /// File extension (without dot) of the produced files.
    fn extension(&self) -> &'static str;

    /// Write the table to `path`, replacing any existing file.
    fn write(&self, path: &Path, header: [&str; 3], rows: &[ManifestRow])
        -> Result<(), ManifestError>;
}

/// `.xlsx` output through `rust_xlsxwriter`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxTabularWriter;

impl TabularWriter for XlsxTabularWriter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn write(
        &self,
        path: &Path,
        header: [&str; 3],
        rows: &[ManifestRow],
    ) -> Result<(), ManifestError> {
        let tabular = |e: rust_xlsxwriter::XlsxError| ManifestError::tabular(path, e.to_string());

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, label) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *label).map_err(tabular)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.cells().iter().enumerate() {
                if !cell.is_empty() {
                    sheet.write_string(r, col as u16, *cell).map_err(tabular)?;
                }
            }
        }

        workbook.save(path).map_err(tabular)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    use parking_lot::Mutex;

    use super::TabularWriter;
    use crate::manifest::ManifestError;
    use crate::models::ManifestRow;

    /// One recorded table.
    #[derive(Debug, Clone)]
    pub struct WrittenTable {
        pub path: PathBuf,
        pub header: Vec<String>,
        pub rows: Vec<ManifestRow>,
    }

    /// Records tables in memory and touches the target file so existence
    /// checks behave like the real writer.
    #[derive(Default)]
    pub struct RecordingWriter {
        tables: Mutex<Vec<WrittenTable>>,
    }

    impl RecordingWriter {
        pub fn tables(&self) -> Vec<WrittenTable> {
            self.tables.lock().clone()
        }
    }

    impl TabularWriter for RecordingWriter {
        fn extension(&self) -> &'static str {
            "xlsx"
        }

        fn write(
            &self,
            path: &Path,
            header: [&str; 3],
            rows: &[ManifestRow],
        ) -> Result<(), ManifestError> {
            std::fs::write(path, b"")
                .map_err(|e| ManifestError::io("writing manifest", path, e))?;
            self.tables.lock().push(WrittenTable {
                path: path.to_path_buf(),
                header: header.iter().map(|h| h.to_string()).collect(),
                rows: rows.to_vec(),
            });
            Ok(())
        }
    }
}
