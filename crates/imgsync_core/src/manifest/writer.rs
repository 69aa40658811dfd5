//! Per-folder URL manifest generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ManifestSettings;
use crate::models::ManifestRow;
use crate::staging::discover_images;

use super::tabular::TabularWriter;
use super::url::CdnUrlTemplate;
use super::{ManifestError, ManifestResult};

/// A written manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOutput {
    pub path: PathBuf,
    pub rows: usize,
}

/// Builds and writes `<folder><suffix>.<ext>` tables of CDN URLs.
pub struct ManifestWriter {
    template: CdnUrlTemplate,
    header: [String; 3],
    suffix: String,
    writer: Arc<dyn TabularWriter>,
}

impl ManifestWriter {
    pub fn new(template: CdnUrlTemplate, writer: Arc<dyn TabularWriter>) -> Self {
        let defaults = ManifestSettings::default();
        Self {
            template,
            header: [
                defaults.name_header,
                defaults.placeholder_header,
                defaults.url_header,
            ],
            suffix: defaults.suffix,
            writer,
        }
    }

    /// Apply header labels and file suffix from settings.
    pub fn with_settings(mut self, settings: &ManifestSettings) -> Self {
        self.header = [
            settings.name_header.clone(),
            settings.placeholder_header.clone(),
            settings.url_header.clone(),
        ];
        self.suffix = settings.suffix.clone();
        self
    }

    pub fn template(&self) -> &CdnUrlTemplate {
        &self.template
    }

    /// Manifest file path for `folder_name` inside `repository_root`.
    pub fn output_path(&self, repository_root: &Path, folder_name: &str) -> PathBuf {
        repository_root.join(format!(
            "{}{}.{}",
            folder_name,
            self.suffix,
            self.writer.extension()
        ))
    }

    /// Rows for every image under `repository_root/folder_name`, sorted by
    /// relative path.
    pub fn rows_for(
        &self,
        repository_root: &Path,
        folder_name: &str,
    ) -> ManifestResult<Vec<ManifestRow>> {
        let folder = repository_root.join(folder_name);
        if !folder.is_dir() {
            return Err(ManifestError::FolderMissing(folder));
        }

        let mut relative: Vec<PathBuf> = discover_images(&folder)
            .map_err(|e| ManifestError::io("scanning", &folder, e))?
            .into_iter()
            .filter_map(|p| p.strip_prefix(repository_root).ok().map(Path::to_path_buf))
            .collect();
        relative.sort();

        Ok(relative
            .iter()
            .map(|rel| {
                let name = rel
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                ManifestRow::new(name, self.template.url_for(rel))
            })
            .collect())
    }

    /// Build the rows for a synced folder and write them, replacing any
    /// earlier manifest of the same name.
    pub fn write_folder(
        &self,
        repository_root: &Path,
        folder_name: &str,
    ) -> ManifestResult<ManifestOutput> {
        let rows = self.rows_for(repository_root, folder_name)?;
        let path = self.output_path(repository_root, folder_name);
        let header = [
            self.header[0].as_str(),
            self.header[1].as_str(),
            self.header[2].as_str(),
        ];

        self.writer.write(&path, header, &rows)?;
        tracing::debug!("Wrote {} manifest rows to {}", rows.len(), path.display());

        Ok(ManifestOutput {
            path,
            rows: rows.len(),
        })
    }
}
