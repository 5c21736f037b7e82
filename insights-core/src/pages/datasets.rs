//! Dataset management: list, upload, activate, delete.

use std::path::PathBuf;

use bytes::Bytes;

use super::PageContext;
use crate::api::DatasetUpload;
use crate::error::{ErrorKind, InsightsError};
use crate::models::DatasetListing;
use crate::render;
use crate::surface::{Level, Region};

pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this dataset? This action cannot be undone.";

/// The upload form: a file plus optional name and description.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UploadRequest {
    /// The name field, or the file name without its extension when blank.
    pub fn resolved_name(&self) -> Option<String> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => self
                .file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .filter(|stem| !stem.is_empty()),
        }
    }
}

pub struct DatasetsPage<'a> {
    ctx: PageContext<'a>,
    listing: Option<DatasetListing>,
}

impl<'a> DatasetsPage<'a> {
    pub fn new(ctx: PageContext<'a>) -> Self {
        Self { ctx, listing: None }
    }

    pub fn listing(&self) -> Option<&DatasetListing> {
        self.listing.as_ref()
    }

    /// Fetch and render the dataset list; failures render a banner.
    pub async fn load(&mut self) {
        match self.ctx.api.list_datasets().await {
            Ok(listing) => {
                self.ctx.surface.render(Region::Datasets, &render::datasets(&listing));
                self.listing = Some(listing);
            }
            Err(e) => {
                let banner = match e.kind() {
                    ErrorKind::Api => "Failed to load datasets",
                    ErrorKind::Network => "Network error",
                };
                self.ctx.surface.render(Region::Datasets, banner);
            }
        }
    }

    /// Validate the form, upload, and refresh. Invalid forms issue no request.
    pub async fn upload(&mut self, request: UploadRequest) -> Result<bool, InsightsError> {
        let name = request.resolved_name().ok_or_else(|| {
            InsightsError::Validation("a dataset name is required".to_string())
        })?;
        if !request.file.is_file() {
            return Err(InsightsError::Validation(format!(
                "{} is not a readable file",
                request.file.display()
            )));
        }
        let contents = tokio::fs::read(&request.file).await?;
        let file_name = request
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());

        let upload = DatasetUpload {
            file_name,
            contents: Bytes::from(contents),
            name,
            description: request.description.unwrap_or_default(),
        };

        let result = {
            let _overlay = self.ctx.overlay("Uploading dataset...");
            self.ctx.api.upload_dataset(upload).await
        };

        match result {
            Ok(_) => {
                self.ctx.toast(Level::Success, "Dataset uploaded successfully");
                self.load().await;
                Ok(true)
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to upload dataset"));
                Ok(false)
            }
        }
    }

    pub async fn activate(&mut self, id: &str) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Activating dataset...");
            self.ctx.api.activate_dataset(id).await
        };

        match result {
            Ok(_) => {
                self.ctx.toast(Level::Success, "Dataset activated successfully");
                self.load().await;
                true
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to activate dataset"));
                false
            }
        }
    }

    /// Asks for confirmation first; declining sends nothing.
    pub async fn delete(&mut self, id: &str) -> bool {
        if !self.ctx.surface.confirm(DELETE_PROMPT) {
            return false;
        }

        let result = {
            let _overlay = self.ctx.overlay("Deleting dataset...");
            self.ctx.api.delete_dataset(id).await
        };

        match result {
            Ok(_) => {
                self.ctx.toast(Level::Success, "Dataset deleted successfully");
                self.load().await;
                true
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to delete dataset"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_defaults_to_file_stem() {
        let request = UploadRequest {
            file: PathBuf::from("/data/superstore_2024.csv"),
            name: Some("   ".to_string()),
            description: None,
        };
        assert_eq!(request.resolved_name().as_deref(), Some("superstore_2024"));
    }

    #[test]
    fn test_explicit_name_wins() {
        let request = UploadRequest {
            file: PathBuf::from("q3.xlsx"),
            name: Some(" Q3 Sales ".to_string()),
            description: None,
        };
        assert_eq!(request.resolved_name().as_deref(), Some("Q3 Sales"));
    }
}
