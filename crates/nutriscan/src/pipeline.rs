//! Sequential scan -> lookup -> insight run.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::barcode::{scan_file, BarcodeDecoder, BarcodeError};
use crate::catalog::{CatalogClient, LookupError};
use crate::generation::{GenerationError, TextGenerator};
use crate::insight::generate_insight;
use crate::types::{Barcode, DecodedBarcode, ProductRecord, Report};

/// A failed run, tagged with the stage that stopped it.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("scan failed: {0}")]
    Scan(#[from] BarcodeError),
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("insight failed: {0}")]
    Insight(#[from] GenerationError),
}

impl PipelineError {
    /// True when the run stopped because there was nothing to work with
    /// (no barcode in the image, or no product in the catalog).
    pub fn is_not_found(&self) -> bool {
        match self {
            PipelineError::Scan(e) => e.is_not_found(),
            PipelineError::Lookup(e) => e.is_not_found(),
            PipelineError::Insight(_) => false,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// The three steps wired together with explicitly constructed backends.
pub struct Pipeline {
    decoder: Box<dyn BarcodeDecoder>,
    catalog: CatalogClient,
    generator: Arc<dyn TextGenerator>,
    preferences: String,
    max_length: u32,
}

impl Pipeline {
    pub fn new(
        decoder: Box<dyn BarcodeDecoder>,
        catalog: CatalogClient,
        generator: Arc<dyn TextGenerator>,
        preferences: impl Into<String>,
        max_length: u32,
    ) -> Self {
        Self {
            decoder,
            catalog,
            generator,
            preferences: preferences.into(),
            max_length,
        }
    }

    pub fn preferences(&self) -> &str {
        &self.preferences
    }

    pub fn scan(&self, image: &Path) -> PipelineResult<DecodedBarcode> {
        Ok(scan_file(self.decoder.as_ref(), image)?)
    }

    pub async fn lookup(&self, barcode: &Barcode) -> PipelineResult<ProductRecord> {
        Ok(self.catalog.fetch_product(barcode).await?)
    }

    pub async fn insight(&self, product: &ProductRecord) -> PipelineResult<String> {
        Ok(generate_insight(
            self.generator.as_ref(),
            product,
            &self.preferences,
            self.max_length,
        )
        .await?)
    }

    /// Look up `barcode` and, only if the product exists, generate an insight.
    pub async fn run_from_barcode(&self, barcode: Barcode) -> PipelineResult<Report> {
        let product = self.lookup(&barcode).await?;
        let insight = self.insight(&product).await?;
        tracing::info!(barcode = %barcode, chars = insight.len(), "insight ready");
        Ok(Report {
            barcode,
            product,
            insight,
        })
    }

    /// Decode `image` and continue with the decoded barcode.
    pub async fn run_from_image(&self, image: &Path) -> PipelineResult<Report> {
        let decoded = self.scan(image)?;
        self.run_from_barcode(decoded.barcode).await
    }
}
