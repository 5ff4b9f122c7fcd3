//! nutriscan — decode a product barcode, look it up in Open Food Facts, and ask an LLM about it.

pub mod barcode;
pub mod catalog;
pub mod config;
pub mod generation;
pub mod insight;
pub mod pipeline;
pub mod types;

pub use barcode::{scan_file, BarcodeDecoder, BarcodeError, RxingDecoder};
pub use catalog::{CatalogClient, LookupError};
pub use config::{Overrides, Settings};
pub use generation::{create_generator, Backend, GenerationError, GeneratorConfig, TextGenerator};
pub use insight::{build_prompt, generate_insight};
pub use pipeline::{Pipeline, PipelineError};
pub use types::*;
