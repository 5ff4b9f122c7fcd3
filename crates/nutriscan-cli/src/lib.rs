//! Command-line front end for nutriscan.
//!
//! `main` only parses arguments and installs logging; everything else lives in
//! [`run`], which writes to caller-supplied streams and returns the exit code.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use nutriscan::{
    create_generator, Barcode, CatalogClient, LookupError, Overrides, Pipeline, PipelineError,
    ProductRecord, RxingDecoder, Settings,
};

const NO_PRODUCT_DATA: &str = "No product data retrieved.";

#[derive(Parser, Debug)]
#[command(
    name = "nutriscan",
    about = "Scan a product barcode, look it up in Open Food Facts, and ask an LLM about it",
    version
)]
pub struct Cli {
    /// Product catalog base URL.
    #[arg(long, global = true)]
    pub catalog_url: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Text-generation backend (huggingface, ollama, fake).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Model name for the generation backend.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL of the generation backend.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode the barcode in an image.
    Scan {
        /// Image file (png, jpeg, webp, ...).
        image: PathBuf,
    },

    /// Look a barcode up in the product catalog.
    Lookup {
        barcode: Barcode,

        /// Print the full product record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Scan or look up a product and generate a dietary insight.
    Insight {
        #[command(flatten)]
        source: Source,

        /// Free-text dietary preferences. Pass "" to ask without preferences.
        #[arg(short, long)]
        preferences: Option<String>,

        /// Maximum length of the generated text.
        #[arg(long)]
        max_length: Option<u32>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   nutriscan completions bash > ~/.local/share/bash-completion/completions/nutriscan
    ///   nutriscan completions zsh > ~/.zfunc/_nutriscan
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct Source {
    /// Image containing the barcode.
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Barcode to look up directly.
    #[arg(short, long)]
    pub barcode: Option<Barcode>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            catalog_url: self.catalog_url.clone(),
            timeout_secs: self.timeout_secs,
            backend: self.backend.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            ..Overrides::default()
        }
    }
}

/// Execute one parsed command. Results go to `out`, user-facing failures to
/// `err`. Returns the process exit code; `Err` is reserved for setup and I/O
/// failures.
pub async fn run(cli: Cli, out: &mut impl Write, err: &mut impl Write) -> anyhow::Result<u8> {
    let mut overrides = cli.overrides();

    match cli.command {
        Commands::Scan { image } => match nutriscan::scan_file(&RxingDecoder, &image) {
            Ok(decoded) => writeln!(out, "Found barcode: {}", decoded.barcode)?,
            Err(e) if e.is_not_found() => {
                tracing::warn!(path = %image.display(), "no barcode decoded");
                writeln!(err, "No barcode found")?;
                return Ok(1);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("scanning {}", image.display()));
            }
        },

        Commands::Lookup { barcode, json } => {
            let settings = Settings::resolve(overrides)?;
            let catalog = CatalogClient::new(&settings.catalog_url, settings.timeout)?;
            match catalog.fetch_product(&barcode).await {
                Ok(product) if json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&product)?)?
                }
                Ok(product) => print_product(out, &product)?,
                Err(e) => {
                    report_lookup_failure(err, &e)?;
                    return Ok(1);
                }
            }
        }

        Commands::Insight {
            source,
            preferences,
            max_length,
        } => {
            overrides.preferences = preferences;
            overrides.max_length = max_length;
            let settings = Settings::resolve(overrides)?;

            let catalog = CatalogClient::new(&settings.catalog_url, settings.timeout)?;
            let generator = create_generator(&settings.generator)?;
            tracing::info!(
                backend = generator.backend_name(),
                model = generator.model_name(),
                "text generator ready"
            );
            let pipeline = Pipeline::new(
                Box::new(RxingDecoder),
                catalog,
                Arc::from(generator),
                settings.preferences,
                settings.max_length,
            );

            let result = match (source.image, source.barcode) {
                (Some(image), _) => match pipeline.scan(&image) {
                    Ok(decoded) => {
                        writeln!(out, "Found barcode: {}", decoded.barcode)?;
                        pipeline.run_from_barcode(decoded.barcode).await
                    }
                    Err(e) => Err(e),
                },
                (None, Some(barcode)) => pipeline.run_from_barcode(barcode).await,
                (None, None) => anyhow::bail!("either --image or --barcode is required"),
            };

            match result {
                Ok(report) => writeln!(out, "{}", report.insight)?,
                Err(PipelineError::Scan(e)) if e.is_not_found() => {
                    tracing::warn!("{e}");
                    writeln!(err, "No barcode found")?;
                    return Ok(1);
                }
                Err(PipelineError::Lookup(e)) => {
                    report_lookup_failure(err, &e)?;
                    return Ok(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "nutriscan", out);
        }
    }

    Ok(0)
}

/// Same wording for `lookup` and `insight`: the cause, then the fixed notice.
fn report_lookup_failure(err: &mut impl Write, e: &LookupError) -> std::io::Result<()> {
    tracing::warn!(not_found = e.is_not_found(), "lookup failed: {e}");
    writeln!(err, "{e}")?;
    writeln!(err, "\n{NO_PRODUCT_DATA}")
}

fn print_product(out: &mut impl Write, product: &ProductRecord) -> std::io::Result<()> {
    writeln!(out, "{} ({})", product.product_name, product.barcode)?;
    writeln!(out, "  Brand:       {}", product.brand)?;
    writeln!(out, "  Description: {}", product.generic_name)?;
    if let Some(categories) = &product.categories {
        writeln!(out, "  Categories:  {categories}")?;
    }
    if let Some(allergens) = &product.allergens {
        writeln!(out, "  Allergens:   {allergens}")?;
    }
    if let Some(labels) = &product.labels {
        writeln!(out, "  Labels:      {labels}")?;
    }
    if let Some(ingredients) = &product.ingredients {
        let names: Vec<&str> = ingredients
            .iter()
            .filter_map(|i| i.text.as_deref())
            .collect();
        writeln!(out, "  Ingredients: {}", names.join(", "))?;
    }
    if !product.nutrition_facts.is_empty() {
        writeln!(out, "  Nutrition per 100g:")?;
        for (name, value) in &product.nutrition_facts {
            writeln!(out, "    {name}: {value}")?;
        }
    }
    Ok(())
}
