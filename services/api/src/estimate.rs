use crate::infra::load_engine;
use chrono::{Local, Utc};
use clap::Args;
use sourcer::config::AppConfig;
use sourcer::error::AppError;
use sourcer::telemetry;
use sourcer::workflows::estimation::{
    AssignmentStrategy, Condition, DealConfig, EstimationArtifacts, PropertyType, RiskProfile,
    SubjectProperty,
};
use sourcer::workflows::pipeline::{
    HttpWebhookClient, PipelineStore, WebhookGateway, WebhookPayload,
};
use std::path::PathBuf;

const DEFAULT_PDF_FILE: &str = "sourcer_offer.pdf";

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// Street address or property label
    pub(crate) address: String,
    /// City for the subject property
    pub(crate) city: String,
    /// Two-letter state code
    pub(crate) state: String,
    /// 5-digit ZIP code
    pub(crate) postal_code: String,
    /// Heated square footage
    pub(crate) square_feet: f64,
    /// Bedroom count
    pub(crate) beds: f64,
    /// Bathroom count
    pub(crate) baths: f64,
    /// Listing URL to keep with the deal
    #[arg(long)]
    pub(crate) listing_url: Option<String>,
    /// turnkey, rent_ready, light_rehab, heavy_rehab or tear_down
    #[arg(long, default_value = "light_rehab")]
    pub(crate) condition: Condition,
    /// single_family, multi_family, condo or townhome
    #[arg(long, default_value = "single_family")]
    pub(crate) property_type: PropertyType,
    #[arg(long)]
    pub(crate) year_built: Option<i32>,
    #[arg(long)]
    pub(crate) lot_square_feet: Option<f64>,
    /// MAO factor, clamped to 0.55-0.75
    #[arg(long, default_value_t = 0.65)]
    pub(crate) factor: f64,
    /// Target assignment fee when not overriding
    #[arg(long, default_value_t = 10_000.0)]
    pub(crate) assignment_fee: f64,
    /// Force a specific assignment fee
    #[arg(long)]
    pub(crate) assignment_fee_override: Option<f64>,
    /// Closing cost rate as a decimal
    #[arg(long)]
    pub(crate) closing_rate: Option<f64>,
    #[arg(long)]
    pub(crate) holding_months: Option<f64>,
    /// Use this repair total instead of the itemized budget
    #[arg(long)]
    pub(crate) repair_override: Option<f64>,
    /// aggressive, balanced or conservative
    #[arg(long, default_value = "balanced")]
    pub(crate) risk_profile: RiskProfile,
    /// Skip the PDF snapshot
    #[arg(long)]
    pub(crate) no_pdf: bool,
    /// Where to write the PDF snapshot (defaults to ./sourcer_offer.pdf)
    #[arg(long)]
    pub(crate) pdf_path: Option<PathBuf>,
    /// Save the deal to the pipeline journal
    #[arg(long)]
    pub(crate) save: bool,
    /// Comma-separated tags stored with a saved deal
    #[arg(long)]
    pub(crate) tags: Option<String>,
    /// CRM link stored with a saved deal
    #[arg(long)]
    pub(crate) crm_url: Option<String>,
    /// Export the pipeline CSV after saving
    #[arg(long)]
    pub(crate) export_csv: bool,
    /// POST the deal summary to this URL after saving
    #[arg(long)]
    pub(crate) webhook: Option<String>,
    /// Print the estimate as JSON instead of the text summary
    #[arg(long)]
    pub(crate) as_json: bool,
}

impl EstimateArgs {
    pub(crate) fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn subject(&self) -> SubjectProperty {
        SubjectProperty {
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            square_feet: self.square_feet,
            beds: self.beds,
            baths: self.baths,
            year_built: self.year_built,
            lot_square_feet: self.lot_square_feet,
            condition: self.condition,
            property_type: self.property_type,
            listing_url: self.listing_url.clone(),
        }
    }

    fn deal_config(&self) -> DealConfig {
        let defaults = AssignmentStrategy::default();
        DealConfig {
            strategy: AssignmentStrategy::new(
                self.factor,
                self.assignment_fee,
                defaults.fee_floor,
                defaults.fee_ceiling,
            ),
            risk_profile: self.risk_profile,
            repair_override: self.repair_override,
            closing_cost_rate: self.closing_rate,
            holding_months: self.holding_months,
            assignment_fee_override: self.assignment_fee_override,
            include_report: !self.no_pdf,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// CSV destination (defaults to SOURCER_EXPORT_PATH or ~/.sourcer/pipeline.csv)
    #[arg(long)]
    pub(crate) destination: Option<PathBuf>,
}

pub(crate) async fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let engine = load_engine(&config.data)?;
    let artifacts = engine.estimate(&args.subject(), Some(&args.deal_config()))?;

    let pdf_path = match &artifacts.document {
        Some(bytes) => {
            let path = args
                .pdf_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PDF_FILE));
            std::fs::write(&path, bytes)?;
            Some(path)
        }
        None => None,
    };

    if args.save {
        let store = PipelineStore::new(&config.pipeline.store_path);
        store.save(
            &artifacts.estimate,
            &args.tag_list(),
            args.crm_url.as_deref(),
            Local::now().date_naive(),
        )?;
        eprintln!("Deal saved to {}", store.path().display());

        if args.export_csv {
            let path = store.export_csv(&config.pipeline.export_path)?;
            eprintln!("Pipeline CSV exported to {}", path.display());
        }

        if let Some(url) = &args.webhook {
            deliver_webhook(&config, url, &artifacts).await;
        }
    }

    if args.as_json {
        print_json(&artifacts, pdf_path.as_ref())?;
    } else {
        println!("{}", artifacts.text_summary);
        if let Some(path) = &pdf_path {
            println!("PDF saved to {}", path.display());
        }
    }

    Ok(())
}

async fn deliver_webhook(config: &AppConfig, url: &str, artifacts: &EstimationArtifacts) {
    let payload = WebhookPayload::from_estimate(&artifacts.estimate, Utc::now());
    let outcome = match HttpWebhookClient::new(config.webhook.timeout) {
        Ok(client) => client.deliver(url, &payload).await,
        Err(err) => Err(err),
    };
    match outcome {
        Ok(status) => eprintln!("Webhook delivered with status {status}"),
        Err(err) => eprintln!("Webhook failed: {err}"),
    }
}

fn print_json(
    artifacts: &EstimationArtifacts,
    pdf_path: Option<&PathBuf>,
) -> Result<(), AppError> {
    let mut payload = serde_json::to_value(&artifacts.estimate).map_err(std::io::Error::other)?;
    if let (Some(path), Some(object)) = (pdf_path, payload.as_object_mut()) {
        object.insert(
            "pdf_path".to_string(),
            serde_json::Value::String(path.display().to_string()),
        );
    }
    let rendered = serde_json::to_string_pretty(&payload).map_err(std::io::Error::other)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_markets() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = load_engine(&config.data)?;
    println!("Supported markets:");
    for market in engine.available_markets() {
        println!("  - {market}");
    }
    Ok(())
}

pub(crate) fn run_pipeline_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = PipelineStore::new(&config.pipeline.store_path);
    let destination = args
        .destination
        .unwrap_or_else(|| config.pipeline.export_path.clone());
    let path = store.export_csv(&destination)?;
    println!("Pipeline CSV exported to {}", path.display());
    Ok(())
}
