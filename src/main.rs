use std::{path::Path, process, sync::Arc};

use bakehouse::{
    application::{
        catalog::CatalogService,
        documents::{DocumentBuilders, DocumentKind, DocumentService, PdfDocument, PdfPrinter},
        error::AppError,
    },
    config::{self, RenderArgs},
    domain::{
        ingredients::{Filling, Flavor},
        orders::{Commission, Folio},
    },
    infra::{
        catalog::InMemoryCatalog, chrome::ChromeEngine, error::InfraError, telemetry,
    },
    presentation::documents::AskamaTemplates,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        eprintln!("{}", error.presentation_message());
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let causes = error.report().join(": ");
    if dispatcher::has_been_set() {
        error!(error = %error, causes = %causes, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, causes = %causes, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Render(args) => run_render(&settings, args).await,
        config::Command::SeedCatalog => run_seed_catalog().await,
    }
}

fn build_document_service(settings: &config::RenderSettings) -> DocumentService {
    let engine = ChromeEngine::new(settings.chrome_path.clone());
    let service = DocumentService::new(
        Arc::new(AskamaTemplates::new()),
        PdfPrinter::new(Arc::new(engine)),
        DocumentBuilders::new(settings.builder_settings()),
    );

    match settings.max_concurrent_renders {
        Some(limit) => service.with_admission_limit(limit),
        None => service,
    }
}

async fn run_render(settings: &config::Settings, args: RenderArgs) -> Result<(), AppError> {
    let RenderArgs {
        kind,
        input,
        output,
        date,
    } = args;

    // Checked before any input is read so a bad invocation never starts a browser.
    let report_date = match (kind, date) {
        (DocumentKind::CommissionReport, Some(date)) if !date.trim().is_empty() => {
            Some(date.trim().to_string())
        }
        (DocumentKind::CommissionReport, _) => {
            return Err(AppError::validation(
                "--date is required for commission reports",
            ));
        }
        _ => None,
    };

    info!(
        target = "bakehouse::render",
        kind = %kind,
        input = %input.display(),
        output = %output.display(),
        "Starting document render"
    );

    let service = build_document_service(&settings.render);
    let document: PdfDocument = match kind {
        DocumentKind::SingleOrder => {
            let folio: Folio = read_json(&input).await?;
            service.create_folio_pdf(&folio).await?
        }
        DocumentKind::LabelSheet => {
            let folios: Vec<Folio> = read_json(&input).await?;
            service.create_labels_pdf(&folios).await?
        }
        DocumentKind::ShippingManifest => {
            let folios: Vec<Folio> = read_json(&input).await?;
            service.create_orders_pdf(&folios).await?
        }
        DocumentKind::CommissionReport => {
            let commissions: Vec<Commission> = read_json(&input).await?;
            let date = report_date.unwrap_or_default();
            service
                .create_commission_report_pdf(&commissions, &date)
                .await?
        }
    };

    tokio::fs::write(&output, document.as_bytes())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "bakehouse::render",
        kind = %kind,
        output = %output.display(),
        pdf_bytes = document.len(),
        "Document written"
    );
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    serde_json::from_slice(&raw).map_err(|err| {
        AppError::from(InfraError::decode(format!("`{}`: {err}", path.display())))
    })
}

#[derive(Serialize)]
struct CatalogListing {
    flavors: Vec<Flavor>,
    fillings: Vec<Filling>,
}

async fn run_seed_catalog() -> Result<(), AppError> {
    let catalog = CatalogService::new(Arc::new(InMemoryCatalog::new()));
    let outcome = catalog.seed_if_empty().await;

    let listing = CatalogListing {
        flavors: catalog.list_flavors().await?,
        fillings: catalog.list_fillings().await?,
    };

    let json = serde_json::to_string_pretty(&listing)
        .map_err(|err| AppError::unexpected(format!("failed to encode catalog: {err}")))?;
    println!("{json}");

    info!(
        target = "bakehouse::catalog",
        flavors = outcome.flavors,
        fillings = outcome.fillings,
        "Catalog seeded"
    );
    Ok(())
}
