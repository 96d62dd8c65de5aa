mod catalog;
mod config;
mod error;
mod models;
mod overlay;
mod portal;
mod requests;
mod scoring;
mod search;
mod submit;
mod tui;
mod view;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use catalog::{CatalogSource, CatalogStore};
use config::{Config, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
use error::{EMPTY_RESULT_HINT, FraudError};
use models::{FraudResult, PortalJob, salary_label};
use portal::{DEFAULT_JOB_TITLE, JOB_TITLE_PRESETS, PortalView};
use requests::RequestState;
use scoring::{HttpScoringClient, ScoringService};
use submit::{SubmissionFlow, SubmissionForm};
use tui::truncate;
use view::CatalogBrowser;

#[derive(Parser)]
#[command(name = "fraudscope")]
#[command(about = "Browse job postings and check them for fraud")]
struct Cli {
    /// Base URL of the fraud detection service
    #[arg(long, global = true, env = "FRAUDSCOPE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Number of jobs shown per page
    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a job catalog (CSV file or URL) in the terminal browser
    Browse {
        /// Path or http(s) URL of the catalog CSV
        source: String,

        /// Write logs to this file while the browser is open
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Check a single job posting for fraud
    Check {
        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        company_profile: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        requirements: String,

        /// The position is remote
        #[arg(long)]
        telecommuting: bool,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        salary_range: Option<String>,

        #[arg(long)]
        benefits: Option<String>,

        #[arg(long)]
        employment_type: Option<String>,

        #[arg(long)]
        required_experience: Option<String>,

        #[arg(long)]
        education: Option<String>,

        #[arg(long)]
        role: Option<String>,
    },

    /// Look up jobs the service has already scored for a job title
    Portal {
        /// Job title to search for
        #[arg(default_value = DEFAULT_JOB_TITLE)]
        job_title: String,

        /// Print the preset job titles and exit
        #[arg(long)]
        list_titles: bool,

        /// Show full details for the Nth job in the table (1-based)
        #[arg(short, long)]
        expand: Option<usize>,
    },
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        // Anything printed to the terminal would tear the alternate screen
        Commands::Browse { log_file, .. } => {
            if let Some(path) = log_file {
                init_tracing(Some(path))?;
            }
        }
        _ => init_tracing(None)?,
    }

    let config = Config::new(&cli.api_url, cli.page_size)?;
    tracing::debug!(api_url = %config.api_url(), page_size = config.page_size, "configured");

    match cli.command {
        Commands::Browse { source, .. } => {
            let service: Arc<dyn ScoringService> = Arc::new(HttpScoringClient::new(&config)?);
            let source = CatalogSource::parse(&source);
            let catalog = CatalogStore::load(&source).await;
            if catalog.is_empty() && catalog.error().is_none() {
                tracing::warn!(source = %source, "catalog has no usable rows");
            } else {
                tracing::info!(source = %source, records = catalog.len(), "catalog ready");
            }

            let browser = CatalogBrowser::new(catalog, service, config.page_size);
            // The draw loop blocks; spawned checks keep running on the other workers
            tokio::task::block_in_place(|| tui::run_browse(browser))?;
        }

        Commands::Check {
            title,
            company_profile,
            description,
            requirements,
            telecommuting,
            location,
            department,
            salary_range,
            benefits,
            employment_type,
            required_experience,
            education,
            role,
        } => {
            let form = SubmissionForm {
                title,
                company_profile,
                description,
                requirements,
                telecommuting,
                location,
                department,
                salary_range,
                benefits,
                employment_type,
                required_experience,
                education,
                role,
            };

            let service: Arc<dyn ScoringService> = Arc::new(HttpScoringClient::new(&config)?);
            let mut flow = SubmissionFlow::new(service);
            flow.submit(&form)?;

            println!("Analyzing \"{}\"... (Ctrl-C to cancel)", form.title.trim());
            let cancelled = tokio::select! {
                _ = flow.wait() => false,
                _ = tokio::signal::ctrl_c() => true,
            };
            if cancelled {
                flow.reset();
                println!("Check cancelled.");
                return Ok(());
            }

            match flow.state() {
                RequestState::Succeeded(result) => {
                    print_result(result);
                    let notes = form.reference_fields();
                    if !notes.is_empty() {
                        println!("\nYour notes (not sent to the service):");
                        for (label, value) in notes {
                            println!("  {}: {}", label, value);
                        }
                    }
                }
                RequestState::Failed(error) => {
                    if let FraudError::Network(_) = error {
                        tracing::warn!(error = %error, "fraud check could not reach the service");
                    }
                    return Err(anyhow!(error.clone()));
                }
                other => return Err(anyhow!("Check ended without a result ({:?})", other)),
            }
        }

        Commands::Portal {
            job_title,
            list_titles,
            expand,
        } => {
            if list_titles {
                for title in JOB_TITLE_PRESETS {
                    println!("{}", title);
                }
                return Ok(());
            }

            let service: Arc<dyn ScoringService> = Arc::new(HttpScoringClient::new(&config)?);
            let mut portal = PortalView::new(service, DEFAULT_JOB_TITLE);
            portal.select_title(&job_title).await;
            if let Some(n) = expand {
                portal.toggle_expansion(n.saturating_sub(1));
            }
            print_portal(&portal)?;
        }
    }

    Ok(())
}

fn print_result(result: &FraudResult) {
    let level = result.risk_level();
    println!();
    if let Some(title) = &result.job_title {
        println!("Job: {}", title);
    }
    println!("Fraud probability: {}", result.percent());
    println!("Risk level: {}", level.label());
    println!("{}", result.verdict());
    println!("\nRecommendations:");
    for advice in level.recommendations() {
        println!("  - {}", advice);
    }
}

fn print_portal(portal: &PortalView) -> Result<()> {
    match portal.error() {
        Some(FraudError::EmptyResult { .. }) => {
            println!("{}", EMPTY_RESULT_HINT);
            print_counts(portal);
            return Ok(());
        }
        Some(error) => {
            return Err(anyhow!(error.clone())
                .context(format!("Lookup failed for \"{}\"", portal.job_title())));
        }
        None => {}
    }

    if let Some(summary) = portal.summary() {
        println!("{}\n", summary);
    }
    println!(
        "{:<10} {:>7} {:<30} {:<20} {:<18}",
        "STATUS", "PROB", "TITLE", "COMPANY", "LOCATION"
    );
    println!("{}", "-".repeat(89));
    for job in portal.jobs() {
        let probability = match job.fraud_probability {
            Some(p) => format!("{:.1}%", p * 100.0),
            None => "-".to_string(),
        };
        println!(
            "{:<10} {:>7} {:<30} {:<20} {:<18}",
            job.status().label(),
            probability,
            truncate(job.display_title(), 28),
            truncate(job.company.as_deref().unwrap_or("-"), 18),
            truncate(job.location.as_deref().unwrap_or("-"), 16)
        );
    }

    if let Some(job) = portal.expanded().and_then(|i| portal.jobs().get(i)) {
        print_portal_job(job);
    }

    print_counts(portal);
    Ok(())
}

fn print_counts(portal: &PortalView) {
    let counts = portal.counts();
    println!(
        "\n{} safe, {} high risk, {} analyzing",
        counts.safe, counts.high_risk, counts.analyzing
    );
}

fn print_portal_job(job: &PortalJob) {
    println!("\n--- {} ---", job.display_title());
    if let Some(level) = job.risk_level() {
        println!("Risk level: {}", level.label());
    }
    let fields = [
        ("Company", &job.company),
        ("Location", &job.location),
        ("Department", &job.department),
        ("Function", &job.function),
        ("Apply", &job.redirect_url),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    if let Some(salary) = salary_label(job.salary_min, job.salary_max) {
        println!("Salary: {}", salary);
    }
    if let Some(description) = &job.description {
        println!("\nDescription:\n{}", textwrap::fill(description, 80));
    }
    if let Some(requirements) = &job.requirements {
        println!("\nRequirements:\n{}", textwrap::fill(requirements, 80));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::StatusCounts;
    use crate::scoring::mock::ScriptedScoring;

    #[tokio::test]
    async fn test_empty_lookup_prints_hint_instead_of_failing() {
        let service = ScriptedScoring::new();
        service.push_lookup(Err(FraudError::EmptyResult {
            job_title: "zzz-nonexistent".to_string(),
        }));
        let mut portal = PortalView::new(service, "zzz-nonexistent");
        portal.refresh().await;

        assert!(print_portal(&portal).is_ok());
        assert!(portal.jobs().is_empty());
        assert_eq!(portal.counts(), StatusCounts::default());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error() {
        let service = ScriptedScoring::new();
        service.push_lookup(Err(FraudError::Service {
            status: 500,
            message: "API Error: 500 Internal Server Error".to_string(),
        }));
        let mut portal = PortalView::new(service, "developer");
        portal.refresh().await;

        let err = print_portal(&portal).unwrap_err();
        assert!(err.to_string().contains("Lookup failed for \"developer\""));
    }
}
