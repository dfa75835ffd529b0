mod api;
mod board;
mod bookmarks;
mod config;
mod error;
mod form;
mod logging;
mod models;
mod pagination;
mod query;
mod tui;
mod window;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use api::JobsClient;
use board::Board;
use bookmarks::BookmarkTracker;
use config::Config;
use error::ApiError;
use form::{CreateForm, FormStatus};
use models::{format_salary, JobType, NewJob};
use pagination::render_labels;
use window::PaginationPolicy;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Search, filter, bookmark and post listings on a remote job board")]
struct Cli {
    /// Base URL of the job listing API
    #[arg(global = true, long, env = "JOBBOARD_API_URL")]
    api_url: Option<String>,

    /// Where results are split into pages
    #[arg(global = true, long, env = "JOBBOARD_PAGINATION", value_enum)]
    pagination: Option<PaginationPolicy>,

    /// Jobs shown per page
    #[arg(global = true, long)]
    page_size: Option<u32>,

    /// Config file (defaults to config.toml in the user config dir)
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of jobs
    List {
        /// Search job titles
        #[arg(short, long)]
        search: Option<String>,

        /// Job type (Full-time, Hybrid, Internship, Contract, Volunteer)
        #[arg(short = 't', long = "type", value_parser = JobType::from_str)]
        job_type: Option<JobType>,

        /// Only jobs paying at most this much
        #[arg(short, long)]
        max_salary: Option<u64>,

        /// Page to show
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show job details
    Show {
        /// Job ID
        id: String,
    },

    /// Post a new job
    Post {
        /// Read the posting from a JSON file instead of flags
        #[arg(long)]
        from: Option<PathBuf>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Job type (Full-time, Hybrid, Internship, Contract, Volunteer)
        #[arg(long = "type")]
        job_type: Option<String>,

        #[arg(long)]
        salary: Option<u64>,

        #[arg(long)]
        description: Option<String>,

        /// Entry Level, Mid Level or Senior Level
        #[arg(long)]
        experience: Option<String>,

        /// Company logo URL
        #[arg(long)]
        logo: Option<String>,

        /// USD, EUR, GBP, CAD or AUD
        #[arg(long)]
        currency: Option<String>,
    },

    /// Interactive browser
    Browse,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(policy) = cli.pagination {
        config.pagination = policy;
    }
    if let Some(size) = cli.page_size {
        config.page_size = size;
        config.fetch_limit = config.fetch_limit.max(size);
    }
    config.validate()?;
    Ok(config)
}

async fn fetch_into(board: &mut Board, client: &JobsClient) {
    let ticket = board.begin_fetch();
    let result = client.list_jobs(&ticket.query).await;
    board.complete_fetch(ticket.generation, result);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Browse => logging::init_file(&Config::log_path())?,
        _ => logging::init_stderr()?,
    }

    let config = load_config(&cli)?;
    info!(api = %config.api_url, pagination = ?config.pagination, "loaded config");
    let client = JobsClient::new(&config.api_url, config.timeout())
        .context("Failed to create HTTP client")?;

    match cli.command {
        Commands::List {
            search,
            job_type,
            max_salary,
            page,
        } => {
            let mut board = Board::new(
                config.pagination,
                config.page_size,
                config.fetch_limit,
                BookmarkTracker::shared(),
            );
            if let Some(term) = &search {
                board.set_search(term);
            }
            if let Some(t) = job_type {
                board.toggle_type(t);
            }
            if let Some(max) = max_salary {
                board.set_salary_ceiling(max);
            }

            // Server mode asks for the page directly; client mode slices the batch afterwards.
            board.seek_page(page);
            let requested = board.paginator().current();
            fetch_into(&mut board, &client).await;
            if board.paginator().current() != requested && board.last_error().is_none() {
                // past the last page, show the last one instead
                fetch_into(&mut board, &client).await;
            }
            board.go_to_page(page);

            if let Some(err) = board.last_error() {
                eprintln!("Could not fetch jobs: {}", err);
            }

            let jobs = board.visible_jobs();
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!("{:<26} {:<11} {:<30} {:<20} {:>10}", "ID", "TYPE", "TITLE", "COMPANY", "SALARY");
                println!("{}", "-".repeat(101));
                for job in jobs {
                    println!(
                        "{:<26} {:<11} {:<30} {:<20} {:>10}",
                        truncate(&job.id, 26),
                        truncate(job.job_type.as_str(), 11),
                        truncate(&job.title, 28),
                        truncate(&job.company, 18),
                        format_salary(job.salary)
                    );
                }
            }
            println!(
                "\nPage {}  ({} jobs)",
                render_labels(board.paginator()),
                board.total_items()
            );
        }

        Commands::Show { id } => match client.get_job(&id).await {
            Ok(job) => {
                println!("Job {}", job.id);
                println!("Title: {}", job.title);
                if !job.company.is_empty() {
                    println!("Company: {}", job.company);
                }
                println!("Type: {}", job.job_type.label());
                if !job.location.is_empty() {
                    println!("Location: {}", job.location);
                }
                if !job.experience_level.is_empty() {
                    println!("Experience: {}", job.experience_level);
                }
                println!("Salary: {}", format_salary(job.salary));
                if !job.logo.is_empty() {
                    println!("Logo: {}", job.logo);
                }
                if !job.description.is_empty() {
                    println!("\n--- Description ---\n{}", textwrap::fill(&job.description, 80));
                }
            }
            Err(ApiError::NotFound(_)) => {
                println!("Job {} not found.", id);
            }
            Err(e) => return Err(e).context("Failed to fetch job"),
        },

        Commands::Post {
            from,
            title,
            company,
            location,
            job_type,
            salary,
            description,
            experience,
            logo,
            currency,
        } => {
            let values = match from {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read job file: {}", path.display()))?;
                    serde_json::from_str::<NewJob>(&text)
                        .with_context(|| format!("Invalid job file: {}", path.display()))?
                }
                None => {
                    let mut values = CreateForm::initial_values();
                    merge(&mut values.title, title);
                    merge(&mut values.company, company);
                    merge(&mut values.location, location);
                    merge(&mut values.job_type, job_type);
                    merge(&mut values.description, description);
                    merge(&mut values.experience_level, experience);
                    merge(&mut values.currency, currency);
                    if let Some(s) = salary {
                        values.salary = s;
                    }
                    values.logo = logo;
                    values
                }
            };

            let mut form = CreateForm::new(values);
            let payload = match form.begin_submit() {
                Ok(payload) => payload,
                Err(errors) => {
                    for e in &errors.0 {
                        eprintln!("  {}: {}", e.field, e.message);
                    }
                    let fields: Vec<&str> = errors.fields().collect();
                    bail!("Job posting is invalid: check {}", fields.join(", "));
                }
            };

            let result = client.create_job(&payload).await;
            form.finish_submit(result);
            match form.status() {
                FormStatus::Created(id) => println!("Job created successfully! (ID: {})", id),
                FormStatus::Failed(message) => {
                    eprintln!("Failed to create job: {}", message);
                    eprintln!("\nYour posting was kept; fix it and resubmit with --from:");
                    println!("{}", serde_json::to_string_pretty(&form.values)?);
                    return Err(anyhow!("Job creation failed"));
                }
                other => bail!("Unexpected form state: {:?}", other),
            }
        }

        Commands::Browse => {
            let board = Board::new(
                config.pagination,
                config.page_size,
                config.fetch_limit,
                BookmarkTracker::shared(),
            );
            tui::run_browse(client, board)?;
        }
    }

    Ok(())
}

fn merge(field: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *field = v;
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
