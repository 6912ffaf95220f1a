use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use riskdesk_agents::{
    MitigationPlaybook, Portfolio, PortfolioSummary, ProjectAssessment, ProjectRecord, ProjectStore,
    ReportGenerator, RiskAssessmentService, RiskDeskConfig, RiskTelemetry,
};
use riskdesk_scoring::{RiskCategory, RiskScoringEngine, UnknownCategoryPolicy};
use serde::Serialize;
use serde_json::{json, Value};
use shared_event_bus::FileEventPublisher;
use shared_logging::LogLevel;
use tokio::runtime::Runtime;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "riskctl", version, about = "Project risk scoring and assessment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scores a JSON risk input and prints the result.
    Score(ScoreArgs),
    /// Assesses one or all projects of a portfolio.
    Assess {
        #[command(flatten)]
        source: PortfolioArgs,
        /// Only this project; its score is appended to its history in the
        /// portfolio file.
        #[arg(long)]
        project: Option<String>,
    },
    /// Renders a Markdown risk report for one project.
    Report {
        #[command(flatten)]
        source: PortfolioArgs,
        #[arg(long)]
        project: String,
    },
    /// Prints dashboard totals for a portfolio.
    Summary {
        #[command(flatten)]
        source: PortfolioArgs,
    },
    /// Examines one risk category of a project.
    Area {
        #[command(flatten)]
        source: PortfolioArgs,
        #[arg(long)]
        project: String,
        #[arg(long)]
        category: RiskCategory,
    },
    /// Prints the mitigation playbook for a category (generic when omitted).
    Mitigate {
        #[arg(long)]
        category: Option<RiskCategory>,
    },
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// JSON object keyed by category.
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Cap scores at 10.
    #[arg(long)]
    clamp: bool,
    /// Skip unknown category keys instead of failing.
    #[arg(long)]
    ignore_unknown: bool,
    /// Include per-category detail and ranked factors.
    #[arg(long)]
    breakdown: bool,
}

#[derive(Args, Debug)]
struct PortfolioArgs {
    /// Portfolio JSON file.
    #[arg(long)]
    portfolio: PathBuf,
    /// Evaluation date (defaults to today, UTC).
    #[arg(long)]
    as_of: Option<NaiveDate>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON-lines log file; overrides the config.
    #[arg(long)]
    log: Option<PathBuf>,
    /// JSON-lines event file; overrides the config.
    #[arg(long)]
    event_log: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AssessOutput<'a> {
    run_id: &'a str,
    as_of: NaiveDate,
    assessments: &'a [ProjectAssessment],
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = execute(cli.command)?;
    println!("{output}");
    Ok(())
}

fn execute(command: Commands) -> Result<String> {
    match command {
        Commands::Score(args) => handle_score(&args),
        Commands::Mitigate { category } => {
            Ok(MitigationPlaybook::for_category(category).render_markdown(1))
        }
        Commands::Assess { source, project } => {
            runtime()?.block_on(handle_assess(&source, project.as_deref()))
        }
        Commands::Report { source, project } => {
            runtime()?.block_on(handle_report(&source, &project))
        }
        Commands::Summary { source } => runtime()?.block_on(handle_summary(&source)),
        Commands::Area {
            source,
            project,
            category,
        } => handle_area(&source, &project, category),
    }
}

fn runtime() -> Result<Runtime> {
    Runtime::new().context("starting tokio runtime")
}

fn handle_score(args: &ScoreArgs) -> Result<String> {
    let config = RiskDeskConfig::load_or_default(args.config.as_deref())?;
    let mut policy = config.scoring;
    if args.clamp {
        policy.clamp = true;
    }
    if args.ignore_unknown {
        policy.unknown_categories = UnknownCategoryPolicy::Ignore;
    }
    let engine = RiskScoringEngine::new(policy)?;
    let value = read_json(&args.input)?;
    let input = engine
        .parse(&value)
        .with_context(|| format!("validating {}", args.input.display()))?;
    let rendered = if args.breakdown {
        serde_json::to_string_pretty(&engine.breakdown(&input)?)?
    } else {
        serde_json::to_string_pretty(&engine.score(&input)?)?
    };
    Ok(rendered)
}

async fn handle_assess(args: &PortfolioArgs, project: Option<&str>) -> Result<String> {
    let mut session = Session::open(args)?;
    let assessments = match project {
        Some(id) => {
            let store = session.portfolio.store();
            let market = session.portfolio.market_for(session.project(id)?);
            let assessment = session
                .service
                .assess_and_record(&store, id, market, session.as_of)
                .await?;
            session.portfolio.projects = store.list();
            session.portfolio.save(&args.portfolio)?;
            vec![assessment]
        }
        None => {
            session
                .service
                .assess_portfolio(&session.portfolio, session.as_of)
                .await?
        }
    };
    session.finish("assess", assessments.len())?;
    Ok(serde_json::to_string_pretty(&AssessOutput {
        run_id: &session.run_id,
        as_of: session.as_of,
        assessments: &assessments,
    })?)
}

async fn handle_report(args: &PortfolioArgs, project: &str) -> Result<String> {
    let session = Session::open(args)?;
    let record = session.project(project)?;
    let assessment = session
        .service
        .assess(record, session.portfolio.market_for(record), session.as_of)
        .await?;
    let report = ReportGenerator::default().render(&assessment).await?;
    session.finish("report", 1)?;
    Ok(report)
}

async fn handle_summary(args: &PortfolioArgs) -> Result<String> {
    let session = Session::open(args)?;
    let assessments = session
        .service
        .assess_portfolio(&session.portfolio, session.as_of)
        .await?;
    let summary = PortfolioSummary::from_assessments(&assessments);
    session.finish("summary", assessments.len())?;
    Ok(serde_json::to_string_pretty(&summary)?)
}

fn handle_area(args: &PortfolioArgs, project: &str, category: RiskCategory) -> Result<String> {
    let session = Session::open(args)?;
    let record = session.project(project)?;
    let area = session.service.check_area(
        record,
        category,
        session.portfolio.market_for(record),
        session.as_of,
    )?;
    session.finish("area", 1)?;
    Ok(serde_json::to_string_pretty(&area)?)
}

/// Portfolio, service and telemetry for one invocation.
struct Session {
    run_id: String,
    as_of: NaiveDate,
    portfolio: Portfolio,
    service: RiskAssessmentService,
    telemetry: RiskTelemetry,
}

impl Session {
    fn open(args: &PortfolioArgs) -> Result<Self> {
        let config = RiskDeskConfig::load_or_default(args.config.as_deref())?;
        let portfolio = Portfolio::load(&args.portfolio)?;

        let mut builder = RiskTelemetry::builder("riskctl").min_level(config.telemetry.min_level);
        if let Some(path) = args.log.as_ref().or(config.telemetry.log_path.as_ref()) {
            builder = builder.log_path(path);
        }
        if let Some(path) = args.event_log.as_ref().or(config.telemetry.event_log.as_ref()) {
            builder = builder.event_publisher(Arc::new(FileEventPublisher::new(path)?));
        }
        let telemetry = builder.build()?;
        let service = RiskAssessmentService::new(&config, telemetry.clone())?;

        let run_id = format!("run-{}", Uuid::new_v4());
        let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
        telemetry.log(
            LogLevel::Info,
            "riskctl.start",
            json!({
                "run_id": run_id,
                "portfolio": args.portfolio,
                "projects": portfolio.projects.len(),
                "as_of": as_of.to_string(),
            }),
        )?;
        Ok(Self {
            run_id,
            as_of,
            portfolio,
            service,
            telemetry,
        })
    }

    fn project(&self, id: &str) -> Result<&ProjectRecord> {
        self.portfolio
            .projects
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| anyhow!("project `{id}` not found in portfolio"))
    }

    fn finish(&self, command: &str, assessed: usize) -> Result<()> {
        self.telemetry.log(
            LogLevel::Info,
            "riskctl.finish",
            json!({ "run_id": self.run_id, "command": command, "assessed": assessed }),
        )
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading input {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing input {}", path.display()))
}
