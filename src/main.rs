use dashboard_copilot::advisor::LayoutAdvisor;
use dashboard_copilot::aggregation::{chart_data, ChartData};
use dashboard_copilot::assistant::Assistant;
use dashboard_copilot::config::Config;
use dashboard_copilot::ingestion;
use dashboard_copilot::llm::{LanguageModel, LlmClient};
use dashboard_copilot::sample::SAMPLE_CSV_DATA;
use dashboard_copilot::widget::new_widget_id;
use dashboard_copilot::{Aggregation, ChartType, ColumnSpan, Dataset, WidgetConfig};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Build chart dashboards from CSV files with an AI layout advisor")]
#[command(version)]
struct Args {
    #[command(flatten)]
    llm: LlmArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs)]
struct LlmArgs {
    /// API key (falls back to OPENAI_API_KEY)
    #[arg(long, global = true, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, global = true, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Chat-completions base URL
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and print its inferred columns
    Inspect {
        /// CSV file to load (omit to use the built-in sample)
        csv_file: Option<PathBuf>,
    },
    /// Ask the layout advisor for a widget layout
    Suggest {
        csv_file: Option<PathBuf>,
    },
    /// Print the chart data one widget would render
    Chart(ChartArgs),
    /// Ask a question about the data
    Ask {
        question: String,

        #[arg(long)]
        csv_file: Option<PathBuf>,
    },
    /// Generate an executive summary of the data
    Insights {
        #[arg(long)]
        csv_file: Option<PathBuf>,

        /// Focus the report on a specific question
        #[arg(long)]
        question: Option<String>,
    },
    /// Print the built-in sample CSV
    Sample,
}

#[derive(ClapArgs)]
struct ChartArgs {
    csv_file: Option<PathBuf>,

    /// Column to group by
    #[arg(short, long)]
    dimension: String,

    /// Column to reduce
    #[arg(short, long)]
    metric: String,

    #[arg(short, long, value_enum, default_value_t = AggregationArg::Sum)]
    aggregation: AggregationArg,

    #[arg(short = 't', long = "type", value_enum, default_value_t = ChartTypeArg::Bar)]
    chart_type: ChartTypeArg,

    /// Emit CSV instead of JSON (series charts only)
    #[arg(long)]
    csv: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum AggregationArg {
    Sum,
    Avg,
    Count,
}

impl From<AggregationArg> for Aggregation {
    fn from(arg: AggregationArg) -> Self {
        match arg {
            AggregationArg::Sum => Aggregation::Sum,
            AggregationArg::Avg => Aggregation::Avg,
            AggregationArg::Count => Aggregation::Count,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartTypeArg {
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
    Kpi,
}

impl From<ChartTypeArg> for ChartType {
    fn from(arg: ChartTypeArg) -> Self {
        match arg {
            ChartTypeArg::Bar => ChartType::Bar,
            ChartTypeArg::Line => ChartType::Line,
            ChartTypeArg::Area => ChartType::Area,
            ChartTypeArg::Pie => ChartType::Pie,
            ChartTypeArg::Scatter => ChartType::Scatter,
            ChartTypeArg::Kpi => ChartType::Kpi,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Inspect { csv_file } => inspect(csv_file),
        Commands::Suggest { csv_file } => suggest(csv_file, &args.llm).await,
        Commands::Chart(chart) => chart_command(chart),
        Commands::Ask { question, csv_file } => ask(question, csv_file, &args.llm).await,
        Commands::Insights { csv_file, question } => insights(csv_file, question, &args.llm).await,
        Commands::Sample => {
            print!("{}", SAMPLE_CSV_DATA);
            Ok(())
        }
    }
}

fn load_dataset(csv_file: Option<PathBuf>) -> Result<Dataset> {
    match csv_file {
        Some(path) => ingestion::parse_file(&path)
            .with_context(|| format!("Could not parse {}. Check CSV format.", path.display())),
        None => {
            info!("No file given, using the built-in sample");
            ingestion::parse(SAMPLE_CSV_DATA).context("Built-in sample failed to parse")
        }
    }
}

fn build_model(llm: &LlmArgs) -> Result<Arc<dyn LanguageModel>> {
    let mut config = Config::from_env()?;
    if let Some(key) = &llm.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(model) = &llm.model {
        config.model = model.clone();
    }
    if let Some(base_url) = &llm.base_url {
        config.base_url = base_url.clone();
    }

    let client = LlmClient::from_config(&config)?;
    if client.has_credential() {
        info!("Using model {}", client.model());
    } else {
        info!("No API key found - AI features will use fallback responses");
    }
    Ok(Arc::new(client))
}

fn inspect(csv_file: Option<PathBuf>) -> Result<()> {
    let dataset = load_dataset(csv_file)?;
    println!("{} rows", dataset.len());
    for column in &dataset.columns {
        println!("  {:<24} {}", column.name, column.column_type);
    }
    Ok(())
}

async fn suggest(csv_file: Option<PathBuf>, llm: &LlmArgs) -> Result<()> {
    let dataset = load_dataset(csv_file)?;
    let advisor = LayoutAdvisor::new(build_model(llm)?);
    let widgets = advisor.suggest_layout(&dataset.columns, &dataset.rows).await;
    if widgets.is_empty() {
        eprintln!("The advisor proposed no widgets; the dashboard starts empty.");
    }
    println!("{}", serde_json::to_string_pretty(&widgets)?);
    Ok(())
}

fn chart_command(args: ChartArgs) -> Result<()> {
    let dataset = load_dataset(args.csv_file)?;
    let chart_type = ChartType::from(args.chart_type);
    let widget = WidgetConfig {
        id: new_widget_id(),
        title: format!("{} of {}", args.metric, args.dimension),
        chart_type,
        dimension_key: args.dimension,
        metric_key: args.metric,
        aggregation: args.aggregation.into(),
        column_span: ColumnSpan::ONE,
    };

    let data = chart_data(&widget, &dataset);
    match (&data, args.csv) {
        (ChartData::NoData, _) => {
            eprintln!("No data available for selected keys");
        }
        (ChartData::Series(series), true) => {
            series.write_csv(std::io::stdout().lock())?;
        }
        (_, true) => anyhow::bail!("--csv is only supported for Bar, Line, Area and Pie charts"),
        (_, false) => println!("{}", serde_json::to_string_pretty(&data.to_json())?),
    }
    Ok(())
}

async fn ask(question: String, csv_file: Option<PathBuf>, llm: &LlmArgs) -> Result<()> {
    let dataset = load_dataset(csv_file)?;
    let assistant = Assistant::new(build_model(llm)?);
    let answer = assistant.ask(&dataset.rows, &question).await;
    println!("{}", answer);
    Ok(())
}

async fn insights(csv_file: Option<PathBuf>, question: Option<String>, llm: &LlmArgs) -> Result<()> {
    let dataset = load_dataset(csv_file)?;
    let assistant = Assistant::new(build_model(llm)?);
    match assistant.insights(&dataset.rows, question.as_deref()).await {
        Some(report) => {
            println!("Summary: {}", report.summary);
            if !report.key_trends.is_empty() {
                println!("\nKey trends:");
                for trend in &report.key_trends {
                    println!("  - {}", trend);
                }
            }
            if !report.recommendation.is_empty() {
                println!("\nRecommendation: {}", report.recommendation);
            }
        }
        None => eprintln!("Insights are unavailable right now. Please check your API key."),
    }
    Ok(())
}
