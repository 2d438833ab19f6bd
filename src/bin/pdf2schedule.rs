use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use schedule_pdf_to_json::{
    ExtractOptions, ExtractionReport, OutputFormat, PageSelection, ParserMode, RunConfig,
    compare_parsers, dump_table, dump_words, extract_pdf_to_file, find_literal, read_pdf_pages,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2schedule",
    version,
    about = "Extract per-class timetables from a timetable PDF into JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse every class page and write the schedules.
    Extract(ExtractArgs),
    /// Print the positioned words of one page.
    Inspect(InspectArgs),
    /// Run both parsers on every page and report where they disagree.
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path. Falls back to `input_path` from the config file.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output path. Falls back to `output_path` from the config file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parser to use: position or table.
    #[arg(long)]
    mode: Option<ParserMode>,

    /// Output format: json or csv.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// TOML file with run settings and layout tolerances.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every skipped page.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// 1-based page to dump.
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Number of words to print.
    #[arg(long, default_value_t = 80)]
    limit: usize,

    /// Word to locate, usually the expected class name.
    #[arg(long, default_value = "5a")]
    literal: String,

    /// Also print the page text in reading order.
    #[arg(long)]
    text: bool,

    /// Also print every ruled table found on the page.
    #[arg(long)]
    table: bool,

    /// Table rows to print per table.
    #[arg(long, default_value_t = 15)]
    rows: usize,
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Input PDF path. Falls back to `input_path` from the config file.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// TOML file with run settings and layout tolerances.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to read config '{}'", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn parse_pages(cli_pages: Option<&str>, config: &RunConfig) -> Result<Option<PageSelection>> {
    match cli_pages {
        Some(pages) => PageSelection::from_str(pages)
            .map(Some)
            .map_err(|error| anyhow!("invalid page selection: {error}"))
            .context("failed to parse --pages"),
        None => config
            .page_selection()
            .context("failed to parse pages from config"),
    }
}

fn resolve_input(cli_input: Option<PathBuf>, config: &RunConfig) -> Result<PathBuf> {
    cli_input
        .or_else(|| config.input_path.clone())
        .ok_or_else(|| anyhow!("no input PDF given; pass --input or set input_path"))
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    eprintln!(
        "extracted {} of {} pages ({} lessons)",
        report.schedule_count, report.page_count, report.lesson_count
    );
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} page(s) skipped or replaced", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} class={:?}: {}",
                warning.code, warning.page, warning.class_name, warning.message
            );
        }
    }
}

fn run_extract(args: ExtractArgs) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let pages = parse_pages(args.pages.as_deref(), &config)?;
    let input = resolve_input(args.input, &config)?;
    let output = args
        .output
        .or_else(|| config.output_path.clone())
        .ok_or_else(|| anyhow!("no output path given; pass --output or set output_path"))?;
    let format = args.format.or(config.format).unwrap_or_default();
    let options = ExtractOptions {
        pages,
        mode: args.mode.or(config.mode).unwrap_or_default(),
        layout: config.layout,
    };

    let report = extract_pdf_to_file(&input, &output, format, &options)
        .with_context(|| format!("failed to extract schedules from '{}'", input.display()))?;
    log_report(&report, args.verbose);
    Ok(if report.schedule_count > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn run_inspect(args: &InspectArgs) -> Result<ExitCode> {
    let pages = read_pdf_pages(&args.input, None)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    println!("document has {} pages", pages.len());
    let Some(page) = pages.iter().find(|page| page.page_number == args.page) else {
        eprintln!("page {} not in document", args.page);
        return Ok(ExitCode::from(2));
    };

    println!("page {} has {} words", page.page_number, page.words.len());
    for line in dump_words(&page.words, args.limit) {
        println!("{line}");
    }

    let hits = find_literal(&page.words, &args.literal, 3, 5);
    if hits.is_empty() {
        println!("'{}' not found", args.literal);
    }
    for hit in hits {
        println!(
            "'{}' at index {} x={:.1} y={:.1}",
            args.literal, hit.index, hit.x0, hit.top
        );
        for (index, text) in hit.context {
            println!("    {index:3}: '{text}'");
        }
    }

    if args.text {
        println!("--- text ---");
        println!("{}", page.text);
    }
    if args.table {
        println!("--- {} table(s) ---", page.tables.len());
        for (index, table) in page.tables.iter().enumerate() {
            println!("table {index}:");
            for line in dump_table(table, args.rows) {
                println!("{line}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_compare(args: CompareArgs) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let pages = parse_pages(args.pages.as_deref(), &config)?;
    let input = resolve_input(args.input, &config)?;

    let contents = read_pdf_pages(&input, pages.as_ref())
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let comparisons = compare_parsers(&contents, &config.layout);

    let mut all_agree = !comparisons.is_empty();
    for comparison in &comparisons {
        let check = &comparison.check;
        if check.agrees() {
            println!(
                "page {} {}: {} lessons agree",
                comparison.page,
                comparison.class_name,
                check.matched.len()
            );
            continue;
        }

        all_agree = false;
        println!(
            "page {} {}: {} matched, {} table only, {} position only",
            comparison.page,
            comparison.class_name,
            check.matched.len(),
            check.table_only.len(),
            check.position_only.len()
        );
        for (period, day_index, subject) in &check.table_only {
            println!("    table only: period {period} day {day_index} {subject}");
        }
        for (period, day_index, subject) in &check.position_only {
            println!("    position only: period {period} day {day_index} {subject}");
        }
    }

    Ok(if all_agree {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("schedule_pdf_to_json=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Compare(args) => run_compare(args),
    };
    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
