//! marginbox-migrate - Migrate legacy .marginBox CSS to page margin variables

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use marginbox_migrate::corpus::{self, CssGroup, FilterOutput};
use marginbox_migrate::{Error, MigrationConfig, Result, migrate};

#[derive(Parser)]
#[command(name = "marginbox-migrate")]
#[command(version, about = "Migrate legacy .marginBox CSS to page margin variables", long_about = None)]
#[command(after_help = "EXAMPLES:
    marginbox-migrate migrate custom.css                 Print the migrated stylesheet
    marginbox-migrate migrate custom.css -o new.css      Write it and summarize
    marginbox-migrate group ./downloads -o groups.json   Group a downloaded corpus
    marginbox-migrate filter -i groups.json -o problems.json
    marginbox-migrate create-migrations -i problems.json -o migrations")]
struct Cli {
    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Migrate one stylesheet
    Migrate {
        /// Stylesheet to migrate
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Write the result here instead of printing it
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// JSON file with extra page sizes
        #[arg(long, value_name = "FILE")]
        page_sizes: Option<PathBuf>,
    },

    /// Group downloaded stylesheets by content
    Group {
        /// Folder of downloaded books
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        #[arg(short, long, default_value = "output/group-output.json")]
        output: PathBuf,

        /// Stop after this many stylesheets
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Keep the groups whose .marginBox rules need migration
    Filter {
        #[arg(short, long, default_value = "output/group-output.json")]
        input: PathBuf,

        #[arg(short, long, default_value = "output/filter-output.json")]
        output: PathBuf,
    },

    /// Write a draft migration folder for each filtered stylesheet
    CreateMigrations {
        #[arg(short, long, default_value = "output/filter-output.json")]
        input: PathBuf,

        #[arg(short, long, default_value = "output/migrations")]
        output: PathBuf,

        /// JSON file with extra page sizes
        #[arg(long, value_name = "FILE")]
        page_sizes: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Migrate {
            input,
            output,
            page_sizes,
        } => run_migrate(&input, output.as_deref(), page_sizes.as_deref()),
        Command::Group {
            source,
            output,
            limit,
        } => run_group(&source, &output, limit),
        Command::Filter { input, output } => run_filter(&input, &output),
        Command::CreateMigrations {
            input,
            output,
            page_sizes,
        } => run_create_migrations(&input, &output, page_sizes.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(page_sizes: Option<&Path>) -> Result<MigrationConfig> {
    let config = MigrationConfig::default();
    match page_sizes {
        Some(path) => config.with_page_sizes_file(path),
        None => Ok(config),
    }
}

fn run_migrate(input: &Path, output: Option<&Path>, page_sizes: Option<&Path>) -> Result<()> {
    let config = load_config(page_sizes)?;
    let css = fs::read_to_string(input).map_err(|e| Error::io_at(input, e))?;
    let migration = migrate(&css, &config);

    let Some(output) = output else {
        println!("{}", migration.css);
        return Ok(());
    };
    fs::write(output, &migration.css).map_err(|e| Error::io_at(output, e))?;

    let report = &migration.report;
    println!("File: {}", input.display());
    if let Some(error) = &report.parse_error {
        println!("Unparseable: {error} (written unchanged)");
    }
    if let Some(repair) = &report.repair {
        println!("Repaired: {repair}");
    }
    println!("Migrated rules: {}", report.migrated_rules);
    println!("Split rules: {}", report.split_rules);
    if report.unmigrated_rules > 0 {
        println!("Unmigrated rules: {}", report.unmigrated_rules);
    }
    if !report.not_migrated.is_empty() {
        println!("NOT MIGRATED: {}", report.not_migrated.join(", "));
    }
    if report.value_errors > 0 {
        println!("Value errors: {}", report.value_errors);
    }
    println!(
        "Hide secondary cover title: {}",
        migration.hide_secondary_cover_title
    );
    Ok(())
}

fn run_group(source: &Path, output: &Path, limit: Option<usize>) -> Result<()> {
    let groups = corpus::group_stylesheets(source, limit)?;
    corpus::write_json(output, &groups)?;

    let books: usize = groups.iter().map(|g| g.paths.len()).sum();
    println!("{books} stylesheets, {} unique", groups.len());
    Ok(())
}

fn run_filter(input: &Path, output: &Path) -> Result<()> {
    let groups: Vec<CssGroup> = corpus::read_json(input)?;
    let filtered = corpus::filter_groups(&groups);
    corpus::write_json(output, &filtered)?;

    let summary = &filtered.summary;
    println!("total books with custom css rules: {}", summary.total_books);
    println!("total unique css files: {}", summary.total_unique_files);
    println!(
        "unique CSS files with problematic rules: {}, covering {} books",
        summary.unique_files_with_problems, summary.total_books_with_problems
    );
    Ok(())
}

fn run_create_migrations(input: &Path, output: &Path, page_sizes: Option<&Path>) -> Result<()> {
    let config = load_config(page_sizes)?;
    let filtered: FilterOutput = corpus::read_json(input)?;
    let written = corpus::create_migrations(&filtered.records, output, &config)?;
    println!("{} migrations written to {}", written.len(), output.display());
    Ok(())
}
