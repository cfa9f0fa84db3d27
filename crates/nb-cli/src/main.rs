//! New Books Notification CLI
//!
//! Runs the daily notification batch and offers tools for checking rules
//! files and C-codes.

mod archive;
mod feed;
mod notifier;
mod openbd;
mod pipeline;
mod recorder;
mod run;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use nb_compiler::{
    build_filter_with_stats, optimize_filter, read_rule_set, OptimizeStats, RuleRejection,
};
use nb_core::ccode::CcodeDecoder;
use nb_core::record::record_fields;

#[derive(Parser)]
#[command(name = "nb-cli")]
#[command(about = "New books notification batch and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the new-releases feed and notify matching books
    Run {
        /// New-releases feed URL
        #[arg(long, env = "FEED_URL")]
        feed_url: String,

        /// Notification rules file
        #[arg(long, env = "FILTER_RULES_PATH", default_value = "data/filter.json")]
        rules: PathBuf,

        /// C-code table file
        #[arg(long, env = "CCODE_TABLE_PATH", default_value = "data/ccode.json")]
        ccode_table: PathBuf,

        /// openBD API base URL
        #[arg(long, env = "OPENBD_API_URL", default_value = openbd::DEFAULT_OPENBD_URL)]
        openbd_url: String,

        /// Slack incoming webhook URL
        #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
        slack_webhook_url: Option<String>,

        /// Book records file (JSON lines)
        #[arg(long, env = "RECORDS_PATH", default_value = "records.jsonl")]
        records: PathBuf,

        /// Directory the fetched feed is archived into
        #[arg(long, env = "ARCHIVE_DIR")]
        archive_dir: Option<PathBuf>,

        /// Print matches instead of posting; record and archive nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Load a rules file and summarize the filter it builds
    Check {
        /// Rules file to check
        #[arg(short, long)]
        input: String,

        /// Remove duplicate conditions and blocks
        #[arg(long)]
        optimize: bool,

        /// List every block
        #[arg(short, long)]
        verbose: bool,
    },

    /// Decode a 4-digit C-code
    Decode {
        /// C-code, e.g. 0040
        code: String,

        /// C-code table file
        #[arg(short, long, default_value = "data/ccode.json")]
        table: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            feed_url,
            rules,
            ccode_table,
            openbd_url,
            slack_webhook_url,
            records,
            archive_dir,
            dry_run,
        } => run::run_batch(run::RunOptions {
            feed_url,
            rules,
            ccode_table,
            openbd_url,
            slack_webhook_url,
            records,
            archive_dir,
            dry_run,
        }),
        Commands::Check {
            input,
            optimize,
            verbose,
        } => cmd_check(&input, optimize, verbose),
        Commands::Decode { code, table } => cmd_decode(&code, &table),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_check(input: &str, optimize: bool, verbose: bool) -> Result<(), String> {
    let start = Instant::now();

    let settings =
        read_rule_set(Path::new(input)).map_err(|e| format!("Invalid rules file: {}", e))?;
    let (mut filter, stats) = build_filter_with_stats(&settings);

    println!("Rules file '{}'", input);
    println!("  Blocks:      {} ({} dropped)", stats.blocks_seen, stats.blocks_dropped);
    println!("  Conditions:  {} ({} skipped)", stats.conditions_seen, stats.rejected.len());
    for rejected in &stats.rejected {
        println!(
            "    block {} rule {}: {}",
            rejected.block, rejected.condition, rejected.reason
        );
    }
    if stats
        .rejected
        .iter()
        .any(|r| matches!(r.reason, RuleRejection::InvalidFieldName(_)))
    {
        let fields: Vec<&str> = record_fields().collect();
        println!("  Fields:      {}", fields.join(", "));
    }

    if optimize {
        let (optimized, opt) = optimize_filter(filter);
        filter = optimized;
        println!("  Optimized:   {}", optimize_summary(&opt));
    }

    if filter.blocks().is_empty() {
        println!("  Warning:     no usable block, nothing will ever be notified");
    }

    if verbose {
        println!();
        for (i, block) in filter.blocks().iter().enumerate() {
            println!("  Block {} (any of):", i);
            for cond in block.conditions() {
                println!(
                    "    {} {} [{}]",
                    cond.field(),
                    cond.kind().as_config(),
                    cond.words().join(", ")
                );
            }
        }
    }

    println!("  Time:        {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}

fn cmd_decode(code: &str, table: &str) -> Result<(), String> {
    let decoder = CcodeDecoder::load(Path::new(table))
        .map_err(|e| format!("Failed to load C-code table: {}", e))?;
    let subject = decoder.decode(code).map_err(|e| e.to_string())?;

    println!("C-code {}", code);
    println!("  Target:      {}", subject.target);
    println!("  Format:      {}", subject.format);
    println!("  Content:     {}", subject.content);
    Ok(())
}

fn optimize_summary(opt: &OptimizeStats) -> String {
    format!(
        "{} -> {} blocks, {} -> {} conditions (removed {} duplicate conditions, {} duplicate blocks)",
        opt.blocks_before,
        opt.blocks_after,
        opt.conditions_before,
        opt.conditions_after,
        opt.deduped_conditions,
        opt.deduped_blocks,
    )
}
