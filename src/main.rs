use clap::{Parser, Subcommand};
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use run_reporter::config::{self, ScreenshotMode};
use run_reporter::{Aggregator, Event, JsonRenderer, ReportWriter, logging};

/// Run Reporter - build test-run reports from lifecycle events
#[derive(Parser, Debug)]
#[command(
    name = "run-reporter",
    about = "Build a hierarchical test-run report from a stream of lifecycle events",
    after_help = "ENVIRONMENT VARIABLES:\n\
        RUN_REPORT_OUTPUT_DIR            Report output directory\n\
        RUN_REPORT_FILENAME              Report file name\n\
        RUN_REPORT_TITLE                 Report title\n\
        RUN_REPORT_SCREENSHOT_DIR        Directory for saved screenshots\n\
        RUN_REPORT_SAVE_SCREENSHOTS      Save screenshots to disk (true) or embed them (false)\n\
        RUN_REPORT_SCREENSHOTS_PER_TEST  Maximum screenshots per test\n\
        RUN_REPORT_MAX_LOGS              Maximum log entries per test\n\
        RUN_REPORT_MAX_LOG_LENGTH        Maximum characters per log message\n\
        RUN_REPORT_LOG                   Log filter (e.g. debug)"
)]
struct Args {
    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON-lines event stream and write the report
    Replay {
        /// Event stream, one JSON event per line ("-" for stdin)
        #[arg(short, long)]
        events: PathBuf,

        /// Output directory (overrides RUN_REPORT_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report file name (overrides RUN_REPORT_FILENAME)
        #[arg(short, long)]
        filename: Option<String>,

        /// Report title (overrides RUN_REPORT_TITLE)
        #[arg(short, long)]
        title: Option<String>,

        /// Embed screenshot data in the report instead of writing PNG files
        #[arg(long)]
        embed_screenshots: bool,

        /// Maximum log entries kept per test
        #[arg(long)]
        max_logs: Option<usize>,

        /// Maximum screenshots kept per test
        #[arg(long)]
        max_screenshots: Option<usize>,

        /// Print the report to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Check an event stream for malformed events without building a report
    Validate {
        /// Event stream, one JSON event per line ("-" for stdin)
        #[arg(short, long)]
        events: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.verbose);

    match args.command {
        Some(Commands::Replay {
            events,
            output,
            filename,
            title,
            embed_screenshots,
            max_logs,
            max_screenshots,
            stdout,
        }) => {
            let mut config = config::get().clone();
            if let Some(dir) = output {
                config = config.output_dir(dir);
            }
            if let Some(filename) = filename {
                config = config.filename(filename);
            }
            if let Some(title) = title {
                config = config.report_title(title);
            }
            if embed_screenshots {
                config = config.screenshot_mode(ScreenshotMode::Embed);
            }
            if let Some(max) = max_logs {
                config = config.max_logs_per_test(max);
            }
            if let Some(max) = max_screenshots {
                config = config.max_screenshots_per_test(max);
            }

            let renderer = JsonRenderer::new(&config.report_title);
            let mut aggregator = Aggregator::new(config.clone(), renderer);
            for line in read_lines(&events)? {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                aggregator.ingest_json(&line)?;
            }
            if !aggregator.is_finished() {
                // Streams cut short still produce a partial report.
                aggregator.handle(Event::run_end())?;
            }

            let anomalies = aggregator.anomalies().len();
            let screenshots = aggregator.take_pending_screenshots();
            let report = aggregator.into_artifact()?;

            if stdout {
                println!("{}", report);
            } else {
                let path = ReportWriter::new(config).write(&report, &screenshots)?;
                println!("Report generated: {}", path.display());
                if anomalies > 0 {
                    println!("  {} anomalies in the event stream (see log output)", anomalies);
                }
            }
        }

        Some(Commands::Validate { events }) => {
            let mut malformed = 0;
            for (index, line) in read_lines(&events)?.enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(anomaly) = Event::from_json(&line) {
                    malformed += 1;
                    println!("line {}: {}", index + 1, anomaly);
                }
            }
            if malformed > 0 {
                return Err(format!("{} malformed events", malformed).into());
            }
            println!("All events are well-formed");
        }

        None => {
            println!("Run Reporter - build test-run reports from lifecycle events");
            println!();
            println!("Usage: run-reporter <COMMAND>");
            println!();
            println!("Commands:");
            println!("  replay    Replay a JSON-lines event stream and write the report");
            println!("  validate  Check an event stream for malformed events");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

fn read_lines(path: &Path) -> std::io::Result<Box<dyn Iterator<Item = std::io::Result<String>>>> {
    if path == Path::new("-") {
        Ok(Box::new(std::io::stdin().lock().lines()))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?).lines()))
    }
}
