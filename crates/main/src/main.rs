use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use lookahead_report::sample::sample_dataset;
use lookahead_report::{ExportSession, LookAheadDataset, ReportConfig};

/// Exports the look-ahead milestone report from the command line.
///
/// Fonts must be present under `assets/fonts` next to the binary or in the
/// crate root, or provided via the `LOOKAHEAD_FONTS_DIR` environment variable,
/// before running `pdf` or `snapshot`.
#[derive(Parser)]
#[command(author, version, about = "Look-ahead milestone report exporter")]
struct Cli {
    /// Look-ahead dataset as JSON. Defaults to the bundled sample.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Configuration override (fonts, template, snapshotWidth) as JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the on-screen table rows as JSON.
    Rows,

    /// Print the document description as JSON.
    Describe,

    /// Export the report from the structured rows.
    Pdf {
        #[arg(long, default_value = "look_ahead.pdf")]
        output: PathBuf,

        /// Print "Page N" at the bottom of every page.
        #[arg(long)]
        page_numbers: bool,
    },

    /// Export the report from a capture of the rendered table.
    Snapshot {
        #[arg(long, default_value = "look_ahead_snapshot.pdf")]
        output: PathBuf,

        /// Also write the captured table as PNG.
        #[arg(long)]
        png: Option<PathBuf>,
    },

    /// Write the on-screen table as an HTML page.
    Preview {
        #[arg(long, default_value = "look_ahead.html")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => ReportConfig::from_path(path)?,
        None => ReportConfig::default(),
    };
    let dataset = match &cli.data {
        Some(path) => LookAheadDataset::from_path(path)?,
        None => sample_dataset()?,
    };

    let mut session = ExportSession::new(&config, dataset.records());

    match cli.command {
        Commands::Rows => println!("{}", serde_json::to_string_pretty(session.rows())?),
        Commands::Describe => println!("{}", session.document().to_json_pretty()?),
        Commands::Pdf {
            output,
            page_numbers,
        } => {
            let renderer = config.renderer().with_page_numbers(page_numbers);
            session.export_structured(&renderer, &output)?;
            keep_artifact(&mut session);
        }
        Commands::Snapshot { output, png } => {
            let rasterizer = config.rasterizer()?;
            let snapshot = session.capture(&rasterizer)?;
            if let Some(path) = png {
                fs::write(&path, snapshot.to_png()?)?;
                info!("wrote table capture to {}", path.display());
            }
            session.export_captured(&snapshot, &config.renderer(), &output)?;
            keep_artifact(&mut session);
        }
        Commands::Preview { output } => {
            let page = session
                .render_table()
                .to_html_document(lookahead_report::assembler::REPORT_TITLE);
            fs::write(&output, page)?;
            report_written(&output);
        }
    }

    Ok(())
}

fn keep_artifact(session: &mut ExportSession<'_>) {
    if let Some(artifact) = session.take_artifact() {
        report_written(&artifact.keep());
    }
}

fn report_written(path: &Path) {
    println!("Wrote {}", path.display());
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
