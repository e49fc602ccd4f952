//! xlmd CLI - convert between Excel workbooks and Markdown tables

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use xlmd::{ConverterBuilder, Direction, MarkdownStyle};

#[derive(Parser)]
#[command(name = "xlmd")]
#[command(
    author,
    version,
    about = "Convert between Excel (.xlsx) workbooks and Markdown tables"
)]
struct Cli {
    /// Input file (.xlsx or .md); the direction follows the extensions
    #[arg(short, long, required_unless_present = "paste")]
    input: Option<PathBuf>,

    /// Output file (.md or .xlsx); with --paste, "-" or omitted writes to stdout
    #[arg(short, long, required_unless_present = "paste")]
    output: Option<PathBuf>,

    /// Read tab- or comma-delimited rows pasted on stdin, ending at a blank line
    #[arg(long, conflicts_with = "input")]
    paste: bool,

    /// Markdown table layout
    #[arg(long, value_enum, default_value = "compact")]
    style: StyleArg,

    /// Sheet name for Markdown without "## " headings and for pasted rows
    #[arg(long, default_value = "Sheet1")]
    sheet_name: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Compact,
    Aligned,
}

impl From<StyleArg> for MarkdownStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Compact => MarkdownStyle::Compact,
            StyleArg::Aligned => MarkdownStyle::Aligned,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xlmd=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> xlmd::Result<()> {
    let converter = ConverterBuilder::new()
        .with_markdown_style(cli.style.into())
        .with_default_sheet_name(cli.sheet_name)
        .build()?;

    if cli.paste {
        return paste(&converter, cli.output.as_deref());
    }

    // clapがpaste以外では両方を必須にしている
    let (Some(input), Some(output)) = (cli.input, cli.output) else {
        return Err(xlmd::XlmdError::Config(
            "Both --input and --output are required".to_string(),
        ));
    };

    let direction = converter.convert_file(&input, &output)?;
    let label = match direction {
        Direction::XlsxToMarkdown => "Excel -> Markdown",
        Direction::MarkdownToXlsx => "Markdown -> Excel",
        _ => "converted",
    };
    eprintln!("{}: {} -> {}", label, input.display(), output.display());
    Ok(())
}

fn paste(converter: &xlmd::Converter, output: Option<&Path>) -> xlmd::Result<()> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Paste the copied cells below, then press ENTER twice when done:");
    }

    let sheet = converter.read_pasted(stdin.lock())?;
    if sheet.is_empty() {
        eprintln!("No data received.");
        return Ok(());
    }

    match output {
        Some(path) if path != Path::new("-") => {
            let file = std::fs::File::create(path).map_err(|e| {
                xlmd::XlmdError::WriteIo(format!("{}: {}", path.display(), e))
            })?;
            converter.write_markdown_to(&[sheet], io::BufWriter::new(file))
        }
        _ => converter.write_markdown_to(&[sheet], io::stdout().lock()),
    }
}
