use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use orden_pdf::{PurchaseOrder, RenderOptions, Session};

const EXAMPLE_ORDER: &str = include_str!("../demos/orden.json");

#[derive(Parser)]
#[command(name = "orden-pdf")]
#[command(version)]
#[command(about = "Render a purchase order (JSON) to a paginated PDF", long_about = None)]
struct Cli {
    /// Order JSON file
    #[arg(value_name = "FILE", required_unless_present = "example")]
    input: Option<PathBuf>,

    /// Output PDF (defaults to the input name with a .pdf extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Render options JSON (page geometry, labels, fonts)
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// TrueType/OpenType font for regular text
    #[arg(long, value_name = "FILE")]
    font_regular: Option<PathBuf>,

    /// TrueType/OpenType font for bold text
    #[arg(long, value_name = "FILE")]
    font_bold: Option<PathBuf>,

    /// Upload the result to this backend after rendering
    #[arg(long, value_name = "BASE_URL", requires = "token")]
    upload: Option<String>,

    /// Bearer token for --upload
    #[arg(long, env = "ORDEN_PDF_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print a sample order JSON and exit
    #[arg(long)]
    example: bool,
}

fn run(cli: Cli) -> Result<(), orden_pdf::Error> {
    let Some(input) = cli.input else {
        return Ok(());
    };

    let mut opts = match &cli.options {
        Some(path) => RenderOptions::from_json_file(path)?,
        None => RenderOptions::default(),
    };
    if cli.font_regular.is_some() {
        opts.fonts.regular = cli.font_regular;
    }
    if cli.font_bold.is_some() {
        opts.fonts.bold = cli.font_bold;
    }

    let text = std::fs::read_to_string(&input)?;
    let order: PurchaseOrder = serde_json::from_str(&text)?;
    let output = cli.output.unwrap_or_else(|| input.with_extension("pdf"));

    let report = orden_pdf::render_to_file(&order, &opts, &output)?;
    println!(
        "Rendered {} ({} items, {} pages) -> {}",
        order.header.number,
        order.items.len(),
        report.page_count(),
        output.display()
    );

    if let (Some(base_url), Some(token)) = (cli.upload, cli.token) {
        let session = Session::new(base_url, token);
        let bytes = std::fs::read(&output)?;
        let file_name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.pdf", order.header.number));
        let url = orden_pdf::upload_pdf(&session, &file_name, bytes)?;
        println!("Uploaded -> {url}");
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.example {
        print!("{EXAMPLE_ORDER}");
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
