//! The plakat command line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use plakat::export::OutputFormat;
use plakat::osm::OsmProvider;
use plakat::page::{Orientation, PageSpec, PaperSize};
use plakat::poster;
use plakat::render::RenderRequest;
use plakat::theme::ThemeStore;

#[derive(Parser)]
#[command(name = "plakat", version, about = "Generate minimalist map posters for any city.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a poster for a city.
    Create(CreateArgs),
    /// List all available themes.
    Themes {
        /// Directory holding the theme records.
        #[arg(long, default_value = "themes")]
        themes_dir: PathBuf,
    },
}

#[derive(Args)]
struct CreateArgs {
    /// City name.
    #[arg(short, long)]
    city: String,

    /// Country name, used for geocoding and the subtitle.
    #[arg(short = 'C', long)]
    country: Option<String>,

    /// Theme identifier.
    #[arg(short, long, default_value = "feature_based")]
    theme: String,

    /// Map radius in meters.
    #[arg(short, long, default_value_t = 12_000.0)]
    radius: f64,

    /// Raster output resolution.
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// Output directory.
    #[arg(short, long, default_value = "posters")]
    output: PathBuf,

    /// Directory holding the theme records.
    #[arg(long, default_value = "themes")]
    themes_dir: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    /// Paper size for PDF/EPS output.
    #[arg(long, value_enum, default_value_t = PaperArg::A4)]
    paper: PaperArg,

    /// Page orientation for PDF/EPS output.
    #[arg(long, value_enum, default_value_t = OrientationArg::Portrait)]
    orientation: OrientationArg,

    /// Add bleed and crop marks (PDF/EPS output).
    #[arg(long)]
    print_ready: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Pdf,
    Eps,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Eps => OutputFormat::Eps,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => PaperSize::A3,
            PaperArg::A4 => PaperSize::A4,
            PaperArg::A5 => PaperSize::A5,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
    Square,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
            OrientationArg::Square => Orientation::Square,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> plakat::Result<()> {
    match cli.command {
        Command::Themes { themes_dir } => {
            let store = ThemeStore::open(themes_dir);
            println!("Available themes:");
            for id in store.list()? {
                println!("  - {id}");
            }
            Ok(())
        }
        Command::Create(args) => {
            let store = ThemeStore::open(&args.themes_dir);
            let provider = OsmProvider::new();
            let request = RenderRequest {
                city: args.city.clone(),
                country: args.country.clone(),
                theme: args.theme.clone(),
                radius_m: args.radius,
                dpi: args.dpi,
            };

            let artifact = match OutputFormat::from(args.format) {
                OutputFormat::Png => {
                    poster::create_poster(&provider, &store, &request, &args.output)?
                }
                format => {
                    let spec = PageSpec {
                        paper: args.paper.into(),
                        orientation: args.orientation.into(),
                        print_ready: args.print_ready,
                    };
                    poster::create_page_poster(&provider, &store, &request, &spec, format, &args.output)?
                }
            };

            println!("{}", artifact.path.display());
            Ok(())
        }
    }
}
