use anyhow::Result;
use clap::{Parser, Subcommand};
use rsrcfork_cli::{commands, ConvertArgs};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rsrcfork")]
#[command(about = "Extract and rebuild classic Macintosh resource forks", long_about = None)]
#[command(
    after_help = "Resource types shorter than four characters are padded with spaces. \
                  Non-printable types can be given URL-encoded, e.g. '%53%54%52%20' for 'STR '."
)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resources sorted by type and ID
    List {
        /// Resource fork or AppleDouble file
        file: String,

        #[command(flatten)]
        args: ConvertArgs,
    },

    /// Extract resources to a JSON index and side files
    Extract {
        /// Resource fork or AppleDouble file
        file: String,

        /// Output JSON index (default: <FILE stem>.json in the working directory)
        #[arg(short, long)]
        output: Option<String>,

        /// Show a progress bar while writing side files
        #[arg(long)]
        progress: bool,

        #[command(flatten)]
        args: ConvertArgs,
    },

    /// Rebuild a resource fork from a JSON index
    Create {
        /// JSON index produced by `extract`
        input: String,

        /// Output file
        #[arg(short, long)]
        output: String,

        /// Share one name-list entry between resources with identical names
        #[arg(long)]
        dedup_names: bool,

        #[command(flatten)]
        args: ConvertArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::List { file, args } => commands::list::execute(&file, &args),

        Commands::Extract {
            file,
            output,
            progress,
            args,
        } => commands::extract::execute(&file, output.as_deref(), &args, progress).map(|_| ()),

        Commands::Create {
            input,
            output,
            dedup_names,
            args,
        } => commands::create::execute(&input, &output, &args, dedup_names),
    }
}
