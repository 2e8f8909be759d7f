//! chart2sls CLI - render Helm charts into MetalK8s Salt state templates

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;
mod helm;

use commands::PipelineArgs;

#[derive(Parser)]
#[command(name = "chart2sls")]
#[command(version)]
#[command(about = "Render Helm charts into MetalK8s Salt state templates", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a chart with Helm and turn it into a Salt state
    Render {
        /// Release name, also used as the chart name in config paths
        name: String,

        /// Values file passed to the renderer
        values: PathBuf,

        /// Chart path
        chart_path: PathBuf,

        /// Helm v2 binary used to render the chart
        #[arg(long, env = "CHART2SLS_HELM", default_value = "helm")]
        helm: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Turn an already rendered manifest stream into a Salt state
    Transform {
        /// Chart name, used in config paths
        name: String,

        /// Rendered manifests (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command {
        Commands::Render {
            name,
            values,
            chart_path,
            helm,
            pipeline,
        } => commands::render::run(&name, &values, &chart_path, &helm, &pipeline, cli.debug),

        Commands::Transform {
            name,
            input,
            pipeline,
        } => commands::transform::run(&name, input.as_deref(), &pipeline, cli.debug),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }

    std::process::exit(exit_codes::SUCCESS);
}
