mod context;

use clap::{Parser, Subcommand};
use constructs::{registry_account, supported_regions, Stack};
use context::{CliOverrides, ContextFile};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "synth")]
#[command(about = "Declares the HuggingFace inference stack and writes its template")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the stack and write the synthesized template
    Synth {
        /// HuggingFace model identifier
        #[arg(short, long)]
        model: Option<String>,
        /// Inference task, e.g. text-classification
        #[arg(short, long)]
        task: Option<String>,
        /// Instance type backing the endpoint
        #[arg(long)]
        instance_type: Option<String>,
        /// Existing execution role ARN (a fresh role is minted otherwise)
        #[arg(long)]
        role: Option<String>,
        /// Deployment region
        #[arg(long)]
        region: Option<String>,
        /// Deployment account
        #[arg(long)]
        account: Option<String>,
        /// Context file with default parameters
        #[arg(short, long, default_value = "stack.toml")]
        context: PathBuf,
        /// Where to write the template (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List regions with a published inference image registry
    Regions,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth {
            model,
            task,
            instance_type,
            role,
            region,
            account,
            context,
            output,
        } => {
            let overrides = CliOverrides {
                model,
                task,
                instance_type,
                role,
                region,
                account,
            };
            synth(overrides, &context, output.as_deref())?;
        }
        Commands::Regions => {
            list_regions();
        }
    }

    Ok(())
}

fn synth(
    overrides: CliOverrides,
    context_path: &std::path::Path,
    output: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = ContextFile::load(context_path)?;
    let config = context::resolve(overrides, file);
    info!(
        model = %config.model,
        task = %config.task,
        instance_type = %config.instance_type,
        region = %config.region,
        "resolved stack configuration"
    );

    let stack = match Stack::assemble(&config) {
        Ok(stack) => stack,
        Err(e) => {
            error!("stack assembly failed: {e}");
            return Err(e.into());
        }
    };
    let rendition = template::synthesize(stack.graph())?.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, rendition)?;
            info!(path = %path.display(), endpoint = %stack.endpoint_name(), "template written");
        }
        None => {
            println!("{rendition}");
        }
    }
    Ok(())
}

fn list_regions() {
    for region in supported_regions() {
        // Lookup over the same table the image resolver uses; it cannot
        // fail for a listed region.
        let account = registry_account(region).unwrap_or("unknown");
        println!("{region}  {account}");
    }
}
