//! kiln CLI: generate verified Aiken starter projects.
//!
//! Five commands, each a thin layer over [`kiln_core::Kiln`]:
//! `generate`, `list`, `features`, `validate`, and `verify`.

mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};

use kiln_aiken::AikenToolchain;
use kiln_core::config::KilnConfig;
use kiln_core::options::{CustomInput, GenerateOptions};
use kiln_core::Kiln;

#[derive(Parser)]
#[command(
    name = "kiln",
    about = "Aiken starter projects, compiled, tested and scanned before you get them",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to kiln.config.json (defaults apply when the file is absent)
    #[arg(long, global = true, default_value = kiln_core::config::CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a project from a template
    Generate {
        #[command(flatten)]
        project: ProjectArgs,

        /// Also generate the TypeScript SDK under sdk/
        #[arg(long)]
        sdk: bool,

        /// Write files without running the compile, test and scan stages
        #[arg(long)]
        skip_verify: bool,

        /// Output directory (default: ./<name>)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print the generated file list and report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available templates
    List {
        #[arg(long)]
        json: bool,
    },

    /// List composable features for the custom template
    Features {
        #[arg(long)]
        json: bool,
    },

    /// Check a configuration without generating anything
    Validate {
        #[command(flatten)]
        project: ProjectArgs,

        #[arg(long)]
        json: bool,
    },

    /// Run the verification pipeline against an existing project
    Verify {
        /// Project directory (containing aiken.toml)
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

/// Template selection and template-specific inputs.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Template slug or alias (see `kiln list`)
    template: String,

    /// Namespace, usually your GitHub user or organization
    #[arg(long, short)]
    namespace: String,

    /// Project name
    #[arg(long)]
    name: String,

    /// simple_mint: only allow minting after a deadline
    #[arg(long)]
    time_lock: bool,

    /// simple_mint: token name
    #[arg(long)]
    token_name: Option<String>,

    /// simple_mint: CIP-25 asset name
    #[arg(long)]
    asset_name: Option<String>,

    /// vesting: let the owner cancel before the lock expires
    #[arg(long)]
    cancellable: bool,

    /// vesting: allow claiming in several installments
    #[arg(long)]
    partial_claim: bool,

    /// custom: validator purpose
    #[arg(long, value_enum)]
    purpose: Option<PurposeChoice>,

    /// custom: comma-separated features, e.g. sig,timelock,value
    #[arg(long)]
    features: Option<String>,

    /// custom: datum fields, e.g. owner:ByteArray,deadline:Int
    #[arg(long)]
    datum: Option<String>,

    /// custom: redeemer actions, e.g. Deposit(amount:Int),Withdraw
    #[arg(long)]
    redeemer: Option<String>,

    /// Emit .aikido.toml with a scanner profile
    #[arg(long, value_enum)]
    scan_profile: Option<ScanProfileChoice>,
}

impl ProjectArgs {
    fn custom_input(&self) -> Option<CustomInput> {
        let given = self.purpose.is_some()
            || self.features.is_some()
            || self.datum.is_some()
            || self.redeemer.is_some();
        given.then(|| CustomInput {
            purpose: self
                .purpose
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
            features: self.features.clone().unwrap_or_default(),
            datum: self.datum.clone().unwrap_or_default(),
            redeemer: self.redeemer.clone().unwrap_or_default(),
        })
    }

    pub fn to_options(&self, skip_verify: bool) -> GenerateOptions {
        GenerateOptions {
            template: self.template.clone(),
            namespace: self.namespace.clone(),
            project_name: self.name.clone(),
            time_lock: self.time_lock,
            token_name: self.token_name.clone(),
            asset_name: self.asset_name.clone(),
            cancellable: self.cancellable,
            partial_claim: self.partial_claim,
            custom: self.custom_input(),
            scan_profile: self.scan_profile.as_ref().map(|p| p.as_str().to_string()),
            skip_verify,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
pub enum PurposeChoice {
    Spend,
    Mint,
}

impl PurposeChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spend => "spend",
            Self::Mint => "mint",
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
pub enum ScanProfileChoice {
    Standard,
    Strict,
}

impl ScanProfileChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Strict => "strict",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = KilnConfig::load_or_default(&cli.config)?;
    let toolchain = Arc::new(AikenToolchain::from_config(&config.toolchain));
    let kiln = Kiln::new(&config, toolchain);

    match cli.command {
        Commands::Generate {
            project,
            sdk,
            skip_verify,
            output,
            json,
        } => {
            commands::generate::run(&kiln, &project, sdk, skip_verify, output.as_deref(), json)
                .await?;
        }
        Commands::List { json } => {
            commands::list::run_templates(&kiln, json)?;
        }
        Commands::Features { json } => {
            commands::list::run_features(&kiln, json)?;
        }
        Commands::Validate { project, json } => {
            commands::validate::run(&kiln, &project, json)?;
        }
        Commands::Verify { path, json } => {
            commands::verify::run(&kiln, &path, json).await?;
        }
    }

    Ok(())
}
