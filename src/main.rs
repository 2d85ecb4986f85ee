use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
mod auth;
use auth::Prompt;
use scryptbox::{
    Budget, ContainerInfo, DEFAULT_HASH_N, DEFAULT_HASH_P, DEFAULT_HASH_R, HostProfile, Storage,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Debug, clap::Args)]
struct BudgetArgs {
    /// Maximum seconds to spend on key derivation (default: 5 for enc, 300 for dec)
    #[arg(short = 't', long = "max-time", env = "SCRYPTBOX_MAX_TIME")]
    max_time: Option<f64>,

    /// Maximum bytes of memory for key derivation (default: 0, no absolute limit)
    #[arg(
        short = 'M',
        long = "max-mem",
        env = "SCRYPTBOX_MAX_MEM",
        default_value_t = 0
    )]
    max_mem: u64,

    /// Maximum fraction of available memory (default: 0.125 for enc, 0.5 for dec)
    #[arg(short = 'm', long = "max-mem-frac", env = "SCRYPTBOX_MAX_MEM_FRAC")]
    max_mem_frac: Option<f64>,
}

impl BudgetArgs {
    fn to_budget(&self) -> Budget {
        let mut budget = Budget::new().with_max_mem(self.max_mem);
        if let Some(seconds) = self.max_time {
            budget = budget.with_max_time(seconds);
        }
        if let Some(fraction) = self.max_mem_frac {
            budget = budget.with_max_mem_frac(fraction);
        }
        budget
    }
}

#[derive(Debug, Parser)]
#[command(name = "scryptbox")]
#[command(
    version,
    about = "Password-based encryption and key derivation built on scrypt."
)]
struct Cli {
    /// Log chosen scrypt parameters and calibration results to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a file (use - for stdin)
    #[command(arg_required_else_help = true)]
    Enc {
        #[command(flatten)]
        budget: BudgetArgs,
        input: PathBuf,
        /// Output file (default: stdout)
        output: Option<PathBuf>,
    },

    /// Decrypts a file (use - for stdin)
    #[command(arg_required_else_help = true)]
    Dec {
        #[command(flatten)]
        budget: BudgetArgs,
        input: PathBuf,
        /// Output file (default: stdout)
        output: Option<PathBuf>,
    },

    /// Prints the hex-encoded 64-byte scrypt hash of the password
    #[command(arg_required_else_help = true)]
    Hash {
        salt: String,

        /// CPU/memory cost, a power of two greater than one
        #[arg(short = 'N', default_value_t = DEFAULT_HASH_N)]
        n: u64,

        /// Block size
        #[arg(short = 'r', default_value_t = DEFAULT_HASH_R)]
        r: u32,

        /// Parallelization
        #[arg(short = 'p', default_value_t = DEFAULT_HASH_P)]
        p: u32,

        /// Interpret SALT as hex instead of raw text
        #[arg(long, default_value_t = false)]
        hex_salt: bool,
    },

    /// Shows the cost parameters of an encrypted file
    #[command(arg_required_else_help = true)]
    Info {
        input: PathBuf,

        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Serialize)]
struct InfoReport {
    #[serde(flatten)]
    info: ContainerInfo,
    estimated_seconds: f64,
}

fn output_storage(path: Option<PathBuf>) -> Storage {
    path.map(Storage::new).unwrap_or_else(Storage::stdio)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("scryptbox=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Enc {
            budget,
            input,
            output,
        } => {
            let input = Storage::new(input);
            let password = auth::read_password(Prompt::New, !input.is_stdio())?;
            let plaintext = Zeroizing::new(
                input
                    .load()
                    .with_context(|| format!("cannot read {}", input.path().display()))?,
            );

            let blob = scryptbox::encrypt(&plaintext, password.as_bytes(), &budget.to_budget())
                .context("encryption failed")?;
            output_storage(output).save(&blob)?;
        }
        Commands::Dec {
            budget,
            input,
            output,
        } => {
            let input = Storage::new(input);
            let password = auth::read_password(Prompt::Existing, !input.is_stdio())?;
            let blob = input
                .load()
                .with_context(|| format!("cannot read {}", input.path().display()))?;

            let plaintext = scryptbox::decrypt(&blob, password.as_bytes(), &budget.to_budget())
                .context("decryption failed")?;
            output_storage(output).save(&plaintext)?;
        }
        Commands::Hash {
            salt,
            n,
            r,
            p,
            hex_salt,
        } => {
            let salt = if hex_salt {
                hex::decode(&salt).context("SALT is not valid hex")?
            } else {
                salt.into_bytes()
            };
            let password = auth::read_password(Prompt::AllowEmpty, true)?;

            let digest = scryptbox::hash(password.as_bytes(), &salt, n, r, p)?;
            println!("{}", hex::encode(digest));
        }
        Commands::Info { input, json } => {
            let input = Storage::new(input);
            let blob = input
                .load()
                .with_context(|| format!("cannot read {}", input.path().display()))?;
            let info = scryptbox::inspect(&blob)?;
            let host = HostProfile::probe()?;
            let report = InfoReport {
                estimated_seconds: info.estimated_seconds(&host),
                info,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let info = &report.info;
                println!("Parameters used: N = {}; r = {}; p = {};", info.n, info.r, info.p);
                println!("    log2(N) = {}", info.log_n);
                println!("    Memory required: {} bytes", info.memory_bytes);
                println!(
                    "    Estimated decryption time: {:.3} seconds",
                    report.estimated_seconds
                );
                println!("    Salt: {}", info.salt);
            }
        }
    }

    Ok(())
}
