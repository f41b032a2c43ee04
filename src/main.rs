//! # accession CLI
//!
//! Command-line interface (`acn`) for numbering schemes and identifier generation.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use accession::{
    commands::{self, parse_field, GenerateArgs, PreviewArgs, SchemeAddArgs, Target},
    constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR, MAX_BATCH_SIZE},
    scheme::{Sector, SequenceReset},
};

const GLOBAL_HELP: &str = "\
Configuration Files:
  .accession         Project configuration (scheme directory, strict mode, locking)
  schemes/<id>.toml  One numbering scheme per file

Pattern Tokens:
  {SEQ} {SEQ:n}      Next sequence value (zero-padded to n digits, never truncated)
  {YEAR} {YY}        Current year (4 / 2 digits)
  {MONTH} {DAY}      Current month / day (2 digits)
  {PREFIX} {REPO} {FONDS} {SERIES} {COLLECTION} {DEPT} {TYPE} {PROJECT} {ITEM}
                     Values from --field KEY=VALUE or the scheme's defaults
  {UUID}             Random UUID
  {RANDOM:n}         n random alphanumeric characters
  Unknown {TOKENS} are kept as literal text.

Getting Started:
  acn init                                   Initialize project in current directory
  acn preview \"{REPO}-{YEAR}-{SEQ:5}\"        Try a pattern
  acn generate --scheme archive-standard -f REPO=ZA -f FONDS=A
  acn scheme list                            Show schemes and their next values

Logging:
  Set ACN_LOG (or RUST_LOG) to e.g. \"debug\" for diagnostics on stderr.";

#[derive(Parser)]
#[command(name = "acn")]
#[command(author = "Dominic Rodemer")]
#[command(version)]
#[command(about = "Pattern-based identifier generation with per-scheme sequence numbering")]
#[command(
    long_about = "acn generates structured identifiers (accession numbers, file references) \
from numbering schemes. A scheme binds a pattern such as {REPO}/{FONDS}/{SEQ:4} to a \
sequence counter that is allocated atomically, can reset yearly, monthly or daily, and \
can reuse reclaimed numbers.

Schemes are stored as TOML files next to a .accession project configuration."
)]
#[command(after_help = GLOBAL_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new accession project in the current directory
    #[command(
        long_about = "Initialize a new accession project in the current directory.\n\n\
Creates a .accession configuration file, the scheme directory, and the default \
'archive-standard' scheme ({REPO}/{FONDS}/{SEQ:4}) for the archive sector."
    )]
    Init,

    /// Manage numbering schemes
    #[command(subcommand)]
    Scheme(SchemeCommand),

    /// Generate identifiers (allocates sequence values)
    #[command(
        long_about = "Generate the next identifier for a scheme, or for a sector's default scheme.\n\n\
Contextual tokens are filled from --field KEY=VALUE, then from the scheme's defaults. \
Missing values are written as the token name unless strict mode is on.",
        after_help = "Examples:\n  \
acn generate --scheme archive-standard -f REPO=NARSSA -f FONDS=A\n  \
acn generate --sector museum\n  \
acn generate --scheme accession --count 25\n  \
acn generate --scheme archive-standard --repo-name \"Western Cape Archives\" -f FONDS=B\n\n\
Output: one identifier per line."
    )]
    Generate {
        /// Scheme id
        #[arg(long, conflicts_with = "sector", required_unless_present = "sector")]
        scheme: Option<String>,

        /// Use the default scheme of this sector
        #[arg(long, value_enum)]
        sector: Option<Sector>,

        /// Contextual value (repeatable), e.g. -f FONDS=A
        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Repository name, abbreviated to initials for {REPO}
        #[arg(long)]
        repo_name: Option<String>,

        /// Fail when a contextual token has no value
        #[arg(long)]
        strict: bool,

        /// Number of identifiers (reserved as one contiguous block)
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=MAX_BATCH_SIZE))]
        count: u64,
    },

    /// Preview a pattern without allocating sequence values
    #[command(after_help = "Examples:\n  \
acn preview \"{PREFIX}-{YEAR}-{SEQ:5}\" -f PREFIX=ACC\n  \
acn preview \"{REPO}/{RANDOM:6}\" --count 3")]
    Preview {
        /// Pattern to render
        pattern: String,

        /// Contextual value (repeatable)
        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Repository name, abbreviated to initials for {REPO}
        #[arg(long)]
        repo_name: Option<String>,

        /// Number of samples (stand-in sequence values 1, 2, 3, ...)
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=MAX_BATCH_SIZE))]
        count: u64,
    },

    /// Show the next sequence value without allocating it
    Peek {
        #[arg(long)]
        scheme: String,
    },

    /// Set a scheme's counter so the next value is TO + 1
    #[command(
        long_about = "Set a scheme's counter so the next allocation returns TO + 1.\n\n\
Moving the counter below a value already issued in the current epoch is rejected \
because it would produce duplicate identifiers. Use --force to override."
    )]
    Reset {
        #[arg(long)]
        scheme: String,

        /// New last-issued value
        #[arg(long)]
        to: u64,

        /// Allow re-issuing values
        #[arg(long)]
        force: bool,
    },

    /// Return an issued value to a fill-gaps scheme's pool
    Reclaim {
        #[arg(long)]
        scheme: String,

        /// Value to reuse
        value: u64,
    },

    /// Check a pattern for errors and unknown tokens
    Validate {
        /// Pattern to check
        pattern: String,
    },

    /// Check a manually entered identifier against a scheme
    Check {
        #[arg(long)]
        scheme: String,

        /// Identifier to check
        identifier: String,
    },

    /// Show numbering status per sector
    Info {
        #[arg(long, value_enum)]
        sector: Option<Sector>,
    },

    /// List the pattern tokens
    Tokens,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SchemeCommand {
    /// Create or replace a scheme
    #[command(after_help = "Examples:\n  \
acn scheme add accession --sector museum --pattern \"{YEAR}.{SEQ:4}\" --reset yearly --default\n  \
acn scheme add dam --sector dam --pattern \"{PREFIX}-{SEQ:6}\" --set PREFIX=DAM --fill-gaps")]
    Add {
        /// Scheme id (letters, digits, '-' and '_')
        id: String,

        #[arg(long)]
        pattern: String,

        #[arg(long, value_enum, default_value_t = Sector::Archive)]
        sector: Sector,

        /// Display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum, default_value_t = SequenceReset::Never)]
        reset: SequenceReset,

        /// Reuse reclaimed values before incrementing
        #[arg(long)]
        fill_gaps: bool,

        /// Regular expression manual and generated identifiers must match
        #[arg(long)]
        regex: Option<String>,

        /// Allow manually entered identifiers
        #[arg(long)]
        manual_override: bool,

        /// Make this the sector's default scheme
        #[arg(long)]
        default: bool,

        /// Save as inactive
        #[arg(long)]
        inactive: bool,

        /// Do not auto-generate identifiers for new records
        #[arg(long)]
        no_auto: bool,

        /// Default contextual value (repeatable), e.g. --set PREFIX=ACC
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_field)]
        defaults: Vec<(String, String)>,

        /// Overwrite an existing scheme's settings (its counter is kept)
        #[arg(long)]
        replace: bool,
    },

    /// List schemes
    List {
        #[arg(long, value_enum)]
        sector: Option<Sector>,
    },

    /// Show all settings of a scheme
    Show {
        id: String,
    },
}

fn main() {
    init_logging();

    if let Err(err) = run() {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init(),

        Commands::Scheme(SchemeCommand::Add {
            id,
            pattern,
            sector,
            name,
            reset,
            fill_gaps,
            regex,
            manual_override,
            default,
            inactive,
            no_auto,
            defaults,
            replace,
        }) => commands::scheme::add(SchemeAddArgs {
            id,
            name,
            sector,
            pattern,
            reset,
            fill_gaps,
            validation_regex: regex,
            allow_manual_override: manual_override,
            is_default: default,
            inactive,
            no_auto_generate: no_auto,
            defaults,
            replace,
        }),

        Commands::Scheme(SchemeCommand::List { sector }) => commands::scheme::list(sector),

        Commands::Scheme(SchemeCommand::Show { id }) => commands::scheme::show(&id),

        Commands::Generate {
            scheme,
            sector,
            fields,
            repo_name,
            strict,
            count,
        } => {
            let target = match (scheme, sector) {
                (Some(id), _) => Target::Scheme(id),
                (None, Some(sector)) => Target::Sector(sector),
                (None, None) => anyhow::bail!("Either --scheme or --sector is required"),
            };
            commands::generate(&GenerateArgs {
                target,
                fields,
                repo_name,
                strict,
                count,
            })
        }

        Commands::Preview {
            pattern,
            fields,
            repo_name,
            count,
        } => commands::preview(&PreviewArgs {
            pattern,
            fields,
            repo_name,
            count,
        }),

        Commands::Peek { scheme } => commands::peek(&scheme),

        Commands::Reset { scheme, to, force } => commands::reset(&scheme, to, force),

        Commands::Reclaim { scheme, value } => commands::reclaim(&scheme, value),

        Commands::Validate { pattern } => commands::validate(&pattern),

        Commands::Check { scheme, identifier } => commands::check(&scheme, &identifier),

        Commands::Info { sector } => commands::info(sector),

        Commands::Tokens => {
            commands::tokens();
            Ok(())
        }

        Commands::Completions { shell } => {
            commands::completions::execute(shell, &mut Cli::command())
        }
    }
}
