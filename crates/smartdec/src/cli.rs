use std::fmt::Display;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};

use smartnet::{BandPlan, ObtParams, UnrecognizedBandPlan};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program reads SmartNet control channel OSWs, one per line, and prints every voice grant and update as a line of JSON.

See --help for more details.
"#;

const USAGE_LONG: &str = r##"
This program reads SmartNet control channel OSWs, one per line, and prints every voice grant and update as a line of JSON.

The default text --format has one message per line:

    1616883240.125 osw 2460 G 100
    1616883240.150 reset
    1616883241.000 timeout

Each OSW line has a timestamp, the word "osw", the address in hex, G (group) or I (individual), and the command in hex. Timestamps are seconds or RFC 3339 date-times. Blank lines and lines starting with "#" are ignored.

The binary --format has fixed 16-byte records:

    u16 message type (big-endian): 0x0000 OSW, 0xfffe bad frame, 0xffff timeout
    f64 timestamp (big-endian)
    5-byte OSW payload: address (u16 BE), group flag, command (u16 BE)
    1 pad byte

You MUST select the --band-plan of your system. For OBT systems, also give the --obt-base, --obt-spacing, and --obt-offset.
"##;

const OBT: &str = "OBT Band Plan Options";

/// Input record format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// One text message per line
    Text,

    /// Fixed-length binary records
    Binary,
}

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even events
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Input format
    #[arg(long, value_enum, default_value_t = InputFormat::Text)]
    pub format: InputFormat,

    /// System band plan
    ///
    /// One of 800_domestic, 800_domestic_splinter, 800_rebanded,
    /// 900, or OBT.
    #[arg(short, long, default_value = "800_domestic")]
    #[arg(value_parser = parse_band_plan)]
    pub band_plan: BandPlan,

    /// System number, copied into every event
    #[arg(short, long, default_value_t = 0)]
    pub system_number: u32,

    /// Print a status report on exit
    #[arg(long)]
    pub status: bool,

    /// Frequency of the first receive channel (MHz)
    #[arg(long, default_value_t = 0.0)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = OBT)]
    pub obt_base: f64,

    /// Channel spacing (MHz)
    #[arg(long, default_value_t = 0.0)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = OBT)]
    pub obt_spacing: f64,

    /// Channel number of the first receive channel
    #[arg(long, default_value_t = 380)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = OBT)]
    pub obt_offset: u16,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }

    /// Band plan, with OBT parameters applied
    pub fn band_plan(&self) -> BandPlan {
        match self.band_plan {
            BandPlan::Obt(_) => BandPlan::Obt(ObtParams {
                base_mhz: self.obt_base,
                spacing_mhz: self.obt_spacing,
                offset: self.obt_offset,
            }),
            other => other,
        }
    }
}

fn parse_band_plan(name: &str) -> Result<BandPlan, UnrecognizedBandPlan> {
    BandPlan::from_name(name)
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}
