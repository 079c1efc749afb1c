use std::io;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{info, warn, LevelFilter};

use smartnet::{BandPlan, SmartnetDecoderBuilder};

mod app;
mod cli;

use cli::{Args, CliError};

fn main() {
    match smartdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn smartdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // create the decoder
    let band_plan = args.band_plan();
    if let BandPlan::Obt(params) = band_plan {
        if params.spacing_mhz <= 0.0 || params.base_mhz <= 0.0 {
            warn!("OBT band plan without --obt-base and --obt-spacing: channels will not resolve");
        }
    }
    info!("decoding with band plan {}", band_plan);

    let mut decoder = SmartnetDecoderBuilder::new(band_plan)
        .with_system_number(args.system_number)
        .build();

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let inbuf = file_setup(&args, stdin_handle)?;

    app::run(&args, &mut decoder, inbuf)?;

    if args.status {
        let status = decoder
            .status()
            .to_json()
            .context("unable to serialize status")?;
        println!("{}", status);
    }

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("smartnet", log_filter)
            .filter_module("smartdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("SmartNet decoder reading standard input");
        if !is_terminal(&std::io::stdin()) {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read OSWs from a terminal.

Pipe a recorded OSW log or a demodulator's output into this
program, or use --file."
            ))
        }
    } else {
        info!("SmartNet decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}
