//! Command-line entry point: argument parsing, config resolution, and exit codes.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};

use crate::app::fields;
use crate::app::process::{ProcessStats, Processor};
use crate::domain::errors::{CutError, ProcessError};
use crate::infra::config::Config;
use crate::infra::logging;

const STDIN_PATH: &str = "-";

#[derive(Debug, Parser)]
#[command(name = "fieldcut", author, version, about = "Print selected fields from each line of input", long_about = None)]
pub struct Cli {
    /// Fields to select, e.g. '1,3-5,7-'
    #[arg(short = 'f', long = "fields", value_name = "LIST", allow_hyphen_values = true)]
    pub fields: String,

    /// Field delimiter (one or more characters) [default: TAB]
    #[arg(short = 'd', long = "delimiter", value_name = "DELIM", allow_hyphen_values = true)]
    pub delimiter: Option<String>,

    /// Only print lines containing the delimiter
    #[arg(short = 's', long = "only-delimited")]
    pub only_delimited: bool,

    /// Additional config file layered over the global one
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity on stderr (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Input files; '-' or none reads stdin
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Run the tool against the given streams and return the process exit code.
///
/// 0 on success, 1 when reading or writing fails mid-stream, 2 for usage and
/// configuration errors (nothing is read in that case).
pub fn run<I, T, R, W, E>(args: I, stdin: R, mut stdout: W, mut stderr: E) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: BufRead,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            return match write!(stdout, "{}", err.render()).and_then(|()| stdout.flush()) {
                Ok(()) => 0,
                Err(_) => 1,
            };
        }
        Err(err) => return report(CutError::Usage(err), &mut stderr),
    };

    match execute(cli, stdin, &mut stdout) {
        Ok(stats) => {
            tracing::info!(
                lines_read = stats.lines_read,
                lines_written = stats.lines_written,
                lines_suppressed = stats.lines_suppressed,
                "done"
            );
            0
        }
        Err(err) => report(err, &mut stderr),
    }
}

fn report<E: Write>(err: CutError, stderr: &mut E) -> u8 {
    // Nothing sensible is left to do if stderr itself is gone.
    let _ = match &err {
        CutError::Usage(usage) => write!(stderr, "{usage}"),
        other => writeln!(stderr, "fieldcut: {other}"),
    };
    err.exit_code()
}

fn execute<R: BufRead, W: Write>(
    cli: Cli,
    mut stdin: R,
    stdout: &mut W,
) -> Result<ProcessStats, CutError> {
    logging::init(cli.verbose);

    let selection = fields::parse(&cli.fields)?;
    tracing::debug!(%selection, "parsed field list");

    let config = Config::load(cli.config.as_deref()).map_err(CutError::Config)?;
    tracing::debug!(?config, "resolved configuration");

    let delimiter = cli.delimiter.unwrap_or(config.defaults.delimiter);
    let processor = Processor::new(selection)
        .with_delimiter(delimiter)
        .with_separated_only(cli.only_delimited || config.defaults.separated_only)
        .with_max_line_bytes(config.limits.max_line_bytes);

    let inputs = if cli.files.is_empty() {
        vec![PathBuf::from(STDIN_PATH)]
    } else {
        cli.files
    };

    let mut total = ProcessStats::default();
    for path in &inputs {
        tracing::debug!(input = %path.display(), "processing input");
        total += if path == Path::new(STDIN_PATH) {
            processor.process(&mut stdin, &mut *stdout)?
        } else {
            let file = File::open(path).map_err(|source| ProcessError::Open {
                path: path.clone(),
                source,
            })?;
            processor.process(BufReader::new(file), &mut *stdout)?
        };
    }

    Ok(total)
}
