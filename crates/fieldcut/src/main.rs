use std::io::{self, BufWriter};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());

    let code = fieldcut::cli::run(std::env::args_os(), stdin, stdout, io::stderr());
    ExitCode::from(code)
}
