use clap::Parser;

/// Reports the mandatory integrity level of the current process.
///
/// Prints the level name (or its SID) on stdout and exits 0; on failure a
/// diagnostic goes to stderr and the exit code is non-zero, so a parent
/// process can use this binary as the child half of a sandbox round trip.
#[derive(Parser, Debug)]
#[command(
    name = "integrity",
    about = "Report the Windows integrity level of the current process",
    version
)]
struct Args {
    /// Print the mandatory-label SID instead of the level name
    #[arg(long)]
    sid: bool,
}

#[cfg(windows)]
fn main() {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the level for the caller.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match integrity_rs::current_process_integrity_level() {
        Ok(level) => {
            if args.sid {
                println!("{}", level.sid_string());
            } else {
                println!("{level}");
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(windows))]
fn main() {
    let _ = Args::parse();
    eprintln!("error: mandatory integrity levels are only available on Windows");
    std::process::exit(1);
}
