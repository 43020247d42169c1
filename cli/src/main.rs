//! Binary entrypoint for solpatch

fn main() {
    if let Err(err) = solpatch_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
