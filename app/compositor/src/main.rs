//! Lattice binary: replay harness and configuration tooling.

fn main() {
    if let Err(err) = lattice_lib::cli::run() {
        eprintln!("lattice: {err}");
        std::process::exit(1);
    }
}
