//! Trailsort CLI entry point.

#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

fn main() {
    if let Err(e) = trailsort::run() {
        eprintln!("error: {}", e.detailed_message());
        if e.is_configuration() {
            eprintln!("hint: run `trailsort config path` to locate the configuration file");
        }
        std::process::exit(1);
    }
}
