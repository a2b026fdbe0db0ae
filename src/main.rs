use std::env;

use heic_sim::{cli, logging};

fn main() {
    logging::init();
    let args: Vec<String> = env::args().collect();
    std::process::exit(cli::run_with_args(&args));
}
