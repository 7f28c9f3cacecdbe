use arix_tree::cli;

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
