use std::process;

fn main() {
    env_logger::init();

    // A produced executable runs its payload and never reaches the CLI.
    if let Some(code) = file_binder::binder::stub::run_embedded() {
        process::exit(code);
    }

    let exit_code = match tokio::runtime::Runtime::new() {
        Ok(runtime) => match runtime.block_on(file_binder::cli::run()) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                e.exit_code()
            }
        },
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
