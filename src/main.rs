use cypress_cli::binary::BinaryHandlers;
use cypress_cli::config::{load_config, resolve_config};
use cypress_cli::dispatch::launch;
use cypress_cli::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let (config_path, file) = load_config();
    let handlers = BinaryHandlers::new(resolve_config(&file, config_path));

    match launch(std::env::args_os(), &handlers).await {
        Ok(exit) => {
            if let Some(code) = exit.code() {
                std::process::exit(code);
            }
        }
        Err(e) => {
            e.print_stderr();
            std::process::exit(e.exit_status());
        }
    }
}
