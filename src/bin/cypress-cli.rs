// The dispatch library is meant to be driven by the `cypress` launcher.
// Running this target directly is refused before any argument is looked at.

use cypress_cli::logging;

const STANDALONE_EXIT_STATUS: i32 = -1;

fn main() {
    logging::init_errors_only();
    tracing::error!("This CLI module should be invoked from the cypress launcher");
    tracing::error!("and not executed directly");
    std::process::exit(STANDALONE_EXIT_STATUS);
}
