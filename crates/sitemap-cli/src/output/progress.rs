//! Progress display utilities

use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

/// A spinner on stderr, hidden when stderr is not a terminal.
///
/// Use for synchronous work of unknown duration.
pub fn spinner(message: &str) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
