//! Terminal renditions of the notification and navigation seams.

use services::{Navigator, Notifier};
use tokio::sync::mpsc;

/// Prints notifications as status lines on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_success(&self, message: &str) {
        tracing::debug!(message, "notify success");
        println!("[ok] {message}");
    }

    fn notify_error(&self, message: &str) {
        tracing::debug!(message, "notify error");
        println!("[error] {message}");
    }
}

/// A CLI has a single view; routes are only announced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn go_to(&self, path: &str) {
        tracing::debug!(path, "navigate");
        println!("-> {path}");
    }
}

/// Read stdin lines on a dedicated thread. The channel closes at end of input.
///
/// `tokio::io::stdin` keeps the runtime from shutting down while a read is
/// pending, so sessions that end on their own could not exit.
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Split a session input line into a `:command` with its argument, or plain text.
pub fn split_command(line: &str) -> Result<(&str, &str), &str> {
    let trimmed = line.trim();
    match trimmed.strip_prefix(':') {
        Some(rest) => {
            let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Ok((name, arg.trim()))
        }
        None => Err(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_and_text_are_told_apart() {
        assert_eq!(split_command(":go 3"), Ok(("go", "3")));
        assert_eq!(split_command("  :submit  "), Ok(("submit", "")));
        assert_eq!(split_command("use a min-heap"), Err("use a min-heap"));
    }
}
