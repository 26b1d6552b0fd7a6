//! Output abstraction for the interactive prompt
//!
//! Separates console I/O from the network-selection logic so the prompt can
//! be driven by a scripted reader and a capturing output in tests.

use crate::error::ClaimerResult;
use std::io::Write;

/// Output abstraction for operator-facing text
pub trait Output: Send + Sync {
    /// Print normal output
    fn print(&self, msg: &str) -> ClaimerResult<()>;

    /// Print error message
    fn error(&self, msg: &str) -> ClaimerResult<()>;

    /// Print a prompt without a trailing newline
    fn prompt(&self, msg: &str) -> ClaimerResult<()> {
        self.print(msg)
    }

    /// Print a section header
    fn header(&self, title: &str) -> ClaimerResult<()> {
        self.print(&format!("\n{}\n{}", title, "=".repeat(title.len())))
    }
}

/// Console output on stderr, keeping stdout free for piping
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn print(&self, msg: &str) -> ClaimerResult<()> {
        eprintln!("{}", msg);
        Ok(())
    }

    fn error(&self, msg: &str) -> ClaimerResult<()> {
        eprintln!("❌ {}", msg);
        Ok(())
    }

    fn prompt(&self, msg: &str) -> ClaimerResult<()> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{}", msg)?;
        stderr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock output for testing - captures all output
    #[derive(Clone)]
    pub struct MockOutput {
        messages: Arc<Mutex<Vec<String>>>,
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl MockOutput {
        pub fn new() -> Self {
            MockOutput {
                messages: Arc::new(Mutex::new(Vec::new())),
                errors: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn get_messages(&self) -> Vec<String> {
            self.messages.lock().map(|m| m.clone()).unwrap_or_default()
        }

        pub fn get_errors(&self) -> Vec<String> {
            self.errors.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    impl Default for MockOutput {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Output for MockOutput {
        fn print(&self, msg: &str) -> ClaimerResult<()> {
            if let Ok(mut messages) = self.messages.lock() {
                messages.push(msg.to_string());
            }
            Ok(())
        }

        fn error(&self, msg: &str) -> ClaimerResult<()> {
            if let Ok(mut errors) = self.errors.lock() {
                errors.push(msg.to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_mock_output_captures_messages() {
        let output = MockOutput::new();
        output.print("test message").unwrap();
        output.prompt("Enter network number: ").unwrap();

        let messages = output.get_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "test message");
        assert_eq!(messages[1], "Enter network number: ");
    }

    #[test]
    fn test_mock_output_captures_errors() {
        let output = MockOutput::new();
        output.error("Invalid network number").unwrap();
        assert_eq!(output.get_errors(), vec!["Invalid network number".to_string()]);
    }

    #[test]
    fn test_header_underline() {
        let output = MockOutput::new();
        output.header("Networks").unwrap();
        assert!(output.get_messages()[0].ends_with("========"));
    }
}
