use std::io::Write;

use anyhow::Result;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented stdin shared by the shell and the interactive commands
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }

    /// Print `prompt` and read one trimmed line. `None` at end of input.
    pub async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}
