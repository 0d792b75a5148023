//! Tail the fact log command
//!
//! Prints the last lines of the fact log using a backward read, then
//! optionally follows new content, similar to `tail -f`.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use fact_cache::{CacheConfig, LogRecord, last_lines};

/// Print the last lines of the fact log
#[derive(Parser, Debug)]
pub struct Tail {
    /// Number of lines to show
    #[arg(short = 'n', long, default_value = "10")]
    pub lines: usize,

    /// Keep printing lines as they are appended
    #[arg(short, long)]
    pub follow: bool,

    /// Poll interval in milliseconds (with --follow)
    #[arg(long, default_value = "100")]
    pub poll_interval: u64,
}

impl Tail {
    pub fn execute(self, config: &CacheConfig) -> Result<()> {
        let path = config.facts_path.as_path();
        if !path.exists() {
            eprintln!("{}", style("✗ Fact log not found").red().bold());
            eprintln!("  Path: {}", style(path.display()).dim());
            anyhow::bail!("Fact log does not exist");
        }

        let lines = last_lines(path, self.lines)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        for line in &lines {
            print_line(line);
        }

        if self.follow {
            self.follow_file(path)?;
        }

        Ok(())
    }

    fn follow_file(&self, path: &Path) -> Result<()> {
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open fact log: {}", path.display()))?;
        file.seek(SeekFrom::End(0))?;

        let mut reader = BufReader::new(file);
        let poll_interval = Duration::from_millis(self.poll_interval);
        let mut pending = String::new();

        loop {
            match reader.read_line(&mut pending) {
                Ok(0) => std::thread::sleep(poll_interval),
                Ok(_) if pending.ends_with('\n') => {
                    print_line(pending.trim_end());
                    pending.clear();
                }
                // Partial line still being appended; keep it and retry.
                Ok(_) => std::thread::sleep(poll_interval),
                Err(e) => {
                    return Err(e).context("Failed to read fact log");
                }
            }
        }
    }
}

/// Highlight unparsable lines so torn appends stand out.
fn print_line(line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match LogRecord::parse(line) {
        Some(_) => println!("{}", line),
        None => println!("{}", style(line).red()),
    }
}
