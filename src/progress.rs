// src/progress.rs
//! Round progress spinner using indicatif

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner on stderr showing the active round; a no-op when disabled
#[derive(Clone)]
pub struct ProgressIndicator {
    spinner: Option<ProgressBar>,
}

impl ProgressIndicator {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { spinner: None };
        }

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner: Some(spinner),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Announce the start of round `round` with `jobs` hosts in its frontier
    pub fn round_started(&self, round: usize, jobs: usize) {
        self.set_message(format!("round {}: probing {} hosts", round, jobs));
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(msg.into());
        }
    }

    pub fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.spinner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_is_noop() {
        let progress = ProgressIndicator::disabled();
        assert!(!progress.is_enabled());

        progress.round_started(1, 10);
        progress.finish();
    }

    #[test]
    fn test_enabled_spinner_tracks_rounds() {
        let progress = ProgressIndicator::new(true);
        assert!(progress.is_enabled());

        progress.round_started(2, 5);
        progress.finish();
    }
}
