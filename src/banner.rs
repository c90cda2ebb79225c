// src/banner.rs
//! Startup banner, printed to stderr so it never mixes with results

use colored::Colorize;

const LOGO: &str = r"
                     __   _         ____
  _____ ___   _____ / /_ (_)____   / __/____
 / ___// _ \ / ___// __// // __ \ / /_ / __ \
/ /__ /  __// /   / /_ / // / / // __// /_/ /
\___/ \___//_/    \__//_//_/ /_//_/   \____/
";

pub fn version_line() -> String {
    format!("Current certinfo version v{}", env!("CARGO_PKG_VERSION"))
}

pub fn print_banner() {
    eprintln!("{}", LOGO.cyan().bold());
    eprintln!("{}\n", format!("{:>50}", version_line()).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line_uses_package_version() {
        assert!(version_line().ends_with(env!("CARGO_PKG_VERSION")));
    }
}
