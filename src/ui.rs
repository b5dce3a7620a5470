use colored::*;
use terminal_size::{terminal_size, Height, Width};

use crate::providers::ProviderStatus;

fn rule() -> String {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    "─".repeat((width.0 as usize).min(100))
}

pub fn print_header(transport: &str) {
    let line = rule();
    println!("{}", line.black().bold());

    let name = "AI Factory".yellow().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {}", name, version);
    println!("{}", format!("  transport: {}", transport).cyan());

    println!("{}", line.black().bold());
}

/// Render the provider table; plain text so it can be tested.
pub fn provider_table(statuses: &[ProviderStatus]) -> Vec<String> {
    let name_width = statuses
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max("Provider".len());

    let mut rows = vec![format!("{:<name_width$}  {:<10}  {}", "Provider", "Configured", "Default Model")];
    for status in statuses {
        let mark = if status.configured { "✓" } else { "✗" };
        rows.push(format!(
            "{:<name_width$}  {:<10}  {}",
            status.name, mark, status.default_model
        ));
    }
    rows
}

pub fn print_provider_table(statuses: &[ProviderStatus]) {
    for (i, row) in provider_table(statuses).into_iter().enumerate() {
        if i == 0 {
            println!("  {}", row.bold());
        } else if statuses[i - 1].configured {
            println!("  {}", row.green());
        } else {
            println!("  {}", row.black().bold());
        }
    }
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_table_alignment() {
        let rows = provider_table(&[
            ProviderStatus {
                name: "gemini".to_string(),
                configured: true,
                default_model: "gemini-2.5-pro".to_string(),
            },
            ProviderStatus {
                name: "copilot".to_string(),
                configured: false,
                default_model: "gpt-4".to_string(),
            },
        ]);

        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("Provider  Configured"));
        assert!(rows[1].starts_with("gemini    ✓"));
        assert!(rows[2].ends_with("gpt-4"));
    }
}
