//! Transfer-rate extraction from push/pull progress output.

/// Extract a transfer rate such as `2.40 MiB/s` from a progress line.
///
/// Handles both a separate number token (`1.5 MiB/s`) and a fused one
/// (`850KiB/s`). Returns `None` when the line carries no rate.
pub fn parse_transfer_rate(line: &str) -> Option<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    for (i, raw) in tokens.iter().enumerate() {
        let token = raw.trim_end_matches([',', ')', ';']);
        if !token.ends_with("/s") || token.len() <= 2 {
            continue;
        }

        if token.starts_with(|c: char| c.is_ascii_digit()) {
            return Some(token.to_string());
        }

        if i > 0 {
            let number = tokens[i - 1].trim_start_matches('|');
            if !number.is_empty() && number.parse::<f64>().is_ok() {
                return Some(format!("{} {}", number, token));
            }
        }
    }

    None
}
