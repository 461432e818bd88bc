//! Pure metric extraction from rendered analyzer HTML.
//!
//! Both extractors are first-match-wins and total: a missing or malformed
//! pattern yields 0.0, never an error. The label match is case-insensitive.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum characters of document context included in diagnostic logs.
pub(crate) const SNIPPET_MAX_CHARS: usize = 200;

/// Extract the win rate percentage.
///
/// Matches the first `Win Rate` heading followed by a `text-2xl` value
/// node carrying a decimal percentage, e.g.
/// `<h3>Win Rate</h3><p class="text-2xl">65.50%</p>` -> `65.50`.
#[must_use]
pub fn extract_win_rate(html: &str) -> f64 {
    static WIN_RATE_RE: OnceLock<Regex> = OnceLock::new();
    let re = WIN_RATE_RE.get_or_init(|| {
        Regex::new(r"(?i)Win Rate</h3><p[^>]*text-2xl[^>]*>([\d.]+)%").expect("valid regex")
    });

    let Some(caps) = re.captures(html) else {
        return 0.0;
    };
    match caps[1].parse::<f64>() {
        Ok(val) => val,
        Err(e) => {
            tracing::warn!("Failed to parse win rate value '{}': {}", &caps[1], e);
            0.0
        }
    }
}

/// Extract the realized PnL percentage.
///
/// Matches the first `Realized` label followed by a currency amount and a
/// parenthesized signed percentage, e.g.
/// `<p>Realized</p><p>-$500.00 <span>(-25.50%)</span></p>` -> `-25.50`.
/// Thousands separators are accepted in the currency amount but never
/// appear in the captured percentage.
#[must_use]
pub fn extract_realized_pnl(html: &str) -> f64 {
    static PNL_RE: OnceLock<Regex> = OnceLock::new();
    let re = PNL_RE.get_or_init(|| {
        Regex::new(r"(?i)Realized</p><p[^>]*>-?\$[\d,.]+\s*<span[^>]*>\((-?[\d.]+)%\)</span>")
            .expect("valid regex")
    });

    if let Some(caps) = re.captures(html) {
        return match caps[1].parse::<f64>() {
            Ok(val) => val,
            Err(e) => {
                tracing::warn!("Failed to parse realized PnL value '{}': {}", &caps[1], e);
                0.0
            }
        };
    }

    // The label was rendered but the value shape didn't match; surface a
    // bounded excerpt so selector drift is diagnosable from logs.
    if html.len() > 500 {
        static PNL_CONTEXT_RE: OnceLock<Regex> = OnceLock::new();
        let re = PNL_CONTEXT_RE
            .get_or_init(|| Regex::new(r"(?i)Realized.{0,200}").expect("valid regex"));
        if let Some(m) = re.find(html) {
            tracing::warn!("Realized PnL pattern missed, context: {}", m.as_str());
        }
    }

    0.0
}

/// Char-boundary-safe prefix of a document for diagnostic logging.
pub(crate) fn snippet(html: &str, max_chars: usize) -> String {
    html.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_win_rate_basic() {
        let html = r#"<h3>Win Rate</h3><p class="text-2xl">65.50%</p>"#;
        assert_eq!(extract_win_rate(html), 65.50);
    }

    #[test]
    fn test_extract_win_rate_case_insensitive() {
        let html = r#"<h3>WIN RATE</h3><p class="font-bold text-2xl mt-1">42.1%</p>"#;
        assert_eq!(extract_win_rate(html), 42.1);

        let html = r#"<h3>win rate</h3><p class="text-2xl">356.123%</p>"#;
        assert_eq!(extract_win_rate(html), 356.123);
    }

    #[test]
    fn test_extract_win_rate_first_match_wins() {
        let html = concat!(
            r#"<h3>Win Rate</h3><p class="text-2xl">10.00%</p>"#,
            r#"<h3>Win Rate</h3><p class="text-2xl">99.99%</p>"#,
        );
        assert_eq!(extract_win_rate(html), 10.00);
    }

    #[test]
    fn test_extract_win_rate_absent_or_malformed() {
        assert_eq!(extract_win_rate(""), 0.0);
        assert_eq!(extract_win_rate("<h3>Win Rate</h3>"), 0.0);
        // Value node missing the style marker
        assert_eq!(
            extract_win_rate(r#"<h3>Win Rate</h3><p class="small">65.50%</p>"#),
            0.0
        );
        // No percent sign
        assert_eq!(
            extract_win_rate(r#"<h3>Win Rate</h3><p class="text-2xl">65.50</p>"#),
            0.0
        );
    }

    #[test]
    fn test_extract_realized_pnl_basic() {
        let html = r#"<p>Realized</p><p>-$500.00 <span>(-25.50%)</span></p>"#;
        assert_eq!(extract_realized_pnl(html), -25.50);
    }

    #[test]
    fn test_extract_realized_pnl_positive_with_thousands() {
        let html = r#"<p>Realized</p><p class="mt-1">$1,234,567.89 <span class="text-xs">(356.123%)</span></p>"#;
        assert_eq!(extract_realized_pnl(html), 356.123);
    }

    #[test]
    fn test_extract_realized_pnl_negative_amount_positive_pct() {
        let html = r#"<p>realized</p><p>-$42.00<span>(3.5%)</span></p>"#;
        assert_eq!(extract_realized_pnl(html), 3.5);
    }

    #[test]
    fn test_extract_realized_pnl_first_match_wins() {
        let html = concat!(
            r#"<p>Realized</p><p>$10.00 <span>(1.00%)</span></p>"#,
            r#"<p>Realized</p><p>$20.00 <span>(2.00%)</span></p>"#,
        );
        assert_eq!(extract_realized_pnl(html), 1.00);
    }

    #[test]
    fn test_extract_realized_pnl_absent_or_malformed() {
        assert_eq!(extract_realized_pnl(""), 0.0);
        assert_eq!(extract_realized_pnl("<p>Realized</p>"), 0.0);
        // Percentage outside a span sub-element
        assert_eq!(
            extract_realized_pnl(r#"<p>Realized</p><p>$500.00 (-25.50%)</p>"#),
            0.0
        );
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let s = "é".repeat(300);
        let cut = snippet(&s, SNIPPET_MAX_CHARS);
        assert_eq!(cut.chars().count(), 200);
    }
}
