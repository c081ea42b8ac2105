//! Text helpers for user-facing replies.

use unqgate_types::TokenAmount;

/// Minimum fractional digits shown for amounts.
const AMOUNT_DIGITS: usize = 6;

/// Shorten long addresses to `first10...last10`.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 20 {
        return address.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{head}...{tail}")
}

/// Render an amount with at least six fractional digits. Never rounds.
pub fn format_amount(amount: &TokenAmount) -> String {
    let text = amount.to_string();
    let frac_len = text.split_once('.').map_or(0, |(_, f)| f.len());
    if frac_len >= AMOUNT_DIGITS {
        return text;
    }
    let mut out = text;
    if frac_len == 0 {
        out.push('.');
    }
    out.extend(std::iter::repeat('0').take(AMOUNT_DIGITS - frac_len));
    out
}

/// Trim and strip angle brackets.
pub fn sanitize_input(input: &str) -> String {
    input.trim().chars().filter(|c| *c != '<' && *c != '>').collect()
}
