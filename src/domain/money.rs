use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision
/// issues. 1 unit = 100 cents, so a balance of 5000.00 is 500_000 cents.
pub type Cents = i64;

/// Format cents as a decimal currency string: 500000 -> "5000.00".
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal string into cents: "5000" -> 500000, "12.5" -> 1250.
/// Decimal places beyond the second are truncated.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, unsigned) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, frac_str) = match unsigned.split_once('.') {
        Some((units, frac)) => (units, frac),
        None => (unsigned, ""),
    };

    if unsigned.is_empty() || (units_str.is_empty() && frac_str.is_empty()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    if frac_str.contains('.') {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let frac: i64 = match frac_str.len() {
        0 => 0,
        1 => {
            frac_str
                .parse::<i64>()
                .map_err(|_| ParseCentsError::InvalidFormat)?
                * 10
        }
        _ => {
            // Truncate to two decimal places; reject fractions whose third
            // byte is inside a multi-byte character rather than panic on a
            // char-boundary slice.
            if !frac_str.is_char_boundary(2) {
                return Err(ParseCentsError::InvalidFormat);
            }
            frac_str[..2]
                .parse()
                .map_err(|_| ParseCentsError::InvalidFormat)?
        }
    };

    let cents = units * 100 + frac;
    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
