//! Engineering units and SI prefix handling.

/// Parse a SPICE-style value with optional SI suffix.
///
/// Supported suffixes (case-insensitive): T, G, MEG, K, M (milli), MIL, U
/// (or `µ`), N, P, F. Letters after the suffix are ignored the way SPICE
/// ignores them, so `10kOhm` and `100nF` parse as expected. An exponent
/// marker with no digits after it (`1e`, `2E+`) is rejected.
pub fn parse_value(s: &str) -> Option<f64> {
    let s = s.trim().to_uppercase();

    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }

    let num_end = s
        .char_indices()
        .find(|&(i, c)| {
            let exponent = c == 'E'
                && s[i + 1..]
                    .chars()
                    .next()
                    .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+');
            !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || exponent)
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    if num_end == 0 {
        return None;
    }

    let (num_str, suffix) = s.split_at(num_end);
    let value: f64 = num_str.parse().ok()?;

    let multiplier = if suffix.starts_with("MEG") {
        1e6
    } else if suffix.starts_with("MIL") {
        25.4e-6
    } else {
        match suffix.chars().next() {
            Some('T') => 1e12,
            Some('G') => 1e9,
            Some('K') => 1e3,
            Some('M') => 1e-3,
            // Micro sign and Greek mu both uppercase to U+039C.
            Some('U' | '\u{39C}' | '\u{B5}') => 1e-6,
            Some('N') => 1e-9,
            Some('P') => 1e-12,
            Some('F') => 1e-15,
            Some('E') => return None,
            Some(c) if c.is_ascii_alphabetic() || c == 'Ω' => 1.0,
            _ => return None,
        }
    };

    Some(value * multiplier)
}

/// Format a value for a netlist card.
///
/// Uses the shortest representation that round-trips and always keeps a
/// decimal point or exponent, so `5.0`, `1000.0` and `1e-6` come out the
/// same way every time.
pub fn format_netlist_value(value: f64) -> String {
    format!("{:?}", value)
}

/// Format a value with an SI prefix for human-readable messages.
pub fn format_si(value: f64) -> String {
    let abs_value = value.abs();

    let (scaled, suffix) = if abs_value >= 1e12 {
        (value / 1e12, "T")
    } else if abs_value >= 1e9 {
        (value / 1e9, "G")
    } else if abs_value >= 1e6 {
        (value / 1e6, "M")
    } else if abs_value >= 1e3 {
        (value / 1e3, "k")
    } else if abs_value >= 1.0 {
        (value, "")
    } else if abs_value >= 1e-3 {
        (value * 1e3, "m")
    } else if abs_value >= 1e-6 {
        (value * 1e6, "u")
    } else if abs_value >= 1e-9 {
        (value * 1e9, "n")
    } else if abs_value >= 1e-12 {
        (value * 1e12, "p")
    } else if abs_value >= 1e-15 {
        (value * 1e15, "f")
    } else {
        (value, "")
    };

    let text = format!("{:.3}", scaled);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", text, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|v| (v - b).abs() < b.abs() * 1e-10 + 1e-20)
    }

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_value("1.5"), Some(1.5));
        assert_eq!(parse_value("-2.5"), Some(-2.5));
        assert_eq!(parse_value("1e-3"), Some(1e-3));
    }

    #[test]
    fn test_parse_with_suffix() {
        assert!(approx_eq(parse_value("1k"), 1e3));
        assert!(approx_eq(parse_value("4.7K"), 4.7e3));
        assert!(approx_eq(parse_value("10M"), 10e-3));
        assert!(approx_eq(parse_value("10MEG"), 10e6));
        assert!(approx_eq(parse_value("100n"), 100e-9));
        assert!(approx_eq(parse_value("1u"), 1e-6));
        assert!(approx_eq(parse_value("10p"), 10e-12));
    }

    #[test]
    fn test_parse_trailing_unit_letters() {
        assert!(approx_eq(parse_value("10kOhm"), 10e3));
        assert!(approx_eq(parse_value("100nF"), 100e-9));
        assert!(approx_eq(parse_value("5V"), 5.0));
        assert!(approx_eq(parse_value("2.5e3Hz"), 2.5e3));
    }

    #[test]
    fn test_parse_micro_sign() {
        assert!(approx_eq(parse_value("4.7\u{B5}F"), 4.7e-6));
        assert!(approx_eq(parse_value("10\u{3BC}"), 10e-6));
        assert!(approx_eq(parse_value("2.2\u{3BC}H"), 2.2e-6));
        assert!(approx_eq(parse_value(&format_si(3.3e-6)), 3.3e-6));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("1e"), None);
        assert_eq!(parse_value("2E"), None);
        assert_eq!(parse_value("1e+"), None);
        assert_eq!(parse_value("3.3e-"), None);
    }

    #[test]
    fn test_netlist_value_format() {
        assert_eq!(format_netlist_value(5.0), "5.0");
        assert_eq!(format_netlist_value(1000.0), "1000.0");
        assert_eq!(format_netlist_value(1e-6), "1e-6");
        assert_eq!(format_netlist_value(-15.0), "-15.0");
    }

    #[test]
    fn test_format_si() {
        assert_eq!(format_si(1000.0), "1k");
        assert_eq!(format_si(4700.0), "4.7k");
        assert_eq!(format_si(0.001), "1m");
        assert_eq!(format_si(1e-9), "1n");
        assert_eq!(format_si(0.0), "0");
    }
}
