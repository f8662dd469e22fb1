//! Kubernetes resource quantity parsing
//!
//! Converts quantity strings (`250m`, `1.5`, `128Mi`, `2G`, `1e3`) into
//! integer millicores or bytes. Fractional results round up, matching how
//! the API server reports milli values.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity '{0}'")]
    Invalid(String),

    #[error("negative quantity '{0}'")]
    Negative(String),
}

/// Parse a quantity into its plain numeric value (cores, bytes, ...)
pub fn parse_quantity(input: &str) -> Result<f64, QuantityError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    let base: f64 = number
        .parse()
        .map_err(|_| QuantityError::Invalid(input.to_string()))?;

    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024.0_f64.powi(2),
        "Gi" => 1024.0_f64.powi(3),
        "Ti" => 1024.0_f64.powi(4),
        "Pi" => 1024.0_f64.powi(5),
        "Ei" => 1024.0_f64.powi(6),
        s if s.starts_with('e') || s.starts_with('E') => {
            let exponent: i32 = s[1..]
                .parse()
                .map_err(|_| QuantityError::Invalid(input.to_string()))?;
            10f64.powi(exponent)
        }
        _ => return Err(QuantityError::Invalid(input.to_string())),
    };

    let value = base * multiplier;
    if value < 0.0 {
        return Err(QuantityError::Negative(input.to_string()));
    }
    Ok(value)
}

/// Parse a CPU quantity into millicores, rounding up
pub fn parse_cpu_millicores(input: &str) -> Result<u64, QuantityError> {
    parse_quantity(input).map(|cores| round_up(cores * 1000.0))
}

/// Parse a memory quantity into bytes, rounding up
pub fn parse_memory_bytes(input: &str) -> Result<u64, QuantityError> {
    parse_quantity(input).map(round_up)
}

/// Suffixes that a byte count can be rendered with exactly
const BYTE_SUFFIXES: [(&str, u64); 12] = [
    ("Ki", 1 << 10),
    ("Mi", 1 << 20),
    ("Gi", 1 << 30),
    ("Ti", 1 << 40),
    ("Pi", 1 << 50),
    ("Ei", 1 << 60),
    ("k", 1_000),
    ("M", 1_000_000),
    ("G", 1_000_000_000),
    ("T", 1_000_000_000_000),
    ("P", 1_000_000_000_000_000),
    ("E", 1_000_000_000_000_000_000),
];

/// Render a byte count as an exact quantity string
///
/// Picks the suffix with the smallest whole number, so `134217728` renders
/// as `128Mi` and `500000000` as `500M`. Counts no suffix divides render as
/// plain bytes.
pub fn format_memory_quantity(bytes: u64) -> String {
    if bytes == 0 {
        return "0".to_string();
    }
    BYTE_SUFFIXES
        .iter()
        .filter(|(_, factor)| bytes % factor == 0)
        .min_by_key(|(_, factor)| bytes / factor)
        .map(|(suffix, factor)| format!("{}{}", bytes / factor, suffix))
        .unwrap_or_else(|| bytes.to_string())
}

fn round_up(value: f64) -> u64 {
    // Absorb float noise such as 0.1 * 1000 = 100.00000000000001
    let rounded = (value * 1e6).round() / 1e6;
    rounded.ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_quantities() {
        assert_eq!(parse_cpu_millicores("250m"), Ok(250));
        assert_eq!(parse_cpu_millicores("1"), Ok(1000));
        assert_eq!(parse_cpu_millicores("1.5"), Ok(1500));
        assert_eq!(parse_cpu_millicores("0.1"), Ok(100));
        // metrics-server reports nanocores
        assert_eq!(parse_cpu_millicores("12345678n"), Ok(13));
        assert_eq!(parse_cpu_millicores("500u"), Ok(1));
    }

    #[test]
    fn test_memory_quantities() {
        assert_eq!(parse_memory_bytes("128Mi"), Ok(134_217_728));
        assert_eq!(parse_memory_bytes("1Gi"), Ok(1_073_741_824));
        assert_eq!(parse_memory_bytes("2G"), Ok(2_000_000_000));
        assert_eq!(parse_memory_bytes("10240Ki"), Ok(10_485_760));
        assert_eq!(parse_memory_bytes("1e3"), Ok(1000));
        assert_eq!(parse_memory_bytes("4096"), Ok(4096));
    }

    #[test]
    fn test_memory_quantity_rendering() {
        assert_eq!(format_memory_quantity(134_217_728), "128Mi");
        assert_eq!(format_memory_quantity(268_435_456), "256Mi");
        assert_eq!(format_memory_quantity(1_073_741_824), "1Gi");
        assert_eq!(format_memory_quantity(2_000_000_000), "2G");
        assert_eq!(format_memory_quantity(500_000_000), "500M");
        assert_eq!(format_memory_quantity(3_072), "3Ki");
        assert_eq!(format_memory_quantity(1_001), "1001");
        assert_eq!(format_memory_quantity(0), "0");
    }

    #[test]
    fn test_memory_quantity_parses_back() {
        for raw in ["128Mi", "1Gi", "2G", "750k", "3Ki"] {
            let bytes = parse_memory_bytes(raw).unwrap();
            assert_eq!(format_memory_quantity(bytes), raw);
        }
    }

    #[test]
    fn test_invalid_quantities() {
        assert_eq!(parse_memory_bytes(""), Err(QuantityError::Empty));
        assert!(matches!(
            parse_memory_bytes("lots"),
            Err(QuantityError::Invalid(_))
        ));
        assert!(matches!(
            parse_memory_bytes("12Xi"),
            Err(QuantityError::Invalid(_))
        ));
        assert!(matches!(
            parse_cpu_millicores("-1"),
            Err(QuantityError::Negative(_))
        ));
    }
}
