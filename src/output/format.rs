//! Number formatting for benchmark output.

type Units = &'static [(f64, &'static str)];

const RATE_UNITS: Units = &[(1.0, ""), (1e3, "K"), (1e6, "M")];
const LATENCY_UNITS: Units = &[(1.0, "us"), (1e3, "ms"), (1e6, "s")];
const BANDWIDTH_UNITS: Units = &[(1.0, "bps"), (1e3, "Kbps"), (1e6, "Mbps"), (1e9, "Gbps")];
const COUNT_UNITS: Units = &[(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B")];

/// Divide `value` by the largest unit it reaches. `units` is ascending.
fn scale(value: f64, units: Units) -> (f64, &'static str) {
    let (factor, suffix) = units
        .iter()
        .rev()
        .find(|(factor, _)| value >= *factor)
        .copied()
        .unwrap_or(units[0]);
    (value / factor, suffix)
}

/// Three significant figures, e.g. "1.23", "12.3", "123".
fn format_3sig(value: f64, suffix: &str) -> String {
    // 9.995 rounds to 10.00 and 99.95 to 100.0, so switch precision early.
    let precision = if value < 9.995 {
        2
    } else if value < 99.95 {
        1
    } else {
        0
    };
    format!("{:.*}{}", precision, value, suffix)
}

/// Requests per second with a K or M suffix.
pub fn format_rate(value: f64) -> String {
    let (scaled, suffix) = scale(value, RATE_UNITS);
    format_3sig(scaled, suffix)
}

pub fn format_rate_padded(value: f64, width: usize) -> String {
    format!("{:>width$}", format_rate(value))
}

/// A latency given in microseconds, shown as us, ms or s.
pub fn format_latency_us(us: f64) -> String {
    let (scaled, suffix) = scale(us, LATENCY_UNITS);
    format_3sig(scaled, suffix)
}

pub fn format_latency_padded(us: f64, width: usize) -> String {
    format!("{:>width$}", format_latency_us(us))
}

/// Percentage without the sign. Values that round to 100 drop the decimals.
pub fn format_pct(value: f64) -> String {
    let precision = if value >= 99.95 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*}", precision, value)
}

/// Bits per second.
pub fn format_bandwidth_bps(bps: f64) -> String {
    let (scaled, unit) = scale(bps, BANDWIDTH_UNITS);
    let precision = match unit {
        "bps" => 0,
        "Gbps" => 2,
        _ => 1,
    };
    format!("{:.*} {}", precision, scaled, unit)
}

/// Exact below a thousand, one decimal with K, M or B above.
pub fn format_count(value: u64) -> String {
    if value < 1_000 {
        return value.to_string();
    }
    let (scaled, suffix) = scale(value as f64, COUNT_UNITS);
    format!("{:.1}{}", scaled, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(1.23), "1.23");
        assert_eq!(format_rate(12.3), "12.3");
        assert_eq!(format_rate(500.0), "500");
        assert_eq!(format_rate(1_230.0), "1.23K");
        assert_eq!(format_rate(234_000.0), "234K");
        assert_eq!(format_rate(12_300_000.0), "12.3M");
        // rounding at the precision boundaries
        assert_eq!(format_rate(99_950.0), "100K");
        assert_eq!(format_rate(9_995.0), "10.0K");
    }

    #[test]
    fn test_format_rate_padded() {
        assert_eq!(format_rate_padded(1_230.0, 7), "  1.23K");
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency_us(1.23), "1.23us");
        assert_eq!(format_latency_us(42.5), "42.5us");
        assert_eq!(format_latency_us(999.0), "999us");
        assert_eq!(format_latency_us(1_230.0), "1.23ms");
        assert_eq!(format_latency_us(200_000.0), "200ms");
        assert_eq!(format_latency_us(42_500_000.0), "42.5s");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(100.0), "100");
        assert_eq!(format_pct(95.23), "95.2");
        assert_eq!(format_pct(9.99), "9.99");
        assert_eq!(format_pct(0.0), "0.00");
    }

    #[test]
    fn test_format_bandwidth() {
        assert_eq!(format_bandwidth_bps(500.0), "500 bps");
        assert_eq!(format_bandwidth_bps(1_500.0), "1.5 Kbps");
        assert_eq!(format_bandwidth_bps(1_240_000_000.0), "1.24 Gbps");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(100_000), "100.0K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }
}
