//! Human-readable byte counts for progress lines.

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Human-readable size: `B`, `KB`, `MB` or `GB`, two decimals below 100 and one
/// above. `per_second` appends `/s`.
pub fn format_size(bytes: u64, per_second: bool) -> String {
    let b = bytes as f64;
    let (value, unit) = if b < KB {
        (b, "B")
    } else if b < MB {
        (b / KB, "KB")
    } else if b < GB {
        (b / MB, "MB")
    } else {
        (b / GB, "GB")
    };
    let number = if value < 100.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.1}")
    };
    let suffix = if per_second { "/s" } else { "" };
    format!("{number} {unit}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_and_precision() {
        assert_eq!(format_size(0, false), "0.00 B");
        assert_eq!(format_size(512, false), "512.0 B");
        assert_eq!(format_size(1536, false), "1.50 KB");
        assert_eq!(format_size(500_000, false), "488.3 KB");
        assert_eq!(format_size(5 * 1024 * 1024, true), "5.00 MB/s");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024, false), "3.00 GB");
    }
}
