//! Dial tick labels, written as hours with vulgar fractions ("1½", "⅔").

const TOLERANCE: f64 = 1e-6;
const DENOMINATORS: [u32; 6] = [2, 3, 4, 5, 6, 8];

/// Labels for every section boundary: `tick_count` boundaries from 12 o'clock
/// plus the closing label for the full duration.
pub fn tick_labels(total_hours: f64, slice_hours: f64, tick_count: u64) -> Vec<String> {
    (0..tick_count)
        .map(|i| i as f64 * slice_hours)
        .chain(std::iter::once(total_hours))
        .map(format_hours)
        .collect()
}

pub fn format_hours(hours: f64) -> String {
    let whole = (hours + TOLERANCE).floor();
    let frac = hours - whole;
    if frac.abs() < TOLERANCE {
        return format!("{}", whole as i64);
    }
    for denominator in DENOMINATORS {
        let scaled = frac * f64::from(denominator);
        let numerator = scaled.round();
        if (scaled - numerator).abs() >= TOLERANCE {
            continue;
        }
        let Some(glyph) = vulgar_fraction(numerator as u32, denominator) else {
            break;
        };
        return if whole == 0.0 {
            glyph.to_string()
        } else {
            format!("{}{glyph}", whole as i64)
        };
    }
    format!("{hours:.2}")
}

/// Remaining time as `H:MM:SS`; partial seconds count as a whole second.
pub fn format_clock(remaining_secs: f64) -> String {
    let total = remaining_secs.max(0.0).ceil() as u64;
    let (hours, rest) = (total / 3600, total % 3600);
    format!("{hours}:{:02}:{:02}", rest / 60, rest % 60)
}

fn vulgar_fraction(numerator: u32, denominator: u32) -> Option<char> {
    let glyph = match (numerator, denominator) {
        (1, 2) => '½',
        (1, 3) => '⅓',
        (2, 3) => '⅔',
        (1, 4) => '¼',
        (3, 4) => '¾',
        (1, 5) => '⅕',
        (2, 5) => '⅖',
        (3, 5) => '⅗',
        (4, 5) => '⅘',
        (1, 6) => '⅙',
        (5, 6) => '⅚',
        (1, 8) => '⅛',
        (3, 8) => '⅜',
        (5, 8) => '⅝',
        (7, 8) => '⅞',
        _ => return None,
    };
    Some(glyph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_and_half_hours() {
        assert_eq!(format_hours(0.0), "0");
        assert_eq!(format_hours(2.0), "2");
        assert_eq!(format_hours(0.5), "½");
        assert_eq!(format_hours(3.5), "3½");
    }

    #[test]
    fn thirds_quarters_and_eighths() {
        assert_eq!(format_hours(1.0 / 3.0), "⅓");
        assert_eq!(format_hours(1.0 + 2.0 / 3.0), "1⅔");
        assert_eq!(format_hours(0.75), "¾");
        assert_eq!(format_hours(2.375), "2⅜");
        assert_eq!(format_hours(0.2 * 3.0), "⅗");
        assert_eq!(format_hours(5.0 / 6.0), "⅚");
    }

    #[test]
    fn float_noise_still_reads_as_whole() {
        assert_eq!(format_hours(0.1 * 30.0), "3");
        assert_eq!(format_hours(2.9999999999), "3");
    }

    #[test]
    fn other_fractions_use_two_decimals() {
        assert_eq!(format_hours(0.1), "0.10");
        assert_eq!(format_hours(1.07), "1.07");
    }

    #[test]
    fn clock_text_counts_down_in_whole_seconds() {
        assert_eq!(format_clock(12_600.0), "3:30:00");
        assert_eq!(format_clock(3599.2), "1:00:00");
        assert_eq!(format_clock(61.0), "0:01:01");
        assert_eq!(format_clock(0.0), "0:00:00");
        assert_eq!(format_clock(-3.0), "0:00:00");
    }

    #[test]
    fn default_exam_dial() {
        let labels = tick_labels(3.5, 0.5, 7);
        assert_eq!(
            labels,
            vec!["0", "½", "1", "1½", "2", "2½", "3", "3½"]
        );
    }

    #[test]
    fn partial_final_section_keeps_total_label() {
        let labels = tick_labels(1.25, 0.5, 3);
        assert_eq!(labels, vec!["0", "½", "1", "1¼"]);
    }
}
