//! Half-open interval arithmetic shared by the booking and opening-hours
//! checks. Works for any ordered time type (`NaiveDateTime`, `NaiveTime`).

/// `[a_start, a_end)` and `[b_start, b_end)` share at least one instant.
/// Ranges that only touch at an endpoint do not overlap.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// `[start, end)` lies entirely within `[outer_start, outer_end)`.
pub fn contains<T: PartialOrd>(outer_start: T, outer_end: T, start: T, end: T) -> bool {
    outer_start <= start && end <= outer_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_touching_ranges_do_not_overlap() {
        let t0 = dt("2025-06-16 10:00");
        let mid = dt("2025-06-16 10:30");
        let t1 = dt("2025-06-16 11:00");
        assert!(!overlaps(t0, mid, mid, t1));
        assert!(!overlaps(mid, t1, t0, mid));
    }

    #[test]
    fn test_partial_overlap_either_side() {
        assert!(overlaps(
            dt("2025-06-16 10:00"),
            dt("2025-06-16 10:30"),
            dt("2025-06-16 10:15"),
            dt("2025-06-16 10:45"),
        ));
        assert!(overlaps(
            dt("2025-06-16 10:15"),
            dt("2025-06-16 10:45"),
            dt("2025-06-16 10:00"),
            dt("2025-06-16 10:30"),
        ));
    }

    #[test]
    fn test_nested_and_identical_ranges_overlap() {
        assert!(overlaps(t("09:00"), t("17:00"), t("12:00"), t("12:30")));
        assert!(overlaps(t("12:00"), t("12:30"), t("09:00"), t("17:00")));
        assert!(overlaps(t("12:00"), t("12:30"), t("12:00"), t("12:30")));
    }

    #[test]
    fn test_disjoint_ranges() {
        assert!(!overlaps(t("09:00"), t("10:00"), t("11:00"), t("12:00")));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let points = ["09:00", "09:30", "10:00", "10:30", "11:00"].map(t);
        for &a0 in &points {
            for &a1 in points.iter().filter(|p| **p > a0) {
                for &b0 in &points {
                    for &b1 in points.iter().filter(|p| **p > b0) {
                        assert_eq!(overlaps(a0, a1, b0, b1), overlaps(b0, b1, a0, a1));
                    }
                }
            }
        }
    }

    #[test]
    fn test_contains() {
        assert!(contains(t("09:00"), t("17:00"), t("09:00"), t("17:00")));
        assert!(contains(t("09:00"), t("17:00"), t("10:00"), t("10:30")));
        assert!(!contains(t("09:00"), t("17:00"), t("16:45"), t("17:15")));
        assert!(!contains(t("09:00"), t("12:00"), t("11:30"), t("13:30")));
    }
}
