//! Student identifiers look like `STU-007`.
//!
//! New ids take the numeric suffix of the lexicographically greatest existing
//! id and add one. This is best-effort: two concurrent creations can pick the
//! same id, in which case the second insert fails as a duplicate.

///the id that the user asked for, unless it is blank or exactly `NEW`
pub fn requested_id(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty() && *id != "NEW")
}

pub fn next_student_id(prefix: &str, max_existing: Option<&str>) -> String {
    let next = max_existing
        .and_then(|id| id.split('-').nth(1))
        .and_then(|suffix| suffix.trim().parse::<u64>().ok())
        .map_or(1, |n| n.saturating_add(1));

    format!("{prefix}-{next:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_id_when_empty() {
        assert_eq!(next_student_id("STU", None), "STU-001");
    }

    #[test]
    fn successor_is_zero_padded() {
        assert_eq!(next_student_id("STU", Some("STU-009")), "STU-010");
        assert_eq!(next_student_id("STU", Some("STU-041")), "STU-042");
    }

    #[test]
    fn padding_grows_past_three_digits() {
        assert_eq!(next_student_id("STU", Some("STU-999")), "STU-1000");
    }

    #[test]
    fn unparseable_suffix_restarts_at_one() {
        assert_eq!(next_student_id("STU", Some("legacy")), "STU-001");
        assert_eq!(next_student_id("STU", Some("STU-abc")), "STU-001");
        assert_eq!(next_student_id("STU", Some("STU-")), "STU-001");
    }

    #[test]
    fn only_the_second_segment_counts() {
        assert_eq!(next_student_id("STU", Some("STU-012-B")), "STU-013");
    }

    #[test]
    fn placeholder_ids_request_generation() {
        assert_eq!(requested_id(None), None);
        assert_eq!(requested_id(Some("")), None);
        assert_eq!(requested_id(Some("  ")), None);
        assert_eq!(requested_id(Some("NEW")), None);
        assert_eq!(requested_id(Some("STU-123")), Some("STU-123"));
    }

    #[test]
    fn only_the_exact_placeholder_is_special() {
        assert_eq!(requested_id(Some("new")), Some("new"));
        assert_eq!(requested_id(Some("New")), Some("New"));
        assert_eq!(requested_id(Some(" NEW ")), Some(" NEW "));
    }
}
