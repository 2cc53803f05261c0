use std::collections::HashSet;

/// Percentage of a course's lectures the viewer has completed, rounded to
/// the nearest whole percent. Completed ids that no longer exist in the
/// course (removed lectures) are ignored. A course with no lectures is 0%
/// complete rather than a division by zero.
pub fn completion_percent(course_lecture_ids: &HashSet<String>, completed: &HashSet<String>) -> u8 {
    let total = course_lecture_ids.len();
    if total == 0 {
        return 0;
    }
    let done = completed.intersection(course_lecture_ids).count();
    ((100.0 * done as f64) / total as f64).round() as u8
}

/// A certificate is earned only at full completion.
pub fn certificate_eligible(
    course_lecture_ids: &HashSet<String>,
    completed: &HashSet<String>,
) -> bool {
    !course_lecture_ids.is_empty() && completion_percent(course_lecture_ids, completed) == 100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> HashSet<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_course_is_zero_percent() {
        assert_eq!(completion_percent(&ids(&[]), &ids(&[])), 0);
        assert!(!certificate_eligible(&ids(&[]), &ids(&[])));
    }

    #[test]
    fn fresh_progress_is_zero_percent() {
        let course = ids(&["l1", "l2", "l3"]);
        assert_eq!(completion_percent(&course, &ids(&[])), 0);
    }

    #[test]
    fn percent_progresses_through_a_three_lecture_course() {
        // Two chapters, three lectures total, marked one at a time.
        let course = ids(&["l1", "l2", "l3"]);
        let mut completed = HashSet::new();

        let mut seen = vec![completion_percent(&course, &completed)];
        for id in ["l1", "l2", "l3"] {
            completed.insert(id.to_string());
            seen.push(completion_percent(&course, &completed));
        }

        assert_eq!(seen, vec![0, 33, 67, 100]);
        assert!(certificate_eligible(&course, &completed));
    }

    #[test]
    fn percent_is_monotonic_as_lectures_complete() {
        let course: HashSet<String> = (0..17).map(|i| format!("l{i}")).collect();
        let mut completed = HashSet::new();
        let mut last = 0;
        for id in course.iter() {
            completed.insert(id.clone());
            let pct = completion_percent(&course, &completed);
            assert!(pct >= last);
            last = pct;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn stale_completed_ids_do_not_count() {
        let course = ids(&["l1", "l2"]);
        let completed = ids(&["l1", "removed"]);
        assert_eq!(completion_percent(&course, &completed), 50);
        assert!(!certificate_eligible(&course, &completed));
    }

    #[test]
    fn certificate_requires_exactly_the_full_set() {
        let course = ids(&["l1", "l2"]);
        assert!(!certificate_eligible(&course, &ids(&["l1"])));
        assert!(certificate_eligible(&course, &ids(&["l1", "l2"])));
        // Order and extras are irrelevant, membership is what counts.
        assert!(certificate_eligible(&course, &ids(&["l2", "l1", "gone"])));
    }
}
