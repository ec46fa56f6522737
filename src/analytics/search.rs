use crate::data::student::Student;

/// Whether `needle` (already lowercased) appears in any of the searchable fields.
fn matches(student: &Student, needle: &str) -> bool {
    [
        &student.id,
        &student.full_name,
        &student.group,
        &student.major,
        &student.citizenship,
    ]
    .into_iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Keeps the students whose id, name, group, major or citizenship contain
/// `term`, ignoring case. A missing or empty term keeps everyone. Order is
/// preserved.
pub fn filter_students(students: Vec<Student>, term: Option<&str>) -> Vec<Student> {
    let Some(term) = term.filter(|term| !term.is_empty()) else {
        return students;
    };
    let needle = term.to_lowercase();

    students
        .into_iter()
        .filter(|student| matches(student, &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::test_support::student;

    fn students() -> Vec<Student> {
        let mut a = student("STU-001");
        a.full_name = "Aliyev Jamshid".to_string();
        a.citizenship = "Uzbekistan".to_string();
        a.group = "CS-21-1".to_string();

        let mut b = student("STU-002");
        b.full_name = "Wang Li".to_string();
        b.citizenship = "China".to_string();
        b.group = "BA-22-2".to_string();
        b.major = "Business Administration".to_string();

        let mut c = student("STU-003");
        c.full_name = "John Smith".to_string();
        c.citizenship = "United Kingdom".to_string();
        c.group = "ENG-23-1".to_string();
        c.major = "English Literature".to_string();

        vec![a, b, c]
    }

    fn ids(students: &[Student]) -> Vec<&str> {
        students.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn empty_term_keeps_everything_in_order() {
        assert_eq!(
            ids(&filter_students(students(), None)),
            ["STU-001", "STU-002", "STU-003"]
        );
        assert_eq!(
            ids(&filter_students(students(), Some(""))),
            ["STU-001", "STU-002", "STU-003"]
        );
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(ids(&filter_students(students(), Some("wang"))), ["STU-002"]);
        assert_eq!(ids(&filter_students(students(), Some("CHINA"))), ["STU-002"]);
    }

    #[test]
    fn each_field_is_searched() {
        assert_eq!(ids(&filter_students(students(), Some("stu-003"))), ["STU-003"]);
        assert_eq!(ids(&filter_students(students(), Some("ba-22"))), ["STU-002"]);
        assert_eq!(ids(&filter_students(students(), Some("literature"))), ["STU-003"]);
        assert_eq!(ids(&filter_students(students(), Some("kingdom"))), ["STU-003"]);
    }

    #[test]
    fn substring_hits_keep_original_order() {
        assert_eq!(
            ids(&filter_students(students(), Some("i"))),
            ["STU-001", "STU-002", "STU-003"]
        );
        assert_eq!(
            ids(&filter_students(students(), Some("english"))),
            ["STU-003"]
        );
    }

    #[test]
    fn fields_outside_the_set_are_not_searched() {
        let mut students = students();
        students[0].passport_number = "ZZ999".to_string();
        assert!(filter_students(students, Some("zz999")).is_empty());
    }
}
