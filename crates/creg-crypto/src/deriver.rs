//! Certificate identifier derivation.
//!
//! An identifier is a pure function of `(student_id, course, issued_at)`:
//! no counters, no registry round-trip, so issuers can compute it offline
//! before the ledger is contacted. Uniqueness across *different* inputs comes
//! from the hash; same-input, same-millisecond collisions are deliberately
//! left in place so the ledger rejects the duplicate submission.

use creg_types::{CertificateId, IssuedAt};

use crate::hasher::ContentHasher;

/// Canonical form of a course name: trimmed, internal whitespace runs
/// collapsed to a single `_`, lowercased.
///
/// `"  Computer   Science "` and `"computer science"` normalize identically.
pub fn normalize_course(course: &str) -> String {
    course
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Derive the identifier for a certificate.
///
/// The student id is used verbatim. The course is normalized with
/// [`normalize_course`]. The instant contributes its millisecond count.
pub fn derive(student_id: &str, course: &str, issued_at: IssuedAt) -> CertificateId {
    let course = normalize_course(course);
    let millis = issued_at.as_millis().to_be_bytes();
    let digest = ContentHasher::CERTIFICATE.hash_fields(&[
        student_id.as_bytes(),
        course.as_bytes(),
        &millis,
    ]);
    CertificateId::from_hash(digest)
}

/// Human-readable label of the form `cert_<student>_<course>_<millis>`,
/// lowercased.
///
/// Display only. Labels are not collision resistant (student ids may
/// contain `_`) and are never used as ledger keys.
pub fn legacy_label(student_id: &str, course: &str, issued_at: IssuedAt) -> String {
    format!(
        "cert_{}_{}_{}",
        student_id,
        normalize_course(course),
        issued_at.as_millis()
    )
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const AT: IssuedAt = IssuedAt::from_millis(1_700_000_000_000);

    #[test]
    fn normalize_collapses_and_folds() {
        assert_eq!(normalize_course("Computer Science"), "computer_science");
        assert_eq!(normalize_course("  Computer \t  Science\n"), "computer_science");
        assert_eq!(normalize_course("MATH"), "math");
        assert_eq!(normalize_course(""), "");
    }

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(
            derive("ST2024001", "Computer Science", AT),
            derive("ST2024001", "Computer Science", AT)
        );
    }

    #[test]
    fn course_spelling_variants_collide() {
        assert_eq!(
            derive("ST2024001", "Computer Science", AT),
            derive("ST2024001", "computer   SCIENCE", AT)
        );
    }

    #[test]
    fn student_id_is_case_sensitive() {
        assert_ne!(
            derive("ST2024001", "Computer Science", AT),
            derive("st2024001", "Computer Science", AT)
        );
    }

    #[test]
    fn next_millisecond_does_not_collide() {
        let later = IssuedAt::from_millis(AT.as_millis() + 1);
        assert_ne!(derive("ST1", "Physics", AT), derive("ST1", "Physics", later));
    }

    #[test]
    fn field_boundary_shift_does_not_collide() {
        // Same concatenation "ab" + "c" vs "a" + "bc".
        assert_ne!(derive("ab", "c", AT), derive("a", "bc", AT));
    }

    #[test]
    fn legacy_label_format() {
        assert_eq!(
            legacy_label("ST2024001", "Computer Science", IssuedAt::from_millis(1234567890)),
            "cert_st2024001_computer_science_1234567890"
        );
    }

    proptest! {
        #[test]
        fn distinct_instants_never_collide(
            student in "[A-Z0-9]{1,12}",
            course in "[a-zA-Z ]{1,24}",
            a in 0u64..u64::MAX,
            b in 0u64..u64::MAX,
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(
                derive(&student, &course, IssuedAt::from_millis(a)),
                derive(&student, &course, IssuedAt::from_millis(b))
            );
        }

        #[test]
        fn whitespace_padding_is_ignored(
            student in "[A-Z0-9]{1,12}",
            words in prop::collection::vec("[a-z]{1,8}", 1..4),
            pad in " {0,3}",
        ) {
            let plain = words.join(" ");
            let padded = format!("{pad}{}{pad}", words.join("  "));
            prop_assert_eq!(derive(&student, &plain, AT), derive(&student, &padded, AT));
        }
    }
}
