//! Reconciles the untrusted candidate object into a complete `CanonicalResume`.
//!
//! Every field has exactly one defaulting rule below. The mapping is total:
//! any JSON value, including `null`, arrays, and wrong-typed fields, produces
//! a fully populated record.

use serde_json::{Map, Value};

use crate::models::resume::{
    AdditionalCourse, Availability, Award, CanonicalResume, Certification, Education, Experience,
    PortfolioItem, ProfessionalAffiliation, Project, Publication, Reference, Volunteer,
};

/// Keys tried, in order, when a skill or language arrives as an object.
const PRIMITIVE_ITEM_KEYS: &[&str] = &["name", "language", "skill"];

pub fn build_resume(
    candidate: &Value,
    extracted_email: Option<&str>,
    extracted_phone: Option<&str>,
) -> CanonicalResume {
    let empty = Map::new();
    let fields = candidate.as_object().unwrap_or(&empty);

    CanonicalResume {
        full_name: string_field(fields, "fullName"),
        email: contact_field(fields, "email", extracted_email),
        phone: contact_field(fields, "phone", extracted_phone),
        location: string_field(fields, "location"),
        website: string_field(fields, "website"),
        linkedin: string_field(fields, "linkedin"),
        summary: string_field(fields, "summary"),
        experience: record_list(fields, "experience"),
        education: record_list(fields, "education"),
        skills: primitive_list(fields, "skills"),
        languages: primitive_list(fields, "languages"),
        certifications: record_list(fields, "certifications"),
        projects: record_list(fields, "projects"),
        volunteer: record_list(fields, "volunteer"),
        references: record_list(fields, "references"),
        professional_objective: string_field(fields, "professionalObjective"),
        publications: record_list(fields, "publications"),
        awards: record_list(fields, "awards"),
        additional_courses: record_list(fields, "additionalCourses"),
        professional_affiliations: record_list(fields, "professionalAffiliations"),
        portfolio: record_list(fields, "portfolio"),
        personal_interests: string_field(fields, "personalInterests"),
        availability: availability(fields.get("availability")),
    }
}

// ──────────────────────────────────────────────────────────────
// Scalars
// ──────────────────────────────────────────────────────────────

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    coerce_string(fields.get(key))
}

/// Service value when non-empty, else the locally matched signal.
fn contact_field(fields: &Map<String, Value>, key: &str, fallback: Option<&str>) -> String {
    let value = string_field(fields, key);
    if !value.is_empty() {
        return value;
    }
    fallback.unwrap_or_default().to_string()
}

/// Loose truthiness: any non-empty string counts, so "Open to relocation" is
/// `true`, except for explicit negatives such as "no" or "false". Arrays and
/// objects count as present.
fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "no" | "n" | "0" | "none" | "off"
        ),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn availability(value: Option<&Value>) -> Availability {
    let Some(fields) = value.and_then(Value::as_object) else {
        return Availability::default();
    };
    Availability {
        relocation: coerce_bool(fields.get("relocation")),
        remote: coerce_bool(fields.get("remote")),
        start_date: string_field(fields, "startDate"),
        notice: string_field(fields, "notice"),
        preferences: string_field(fields, "preferences"),
    }
}

// ──────────────────────────────────────────────────────────────
// Lists
// ──────────────────────────────────────────────────────────────

/// A list element built from a candidate object, every sub-field defaulted.
trait FromCandidate {
    fn from_candidate(fields: &Map<String, Value>) -> Self;
}

macro_rules! from_candidate {
    ($ty:ident { $($field:ident => $key:literal),* $(,)? }) => {
        impl FromCandidate for $ty {
            fn from_candidate(fields: &Map<String, Value>) -> Self {
                Self {
                    $($field: string_field(fields, $key)),*
                }
            }
        }
    };
}

from_candidate!(Experience {
    company => "company",
    position => "position",
    start_date => "startDate",
    end_date => "endDate",
    description => "description",
});
from_candidate!(Education {
    school => "school",
    degree => "degree",
    field => "field",
    start_date => "startDate",
    end_date => "endDate",
});
from_candidate!(Certification {
    name => "name",
    issuer => "issuer",
    date => "date",
});
from_candidate!(Project {
    name => "name",
    description => "description",
    url => "url",
});
from_candidate!(Volunteer {
    organization => "organization",
    role => "role",
    description => "description",
});
from_candidate!(Reference {
    name => "name",
    position => "position",
    company => "company",
    contact => "contact",
});
from_candidate!(Publication {
    title => "title",
    publisher => "publisher",
    date => "date",
    url => "url",
});
from_candidate!(Award {
    name => "name",
    issuer => "issuer",
    date => "date",
    description => "description",
});
from_candidate!(AdditionalCourse {
    name => "name",
    institution => "institution",
    date => "date",
    description => "description",
});
from_candidate!(ProfessionalAffiliation {
    organization => "organization",
    role => "role",
    start_date => "startDate",
    end_date => "endDate",
});
from_candidate!(PortfolioItem {
    title => "title",
    description => "description",
    url => "url",
});

/// Non-array values become `[]`; non-object elements become empty records.
fn record_list<T: FromCandidate>(fields: &Map<String, Value>, key: &str) -> Vec<T> {
    let empty = Map::new();
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| T::from_candidate(item.as_object().unwrap_or(&empty)))
            .collect(),
        _ => Vec::new(),
    }
}

fn primitive_list(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(primitive_item).collect(),
        _ => Vec::new(),
    }
}

fn primitive_item(item: &Value) -> Option<String> {
    match item {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => PRIMITIVE_ITEM_KEYS
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::CANONICAL_FIELDS;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_service_email_wins_over_signal() {
        let resume = build_resume(&json!({"email": "a@b.com"}), Some("c@d.com"), None);
        assert_eq!(resume.email, "a@b.com");
    }

    #[test]
    fn test_signal_fills_empty_or_missing_email() {
        assert_eq!(
            build_resume(&json!({"email": ""}), Some("c@d.com"), None).email,
            "c@d.com"
        );
        assert_eq!(build_resume(&json!({}), Some("c@d.com"), None).email, "c@d.com");
        assert_eq!(build_resume(&json!({"email": null}), None, None).email, "");
    }

    #[test]
    fn test_phone_fallback() {
        let resume = build_resume(&json!({"fullName": "John Doe"}), None, Some("555-123-4567"));
        assert_eq!(resume.phone, "555-123-4567");
    }

    #[test]
    fn test_only_full_name_leaves_everything_else_default() {
        let resume = build_resume(
            &json!({"fullName": "John Doe"}),
            Some("john@x.com"),
            Some("555-123-4567"),
        );
        let expected = CanonicalResume {
            full_name: "John Doe".into(),
            email: "john@x.com".into(),
            phone: "555-123-4567".into(),
            ..CanonicalResume::default()
        };
        assert_eq!(resume, expected);
    }

    #[test]
    fn test_non_object_candidates_default() {
        for candidate in [json!(null), json!([]), json!("text"), json!(42), json!({})] {
            assert_eq!(
                build_resume(&candidate, None, None),
                CanonicalResume::default(),
                "candidate {candidate}"
            );
        }
    }

    #[test]
    fn test_wrong_typed_fields_default() {
        let resume = build_resume(
            &json!({
                "fullName": {"first": "Jane"},
                "summary": ["a", "b"],
                "experience": "Acme, 2019-2021",
                "skills": {"rust": true},
                "availability": "immediately",
            }),
            None,
            None,
        );
        assert_eq!(resume.full_name, "");
        assert_eq!(resume.summary, "");
        assert!(resume.experience.is_empty());
        assert!(resume.skills.is_empty());
        assert_eq!(resume.availability, Availability::default());
    }

    #[test]
    fn test_numbers_render_as_strings() {
        let resume = build_resume(
            &json!({
                "phone": 5551234567u64,
                "education": [{"school": "MIT", "startDate": 2015, "endDate": 2019}],
            }),
            None,
            None,
        );
        assert_eq!(resume.phone, "5551234567");
        assert_eq!(resume.education[0].start_date, "2015");
        assert_eq!(resume.education[0].end_date, "2019");
        assert_eq!(resume.education[0].degree, "");
    }

    #[test]
    fn test_record_list_fills_missing_subfields() {
        let resume = build_resume(
            &json!({"experience": [
                {"company": "Acme", "position": "Engineer"},
                null,
                "Freelance",
            ]}),
            None,
            None,
        );
        assert_eq!(resume.experience.len(), 3);
        assert_eq!(resume.experience[0].company, "Acme");
        assert_eq!(resume.experience[0].start_date, "");
        assert_eq!(resume.experience[1], Experience::default());
        assert_eq!(resume.experience[2], Experience::default());
    }

    #[test]
    fn test_primitive_lists_drop_empty_and_coerce() {
        let resume = build_resume(
            &json!({
                "skills": ["Rust", "", null, false, 3, {"name": "Go"}, {"level": "high"}],
                "languages": [{"language": "Spanish"}, "English"],
            }),
            None,
            None,
        );
        assert_eq!(resume.skills, vec!["Rust", "3", "Go"]);
        assert_eq!(resume.languages, vec!["Spanish", "English"]);
    }

    #[test]
    fn test_availability_coercion() {
        let resume = build_resume(
            &json!({"availability": {
                "relocation": "Yes",
                "remote": 1,
                "startDate": "2025-01-01",
                "notice": null,
            }}),
            None,
            None,
        );
        assert_eq!(
            resume.availability,
            Availability {
                relocation: true,
                remote: true,
                start_date: "2025-01-01".into(),
                notice: String::new(),
                preferences: String::new(),
            }
        );
    }

    #[test]
    fn test_availability_descriptive_strings_are_truthy() {
        let resume = build_resume(
            &json!({"availability": {"relocation": "Open to relocation", "remote": [true]}}),
            None,
            None,
        );
        assert!(resume.availability.relocation);
        assert!(resume.availability.remote);
    }

    #[test]
    fn test_availability_negative_and_empty_values_are_false() {
        for value in [json!("No"), json!(" false "), json!(""), json!(0), json!(null)] {
            let resume = build_resume(
                &json!({"availability": {"relocation": value.clone(), "remote": value}}),
                None,
                None,
            );
            assert!(!resume.availability.relocation);
            assert!(!resume.availability.remote);
        }
    }

    // ──────────────────────────────────────────────────────────
    // Totality
    // ──────────────────────────────────────────────────────────

    fn field_key() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(CANONICAL_FIELDS.to_vec()).prop_map(String::from),
            prop::sample::select(vec![
                "name", "company", "startDate", "relocation", "remote", "language", "url",
            ])
            .prop_map(String::from),
            "[a-z]{1,6}",
        ]
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            any::<f64>().prop_map(Value::from),
            "[a-zA-Z0-9@. ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::hash_map(field_key(), inner, 0..8)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    fn contains_null(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().any(contains_null),
            Value::Object(map) => map.values().any(contains_null),
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn prop_build_is_total(
            candidate in arb_json(),
            email in proptest::option::of("[a-z]{1,5}@[a-z]{1,5}\\.com"),
        ) {
            let resume = build_resume(&candidate, email.as_deref(), None);
            let value = serde_json::to_value(&resume).unwrap();
            let obj = value.as_object().unwrap();

            prop_assert!(!contains_null(&value));
            prop_assert_eq!(obj.len(), CANONICAL_FIELDS.len());
            for field in CANONICAL_FIELDS {
                prop_assert!(obj.contains_key(*field));
            }
            for list in ["experience", "education", "skills", "languages", "portfolio"] {
                prop_assert!(obj[list].is_array());
            }
            prop_assert!(obj["availability"].is_object());
        }

        #[test]
        fn prop_email_precedence(candidate_email in "[a-z@.]{0,8}", signal in "[a-z]{1,4}@x\\.io") {
            let resume = build_resume(
                &json!({"email": candidate_email.clone()}),
                Some(signal.as_str()),
                None,
            );
            if candidate_email.is_empty() {
                prop_assert_eq!(resume.email, signal);
            } else {
                prop_assert_eq!(resume.email, candidate_email);
            }
        }
    }
}
