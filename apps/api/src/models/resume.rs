use serde::{Deserialize, Serialize};

/// The canonical resume record handed to the editor.
///
/// Every field is always present: strings default to `""`, lists to `[]`, and
/// `availability` always carries all five sub-fields. Field names serialize in
/// camelCase to match the editor's form model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResume {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub linkedin: String,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub certifications: Vec<Certification>,
    pub projects: Vec<Project>,
    pub volunteer: Vec<Volunteer>,
    pub references: Vec<Reference>,
    pub professional_objective: String,
    pub publications: Vec<Publication>,
    pub awards: Vec<Award>,
    pub additional_courses: Vec<AdditionalCourse>,
    pub professional_affiliations: Vec<ProfessionalAffiliation>,
    pub portfolio: Vec<PortfolioItem>,
    pub personal_interests: String,
    pub availability: Availability,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub organization: String,
    pub role: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub position: String,
    pub company: String,
    pub contact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    pub publisher: String,
    pub date: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalCourse {
    pub name: String,
    pub institution: String,
    pub date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalAffiliation {
    pub organization: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Candidate availability. Absent in the candidate ⇒ all defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub relocation: bool,
    pub remote: bool,
    pub start_date: String,
    pub notice: String,
    pub preferences: String,
}

/// Wire names of every top-level field of [`CanonicalResume`], in schema order.
#[cfg(test)]
pub const CANONICAL_FIELDS: &[&str] = &[
    "fullName",
    "email",
    "phone",
    "location",
    "website",
    "linkedin",
    "summary",
    "experience",
    "education",
    "skills",
    "languages",
    "certifications",
    "projects",
    "volunteer",
    "references",
    "professionalObjective",
    "publications",
    "awards",
    "additionalCourses",
    "professionalAffiliations",
    "portfolio",
    "personalInterests",
    "availability",
];
