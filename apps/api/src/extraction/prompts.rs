// Resume extraction prompt templates for the `llm` backend.

pub const RESUME_EXTRACT_SYSTEM: &str = "\
You are a precise resume data extractor. \
Turn cleaned resume text into one structured JSON object. \
Use empty strings and empty arrays for anything the text does not state. \
Keep dates exactly as written in the resume.";

pub const RESUME_EXTRACT_PROMPT: &str = r#"Extract the resume below into a single JSON object.

FILE NAME: {file_name}
EMAIL FOUND BY PATTERN MATCHING: {extracted_email}
PHONE FOUND BY PATTERN MATCHING: {extracted_phone}

RESUME TEXT:
{content}

OUTPUT SCHEMA (return exactly this structure, camelCase keys):
{
  "fullName": "string",
  "email": "string",
  "phone": "string",
  "location": "string",
  "website": "string",
  "linkedin": "string",
  "summary": "string",
  "professionalObjective": "string",
  "experience": [{"company": "string", "position": "string", "startDate": "string", "endDate": "string", "description": "string"}],
  "education": [{"school": "string", "degree": "string", "field": "string", "startDate": "string", "endDate": "string"}],
  "skills": ["string"],
  "languages": ["string"],
  "certifications": [{"name": "string", "issuer": "string", "date": "string"}],
  "projects": [{"name": "string", "description": "string", "url": "string"}],
  "volunteer": [{"organization": "string", "role": "string", "description": "string"}],
  "references": [{"name": "string", "position": "string", "company": "string", "contact": "string"}],
  "publications": [{"title": "string", "publisher": "string", "date": "string", "url": "string"}],
  "awards": [{"name": "string", "issuer": "string", "date": "string", "description": "string"}],
  "additionalCourses": [{"name": "string", "institution": "string", "date": "string", "description": "string"}],
  "professionalAffiliations": [{"organization": "string", "role": "string", "startDate": "string", "endDate": "string"}],
  "portfolio": [{"title": "string", "description": "string", "url": "string"}],
  "personalInterests": "string",
  "availability": {"relocation": false, "remote": false, "startDate": "string", "notice": "string", "preferences": "string"}
}

If the email or phone found by pattern matching is "none", read them from the text yourself."#;

/// Fills the extraction template. Missing signals render as `none`.
pub fn render_extract_prompt(
    content: &str,
    file_name: &str,
    extracted_email: Option<&str>,
    extracted_phone: Option<&str>,
) -> String {
    RESUME_EXTRACT_PROMPT
        .replace("{file_name}", file_name)
        .replace("{extracted_email}", extracted_email.unwrap_or("none"))
        .replace("{extracted_phone}", extracted_phone.unwrap_or("none"))
        // Content last so braces inside the resume are never treated as placeholders.
        .replace("{content}", content)
}
