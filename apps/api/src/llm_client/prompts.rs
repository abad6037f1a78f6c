// Shared prompt fragments. Each caller keeps its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Forbids filling fields the source text does not support.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only copy information that appears in the provided text. \
    Do NOT infer, interpolate, or invent details. \
    If the text does not support a field, leave it empty.";
