//! Prompt text for the answer model.
use crate::config::BrandingConfig;

/// System instruction scoping the assistant to one institution.
pub fn system_instruction(branding: &BrandingConfig) -> String {
    let institution = &branding.institution;
    let short = &branding.short_name;
    let description = &branding.description;
    format!(
        "You are a helpful assistant for {institution}, {description}.\n\
         Answer questions based ONLY on the provided context. If you don't know the answer, say so.\n\
         Be specific about services, programs, and resources offered by {short}.\n\
         When answering about services like wellness services, ALWAYS mention the specific provider if it appears in the context.\n\
         Do NOT generate images or respond to questions unrelated to {institution}."
    )
}

pub fn user_message(question: &str, context: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}
