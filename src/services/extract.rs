//! JSON extraction from free-form oracle output.

/// Extract a JSON object from a response that might carry surrounding
/// prose or markdown fences.
///
/// Falls back to the trimmed input when no object is found; callers treat
/// a parse failure of the returned string as a degraded reading.
pub fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    // If it already looks like JSON, use it directly
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed.to_string();
    }

    // Try to find a JSON object in the response
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                return trimmed[start..=end].to_string();
            }
        }
    }

    // Return as-is if no JSON found
    trimmed.to_string()
}
