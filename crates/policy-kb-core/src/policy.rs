//! Policy identifier extraction from file names.
//!
//! Compliance documents follow a naming convention where the file name
//! starts with a policy token such as `P-018` or `PM-001`. The token is
//! stored as provenance metadata and used for citation grouping.

/// Extract a policy identifier from a file name.
///
/// Matches file names starting with `P-` or `PM-` followed by one or more
/// digits; the matched token is returned. Non-matching names yield `None`,
/// never an error.
///
/// `"P-018-001 Information Security Policy.pdf"` yields `"P-018"` (the
/// token stops at the first non-digit).
pub fn extract_policy_number(file_name: &str) -> Option<String> {
    let prefix = if file_name.starts_with("PM-") {
        "PM-"
    } else if file_name.starts_with("P-") {
        "P-"
    } else {
        return None;
    };

    let rest = &file_name[prefix.len()..];
    let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    Some(format!("{prefix}{}", &rest[..digits]))
}
