//! Conflict marker synthesis.

/// Content written for a conflicted path.
///
/// A missing side contributes nothing between its markers. Side text is
/// inserted verbatim, so text without a trailing newline runs straight into
/// the following marker.
pub fn conflict_content(current: Option<&str>, given: Option<&str>) -> String {
    format!(
        "<<<<<<< HEAD\n{}=======\n{}>>>>>>>\n",
        current.unwrap_or_default(),
        given.unwrap_or_default()
    )
}
