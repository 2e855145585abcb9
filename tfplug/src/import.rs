//! Import helpers for simplifying resource import implementations

use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// Example: ID "img-123" -> state.image_id = "img-123"
pub fn import_state_passthrough_id(
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!(
                    "Could not set attribute '{}' to value '{}'",
                    attr_path, request.id
                ),
            )
            .with_attribute(attr_path),
        );
        return;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}

/// Splits a composite import ID such as "mssql-abc#orders" into exactly
/// `parts` non-empty segments, or explains what shape was expected.
pub fn split_composite_id<'a>(
    id: &'a str,
    separator: &str,
    parts: usize,
    shape: &str,
) -> Result<Vec<&'a str>, Diagnostic> {
    let segments: Vec<&str> = id.split(separator).collect();
    if segments.len() != parts || segments.iter().any(|s| s.is_empty()) {
        return Err(Diagnostic::error(
            "Invalid import ID",
            format!("Expected an ID of the form {}, got \"{}\"", shape, id),
        ));
    }
    Ok(segments)
}
