//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::error::Result;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::state::ReadMode;
use crate::types::{AttributePath, DynamicValue, PrivateStateData};
use tracing::warn;

/// Private state key set by import and consumed by the following read
pub const IMPORT_READ_KEY: &str = "import_read";

/// Sets the import ID to a specific attribute in state
///
/// The private state is marked so the next read runs in [`ReadMode::Import`].
///
/// Example: ID "my-client" -> state.client_id = "my-client"
pub fn import_state_passthrough_id(
    _ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.add_attribute_error(
            attr_path.clone(),
            format!("Failed to set import ID: {}", e),
            format!(
                "Could not set attribute '{}' to value '{}'",
                attr_path, request.id
            ),
        );
        return;
    }

    let private = match import_private_state() {
        Ok(private) => private,
        Err(e) => {
            response
                .diagnostics
                .add_error("Failed to encode private state", e.to_string());
            return;
        }
    };

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
        private,
    });
}

/// Private state carrying the import marker
pub fn import_private_state() -> Result<Vec<u8>> {
    let mut private = PrivateStateData::new();
    private.set_key(IMPORT_READ_KEY, b"true".to_vec());
    private.encode()
}

/// Read mode for a read call, plus the private state to hand back.
/// The marker is consumed so only the first read after import is affected.
pub fn take_read_mode(private: &[u8]) -> (ReadMode, Vec<u8>) {
    let mut data = match PrivateStateData::decode(private) {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, "ignoring undecodable private state");
            return (ReadMode::Refresh, Vec::new());
        }
    };

    if data.get_key(IMPORT_READ_KEY).is_none() {
        return (ReadMode::Refresh, private.to_vec());
    }

    data.remove_key(IMPORT_READ_KEY);
    let remaining = data.encode().unwrap_or_default();
    (ReadMode::Import, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_sets_attribute_and_marks_import() {
        let request = ImportResourceStateRequest {
            type_name: "example_client".to_string(),
            id: "my-client".to_string(),
        };
        let mut response = ImportResourceStateResponse {
            imported_resources: Vec::new(),
            diagnostics: Default::default(),
        };

        import_state_passthrough_id(
            &Context::new(),
            AttributePath::new("client_id"),
            &request,
            &mut response,
        );

        assert!(!response.diagnostics.has_errors());
        let imported = &response.imported_resources[0];
        assert_eq!(
            imported.state.get_string(&AttributePath::new("client_id")).unwrap(),
            "my-client"
        );

        let (mode, remaining) = take_read_mode(&imported.private);
        assert_eq!(mode, ReadMode::Import);
        assert_eq!(take_read_mode(&remaining).0, ReadMode::Refresh);
    }

    #[test]
    fn empty_or_garbage_private_state_means_refresh() {
        assert_eq!(take_read_mode(&[]).0, ReadMode::Refresh);
        assert_eq!(take_read_mode(b"not json").0, ReadMode::Refresh);
    }
}
