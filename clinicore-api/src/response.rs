/// JSON response envelope
///
/// Every successful response is `{ success: true, message, data }`; errors
/// carry `{ success: false, error, message, errors? }` (see
/// [`error`](crate::error)). Handlers return `Json<Envelope<T>>` via
/// [`ok`].

use axum::Json;
use serde::Serialize;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    /// Always true on this path
    pub success: bool,

    /// Human-readable outcome message
    pub message: String,

    /// The payload
    pub data: T,
}

/// Wraps a payload in the success envelope
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: message.into(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let Json(envelope) = ok("created", serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "created");
        assert_eq!(value["data"]["id"], 1);
    }
}
