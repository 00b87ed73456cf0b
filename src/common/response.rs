use serde::{Deserialize, Serialize};

/// Body returned by `POST /api/movies/upload-chunk`.
///
/// Receivers add their own bookkeeping fields; anything not listed here is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResponse {
    #[serde(default)]
    pub completed: bool,
    pub file_path: Option<String>,
    pub video_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest<'a> {
    pub file_path: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_response_ignores_receiver_fields() {
        let body = r#"{"completed":true,"filePath":"uploads/a.mp4","videoId":"v1","received":3,"message":"ok"}"#;
        let res: ChunkResponse = serde_json::from_str(body).unwrap();
        assert!(res.completed);
        assert_eq!(res.file_path.as_deref(), Some("uploads/a.mp4"));
        assert_eq!(res.video_id.as_deref(), Some("v1"));
        assert!(res.error.is_none());
    }

    #[test]
    fn chunk_response_defaults_completed_to_false() {
        let res: ChunkResponse = serde_json::from_str(r#"{"error":"disk full"}"#).unwrap();
        assert!(!res.completed);
        assert_eq!(res.error.as_deref(), Some("disk full"));
    }

    #[test]
    fn delete_request_uses_camel_case() {
        let body = serde_json::to_value(DeleteRequest { file_path: "uploads/a.mp4" }).unwrap();
        assert_eq!(body, serde_json::json!({ "filePath": "uploads/a.mp4" }));
    }
}
