// Reading a transferred file stream inside a worker adapter
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use ptimer_core::domain::ByteStream;

/// Read the whole stream, refusing anything over `max_bytes`.
///
/// `Err` carries the `error` payload of the `file_parse_error` reply.
pub(crate) async fn read_submission(data: ByteStream, max_bytes: u64) -> Result<Vec<u8>, Value> {
    let mut bytes = Vec::new();
    data.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| json!({"name": "IoError", "message": e.to_string()}))?;

    if bytes.len() as u64 > max_bytes {
        return Err(json!({
            "name": "FileTooLarge",
            "message": format!("file exceeds {} bytes", max_bytes),
        }));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(bytes: &[u8]) -> ByteStream {
        Box::new(Cursor::new(bytes.to_vec()))
    }

    #[tokio::test]
    async fn test_reads_up_to_limit() {
        assert_eq!(read_submission(stream(b"1234"), 4).await.unwrap(), b"1234");
    }

    #[tokio::test]
    async fn test_oversized_stream_is_refused() {
        let error = read_submission(stream(b"12345"), 4).await.unwrap_err();
        assert_eq!(
            error,
            json!({"name": "FileTooLarge", "message": "file exceeds 4 bytes"})
        );
    }
}
