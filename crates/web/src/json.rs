//! JSON request and response bodies through serde.

use crate::body::BodyError;
use http::StatusCode;
use quill_http::codec::ResponseBuilder;
use quill_http::protocol::Request;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const APPLICATION_JSON: &[u8] = b"application/json";

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("failed to read body: {source}")]
    Body {
        #[from]
        source: BodyError,
    },

    #[error("invalid json: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

/// Writes a complete `application/json` response with `value` as its body.
///
/// The value is serialized into a scratch buffer first, because the header
/// block needs the content length.
pub fn append_json<T: Serialize + ?Sized>(
    response: &mut ResponseBuilder,
    request: &Request<'_>,
    status: StatusCode,
    value: &T,
) -> Result<(), JsonError> {
    let mut content = ResponseBuilder::new();
    serde_json::to_writer(&mut content, value)?;
    response.append_response(request, status, Some(APPLICATION_JSON), content.as_bytes());
    Ok(())
}

pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, JsonError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_http::codec::RequestParser;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct User {
        id: u32,
        name: String,
    }

    #[test]
    fn test_append_json() {
        let request = RequestParser::new().parse(b"GET /users/1 HTTP/1.1\r\n\r\n").unwrap();
        let mut response = ResponseBuilder::new();
        append_json(&mut response, &request, StatusCode::OK, &User { id: 1, name: "admin".to_owned() }).unwrap();

        let headers = String::from_utf8_lossy(response.headers()).into_owned();
        assert!(headers.contains("Content-Type: application/json\r\n"));
        assert!(headers.contains("Content-Length: 23\r\n"));
        assert_eq!(response.content(), br#"{"id":1,"name":"admin"}"#);
    }

    #[test]
    fn test_parse_json() {
        let user: User = parse_json(br#"{"id":7,"name":"quill"}"#).unwrap();
        assert_eq!(user, User { id: 7, name: "quill".to_owned() });

        assert!(matches!(parse_json::<User>(b"{"), Err(JsonError::Serde { .. })));
    }
}
