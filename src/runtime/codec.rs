use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::runtime::error::Error;

/// JSON bytes for a method result.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(value).map_err(|e| Error::Serialize(e.to_string()))
}

/// Decode method arguments. An empty body decodes as JSON `null`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| Error::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_unit() {
        decode::<()>(b"").unwrap();
        decode::<()>(b" \r\n").unwrap();
    }

    #[test]
    fn test_bad_json_is_deserialize_error() {
        assert!(matches!(decode::<Vec<f64>>(b"[1,"), Err(Error::Deserialize(_))));
    }

    #[test]
    fn test_encode_json() {
        assert_eq!(encode(&vec![1.5, -2.0]).unwrap(), b"[1.5,-2.0]".to_vec());
    }
}
