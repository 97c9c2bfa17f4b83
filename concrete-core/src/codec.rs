//! Serialização dos registros (Concrete e BP-JSON) para bytes.
//!
//! [`RecordCodec`] é o ponto de troca do formato de fio; [`JsonCodec`] usa
//! `serde_json`, o mesmo formato aceito pelo servidor web.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

pub trait RecordCodec: Send + Sync {
    fn serialize<T: Serialize>(&self, record: &T) -> Result<Vec<u8>>;
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    /// Saída indentada (útil para inspeção manual).
    pub pretty: bool,
}

impl JsonCodec {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl RecordCodec for JsonCodec {
    fn serialize<T: Serialize>(&self, record: &T) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(record)?
        } else {
            serde_json::to_vec(record)?
        };
        Ok(bytes)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpjson::{Corpus, CORPUS_FORMAT_TYPE};
    use crate::error::ConversionError;
    use crate::ids::ConcreteUuid;
    use crate::model::{Communication, Section, TextSpan};

    #[test]
    fn test_communication_json_names() {
        let mut comm = Communication::new("doc", ConcreteUuid::new("u-1"), "story", "Oi.");
        comm.section_list.push(Section::new(
            ConcreteUuid::new("u-2"),
            "Unknown",
            TextSpan::new(0, 3),
            Vec::new(),
        ));
        let bytes = JsonCodec::default().serialize(&comm).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["uuid"]["uuidString"], "u-1");
        assert_eq!(json["type"], "story");
        assert_eq!(json["sectionList"][0]["textSpan"]["ending"], 3);
        assert!(json.get("entitySetList").is_none());

        let back: Communication = JsonCodec::pretty().deserialize(&bytes).unwrap();
        assert_eq!(back, comm);
    }

    #[test]
    fn test_corpus_defaults_format_fields() {
        let corpus: Corpus = JsonCodec::default()
            .deserialize(br#"{"corpus-id": "c", "entries": {}}"#)
            .unwrap();
        assert_eq!(corpus.format_type, CORPUS_FORMAT_TYPE);
        assert!(corpus.entries.is_empty());
    }

    #[test]
    fn test_invalid_bytes_are_codec_error() {
        let err = JsonCodec::default()
            .deserialize::<Communication>(b"{not json")
            .unwrap_err();
        assert!(matches!(err, ConversionError::Codec(_)));
    }
}
