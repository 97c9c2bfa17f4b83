//! # Identificadores e Metadados de Anotação
//!
//! Todo objeto Concrete que participa de referências cruzadas carrega um
//! [`ConcreteUuid`]. A geração é injetada via [`UuidGenerator`] para que os
//! testes possam usar uma sequência determinística.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Identificador único (o `UUID` do Concrete, serializado como `{"uuidString": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConcreteUuid {
    #[serde(rename = "uuidString")]
    pub uuid_string: String,
}

impl ConcreteUuid {
    pub fn new(uuid_string: impl Into<String>) -> Self {
        Self {
            uuid_string: uuid_string.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.uuid_string
    }
}

impl std::fmt::Display for ConcreteUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uuid_string)
    }
}

/// Capacidade de gerar UUIDs. Compartilhada entre threads na conversão de corpus.
pub trait UuidGenerator: Send + Sync {
    fn generate(&self) -> ConcreteUuid;
}

/// Gerador padrão: UUIDs aleatórios versão 4.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomUuidGenerator;

impl UuidGenerator for RandomUuidGenerator {
    fn generate(&self) -> ConcreteUuid {
        ConcreteUuid::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Gerador determinístico (`00000000-0000-0000-0000-000000000001`, ...), usado em testes.
#[derive(Debug, Default)]
pub struct SequentialUuidGenerator {
    next: AtomicU64,
}

impl SequentialUuidGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UuidGenerator for SequentialUuidGenerator {
    fn generate(&self) -> ConcreteUuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        ConcreteUuid::new(format!(
            "00000000-0000-0000-{:04x}-{:012x}",
            (n >> 48) & 0xffff,
            n & 0xffff_ffff_ffff
        ))
    }
}

/// Proveniência de uma anotação (`AnnotationMetadata` no Concrete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMetadata {
    pub tool: String,
    pub timestamp: i64,
    #[serde(default = "default_k_best")]
    pub k_best: i32,
}

fn default_k_best() -> i32 {
    1
}

impl AnnotationMetadata {
    /// Metadado "stub" usado em tudo que a conversão cria.
    pub fn stub() -> Self {
        Self {
            tool: "stub".to_string(),
            timestamp: 1,
            k_best: 1,
        }
    }

    /// Metadado com o instante atual (segundos Unix).
    pub fn now(tool: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self {
            tool: tool.into(),
            timestamp,
            k_best: 1,
        }
    }
}

impl Default for AnnotationMetadata {
    fn default() -> Self {
        Self::stub()
    }
}

/// Atalho para [`AnnotationMetadata::stub`].
pub fn generate_annotation_metadata() -> AnnotationMetadata {
    AnnotationMetadata::stub()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_generator_is_unique() {
        let gen = SequentialUuidGenerator::new();
        let ids: HashSet<ConcreteUuid> = (0..100).map(|_| gen.generate()).collect();
        assert_eq!(ids.len(), 100);
        assert_eq!(
            SequentialUuidGenerator::new().generate().as_str(),
            "00000000-0000-0000-0000-000000000001"
        );
    }

    #[test]
    fn test_random_generator_format() {
        let id = RandomUuidGenerator.generate();
        assert_eq!(id.as_str().len(), 36);
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_stub_metadata() {
        let meta = generate_annotation_metadata();
        assert_eq!(meta.tool, "stub");
        assert_eq!(meta.timestamp, 1);
        assert_eq!(meta.k_best, 1);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["kBest"], 1);
    }

    #[test]
    fn test_uuid_serialization() {
        let id = ConcreteUuid::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#"{"uuidString":"abc"}"#);
    }
}
