//! # Modelo de Dados Concrete
//!
//! Registros do formato de anotação linguística **Concrete**, no subconjunto
//! usado pela conversão. A hierarquia estrutural é uma árvore:
//!
//! ```text
//! Communication
//! └── Section (kind, textSpan)
//!     └── Sentence (textSpan)
//!         └── Tokenization (exatamente uma por sentença)
//!             └── Token (tokenIndex, textSpan)
//! ```
//!
//! Sobre essa árvore ficam as camadas de anotação (entidades, menções,
//! situações), que apontam para ela **apenas por UUID**. Os nomes JSON seguem
//! o Concrete (`sectionList`, `textSpan`, `uuidString`, ...).
//!
//! Todos os offsets são índices de caractere (valores escalares Unicode) no
//! texto da `Communication`, em intervalos semiabertos `[start, ending)`.

use serde::{Deserialize, Serialize};

use crate::ids::{AnnotationMetadata, ConcreteUuid};

/// Intervalo semiaberto `[start, ending)` de caracteres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub ending: usize,
}

impl TextSpan {
    pub fn new(start: usize, ending: usize) -> Self {
        Self { start, ending }
    }

    pub fn len(&self) -> usize {
        self.ending.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` se `other` está inteiramente contido neste intervalo.
    pub fn contains(&self, other: &TextSpan) -> bool {
        self.start <= other.start && other.ending <= self.ending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token_index: usize,
    #[serde(default)]
    pub text: String,
    pub text_span: TextSpan,
}

impl Token {
    pub fn new(token_index: usize, text: impl Into<String>, start: usize, ending: usize) -> Self {
        Self {
            token_index,
            text: text.into(),
            text_span: TextSpan::new(start, ending),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenList {
    #[serde(default)]
    pub token_list: Vec<Token>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenizationKind {
    #[default]
    TokenList,
    TokenLattice,
}

/// Um token com a tag que recebeu numa [`TokenTagging`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedToken {
    pub token_index: usize,
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Camada de tags por token (ex: NER em BIO, POS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTagging {
    pub uuid: ConcreteUuid,
    pub metadata: AnnotationMetadata,
    #[serde(default)]
    pub tagging_type: String,
    #[serde(default)]
    pub tagged_token_list: Vec<TaggedToken>,
    /// Separador entre o prefixo BIO e o rótulo (não serializado; `-` se ausente).
    #[serde(skip)]
    pub bio_tag_separator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokenization {
    pub uuid: ConcreteUuid,
    pub metadata: AnnotationMetadata,
    #[serde(default)]
    pub kind: TokenizationKind,
    #[serde(default)]
    pub token_list: TokenList,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_tagging_list: Vec<TokenTagging>,
}

impl Tokenization {
    /// Tokenization vazia (`TOKEN_LIST`) com metadado stub.
    pub fn new(uuid: ConcreteUuid) -> Self {
        Self {
            uuid,
            metadata: AnnotationMetadata::stub(),
            kind: TokenizationKind::TokenList,
            token_list: TokenList::default(),
            token_tagging_list: Vec::new(),
        }
    }

    pub fn with_tokens(uuid: ConcreteUuid, tokens: Vec<Token>) -> Self {
        let mut tokenization = Self::new(uuid);
        tokenization.token_list.token_list = tokens;
        tokenization
    }

    pub fn tokens(&self) -> &[Token] {
        &self.token_list.token_list
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub uuid: ConcreteUuid,
    pub text_span: TextSpan,
    pub tokenization: Tokenization,
}

impl Sentence {
    pub fn new(uuid: ConcreteUuid, text_span: TextSpan, tokenization: Tokenization) -> Self {
        Self {
            uuid,
            text_span,
            tokenization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub uuid: ConcreteUuid,
    /// Tipo da seção em texto livre; comparações ignoram maiúsculas.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub text_span: TextSpan,
    #[serde(default)]
    pub sentence_list: Vec<Sentence>,
}

impl Section {
    pub fn new(
        uuid: ConcreteUuid,
        kind: impl Into<String>,
        text_span: TextSpan,
        sentence_list: Vec<Sentence>,
    ) -> Self {
        Self {
            uuid,
            kind: kind.into(),
            label: None,
            text_span,
            sentence_list,
        }
    }
}

/// Sequência de índices de token dentro de **uma** Tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefSequence {
    pub token_index_list: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_token_index: Option<usize>,
    pub tokenization_id: ConcreteUuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMention {
    pub uuid: ConcreteUuid,
    pub tokens: TokenRefSequence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_mention_id_list: Vec<ConcreteUuid>,
}

impl EntityMention {
    pub fn new(uuid: ConcreteUuid, tokens: TokenRefSequence) -> Self {
        Self {
            uuid,
            tokens,
            entity_type: None,
            phrase_type: None,
            confidence: None,
            text: None,
            child_mention_id_list: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMentionSet {
    pub uuid: ConcreteUuid,
    pub metadata: AnnotationMetadata,
    #[serde(default)]
    pub mention_list: Vec<EntityMention>,
}

/// Cluster de correferência: um conjunto de menções da mesma entidade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub uuid: ConcreteUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub mention_id_list: Vec<ConcreteUuid>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
}

impl Entity {
    pub fn new(uuid: ConcreteUuid, id: Option<String>, mention_id_list: Vec<ConcreteUuid>) -> Self {
        Self {
            uuid,
            id,
            mention_id_list,
            entity_type: None,
            confidence: None,
            canonical_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySet {
    pub uuid: ConcreteUuid,
    pub metadata: AnnotationMetadata,
    #[serde(default)]
    pub entity_list: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub value: String,
    pub metadata: AnnotationMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarity: Option<f64>,
}

/// Argumento de uma [`Situation`]: papel + exatamente um preenchimento.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<ConcreteUuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation_id: Option<ConcreteUuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_list: Vec<Property>,
}

impl Argument {
    pub fn entity(role: impl Into<String>, entity_id: ConcreteUuid) -> Self {
        Self {
            role: role.into(),
            entity_id: Some(entity_id),
            ..Self::default()
        }
    }

    pub fn situation(role: impl Into<String>, situation_id: ConcreteUuid) -> Self {
        Self {
            role: role.into(),
            situation_id: Some(situation_id),
            ..Self::default()
        }
    }

    pub fn property(role: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            property_list: vec![Property {
                value: value.into(),
                metadata: AnnotationMetadata::stub(),
                polarity: None,
            }],
            ..Self::default()
        }
    }

    /// `true` se o argumento aponta para uma entidade ou situação.
    pub fn is_reference(&self) -> bool {
        self.entity_id.is_some() || self.situation_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Situation {
    pub uuid: ConcreteUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub situation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation_kind: Option<String>,
    #[serde(default)]
    pub argument_list: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mention_id_list: Vec<ConcreteUuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Situation {
    pub fn new(
        uuid: ConcreteUuid,
        id: Option<String>,
        situation_type: impl Into<String>,
        situation_kind: Option<String>,
        argument_list: Vec<Argument>,
    ) -> Self {
        Self {
            uuid,
            id,
            situation_type: situation_type.into(),
            situation_kind,
            argument_list,
            mention_id_list: Vec::new(),
            confidence: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationSet {
    pub uuid: ConcreteUuid,
    pub metadata: AnnotationMetadata,
    #[serde(default)]
    pub situation_list: Vec<Situation>,
}

/// Argumento de uma [`SituationMention`]; aponta para menções, não para entidades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionArgument {
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_mention_id: Option<ConcreteUuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation_mention_id: Option<ConcreteUuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationMention {
    pub uuid: ConcreteUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation_kind: Option<String>,
    #[serde(default)]
    pub argument_list: Vec<MentionArgument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenRefSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationMentionSet {
    pub uuid: ConcreteUuid,
    pub metadata: AnnotationMetadata,
    #[serde(default)]
    pub mention_list: Vec<SituationMention>,
}

/// Documento raiz do Concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub id: String,
    pub uuid: ConcreteUuid,
    #[serde(rename = "type")]
    pub comm_type: String,
    #[serde(default)]
    pub text: String,
    pub metadata: AnnotationMetadata,
    #[serde(default)]
    pub section_list: Vec<Section>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_mention_set_list: Vec<EntityMentionSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_set_list: Vec<EntitySet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub situation_mention_set_list: Vec<SituationMentionSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub situation_set_list: Vec<SituationSet>,
}

impl Communication {
    /// Communication sem seções nem anotações.
    pub fn new(
        id: impl Into<String>,
        uuid: ConcreteUuid,
        comm_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            uuid,
            comm_type: comm_type.into(),
            text: text.into(),
            metadata: AnnotationMetadata::stub(),
            section_list: Vec::new(),
            entity_mention_set_list: Vec::new(),
            entity_set_list: Vec::new(),
            situation_mention_set_list: Vec::new(),
            situation_set_list: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_span_contains() {
        let outer = TextSpan::new(0, 10);
        assert!(outer.contains(&TextSpan::new(0, 10)));
        assert!(outer.contains(&TextSpan::new(3, 5)));
        assert!(!outer.contains(&TextSpan::new(5, 11)));
        assert_eq!(TextSpan::new(4, 4).len(), 0);
        assert!(TextSpan::new(4, 4).is_empty());
    }

    #[test]
    fn test_communication_json_names() {
        let mut comm = Communication::new("doc", ConcreteUuid::new("u1"), "story", "Oi.");
        let tokenization = Tokenization::with_tokens(
            ConcreteUuid::new("u3"),
            vec![Token::new(0, "Oi", 0, 2), Token::new(1, ".", 2, 3)],
        );
        let sentence = Sentence::new(ConcreteUuid::new("u2"), TextSpan::new(0, 3), tokenization);
        comm.section_list.push(Section::new(
            ConcreteUuid::new("u4"),
            "Headline",
            TextSpan::new(0, 3),
            vec![sentence],
        ));

        let json = serde_json::to_value(&comm).unwrap();
        assert_eq!(json["type"], "story");
        assert_eq!(json["uuid"]["uuidString"], "u1");
        let sentence = &json["sectionList"][0]["sentenceList"][0];
        assert_eq!(sentence["textSpan"]["ending"], 3);
        assert_eq!(sentence["tokenization"]["kind"], "TOKEN_LIST");
        assert_eq!(sentence["tokenization"]["tokenList"]["tokenList"][1]["tokenIndex"], 1);
        assert!(json.get("entitySetList").is_none(), "listas vazias não são serializadas");

        let back: Communication = serde_json::from_value(json).unwrap();
        assert_eq!(back, comm);
    }

    #[test]
    fn test_argument_constructors() {
        let arg = Argument::entity("agent", ConcreteUuid::new("e1"));
        assert!(arg.is_reference());
        let prop = Argument::property("when", "ontem");
        assert!(!prop.is_reference());
        assert_eq!(prop.property_list[0].metadata.tool, "stub");
    }
}
