//! # Camadas de Tags por Token e Esquema BIO
//!
//! Uma [`TokenTagging`] associa uma tag textual a tokens de uma Tokenization
//! (por `tokenIndex`). Para taggings de entidades usa-se o esquema **BIO**:
//!
//! - `B-TAG`: Begin, primeiro token de uma entidade
//! - `I-TAG`: Inside, tokens seguintes da mesma entidade
//! - `O`: Outside, fora de qualquer entidade
//!
//! O separador entre o prefixo e o rótulo é configurável por tagging (`-` por
//! padrão). As funções `bio_*` mantêm a cadeia `B I*` consistente ao editar
//! uma tag: mudar o rótulo de um `B` propaga para os `I` seguintes, e trocar
//! um `B` por `O` promove o `I` seguinte a `B`.

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};
use crate::ids::{AnnotationMetadata, UuidGenerator};
use crate::model::{TaggedToken, TokenTagging, Tokenization};

const DEFAULT_BIO_SEPARATOR: &str = "-";

/// Prefixo BIO de uma tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BioValue {
    /// **Begin**: primeiro token da entidade.
    Begin,
    /// **Inside**: continuação da entidade.
    Inside,
    /// **Outside**: fora de entidade.
    Outside,
}

impl BioValue {
    pub fn letter(&self) -> char {
        match self {
            BioValue::Begin => 'B',
            BioValue::Inside => 'I',
            BioValue::Outside => 'O',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'B' => Some(BioValue::Begin),
            'I' => Some(BioValue::Inside),
            'O' => Some(BioValue::Outside),
            _ => None,
        }
    }

    /// Parseia a partir da letra (`"B"`, `"I"` ou `"O"`).
    pub fn from_label(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c),
            _ => None,
        }
    }
}

impl std::fmt::Display for BioValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Entidade reconstruída a partir das tags BIO.
///
/// # Exemplo
/// `[O, B-PER, I-PER, O, B-LOC]` → `BioSpan { start: 1, end: 3, label: "PER" }`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BioSpan {
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
    pub label: String,
}

impl Tokenization {
    pub fn add_token_tagging(&mut self, token_tagging: TokenTagging) {
        self.token_tagging_list.push(token_tagging);
    }

    pub fn token_taggings_of_type(&self, tagging_type: &str) -> Vec<&TokenTagging> {
        self.token_tagging_list
            .iter()
            .filter(|tagging| tagging.tagging_type == tagging_type)
            .collect()
    }
}

impl TokenTagging {
    /// Cria uma TokenTagging vazia com UUID novo e metadado com o instante atual.
    pub fn create(
        tagging_type: impl Into<String>,
        tool: Option<&str>,
        uuid_generator: &dyn UuidGenerator,
    ) -> Self {
        Self {
            uuid: uuid_generator.generate(),
            metadata: AnnotationMetadata::now(
                tool.unwrap_or("concrete-core - TokenTagging::create()"),
            ),
            tagging_type: tagging_type.into(),
            tagged_token_list: Vec::new(),
            bio_tag_separator: None,
        }
    }

    pub fn tagged_token_with_token_index(&self, token_index: usize) -> Option<&TaggedToken> {
        self.tagged_token_list
            .iter()
            .find(|tagged| tagged.token_index == token_index)
    }

    /// Define a tag do token, criando o TaggedToken se ainda não existir.
    pub fn set_tagged_token_tag(&mut self, tag: impl Into<String>, token_index: usize) {
        let tag = tag.into();
        match self
            .tagged_token_list
            .iter_mut()
            .find(|tagged| tagged.token_index == token_index)
        {
            Some(tagged) => tagged.tag = tag,
            None => self.tagged_token_list.push(TaggedToken {
                token_index,
                tag,
                confidence: None,
            }),
        }
    }

    /// Descarta as tags atuais e marca todos os tokens da Tokenization com `tag`.
    pub fn set_all_tagged_token_tags(&mut self, tokenization: &Tokenization, tag: &str) {
        self.tagged_token_list = (0..tokenization.tokens().len())
            .map(|token_index| TaggedToken {
                token_index,
                tag: tag.to_string(),
                confidence: None,
            })
            .collect();
    }

    pub fn bio_tag_separator(&self) -> &str {
        self.bio_tag_separator
            .as_deref()
            .unwrap_or(DEFAULT_BIO_SEPARATOR)
    }

    pub fn set_bio_tag_separator(&mut self, separator: impl Into<String>) {
        self.bio_tag_separator = Some(separator.into());
    }

    /// Prefixo BIO da tag no token (None se não houver tag BIO).
    pub fn bio_value(&self, token_index: usize) -> Option<BioValue> {
        let tag = &self.tagged_token_with_token_index(token_index)?.tag;
        tag.chars().next().and_then(BioValue::from_letter)
    }

    /// Rótulo sem o prefixo BIO e o separador (`"B-PER"` → `"PER"`).
    pub fn bio_tag_value(&self, token_index: usize) -> Option<String> {
        let tag = &self.tagged_token_with_token_index(token_index)?.tag;
        if tag.is_empty() {
            return None;
        }
        let skip = 1 + self.bio_tag_separator().chars().count();
        Some(tag.chars().skip(skip).collect())
    }

    /// Índice do `B` da cadeia `B I*` que contém o token.
    pub fn bio_token_index_for_b(&self, token_index: usize) -> Result<usize> {
        match self.bio_value(token_index) {
            Some(BioValue::Begin) | Some(BioValue::Inside) => {}
            _ => {
                return Err(ConversionError::invalid_tagging(
                    token_index,
                    "esperada tag 'B' ou 'I'",
                ))
            }
        }

        let mut b_index = token_index;
        while self.bio_value(b_index) == Some(BioValue::Inside) {
            b_index = b_index.checked_sub(1).ok_or_else(|| {
                ConversionError::invalid_tagging(token_index, "cadeia 'I' sem 'B' inicial")
            })?;
        }
        if self.bio_value(b_index) != Some(BioValue::Begin) {
            return Err(ConversionError::invalid_tagging(
                b_index,
                "esperada tag 'B' no início da cadeia",
            ));
        }
        Ok(b_index)
    }

    /// Define a tag BIO do token e mantém os `I` seguintes consistentes.
    ///
    /// Para `Inside`, o rótulo vem do token anterior (que precisa ser `B` ou `I`);
    /// `tag_text` é ignorado nesse caso.
    pub fn bio_set_tagged_token_tag(
        &mut self,
        value: BioValue,
        tag_text: &str,
        token_index: usize,
    ) -> Result<()> {
        let separator = self.bio_tag_separator().to_string();
        match value {
            BioValue::Begin => {
                self.set_tagged_token_tag(format!("B{}{}", separator, tag_text), token_index)
            }
            BioValue::Inside => {
                let previous = token_index.checked_sub(1);
                let label = match previous.and_then(|p| self.bio_value(p)) {
                    Some(BioValue::Begin) | Some(BioValue::Inside) => previous
                        .and_then(|p| self.bio_tag_value(p))
                        .unwrap_or_default(),
                    _ => {
                        return Err(ConversionError::invalid_tagging(
                            token_index,
                            "'I' precisa seguir 'B' ou 'I'",
                        ))
                    }
                };
                self.set_tagged_token_tag(format!("I{}{}", separator, label), token_index);
            }
            BioValue::Outside => self.set_tagged_token_tag("O", token_index),
        }

        // Propaga para a cadeia de 'I' que começa no próximo token
        let next = token_index + 1;
        if self.bio_value(next) == Some(BioValue::Inside) {
            let next_label = self.bio_tag_value(next).unwrap_or_default();
            if value == BioValue::Outside {
                self.bio_set_tagged_token_tag(BioValue::Begin, &next_label, next)?;
            } else {
                let current_label = self.bio_tag_value(token_index).unwrap_or_default();
                if current_label != next_label {
                    self.bio_set_tagged_token_tag(BioValue::Inside, &current_label, next)?;
                }
            }
        }
        Ok(())
    }

    /// Reconstrói as entidades da tagging (tokens sem tag contam como `O`).
    pub fn bio_spans(&self) -> Vec<BioSpan> {
        let mut tagged: Vec<&TaggedToken> = self.tagged_token_list.iter().collect();
        tagged.sort_by_key(|t| t.token_index);
        sparse_bio_spans(
            tagged.into_iter().map(|t| (t.token_index, t.tag.as_str())),
            self.bio_tag_separator(),
        )
    }
}

/// Converte uma sequência de tags BIO em spans.
///
/// Implementa a máquina de estados do esquema BIO:
/// - inicia uma entidade em `B-X`;
/// - continua enquanto houver `I-X` da **mesma** categoria;
/// - um `I-Y` de outra categoria (ou sem `B` antes) abre uma nova entidade.
pub fn bio_to_spans(tags: &[&str], separator: &str) -> Vec<BioSpan> {
    sparse_bio_spans(tags.iter().copied().enumerate(), separator)
}

/// Mesma máquina de estados sobre pares `(índice, tag)` em ordem crescente.
/// Índices ausentes entre dois pares contam como `O`.
fn sparse_bio_spans<'t>(
    tags: impl IntoIterator<Item = (usize, &'t str)>,
    separator: &str,
) -> Vec<BioSpan> {
    let begin = format!("B{}", separator);
    let inside = format!("I{}", separator);

    let mut spans = Vec::new();
    let mut current: Option<(usize, String)> = None;
    // Índice logo após o último token visto
    let mut next = 0usize;

    for (i, tag) in tags {
        if i != next {
            if let Some((start, open)) = current.take() {
                spans.push(BioSpan { start, end: next, label: open });
            }
        }
        next = i.saturating_add(1);

        if let Some(label) = tag.strip_prefix(&begin) {
            if let Some((start, open)) = current.take() {
                spans.push(BioSpan { start, end: i, label: open });
            }
            current = Some((i, label.to_string()));
        } else if let Some(label) = tag.strip_prefix(&inside) {
            match current.take() {
                Some((start, open)) if open == label => current = Some((start, open)),
                Some((start, open)) => {
                    spans.push(BioSpan { start, end: i, label: open });
                    current = Some((i, label.to_string()));
                }
                // Começou com I: trata como B
                None => current = Some((i, label.to_string())),
            }
        } else if let Some((start, open)) = current.take() {
            spans.push(BioSpan { start, end: i, label: open });
        }
    }

    if let Some((start, open)) = current {
        spans.push(BioSpan {
            start,
            end: next,
            label: open,
        });
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ConcreteUuid, SequentialUuidGenerator};
    use crate::model::Token;

    fn tagging(tags: &[&str]) -> TokenTagging {
        let mut tt = TokenTagging::create("NER", Some("teste"), &SequentialUuidGenerator::new());
        for (i, tag) in tags.iter().enumerate() {
            tt.set_tagged_token_tag(*tag, i);
        }
        tt
    }

    fn tags_of(tt: &TokenTagging) -> Vec<String> {
        let mut tagged = tt.tagged_token_list.clone();
        tagged.sort_by_key(|t| t.token_index);
        tagged.into_iter().map(|t| t.tag).collect()
    }

    #[test]
    fn test_create_and_add() {
        let gen = SequentialUuidGenerator::new();
        let mut tokenization = Tokenization::with_tokens(
            ConcreteUuid::new("tok"),
            vec![Token::new(0, "São", 0, 3), Token::new(1, "Paulo", 4, 9)],
        );
        let tt = TokenTagging::create("NER", None, &gen);
        assert_eq!(tt.metadata.tool, "concrete-core - TokenTagging::create()");
        assert!(tt.metadata.timestamp > 1);
        tokenization.add_token_tagging(tt);
        tokenization.add_token_tagging(TokenTagging::create("POS", Some("tagger"), &gen));

        assert_eq!(tokenization.token_taggings_of_type("NER").len(), 1);
        assert_eq!(tokenization.token_taggings_of_type("LEMMA").len(), 0);
    }

    #[test]
    fn test_set_tagged_token_tag_updates_in_place() {
        let mut tt = tagging(&["O"]);
        tt.set_tagged_token_tag("B-PER", 0);
        tt.set_tagged_token_tag("O", 3);
        assert_eq!(tt.tagged_token_list.len(), 2);
        assert_eq!(tt.tagged_token_with_token_index(0).unwrap().tag, "B-PER");
        assert!(tt.tagged_token_with_token_index(1).is_none());
    }

    #[test]
    fn test_set_all_tagged_token_tags() {
        let tokenization = Tokenization::with_tokens(
            ConcreteUuid::new("tok"),
            vec![Token::new(0, "a", 0, 1), Token::new(1, "b", 2, 3)],
        );
        let mut tt = tagging(&["B-PER", "I-PER", "O"]);
        tt.set_all_tagged_token_tags(&tokenization, "O");
        assert_eq!(tags_of(&tt), vec!["O", "O"]);
    }

    #[test]
    fn test_bio_values() {
        let tt = tagging(&["B-PER", "I-PER", "O", "X"]);
        assert_eq!(tt.bio_value(0), Some(BioValue::Begin));
        assert_eq!(tt.bio_value(1), Some(BioValue::Inside));
        assert_eq!(tt.bio_value(2), Some(BioValue::Outside));
        assert_eq!(tt.bio_value(3), None);
        assert_eq!(tt.bio_value(9), None);
        assert_eq!(tt.bio_tag_value(1).as_deref(), Some("PER"));
        assert_eq!(tt.bio_tag_value(2).as_deref(), Some(""));
    }

    #[test]
    fn test_custom_separator() {
        let mut tt = tagging(&[]);
        assert_eq!(tt.bio_tag_separator(), "-");
        tt.set_bio_tag_separator("_");
        tt.bio_set_tagged_token_tag(BioValue::Begin, "LOC", 0).unwrap();
        assert_eq!(tags_of(&tt), vec!["B_LOC"]);
        assert_eq!(tt.bio_tag_value(0).as_deref(), Some("LOC"));
    }

    #[test]
    fn test_bio_token_index_for_b() {
        let tt = tagging(&["O", "B-ORG", "I-ORG", "I-ORG", "I-PER"]);
        assert_eq!(tt.bio_token_index_for_b(3).unwrap(), 1);
        assert_eq!(tt.bio_token_index_for_b(1).unwrap(), 1);
        assert!(tt.bio_token_index_for_b(0).is_err(), "'O' não pertence a cadeia");

        let broken = tagging(&["O", "I-ORG"]);
        assert!(broken.bio_token_index_for_b(1).is_err());
        let leading = tagging(&["I-ORG"]);
        assert!(leading.bio_token_index_for_b(0).is_err());
    }

    #[test]
    fn test_bio_set_propagates_label() {
        let mut tt = tagging(&["B-PER", "I-PER", "I-PER", "O"]);
        tt.bio_set_tagged_token_tag(BioValue::Begin, "ORG", 0).unwrap();
        assert_eq!(tags_of(&tt), vec!["B-ORG", "I-ORG", "I-ORG", "O"]);
    }

    #[test]
    fn test_bio_set_outside_promotes_next() {
        let mut tt = tagging(&["B-PER", "I-PER", "I-PER"]);
        tt.bio_set_tagged_token_tag(BioValue::Outside, "", 0).unwrap();
        assert_eq!(tags_of(&tt), vec!["O", "B-PER", "I-PER"]);
    }

    #[test]
    fn test_bio_set_inside_requires_chain() {
        let mut tt = tagging(&["O", "O"]);
        assert!(tt.bio_set_tagged_token_tag(BioValue::Inside, "PER", 1).is_err());
        assert!(tt.bio_set_tagged_token_tag(BioValue::Inside, "PER", 0).is_err());

        let mut tt = tagging(&["B-LOC", "O"]);
        tt.bio_set_tagged_token_tag(BioValue::Inside, "ignorado", 1).unwrap();
        assert_eq!(tags_of(&tt), vec!["B-LOC", "I-LOC"]);
    }

    #[test]
    fn test_bio_to_spans() {
        let tags = vec!["O", "B-PER", "I-PER", "O", "B-LOC"];
        let spans = bio_to_spans(&tags, "-");
        assert_eq!(spans.len(), 2);
        assert_eq!(
            spans[0],
            BioSpan { start: 1, end: 3, label: "PER".to_string() }
        );
        assert_eq!(
            spans[1],
            BioSpan { start: 4, end: 5, label: "LOC".to_string() }
        );
    }

    #[test]
    fn test_bio_to_spans_inconsistent_inside() {
        let spans = bio_to_spans(&["I-PER", "I-ORG", "O"], "-");
        assert_eq!(
            spans,
            vec![
                BioSpan { start: 0, end: 1, label: "PER".to_string() },
                BioSpan { start: 1, end: 2, label: "ORG".to_string() },
            ]
        );
    }

    #[test]
    fn test_tagging_bio_spans_with_gaps() {
        let mut tt = tagging(&[]);
        tt.set_tagged_token_tag("I-MISC", 3);
        tt.set_tagged_token_tag("B-MISC", 2);
        assert_eq!(
            tt.bio_spans(),
            vec![BioSpan { start: 2, end: 4, label: "MISC".to_string() }]
        );
    }

    #[test]
    fn test_tagging_bio_spans_sparse_large_indices() {
        let far = 1_000_000_000_000usize;
        let mut tt = tagging(&[]);
        tt.set_tagged_token_tag("I-PER", far + 1);
        tt.set_tagged_token_tag("B-PER", far);
        tt.set_tagged_token_tag("B-LOC", 5);
        tt.set_tagged_token_tag("I-LOC", 7);
        assert_eq!(
            tt.bio_spans(),
            vec![
                BioSpan { start: 5, end: 6, label: "LOC".to_string() },
                BioSpan { start: 7, end: 8, label: "LOC".to_string() },
                BioSpan { start: far, end: far + 2, label: "PER".to_string() },
            ]
        );

        let mut tt = tagging(&[]);
        tt.set_tagged_token_tag("B-PER", usize::MAX);
        let spans = tt.bio_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, usize::MAX);
    }
}
