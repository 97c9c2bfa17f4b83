//! # Erros de Conversão
//!
//! Todas as falhas estruturais da conversão Concrete ⇄ BP-JSON são fatais e
//! retornadas como [`ConversionError`]. Problemas de qualidade de dados
//! (tokens que cruzam fronteiras de sentença) **não** são erros: são
//! registrados com `tracing::warn!` e o token é descartado.

use thiserror::Error;

/// Resultado padrão das operações de conversão.
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Erros possíveis durante a conversão entre os dois modelos de documento.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Duas seções se sobrepõem sem que uma contenha a outra.
    #[error("seções se sobrepõem de forma não hierárquica: [{start}, {ending}) ({kind})")]
    NonHierarchicalOverlap {
        start: usize,
        ending: usize,
        kind: String,
    },

    /// Uma menção (ou span) referencia tokens de mais de uma Tokenization.
    #[error("span [{start_token}, {end_token}] referencia {count} tokenizations")]
    SpanCrossesTokenizations {
        start_token: usize,
        end_token: usize,
        count: usize,
    },

    /// Uma lista que deveria ter exatamente um elemento tem zero ou vários.
    #[error("esperado exatamente um elemento em {what}, encontrados {found}")]
    ExpectedExactlyOne { what: String, found: usize },

    /// Um slot de template mistura preenchimentos incompatíveis.
    #[error("slot '{role}' mistura preenchimentos incompatíveis: {reason}")]
    MixedSlotFills { role: String, reason: String },

    /// Argumento com preenchimento de entidade e de situação ao mesmo tempo.
    #[error("argumento com papel '{role}' tem preenchimento de entidade e de situação")]
    AmbiguousArgument { role: String },

    /// Argumento sem o preenchimento exigido pelo papel (ex: âncora sem entidade).
    #[error("argumento com papel '{role}' não tem preenchimento de {expected}")]
    MissingArgumentFill { role: String, expected: String },

    /// Referência (UUID ou identificador) que não resolve dentro do documento.
    #[error("{kind} não encontrado: {id}")]
    MissingReference { kind: String, id: String },

    /// Offset de caractere fora do texto.
    #[error("offset {offset} fora do texto (tamanho {len})")]
    InvalidOffset { offset: usize, len: usize },

    /// Os índices de caractere de um token não são contíguos.
    #[error("texto do token [{start}, {ending}) não corresponde aos seus índices")]
    TokenTextMismatch { start: usize, ending: usize },

    /// Não há token cujo início/fim coincida com o span de texto.
    #[error("nenhum token corresponde ao span de texto [{start}, {end})")]
    UnalignedTextSpan { start: usize, end: usize },

    /// Marcação BIO inconsistente.
    #[error("marcação BIO inválida no token {token_index}: {reason}")]
    InvalidTagging { token_index: usize, reason: String },

    /// Duas entradas do mesmo corpus com o mesmo `entry-id`.
    #[error("entrada duplicada no corpus: {id}")]
    DuplicateEntry { id: String },

    /// Falha de (de)serialização.
    #[error("erro de codec: {0}")]
    Codec(String),
}

impl ConversionError {
    pub fn missing(kind: impl Into<String>, id: impl Into<String>) -> Self {
        ConversionError::MissingReference {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn expected_one(what: impl Into<String>, found: usize) -> Self {
        ConversionError::ExpectedExactlyOne {
            what: what.into(),
            found,
        }
    }

    pub fn mixed_slot(role: impl Into<String>, reason: impl Into<String>) -> Self {
        ConversionError::MixedSlotFills {
            role: role.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_tagging(token_index: usize, reason: impl Into<String>) -> Self {
        ConversionError::InvalidTagging {
            token_index,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::Codec(err.to_string())
    }
}

/// Retorna o único elemento de `items`, ou erro se houver zero ou vários.
pub fn exactly_one<T>(items: Vec<T>, what: &str) -> Result<T> {
    let found = items.len();
    let mut iter = items.into_iter();
    match (iter.next(), iter.next()) {
        (Some(item), None) => Ok(item),
        _ => Err(ConversionError::expected_one(what, found)),
    }
}
