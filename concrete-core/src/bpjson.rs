//! # Formato BP-JSON
//!
//! Representação plana de um documento: o texto, uma lista de seções
//! rotuladas por offset de caractere (que podem se aninhar ou coincidir), as
//! tabelas `tok2char`/`char2tok` e, opcionalmente, as anotações de eventos
//! (`annotation-sets.basic-events`).
//!
//! Os nomes JSON são hifenizados como no formato de intercâmbio. Mapas usam
//! `BTreeMap` para que a serialização seja estável.
//!
//! ## Slots de templates
//!
//! Um slot de `granular-templates` pode ser um escalar, uma lista de
//! `{"ssid"}` ou uma lista de `{"event-id"}`. O JSON é decodificado **uma
//! única vez** para o enum fechado [`SlotFill`]; listas que misturam os dois
//! tipos de referência são rejeitadas já na decodificação.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Vocabulário de `structural-element` aceito no BP-JSON.
pub const BPJSON_SECTION_KINDS: [&str; 7] = [
    "Byline",
    "Dateline",
    "Headline",
    "Ignore",
    "Section_Header",
    "Sentence",
    "Story-Lead",
];

pub const CORPUS_FORMAT_TYPE: &str = "bp-corpus";
pub const CORPUS_FORMAT_VERSION: &str = "v10";

/// Trecho rotulado do texto, `[start, end)` em caracteres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSection {
    pub end: usize,
    pub start: usize,
    #[serde(rename = "structural-element")]
    pub structural_element: String,
}

impl SegmentSection {
    pub fn new(start: usize, end: usize, structural_element: impl Into<String>) -> Self {
        Self {
            end,
            start,
            structural_element: structural_element.into(),
        }
    }
}

/// Uma ocorrência (menção) de um span-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub end: usize,
    /// Índice global do último token (inclusivo).
    #[serde(rename = "end-token", default, skip_serializing_if = "Option::is_none")]
    pub end_token: Option<usize>,
    pub start: usize,
    #[serde(rename = "start-token", default, skip_serializing_if = "Option::is_none")]
    pub start_token: Option<usize>,
    #[serde(default)]
    pub string: String,
    #[serde(rename = "string-tok", default)]
    pub string_tok: Vec<String>,
}

/// Uma entidade: identificador + suas menções.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSet {
    pub spans: Vec<Span>,
    pub ssid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub agents: Vec<String>,
    pub anchors: String,
    #[serde(rename = "event-type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    pub eventid: String,
    #[serde(default)]
    pub patients: Vec<String>,
    #[serde(rename = "ref-events", default)]
    pub ref_events: Vec<String>,
    #[serde(rename = "state-of-affairs", default)]
    pub state_of_affairs: bool,
}

/// Preenchimento de um slot de template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSlotFill", into = "RawSlotFill")]
pub enum SlotFill {
    /// Valor literal (strings, números e booleanos viram texto).
    Scalar(String),
    /// Lista de `ssid`s.
    EntityRefs(Vec<String>),
    /// Lista de ids de evento.
    EventRefs(Vec<String>),
}

/// Forma JSON crua de um slot, antes da validação.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSlotFill {
    Refs(Vec<SlotRef>),
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ssid: Option<String>,
    #[serde(rename = "event-id", default, skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
}

impl TryFrom<RawSlotFill> for SlotFill {
    type Error = String;

    fn try_from(raw: RawSlotFill) -> Result<Self, Self::Error> {
        let refs = match raw {
            RawSlotFill::Text(s) => return Ok(SlotFill::Scalar(s)),
            RawSlotFill::Number(n) => return Ok(SlotFill::Scalar(n.to_string())),
            RawSlotFill::Flag(b) => return Ok(SlotFill::Scalar(b.to_string())),
            RawSlotFill::Refs(refs) => refs,
        };

        let mut entities = Vec::new();
        let mut events = Vec::new();
        for slot_ref in refs {
            match (slot_ref.ssid, slot_ref.event_id) {
                (Some(ssid), None) => entities.push(ssid),
                (None, Some(event_id)) => events.push(event_id),
                (Some(_), Some(_)) => {
                    return Err("referência de slot com 'ssid' e 'event-id' ao mesmo tempo".into())
                }
                (None, None) => return Err("referência de slot sem 'ssid' nem 'event-id'".into()),
            }
        }
        match (entities.is_empty(), events.is_empty()) {
            (_, true) => Ok(SlotFill::EntityRefs(entities)),
            (true, false) => Ok(SlotFill::EventRefs(events)),
            (false, false) => Err("slot mistura referências de entidade e de evento".into()),
        }
    }
}

impl From<SlotFill> for RawSlotFill {
    fn from(fill: SlotFill) -> Self {
        match fill {
            SlotFill::Scalar(s) => RawSlotFill::Text(s),
            SlotFill::EntityRefs(ids) => RawSlotFill::Refs(
                ids.into_iter()
                    .map(|ssid| SlotRef {
                        ssid: Some(ssid),
                        event_id: None,
                    })
                    .collect(),
            ),
            SlotFill::EventRefs(ids) => RawSlotFill::Refs(
                ids.into_iter()
                    .map(|event_id| SlotRef {
                        ssid: None,
                        event_id: Some(event_id),
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranularTemplate {
    #[serde(rename = "template-anchor", default)]
    pub template_anchor: String,
    #[serde(rename = "template-id")]
    pub template_id: String,
    #[serde(rename = "template-type", default, skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,
    /// Demais chaves do objeto: papel → preenchimento.
    #[serde(flatten)]
    pub slots: BTreeMap<String, SlotFill>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicEvents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, Event>>,
    #[serde(rename = "granular-templates", default, skip_serializing_if = "Option::is_none")]
    pub granular_templates: Option<BTreeMap<String, GranularTemplate>>,
    #[serde(rename = "span-sets", default, skip_serializing_if = "Option::is_none")]
    pub span_sets: Option<BTreeMap<String, SpanSet>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSets {
    #[serde(rename = "basic-events", default)]
    pub basic_events: BasicEvents,
}

/// Uma entrada de corpus (um documento).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    #[serde(rename = "annotation-sets", default, skip_serializing_if = "Option::is_none")]
    pub annotation_sets: Option<AnnotationSets>,
    #[serde(default)]
    pub char2tok: Vec<Vec<usize>>,
    #[serde(rename = "doc-id")]
    pub doc_id: String,
    #[serde(rename = "entry-id")]
    pub entry_id: String,
    #[serde(rename = "segment-sections", default)]
    pub segment_sections: Vec<SegmentSection>,
    #[serde(rename = "segment-text")]
    pub segment_text: String,
    #[serde(rename = "segment-text-tok", default)]
    pub segment_text_tok: Vec<String>,
    #[serde(rename = "segment-type", default)]
    pub segment_type: String,
    #[serde(default)]
    pub tok2char: Vec<Vec<usize>>,
}

impl CorpusEntry {
    pub fn basic_events(&self) -> Option<&BasicEvents> {
        self.annotation_sets.as_ref().map(|sets| &sets.basic_events)
    }
}

/// Corpus: conjunto de entradas indexadas por `entry-id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(rename = "corpus-id")]
    pub corpus_id: String,
    pub entries: BTreeMap<String, CorpusEntry>,
    #[serde(rename = "format-type", default = "default_format_type")]
    pub format_type: String,
    #[serde(rename = "format-version", default = "default_format_version")]
    pub format_version: String,
}

fn default_format_type() -> String {
    CORPUS_FORMAT_TYPE.to_string()
}

fn default_format_version() -> String {
    CORPUS_FORMAT_VERSION.to_string()
}

impl Corpus {
    pub fn new(corpus_id: impl Into<String>) -> Self {
        Self {
            corpus_id: corpus_id.into(),
            entries: BTreeMap::new(),
            format_type: default_format_type(),
            format_version: default_format_version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slot_fill_decoding() {
        let scalar: SlotFill = serde_json::from_value(json!("ontem")).unwrap();
        assert_eq!(scalar, SlotFill::Scalar("ontem".into()));
        let number: SlotFill = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(number, SlotFill::Scalar("3".into()));
        let flag: SlotFill = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(flag, SlotFill::Scalar("true".into()));

        let entities: SlotFill =
            serde_json::from_value(json!([{"ssid": "ss-1"}, {"ssid": "ss-2"}])).unwrap();
        assert_eq!(
            entities,
            SlotFill::EntityRefs(vec!["ss-1".into(), "ss-2".into()])
        );
        let events: SlotFill = serde_json::from_value(json!([{"event-id": "ev-1"}])).unwrap();
        assert_eq!(events, SlotFill::EventRefs(vec!["ev-1".into()]));
    }

    #[test]
    fn test_mixed_slot_fill_rejected() {
        let mixed = serde_json::from_value::<SlotFill>(json!([{"ssid": "a"}, {"event-id": "b"}]));
        assert!(mixed.is_err());
        let both = serde_json::from_value::<SlotFill>(json!([{"ssid": "a", "event-id": "b"}]));
        assert!(both.is_err());
    }

    #[test]
    fn test_slot_fill_serialization() {
        let fill = SlotFill::EventRefs(vec!["ev-1".into()]);
        assert_eq!(serde_json::to_value(&fill).unwrap(), json!([{"event-id": "ev-1"}]));
        let fill = SlotFill::Scalar("x".into());
        assert_eq!(serde_json::to_value(&fill).unwrap(), json!("x"));
    }

    #[test]
    fn test_granular_template_flattened_slots() {
        let value = json!({
            "template-anchor": "ss-0",
            "template-id": "template-0",
            "template-type": "Protestplate",
            "who": [{"ssid": "ss-1"}],
            "when": "ontem"
        });
        let template: GranularTemplate = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(template.slots.len(), 2);
        assert_eq!(template.slots["when"], SlotFill::Scalar("ontem".into()));
        assert_eq!(serde_json::to_value(&template).unwrap(), value);
    }

    #[test]
    fn test_corpus_entry_names() {
        let value = json!({
            "char2tok": [[0], [0], []],
            "doc-id": "d",
            "entry-id": "e",
            "segment-sections": [{"start": 0, "end": 2, "structural-element": "Sentence"}],
            "segment-text": "ab ",
            "segment-text-tok": ["ab"],
            "segment-type": "story",
            "tok2char": [[0, 1]]
        });
        let entry: CorpusEntry = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(entry.segment_sections[0].structural_element, "Sentence");
        assert!(entry.basic_events().is_none());
        assert_eq!(serde_json::to_value(&entry).unwrap(), value);
    }

    #[test]
    fn test_corpus_defaults() {
        let corpus: Corpus =
            serde_json::from_value(json!({"corpus-id": "c", "entries": {}})).unwrap();
        assert_eq!(corpus, Corpus::new("c"));
        assert_eq!(corpus.format_type, "bp-corpus");
        assert_eq!(corpus.format_version, "v10");
    }
}
