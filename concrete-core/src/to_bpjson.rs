//! # Concrete → BP-JSON
//!
//! Achata a estrutura do documento ([`crate::flatten`]) e remapeia as
//! camadas de anotação:
//!
//! - **Entidades** → `span-sets`: cada menção vira um span com offsets de
//!   caractere (do primeiro e último token) e índices **globais** de token.
//! - **Situações `EVENT`** → `events` (agentes, âncora, pacientes, eventos
//!   referenciados).
//! - **Situações de template** → `granular-templates`, com os demais papéis
//!   agrupados em slots.
//!
//! Cada camada só é exportada se a lista correspondente da Communication não
//! estiver vazia; quando há ferramenta configurada, o filtro precisa deixar
//! exatamente um conjunto.

use std::collections::BTreeMap;

use tracing::debug;

use crate::bpjson::{
    AnnotationSets, BasicEvents, CorpusEntry, Event, GranularTemplate, Span, SpanSet,
};
use crate::config::ConversionOptions;
use crate::error::{exactly_one, ConversionError, Result};
use crate::flatten::{flatten, FlattenedDocument};
use crate::ids::ConcreteUuid;
use crate::linker::{add_internal_references, InternalReferences};
use crate::model::{Argument, Communication, EntitySet, Situation, SituationSet, TextSpan, Token};
use crate::offsets::char_slice;
use crate::slots::{arguments_to_slot, normalize_argument_role, IdsByUuid};

const EVENT_SITUATION_TYPE: &str = "EVENT";
const TEMPLATE_ANCHOR_ROLE: &str = "template-anchor";

/// Escolhe o único conjunto gerado pela ferramenta indicada (ou o único, se nenhuma).
fn select_set<'a, T>(
    sets: &'a [T],
    tool: Option<&str>,
    tool_of: impl Fn(&T) -> &str,
    what: &str,
) -> Result<&'a T> {
    let candidates: Vec<&T> = sets
        .iter()
        .filter(|set| tool.map_or(true, |tool| tool_of(set) == tool))
        .collect();
    exactly_one(candidates, what)
}

/// Contexto compartilhado pelas etapas de exportação de um documento.
struct Exporter<'a> {
    communication: &'a Communication,
    chars: Vec<char>,
    flat: FlattenedDocument,
    refs: InternalReferences<'a>,
}

pub fn convert_concrete_to_bpjson(
    communication: &Communication,
    options: &ConversionOptions,
) -> Result<CorpusEntry> {
    let exporter = Exporter {
        communication,
        chars: communication.text.chars().collect(),
        flat: flatten(communication)?,
        refs: add_internal_references(communication),
    };

    let mut basic_events = BasicEvents::default();
    let mut has_annotations = false;
    let mut entity_ids = IdsByUuid::new();

    if !communication.entity_set_list.is_empty()
        && !communication.entity_mention_set_list.is_empty()
    {
        let entity_set = select_set(
            &communication.entity_set_list,
            options.entity_set_tool.as_deref(),
            |set: &EntitySet| set.metadata.tool.as_str(),
            "Communication.entitySetList",
        )?;
        let (span_sets, ids) = exporter.span_sets(entity_set)?;
        basic_events.span_sets = Some(span_sets);
        entity_ids = ids;
        has_annotations = true;
    }

    if !communication.situation_set_list.is_empty() {
        let situation_set = select_set(
            &communication.situation_set_list,
            options.situation_set_tool.as_deref(),
            |set: &SituationSet| set.metadata.tool.as_str(),
            "Communication.situationSetList",
        )?;
        let (events, templates) = exporter.events_and_templates(
            situation_set,
            &entity_ids,
            &options.template_situation_type,
        )?;
        basic_events.events = Some(events);
        basic_events.granular_templates = Some(templates);
        has_annotations = true;
    }

    debug!(
        doc_id = %communication.id,
        sections = exporter.flat.segment_sections.len(),
        tokens = exporter.flat.offsets.tok2char.len(),
        "documento convertido para BP-JSON"
    );

    let Exporter { flat, .. } = exporter;
    Ok(CorpusEntry {
        annotation_sets: has_annotations.then_some(AnnotationSets { basic_events }),
        char2tok: flat.offsets.char2tok,
        doc_id: communication.id.clone(),
        entry_id: communication.id.clone(),
        segment_sections: flat.segment_sections,
        segment_text: communication.text.clone(),
        segment_text_tok: flat.segment_text_tok,
        segment_type: communication.comm_type.clone(),
        tok2char: flat.offsets.tok2char,
    })
}

impl<'a> Exporter<'a> {
    fn token_text(&self, token: &Token) -> Result<String> {
        if token.text.is_empty() {
            char_slice(&self.chars, token.text_span)
        } else {
            Ok(token.text.clone())
        }
    }

    fn span_sets(
        &self,
        entity_set: &'a EntitySet,
    ) -> Result<(BTreeMap<String, SpanSet>, IdsByUuid<'a>)> {
        let mut span_sets = BTreeMap::new();
        let mut entity_ids = IdsByUuid::new();

        for (index, entity) in entity_set.entity_list.iter().enumerate() {
            let ssid = entity
                .id
                .clone()
                .unwrap_or_else(|| format!("ss-{}", index));
            entity_ids.insert(&entity.uuid, ssid.clone());

            let spans = entity
                .mention_id_list
                .iter()
                .map(|mention_id| self.mention_span(mention_id))
                .collect::<Result<Vec<_>>>()?;
            span_sets.insert(ssid.clone(), SpanSet { spans, ssid });
        }
        Ok((span_sets, entity_ids))
    }

    fn mention_span(&self, mention_id: &ConcreteUuid) -> Result<Span> {
        let mention = self.refs.entity_mention(mention_id)?;
        let tokenization = self.refs.tokenization_for_mention(mention)?;
        let token_offset = self
            .flat
            .offsets
            .token_offset(&tokenization.uuid)
            .ok_or_else(|| ConversionError::missing("tokenization", tokenization.uuid.as_str()))?;

        let indices = &mention.tokens.token_index_list;
        let tokens = indices
            .iter()
            .map(|&i| {
                tokenization
                    .tokens()
                    .get(i)
                    .ok_or_else(|| ConversionError::missing("token", format!("{}:{}", tokenization.uuid, i)))
            })
            .collect::<Result<Vec<&Token>>>()?;
        let (first_index, last_index, first, last) =
            match (indices.first(), indices.last(), tokens.first(), tokens.last()) {
                (Some(&fi), Some(&li), Some(first), Some(last)) => (fi, li, first, last),
                _ => return Err(ConversionError::expected_one("tokens da menção", 0)),
            };

        let start = first.text_span.start;
        let end = last.text_span.ending;
        let string = match mention.text.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => char_slice(&self.chars, TextSpan::new(start, end))?,
        };
        let string_tok = tokens
            .iter()
            .map(|token| self.token_text(token))
            .collect::<Result<Vec<_>>>()?;

        Ok(Span {
            end,
            end_token: Some(token_offset + last_index),
            start,
            start_token: Some(token_offset + first_index),
            string,
            string_tok,
        })
    }

    fn events_and_templates(
        &self,
        situation_set: &'a SituationSet,
        entity_ids: &IdsByUuid<'a>,
        template_situation_type: &str,
    ) -> Result<(BTreeMap<String, Event>, BTreeMap<String, GranularTemplate>)> {
        let is_type = |situation: &Situation, situation_type: &str| {
            situation.situation_type.to_uppercase() == situation_type.to_uppercase()
        };

        let event_situations: Vec<(&Situation, String)> = situation_set
            .situation_list
            .iter()
            .filter(|s| is_type(s, EVENT_SITUATION_TYPE))
            .enumerate()
            .map(|(i, s)| (s, s.id.clone().unwrap_or_else(|| format!("event-{}", i))))
            .collect();
        let event_ids: IdsByUuid<'a> = event_situations
            .iter()
            .map(|(s, id)| (&s.uuid, id.clone()))
            .collect();

        let mut events = BTreeMap::new();
        for (situation, event_id) in &event_situations {
            let event = self.event(situation, event_id, entity_ids, &event_ids)?;
            events.insert(event_id.clone(), event);
        }

        let mut templates = BTreeMap::new();
        for (index, situation) in situation_set
            .situation_list
            .iter()
            .filter(|s| is_type(s, template_situation_type))
            .enumerate()
        {
            let template_id = situation
                .id
                .clone()
                .unwrap_or_else(|| format!("template-{}", index));
            let template = self.template(situation, &template_id, entity_ids, &event_ids)?;
            templates.insert(template_id, template);
        }

        if self.communication.situation_set_list.len() > 1 {
            debug!(tool = %situation_set.metadata.tool, "SituationSet selecionado");
        }
        Ok((events, templates))
    }

    fn event(
        &self,
        situation: &Situation,
        event_id: &str,
        entity_ids: &IdsByUuid<'_>,
        event_ids: &IdsByUuid<'_>,
    ) -> Result<Event> {
        let with_role = |role: &'static str| {
            situation
                .argument_list
                .iter()
                .filter(move |arg| normalize_argument_role(&arg.role) == role)
        };
        let entity_refs = |role: &'static str| -> Result<Vec<String>> {
            with_role(role)
                .map(|arg| entity_ref(arg, entity_ids))
                .collect()
        };

        let anchors = exactly_one(entity_refs("anchor")?, "argumentos 'anchor' do evento")?;
        let ref_events = with_role("ref-event")
            .map(|arg| {
                let uuid = arg.situation_id.as_ref().ok_or_else(|| {
                    ConversionError::MissingArgumentFill {
                        role: arg.role.clone(),
                        expected: "situação".to_string(),
                    }
                })?;
                event_ids
                    .get(uuid)
                    .cloned()
                    .ok_or_else(|| ConversionError::missing("evento", uuid.as_str()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Event {
            agents: entity_refs("agent")?,
            anchors,
            event_type: situation.situation_kind.clone(),
            eventid: event_id.to_string(),
            patients: entity_refs("patient")?,
            ref_events,
            state_of_affairs: false,
        })
    }

    fn template(
        &self,
        situation: &Situation,
        template_id: &str,
        entity_ids: &IdsByUuid<'_>,
        event_ids: &IdsByUuid<'_>,
    ) -> Result<GranularTemplate> {
        let (anchors, others): (Vec<&Argument>, Vec<&Argument>) = situation
            .argument_list
            .iter()
            .partition(|arg| normalize_argument_role(&arg.role) == TEMPLATE_ANCHOR_ROLE);
        if anchors.len() > 1 {
            return Err(ConversionError::expected_one(
                format!("âncoras do template {}", template_id),
                anchors.len(),
            ));
        }
        let template_anchor = match anchors.first() {
            Some(arg) => entity_ref(arg, entity_ids)?,
            None => String::new(),
        };

        // Agrupa por papel normalizado; o slot usa a grafia do primeiro argumento
        let mut by_role: BTreeMap<String, (&str, Vec<&Argument>)> = BTreeMap::new();
        for arg in others {
            by_role
                .entry(normalize_argument_role(&arg.role))
                .or_insert_with(|| (arg.role.as_str(), Vec::new()))
                .1
                .push(arg);
        }
        let slots = by_role
            .into_values()
            .map(|(role, args)| {
                arguments_to_slot(role, &args, entity_ids, event_ids)
                    .map(|fill| (role.to_string(), fill))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(GranularTemplate {
            template_anchor,
            template_id: template_id.to_string(),
            template_type: situation.situation_kind.clone(),
            slots,
        })
    }
}

fn entity_ref(argument: &Argument, entity_ids: &IdsByUuid<'_>) -> Result<String> {
    let uuid = argument
        .entity_id
        .as_ref()
        .ok_or_else(|| ConversionError::MissingArgumentFill {
            role: argument.role.clone(),
            expected: "entidade".to_string(),
        })?;
    entity_ids
        .get(uuid)
        .cloned()
        .ok_or_else(|| ConversionError::missing("entidade", uuid.as_str()))
}
