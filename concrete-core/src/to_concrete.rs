//! # BP-JSON → Concrete
//!
//! Reconstrói a Communication a partir de uma entrada de corpus:
//!
//! 1. seções, sentenças e tokens via [`build_sections`];
//! 2. `span-sets` → um `EntityMentionSet` e um `EntitySet` (o `ssid` vira o
//!    `id` da entidade);
//! 3. `events` e `granular-templates` → um único `SituationSet`.
//!
//! Os índices de token do BP-JSON são globais; o mapa de posicionamento
//! devolvido por [`build_sections`] os converte em `(tokenization, índice
//! local)`. Um span que cita um token descartado não tem para onde ir e
//! falha com `MissingReference`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::bpjson::{CorpusEntry, Event, GranularTemplate, Span, SpanSet};
use crate::config::ConversionOptions;
use crate::error::{ConversionError, Result};
use crate::ids::{AnnotationMetadata, ConcreteUuid, UuidGenerator};
use crate::model::{
    Argument, Communication, Entity, EntityMention, EntityMentionSet, EntitySet, Situation,
    SituationSet, TokenRefSequence,
};
use crate::sections::{build_sections, TokenPlacement};
use crate::slots::{slot_to_arguments, UuidsById};

const EVENT_SITUATION_TYPE: &str = "EVENT";

pub fn convert_bpjson_to_concrete(
    entry: &CorpusEntry,
    options: &ConversionOptions,
    uuid_generator: &dyn UuidGenerator,
) -> Result<Communication> {
    let hierarchy = build_sections(
        &entry.segment_sections,
        &entry.tok2char,
        &entry.segment_text,
        uuid_generator,
    )?;

    let mut communication = Communication::new(
        entry.entry_id.clone(),
        uuid_generator.generate(),
        entry.segment_type.clone(),
        entry.segment_text.clone(),
    );
    communication.section_list = hierarchy.sections;

    let basic_events = match entry.basic_events() {
        Some(basic_events) => basic_events,
        None => return Ok(communication),
    };

    let mut entities_by_id = UuidsById::new();
    if let Some(span_sets) = &basic_events.span_sets {
        let importer = SpanImporter {
            tok2char: &entry.tok2char,
            placements: &hierarchy.placements,
            uuid_generator,
        };
        let (mention_set, entity_set) = importer.import(span_sets)?;
        entities_by_id = entity_set
            .entity_list
            .iter()
            .filter_map(|entity| entity.id.clone().map(|id| (id, entity.uuid.clone())))
            .collect();
        communication.entity_mention_set_list.push(mention_set);
        communication.entity_set_list.push(entity_set);
    }

    let events = basic_events.events.as_ref();
    let templates = basic_events.granular_templates.as_ref();
    if events.is_some() || templates.is_some() {
        let situation_set = import_situations(
            events.unwrap_or(&BTreeMap::new()),
            templates.unwrap_or(&BTreeMap::new()),
            &entities_by_id,
            options,
            uuid_generator,
        )?;
        communication.situation_set_list.push(situation_set);
    }

    debug!(
        entry_id = %entry.entry_id,
        sections = communication.section_list.len(),
        entities = entities_by_id.len(),
        "entrada BP-JSON convertida para Concrete"
    );
    Ok(communication)
}

struct SpanImporter<'a> {
    tok2char: &'a [Vec<usize>],
    placements: &'a [Option<TokenPlacement>],
    uuid_generator: &'a dyn UuidGenerator,
}

impl SpanImporter<'_> {
    fn import(&self, span_sets: &BTreeMap<String, SpanSet>) -> Result<(EntityMentionSet, EntitySet)> {
        let mut mentions = Vec::new();
        let mut entities = Vec::with_capacity(span_sets.len());

        for span_set in span_sets.values() {
            let mut mention_ids = Vec::with_capacity(span_set.spans.len());
            for span in &span_set.spans {
                let mention = self.mention(span)?;
                mention_ids.push(mention.uuid.clone());
                mentions.push(mention);
            }
            entities.push(Entity::new(
                self.uuid_generator.generate(),
                Some(span_set.ssid.clone()),
                mention_ids,
            ));
        }

        Ok((
            EntityMentionSet {
                uuid: self.uuid_generator.generate(),
                metadata: AnnotationMetadata::stub(),
                mention_list: mentions,
            },
            EntitySet {
                uuid: self.uuid_generator.generate(),
                metadata: AnnotationMetadata::stub(),
                entity_list: entities,
            },
        ))
    }

    /// Intervalo global `[primeiro, último]` de tokens do span.
    fn token_range(&self, span: &Span) -> Result<(usize, usize)> {
        if let (Some(start), Some(end)) = (span.start_token, span.end_token) {
            return Ok((start, end));
        }
        let first = self
            .tok2char
            .iter()
            .position(|chars| chars.first() == Some(&span.start));
        let last = self
            .tok2char
            .iter()
            .position(|chars| span.end > 0 && chars.last() == Some(&(span.end - 1)));
        match (first, last) {
            (Some(first), Some(last)) if first <= last => Ok((first, last)),
            _ => Err(ConversionError::UnalignedTextSpan {
                start: span.start,
                end: span.end,
            }),
        }
    }

    fn mention(&self, span: &Span) -> Result<EntityMention> {
        let (first, last) = self.token_range(span)?;
        let placements = (first..=last)
            .map(|global| {
                self.placements
                    .get(global)
                    .and_then(Option::as_ref)
                    .ok_or_else(|| ConversionError::missing("token", global.to_string()))
            })
            .collect::<Result<Vec<&TokenPlacement>>>()?;

        let tokenization = match placements.first() {
            Some(placement) => placement.tokenization.clone(),
            None => {
                return Err(ConversionError::UnalignedTextSpan {
                    start: span.start,
                    end: span.end,
                })
            }
        };
        let tokenizations = placements
            .iter()
            .filter(|p| p.tokenization != tokenization)
            .count();
        if tokenizations > 0 {
            let mut distinct: Vec<&ConcreteUuid> = placements.iter().map(|p| &p.tokenization).collect();
            distinct.dedup();
            return Err(ConversionError::SpanCrossesTokenizations {
                start_token: first,
                end_token: last,
                count: distinct.len(),
            });
        }

        let mut mention = EntityMention::new(
            self.uuid_generator.generate(),
            TokenRefSequence {
                token_index_list: placements.iter().map(|p| p.token_index).collect(),
                anchor_token_index: None,
                tokenization_id: tokenization,
            },
        );
        if !span.string.is_empty() {
            mention.text = Some(span.string.clone());
        }
        Ok(mention)
    }
}

fn import_situations(
    events: &BTreeMap<String, Event>,
    templates: &BTreeMap<String, GranularTemplate>,
    entities_by_id: &UuidsById,
    options: &ConversionOptions,
    uuid_generator: &dyn UuidGenerator,
) -> Result<SituationSet> {
    let entity = |role: &str, ssid: &str| -> Result<Argument> {
        entities_by_id
            .get(ssid)
            .cloned()
            .map(|uuid| Argument::entity(role, uuid))
            .ok_or_else(|| ConversionError::missing("entidade", ssid))
    };

    // UUIDs primeiro: `ref-events` pode apontar para qualquer evento
    let events_by_id: UuidsById = events
        .keys()
        .map(|id| (id.clone(), uuid_generator.generate()))
        .collect();

    let mut situations = Vec::with_capacity(events.len() + templates.len());
    for (id, event) in events {
        let mut arguments = Vec::new();
        for ssid in &event.agents {
            arguments.push(entity("agent", ssid)?);
        }
        arguments.push(entity("anchor", &event.anchors)?);
        for ssid in &event.patients {
            arguments.push(entity("patient", ssid)?);
        }
        for ref_event in &event.ref_events {
            let uuid = events_by_id
                .get(ref_event)
                .cloned()
                .ok_or_else(|| ConversionError::missing("evento", ref_event.as_str()))?;
            arguments.push(Argument::situation("ref-event", uuid));
        }

        let uuid = events_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| ConversionError::missing("evento", id.as_str()))?;
        situations.push(Situation::new(
            uuid,
            Some(event.eventid.clone()),
            EVENT_SITUATION_TYPE,
            event.event_type.clone(),
            arguments,
        ));
    }

    for template in templates.values() {
        let mut arguments = Vec::new();
        if !template.template_anchor.is_empty() {
            arguments.push(entity("template-anchor", &template.template_anchor)?);
        }
        for (role, fill) in &template.slots {
            arguments.extend(slot_to_arguments(role, fill, entities_by_id, &events_by_id)?);
        }
        situations.push(Situation::new(
            uuid_generator.generate(),
            Some(template.template_id.clone()),
            options.template_situation_type.clone(),
            template.template_type.clone(),
            arguments,
        ));
    }

    Ok(SituationSet {
        uuid: uuid_generator.generate(),
        metadata: AnnotationMetadata::stub(),
        situation_list: situations,
    })
}
