//! # Slots de Templates
//!
//! Conversão entre os argumentos Concrete de um mesmo papel e o valor de um
//! slot BP-JSON ([`SlotFill`]).
//!
//! Regras de `arguments_to_slot`:
//! - todos os argumentos devem ter o mesmo papel;
//! - nenhum argumento pode apontar para entidade **e** situação;
//! - vários argumentos, ou qualquer referência: todos devem ser referências
//!   do mesmo tipo (entidades → `EntityRefs`, situações → `EventRefs`);
//! - um único argumento escalar: exatamente uma propriedade → `Scalar`.

use std::collections::HashMap;

use crate::bpjson::SlotFill;
use crate::error::{exactly_one, ConversionError, Result};
use crate::ids::ConcreteUuid;
use crate::model::Argument;

/// Mapa UUID Concrete → id BP-JSON (`ssid`, `eventid`).
pub type IdsByUuid<'a> = HashMap<&'a ConcreteUuid, String>;

/// Mapa id BP-JSON → UUID Concrete.
pub type UuidsById = HashMap<String, ConcreteUuid>;

pub fn normalize_argument_role(role: &str) -> String {
    role.to_lowercase()
}

fn resolve_id(ids: &IdsByUuid<'_>, uuid: &ConcreteUuid, kind: &str) -> Result<String> {
    ids.get(uuid)
        .cloned()
        .ok_or_else(|| ConversionError::missing(kind, uuid.as_str()))
}

/// Converte os argumentos de um papel no valor do slot.
pub fn arguments_to_slot(
    role: &str,
    arguments: &[&Argument],
    entity_ids: &IdsByUuid<'_>,
    event_ids: &IdsByUuid<'_>,
) -> Result<SlotFill> {
    let normalized = normalize_argument_role(role);
    if let Some(other) = arguments
        .iter()
        .find(|arg| normalize_argument_role(&arg.role) != normalized)
    {
        return Err(ConversionError::mixed_slot(
            role,
            format!("argumento com papel '{}'", other.role),
        ));
    }
    if let Some(arg) = arguments
        .iter()
        .find(|arg| arg.entity_id.is_some() && arg.situation_id.is_some())
    {
        return Err(ConversionError::AmbiguousArgument {
            role: arg.role.clone(),
        });
    }

    if arguments.len() > 1 || arguments.iter().any(|arg| arg.is_reference()) {
        if arguments.iter().any(|arg| !arg.is_reference()) {
            return Err(ConversionError::mixed_slot(
                role,
                "vários argumentos, mas nem todos apontam para entidade ou situação",
            ));
        }
        if arguments.iter().all(|arg| arg.entity_id.is_some()) {
            return arguments
                .iter()
                .filter_map(|arg| arg.entity_id.as_ref())
                .map(|uuid| resolve_id(entity_ids, uuid, "entidade"))
                .collect::<Result<Vec<_>>>()
                .map(SlotFill::EntityRefs);
        }
        if arguments.iter().all(|arg| arg.situation_id.is_some()) {
            return arguments
                .iter()
                .filter_map(|arg| arg.situation_id.as_ref())
                .map(|uuid| resolve_id(event_ids, uuid, "evento"))
                .collect::<Result<Vec<_>>>()
                .map(SlotFill::EventRefs);
        }
        return Err(ConversionError::mixed_slot(
            role,
            "referências de entidade e de situação no mesmo papel",
        ));
    }

    let argument = exactly_one(arguments.to_vec(), "lista de argumentos escalares")?;
    let property = exactly_one(
        argument.property_list.iter().collect(),
        "lista de propriedades do argumento escalar",
    )?;
    Ok(SlotFill::Scalar(property.value.clone()))
}

/// Inverso de [`arguments_to_slot`]: gera os argumentos Concrete de um slot.
pub fn slot_to_arguments(
    role: &str,
    fill: &SlotFill,
    entities_by_id: &UuidsById,
    events_by_id: &UuidsById,
) -> Result<Vec<Argument>> {
    let lookup = |ids: &UuidsById, id: &str, kind: &str| {
        ids.get(id)
            .cloned()
            .ok_or_else(|| ConversionError::missing(kind, id))
    };
    match fill {
        SlotFill::Scalar(value) => Ok(vec![Argument::property(role, value.clone())]),
        SlotFill::EntityRefs(ssids) => ssids
            .iter()
            .map(|ssid| -> Result<Argument> {
                Ok(Argument::entity(role, lookup(entities_by_id, ssid, "entidade")?))
            })
            .collect(),
        SlotFill::EventRefs(event_ids) => event_ids
            .iter()
            .map(|id| -> Result<Argument> {
                Ok(Argument::situation(role, lookup(events_by_id, id, "evento")?))
            })
            .collect(),
    }
}
