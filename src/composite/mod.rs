// src/composite/mod.rs

pub mod reconcile;
pub mod resolver;
pub mod schema;

use std::collections::HashSet;

use serde_json::Value;
use uuid::Uuid;

use crate::error::SaveError;
use crate::models::question::{
    CategoryItemPayload, ChoicePayload, ClozeNode, ClozePayload, CompositeQuestion,
    QuestionPayload, QuestionRow,
};
use crate::store::{
    CategoryItemWrite, CategoryWrite, ChoiceWrite, ClozeChoiceWrite, ClozeWrite, QuestionStore,
    QuestionWrite, SetStore,
};
use crate::utils::html::clean_html;
use self::reconcile::{Op, Submitted};
use self::resolver::TempRefResolver;
use self::schema::KindData;

/// Saves one question together with its whole child graph.
///
/// * Validates the payload against its kind; no writes happen on failure.
/// * Reconciles child collections in dependency order: categories before the
///   items that reference them, clozes before their choices, then plain
///   choices.
/// * Writes the question's own scalar/JSON state last.
///
/// The caller owns the transaction: every store operation issued here must be
/// committed or discarded as one unit. `inherited_owner` is set when the
/// question is created as a nested child of a question set submission;
/// existing questions keep their owner.
pub async fn save_composite<S: QuestionStore>(
    store: &mut S,
    payload: &QuestionPayload,
    inherited_owner: Option<Uuid>,
) -> Result<Uuid, SaveError> {
    let kind_data = schema::validate(payload).map_err(SaveError::Validation)?;

    let question_set = payload.question_set.ok_or_else(|| {
        SaveError::invalid("question_set", "a question set reference is required")
    })?;
    if !store.question_set_exists(question_set).await? {
        return Err(SaveError::invalid(
            "question_set",
            "question set does not exist",
        ));
    }

    let existing = match payload.id {
        Some(id) => Some(
            store
                .fetch_question(id)
                .await?
                .ok_or_else(|| SaveError::NotFound(format!("question '{id}' not found")))?,
        ),
        None => None,
    };
    let question_id = match &existing {
        Some(row) => row.id,
        None => {
            store
                .insert_question_stub(question_set, payload.kind.as_str(), inherited_owner)
                .await?
        }
    };

    let mut resolver = TempRefResolver::new();

    let live_categories =
        reconcile_categories(store, question_id, payload, &mut resolver).await?;
    reconcile_items(store, question_id, payload, &resolver, &live_categories).await?;
    reconcile_clozes(store, question_id, payload, &mut resolver).await?;
    reconcile_choices(store, question_id, payload).await?;

    let write = question_write(payload, &kind_data, &existing, inherited_owner, question_set)?;
    store.write_question(question_id, &write).await?;

    tracing::debug!(
        question = %question_id,
        kind = payload.kind.as_str(),
        "composite save complete"
    );
    Ok(question_id)
}

/// Reads a question back with its full child graph, children ordered by
/// their persisted positions.
pub async fn load_composite<S: QuestionStore>(
    store: &mut S,
    id: Uuid,
) -> Result<Option<CompositeQuestion>, SaveError> {
    let Some(question) = store.fetch_question(id).await? else {
        return Ok(None);
    };
    let choices = store.list_choices(id).await?;
    let categories = store.list_categories(id).await?;
    let items = store.list_items(id).await?;

    let mut clozes = Vec::new();
    for cloze in store.list_clozes(id).await? {
        clozes.push(ClozeNode {
            id: cloze.id,
            position: cloze.position,
            choices: store.list_cloze_choices(cloze.id).await?,
        });
    }

    Ok(Some(CompositeQuestion {
        question,
        choices,
        categories,
        items,
        clozes,
    }))
}

/// Persists a new ordering of a set's questions.
///
/// * The submission must list every question of the set exactly once;
///   duplicates, strangers, and omissions are all conflicts.
/// * A solo practice session records the old ordering, so the set's session
///   link is cleared together with the position writes.
pub async fn reorder_set<S: QuestionStore + SetStore>(
    store: &mut S,
    set: Uuid,
    submitted: &[Uuid],
) -> Result<(), SaveError> {
    if !store.question_set_exists(set).await? {
        return Err(SaveError::NotFound(format!(
            "question set '{set}' not found"
        )));
    }

    let persisted: HashSet<Uuid> = store.list_set_question_ids(set).await?.into_iter().collect();
    let unique: HashSet<Uuid> = submitted.iter().copied().collect();
    if unique.len() != submitted.len() || unique != persisted {
        return Err(SaveError::Conflict(
            "reorder must list every question of the set exactly once".to_string(),
        ));
    }

    for (position, id) in submitted.iter().enumerate() {
        store.write_question_position(*id, position as i32).await?;
    }
    store.clear_solo_session(set).await?;
    Ok(())
}

/// Reconciles the category collection and registers the ids of newly created
/// categories with the resolver. Returns the ids that survive the save, which
/// is what category items are allowed to reference.
async fn reconcile_categories<S: QuestionStore>(
    store: &mut S,
    question_id: Uuid,
    payload: &QuestionPayload,
    resolver: &mut TempRefResolver,
) -> Result<HashSet<Uuid>, SaveError> {
    let existing: HashSet<Uuid> = store
        .list_categories(question_id)
        .await?
        .iter()
        .map(|row| row.id)
        .collect();
    let Some(categories) = &payload.categories else {
        return Ok(existing);
    };

    let submitted = categories
        .iter()
        .map(|c| Submitted {
            id: c.id.clone(),
            position: None,
            item: c.content.clone(),
        })
        .collect();

    let mut live = HashSet::new();
    for op in reconcile::plan(&existing, submitted) {
        match op {
            Op::Delete { id } => store.delete_category(id).await?,
            Op::Update { id, item, .. } => {
                store
                    .update_category(id, &CategoryWrite { content: item })
                    .await?;
                live.insert(id);
            }
            Op::Create { temp_id, item, .. } => {
                let id = store
                    .insert_category(question_id, &CategoryWrite { content: item })
                    .await?;
                if let Some(temp) = temp_id {
                    resolver.register("categories", &temp, id)?;
                }
                live.insert(id);
            }
        }
    }
    Ok(live)
}

/// Reconciles category items. Every category reference must name a category
/// that survives this save, either by durable id or through the resolver;
/// all references are resolved before the first item write is issued.
async fn reconcile_items<S: QuestionStore>(
    store: &mut S,
    question_id: Uuid,
    payload: &QuestionPayload,
    resolver: &TempRefResolver,
    live_categories: &HashSet<Uuid>,
) -> Result<(), SaveError> {
    let Some(items) = &payload.items else {
        return Ok(());
    };

    let mut submitted = Vec::with_capacity(items.len());
    for item in items {
        submitted.push(Submitted {
            id: item.id.clone(),
            position: None,
            item: resolve_item(item, resolver, live_categories)?,
        });
    }

    let existing: HashSet<Uuid> = store
        .list_items(question_id)
        .await?
        .iter()
        .map(|row| row.id)
        .collect();
    for op in reconcile::plan(&existing, submitted) {
        match op {
            Op::Delete { id } => store.delete_item(id).await?,
            Op::Update { id, item, .. } => store.update_item(id, &item).await?,
            Op::Create { item, .. } => {
                store.insert_item(question_id, &item).await?;
            }
        }
    }
    Ok(())
}

fn resolve_item(
    item: &CategoryItemPayload,
    resolver: &TempRefResolver,
    live_categories: &HashSet<Uuid>,
) -> Result<CategoryItemWrite, SaveError> {
    let mut categories = Vec::with_capacity(item.categories.len());
    for reference in &item.categories {
        let id = match Uuid::parse_str(reference)
            .ok()
            .filter(|id| live_categories.contains(id))
        {
            Some(id) => id,
            None => resolver.resolve("items", reference)?,
        };
        if !categories.contains(&id) {
            categories.push(id);
        }
    }
    Ok(CategoryItemWrite {
        content: item.content.clone(),
        categories,
    })
}

/// Reconciles clozes, then each cloze's choices. Clozes are ordered by
/// submission; a cloze choice finds its owner either through the persisted
/// durable id or through the resolver registration made moments earlier.
async fn reconcile_clozes<S: QuestionStore>(
    store: &mut S,
    question_id: Uuid,
    payload: &QuestionPayload,
    resolver: &mut TempRefResolver,
) -> Result<(), SaveError> {
    let Some(clozes) = &payload.clozes else {
        return Ok(());
    };

    let existing: HashSet<Uuid> = store
        .list_clozes(question_id)
        .await?
        .iter()
        .map(|row| row.id)
        .collect();

    let submitted = clozes
        .iter()
        .map(|c| Submitted {
            id: c.id.clone(),
            position: None,
            item: (),
        })
        .collect();

    // Update/create ops come back in submission order, so `assigned` lines up
    // with the payload's cloze list.
    let mut assigned = Vec::with_capacity(clozes.len());
    for op in reconcile::plan(&existing, submitted) {
        match op {
            Op::Delete { id } => store.delete_cloze(id).await?,
            Op::Update { id, position, .. } => {
                store.update_cloze(id, &ClozeWrite { position }).await?;
                assigned.push(id);
            }
            Op::Create {
                temp_id, position, ..
            } => {
                let id = store
                    .insert_cloze(question_id, &ClozeWrite { position })
                    .await?;
                if let Some(temp) = temp_id {
                    resolver.register("clozes", &temp, id)?;
                }
                assigned.push(id);
            }
        }
    }

    for (cloze, assigned_id) in clozes.iter().zip(assigned) {
        let owning = match cloze.id.as_deref() {
            Some(raw) => match Uuid::parse_str(raw).ok().filter(|id| existing.contains(id)) {
                Some(id) => id,
                None => resolver.resolve("clozes", raw)?,
            },
            None => assigned_id,
        };
        reconcile_cloze_choices(store, question_id, owning, cloze).await?;
    }
    Ok(())
}

async fn reconcile_cloze_choices<S: QuestionStore>(
    store: &mut S,
    question_id: Uuid,
    cloze_id: Uuid,
    cloze: &ClozePayload,
) -> Result<(), SaveError> {
    let existing: HashSet<Uuid> = store
        .list_cloze_choices(cloze_id)
        .await?
        .iter()
        .map(|row| row.id)
        .collect();

    let submitted = cloze
        .choices
        .iter()
        .map(|choice| Submitted {
            id: choice.id.clone(),
            position: choice.order,
            item: choice.clone(),
        })
        .collect();

    for op in reconcile::plan(&existing, submitted) {
        match op {
            Op::Delete { id } => store.delete_cloze_choice(id).await?,
            Op::Update { id, position, item } => {
                store
                    .update_cloze_choice(id, &cloze_choice_write(cloze_id, &item, position))
                    .await?;
            }
            Op::Create { position, item, .. } => {
                store
                    .insert_cloze_choice(question_id, &cloze_choice_write(cloze_id, &item, position))
                    .await?;
            }
        }
    }
    Ok(())
}

fn cloze_choice_write(
    cloze_id: Uuid,
    choice: &crate::models::question::ClozeChoicePayload,
    position: i32,
) -> ClozeChoiceWrite {
    ClozeChoiceWrite {
        cloze_id,
        content: clean_html(&choice.content),
        is_correct: choice.is_correct,
        position,
    }
}

/// Reconciles the plain choice collection. Choices reference nothing else,
/// so they run last among the children.
async fn reconcile_choices<S: QuestionStore>(
    store: &mut S,
    question_id: Uuid,
    payload: &QuestionPayload,
) -> Result<(), SaveError> {
    let Some(choices) = &payload.choices else {
        return Ok(());
    };

    let existing: HashSet<Uuid> = store
        .list_choices(question_id)
        .await?
        .iter()
        .map(|row| row.id)
        .collect();

    let submitted = choices
        .iter()
        .map(|choice| Submitted {
            id: choice.id.clone(),
            position: choice.order,
            item: choice.clone(),
        })
        .collect();

    for op in reconcile::plan(&existing, submitted) {
        match op {
            Op::Delete { id } => store.delete_choice(id).await?,
            Op::Update { id, position, item } => {
                store
                    .update_choice(id, &choice_write(&item, position))
                    .await?;
            }
            Op::Create { position, item, .. } => {
                store
                    .insert_choice(question_id, &choice_write(&item, position))
                    .await?;
            }
        }
    }
    Ok(())
}

fn choice_write(choice: &ChoicePayload, position: i32) -> ChoiceWrite {
    ChoiceWrite {
        content: choice.content.clone(),
        is_correct: choice.is_correct,
        position,
        image: choice.image.clone(),
    }
}

/// Assembles the final scalar state of the question. Kind-specific columns
/// are filled from the validated `KindData`, so a kind change on update also
/// clears the sub-structure of the previous kind.
fn question_write(
    payload: &QuestionPayload,
    kind_data: &KindData,
    existing: &Option<QuestionRow>,
    inherited_owner: Option<Uuid>,
    question_set: Uuid,
) -> Result<QuestionWrite, SaveError> {
    let (hotspot_data, gap_text, gaps, is_true_correct) = match kind_data {
        KindData::Hotspot(data) => (Some(serde_json::to_value(data)?), None, None, None),
        KindData::Gap { text, gaps } => (
            None,
            Some(clean_html(text)),
            Some(Value::Array(gaps.clone())),
            None,
        ),
        KindData::Boolean { is_true_correct } => (None, None, None, Some(*is_true_correct)),
        _ => (None, None, None, None),
    };

    let owner = match existing {
        Some(row) => row.owner,
        None => inherited_owner,
    };

    Ok(QuestionWrite {
        kind: payload.kind.as_str().to_string(),
        title: payload.title.clone(),
        content: payload.content.clone(),
        raw_content: payload.raw_content.as_deref().map(clean_html),
        explanation: payload.explanation.clone(),
        hotspot_data,
        gap_text,
        gaps,
        is_true_correct,
        weight: payload.weight.unwrap_or(1.0),
        image: payload.image.clone(),
        audio: payload.audio.clone(),
        tags: payload.tags.clone().unwrap_or_default(),
        // An omitted flag keeps the persisted archived state; a routine edit
        // must never un-archive a question.
        is_archived: payload
            .is_archived
            .unwrap_or_else(|| existing.as_ref().is_some_and(|row| row.is_archived)),
        question_set,
        owner,
        copied_from: payload
            .copied_from
            .or_else(|| existing.as_ref().and_then(|row| row.copied_from)),
    })
}
