// src/composite/reconcile.rs

use std::collections::HashSet;

use uuid::Uuid;

/// One entry of a submitted child collection, before diffing.
///
/// `id` is either a durable identifier (an update of a persisted child) or a
/// client temporary identifier (a creation); `position` is the submitted
/// ordering value for collections that carry one.
#[derive(Debug, Clone)]
pub struct Submitted<T> {
    pub id: Option<String>,
    pub position: Option<i32>,
    pub item: T,
}

/// One storage operation produced by the diff. Final positions are assigned
/// here and nowhere else.
#[derive(Debug)]
pub enum Op<T> {
    Delete {
        id: Uuid,
    },
    Update {
        id: Uuid,
        position: i32,
        item: T,
    },
    Create {
        temp_id: Option<String>,
        position: i32,
        item: T,
    },
}

/// Diffs a submitted child collection against the persisted set.
///
/// * Persisted ids missing from the submission are deleted (emitted first).
/// * Submitted entries whose id matches a persisted id are updates.
/// * Everything else is a creation; an id string that is not a persisted
///   durable id is carried along as the temporary id.
///
/// The surviving set is renumbered 0..n-1: entries sort by their submitted
/// position, missing positions go last, and collisions resolve by submission
/// order. Submitted position values are never trusted as final.
pub fn plan<T>(existing: &HashSet<Uuid>, submitted: Vec<Submitted<T>>) -> Vec<Op<T>> {
    let positions: Vec<Option<i32>> = submitted.iter().map(|s| s.position).collect();
    let mut order: Vec<usize> = (0..submitted.len()).collect();
    order.sort_by_key(|&i| (positions[i].unwrap_or(i32::MAX), i));

    let mut rank = vec![0usize; submitted.len()];
    for (final_pos, &i) in order.iter().enumerate() {
        rank[i] = final_pos;
    }

    let kept: HashSet<Uuid> = submitted
        .iter()
        .filter_map(|s| durable_id(s.id.as_deref(), existing))
        .collect();

    let mut ops = Vec::with_capacity(existing.len() + submitted.len());
    for &id in existing {
        if !kept.contains(&id) {
            ops.push(Op::Delete { id });
        }
    }
    for (i, s) in submitted.into_iter().enumerate() {
        let position = rank[i] as i32;
        match durable_id(s.id.as_deref(), existing) {
            Some(id) => ops.push(Op::Update {
                id,
                position,
                item: s.item,
            }),
            None => ops.push(Op::Create {
                temp_id: s.id,
                position,
                item: s.item,
            }),
        }
    }
    ops
}

fn durable_id(id: Option<&str>, existing: &HashSet<Uuid>) -> Option<Uuid> {
    id.and_then(|raw| Uuid::parse_str(raw).ok())
        .filter(|id| existing.contains(id))
}
