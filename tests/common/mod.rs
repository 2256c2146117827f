// tests/common/mod.rs

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use question_forge::error::SaveError;
use question_forge::models::question::{
    CategoryItemRow, CategoryRow, ChoiceRow, ClozeChoiceRow, ClozeRow, QuestionRow,
};
use question_forge::store::{
    CategoryItemWrite, CategoryWrite, ChoiceWrite, ClozeChoiceWrite, ClozeWrite, QuestionStore,
    QuestionWrite, SetStore,
};

/// In-memory `QuestionStore` double. Mimics the Postgres schema closely
/// enough for the engine: cascade deletes for cloze choices and category
/// links, position-ordered listings, storage-assigned uuids.
///
/// `writes` counts every mutating call, so tests can assert that a rejected
/// payload performed zero writes. Mid-save failures are covered by the
/// transaction contract: the caller discards the store state on error, which
/// tests emulate by throwing the mutated copy away.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub sets: Vec<Uuid>,
    pub questions: HashMap<Uuid, QuestionRow>,
    /// Position of each question within its set (the row struct carries no
    /// position column, so the double keeps it alongside).
    pub positions: HashMap<Uuid, i32>,
    /// Solo practice session per set, if one is open.
    pub solo_sessions: HashMap<Uuid, Uuid>,
    pub choices: HashMap<Uuid, ChoiceRow>,
    pub categories: HashMap<Uuid, CategoryRow>,
    pub items: HashMap<Uuid, CategoryItemRow>,
    pub clozes: HashMap<Uuid, ClozeRow>,
    pub cloze_choices: HashMap<Uuid, ClozeChoiceRow>,
    pub writes: usize,
}

impl MemoryStore {
    pub fn with_set(set: Uuid) -> Self {
        Self {
            sets: vec![set],
            ..Default::default()
        }
    }

    fn next_position(&self, set: Uuid) -> i32 {
        self.questions
            .values()
            .filter(|q| q.question_set == set)
            .filter_map(|q| self.positions.get(&q.id).copied())
            .max()
            .map_or(0, |p| p + 1)
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn question_set_exists(&mut self, id: Uuid) -> Result<bool, SaveError> {
        Ok(self.sets.contains(&id))
    }

    async fn fetch_question(&mut self, id: Uuid) -> Result<Option<QuestionRow>, SaveError> {
        Ok(self.questions.get(&id).cloned())
    }

    async fn insert_question_stub(
        &mut self,
        question_set: Uuid,
        kind: &str,
        owner: Option<Uuid>,
    ) -> Result<Uuid, SaveError> {
        self.writes += 1;
        let id = Uuid::new_v4();
        self.positions.insert(id, self.next_position(question_set));
        self.questions.insert(
            id,
            QuestionRow {
                id,
                kind: kind.to_string(),
                title: String::new(),
                content: None,
                raw_content: None,
                explanation: None,
                hotspot_data: None,
                gap_text: None,
                gaps: None,
                is_true_correct: None,
                weight: 1.0,
                image: None,
                audio: None,
                tags: Vec::new(),
                is_archived: false,
                question_set,
                owner,
                copied_from: None,
                created_at: None,
                modified_at: None,
            },
        );
        Ok(id)
    }

    async fn write_question(&mut self, id: Uuid, write: &QuestionWrite) -> Result<(), SaveError> {
        self.writes += 1;
        let old_set = self
            .questions
            .get(&id)
            .map(|row| row.question_set)
            .ok_or_else(|| SaveError::Storage(format!("question '{id}' missing")))?;
        // A question moved to another set is appended to the destination's
        // ordering, matching the Postgres store.
        if old_set != write.question_set {
            let next = self.next_position(write.question_set);
            self.positions.insert(id, next);
        }
        let row = self
            .questions
            .get_mut(&id)
            .ok_or_else(|| SaveError::Storage(format!("question '{id}' missing")))?;
        row.kind = write.kind.clone();
        row.title = write.title.clone();
        row.content = write.content.clone();
        row.raw_content = write.raw_content.clone();
        row.explanation = write.explanation.clone();
        row.hotspot_data = write.hotspot_data.clone();
        row.gap_text = write.gap_text.clone();
        row.gaps = write.gaps.clone();
        row.is_true_correct = write.is_true_correct;
        row.weight = write.weight;
        row.image = write.image.clone();
        row.audio = write.audio.clone();
        row.tags = write.tags.clone();
        row.is_archived = write.is_archived;
        row.question_set = write.question_set;
        row.owner = write.owner;
        row.copied_from = write.copied_from;
        Ok(())
    }

    async fn list_choices(&mut self, question: Uuid) -> Result<Vec<ChoiceRow>, SaveError> {
        let mut rows: Vec<ChoiceRow> = self
            .choices
            .values()
            .filter(|row| row.question_id == question)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.position, row.id));
        Ok(rows)
    }

    async fn insert_choice(
        &mut self,
        question: Uuid,
        write: &ChoiceWrite,
    ) -> Result<Uuid, SaveError> {
        self.writes += 1;
        let id = Uuid::new_v4();
        self.choices.insert(
            id,
            ChoiceRow {
                id,
                question_id: question,
                content: write.content.clone(),
                is_correct: write.is_correct,
                position: write.position,
                image: write.image.clone(),
            },
        );
        Ok(id)
    }

    async fn update_choice(&mut self, id: Uuid, write: &ChoiceWrite) -> Result<(), SaveError> {
        self.writes += 1;
        let row = self
            .choices
            .get_mut(&id)
            .ok_or_else(|| SaveError::Storage(format!("choice '{id}' missing")))?;
        row.content = write.content.clone();
        row.is_correct = write.is_correct;
        row.position = write.position;
        row.image = write.image.clone();
        Ok(())
    }

    async fn delete_choice(&mut self, id: Uuid) -> Result<(), SaveError> {
        self.writes += 1;
        self.choices.remove(&id);
        Ok(())
    }

    async fn list_categories(&mut self, question: Uuid) -> Result<Vec<CategoryRow>, SaveError> {
        let mut rows: Vec<CategoryRow> = self
            .categories
            .values()
            .filter(|row| row.question_id == question)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn insert_category(
        &mut self,
        question: Uuid,
        write: &CategoryWrite,
    ) -> Result<Uuid, SaveError> {
        self.writes += 1;
        let id = Uuid::new_v4();
        self.categories.insert(
            id,
            CategoryRow {
                id,
                question_id: question,
                content: write.content.clone(),
            },
        );
        Ok(id)
    }

    async fn update_category(&mut self, id: Uuid, write: &CategoryWrite) -> Result<(), SaveError> {
        self.writes += 1;
        let row = self
            .categories
            .get_mut(&id)
            .ok_or_else(|| SaveError::Storage(format!("category '{id}' missing")))?;
        row.content = write.content.clone();
        Ok(())
    }

    async fn delete_category(&mut self, id: Uuid) -> Result<(), SaveError> {
        self.writes += 1;
        self.categories.remove(&id);
        // many-to-many links cascade
        for item in self.items.values_mut() {
            item.categories.retain(|c| *c != id);
        }
        Ok(())
    }

    async fn list_items(&mut self, question: Uuid) -> Result<Vec<CategoryItemRow>, SaveError> {
        let mut rows: Vec<CategoryItemRow> = self
            .items
            .values()
            .filter(|row| row.question_id == question)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn insert_item(
        &mut self,
        question: Uuid,
        write: &CategoryItemWrite,
    ) -> Result<Uuid, SaveError> {
        self.writes += 1;
        let id = Uuid::new_v4();
        self.items.insert(
            id,
            CategoryItemRow {
                id,
                question_id: question,
                content: write.content.clone(),
                categories: write.categories.clone(),
            },
        );
        Ok(id)
    }

    async fn update_item(&mut self, id: Uuid, write: &CategoryItemWrite) -> Result<(), SaveError> {
        self.writes += 1;
        let row = self
            .items
            .get_mut(&id)
            .ok_or_else(|| SaveError::Storage(format!("item '{id}' missing")))?;
        row.content = write.content.clone();
        row.categories = write.categories.clone();
        Ok(())
    }

    async fn delete_item(&mut self, id: Uuid) -> Result<(), SaveError> {
        self.writes += 1;
        self.items.remove(&id);
        Ok(())
    }

    async fn list_clozes(&mut self, question: Uuid) -> Result<Vec<ClozeRow>, SaveError> {
        let mut rows: Vec<ClozeRow> = self
            .clozes
            .values()
            .filter(|row| row.question_id == question)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.position, row.id));
        Ok(rows)
    }

    async fn insert_cloze(
        &mut self,
        question: Uuid,
        write: &ClozeWrite,
    ) -> Result<Uuid, SaveError> {
        self.writes += 1;
        let id = Uuid::new_v4();
        self.clozes.insert(
            id,
            ClozeRow {
                id,
                question_id: question,
                position: write.position,
            },
        );
        Ok(id)
    }

    async fn update_cloze(&mut self, id: Uuid, write: &ClozeWrite) -> Result<(), SaveError> {
        self.writes += 1;
        let row = self
            .clozes
            .get_mut(&id)
            .ok_or_else(|| SaveError::Storage(format!("cloze '{id}' missing")))?;
        row.position = write.position;
        Ok(())
    }

    async fn delete_cloze(&mut self, id: Uuid) -> Result<(), SaveError> {
        self.writes += 1;
        self.clozes.remove(&id);
        // choices cascade with their owning cloze
        self.cloze_choices.retain(|_, row| row.cloze_id != id);
        Ok(())
    }

    async fn list_cloze_choices(
        &mut self,
        cloze: Uuid,
    ) -> Result<Vec<ClozeChoiceRow>, SaveError> {
        let mut rows: Vec<ClozeChoiceRow> = self
            .cloze_choices
            .values()
            .filter(|row| row.cloze_id == cloze)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.position, row.id));
        Ok(rows)
    }

    async fn insert_cloze_choice(
        &mut self,
        question: Uuid,
        write: &ClozeChoiceWrite,
    ) -> Result<Uuid, SaveError> {
        self.writes += 1;
        let id = Uuid::new_v4();
        self.cloze_choices.insert(
            id,
            ClozeChoiceRow {
                id,
                cloze_id: write.cloze_id,
                question_id: question,
                content: write.content.clone(),
                is_correct: write.is_correct,
                position: write.position,
            },
        );
        Ok(id)
    }

    async fn update_cloze_choice(
        &mut self,
        id: Uuid,
        write: &ClozeChoiceWrite,
    ) -> Result<(), SaveError> {
        self.writes += 1;
        let row = self
            .cloze_choices
            .get_mut(&id)
            .ok_or_else(|| SaveError::Storage(format!("cloze choice '{id}' missing")))?;
        row.content = write.content.clone();
        row.is_correct = write.is_correct;
        row.position = write.position;
        Ok(())
    }

    async fn delete_cloze_choice(&mut self, id: Uuid) -> Result<(), SaveError> {
        self.writes += 1;
        self.cloze_choices.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SetStore for MemoryStore {
    async fn list_set_question_ids(&mut self, set: Uuid) -> Result<Vec<Uuid>, SaveError> {
        let mut rows: Vec<(i32, Uuid)> = self
            .questions
            .values()
            .filter(|q| q.question_set == set)
            .map(|q| (self.positions.get(&q.id).copied().unwrap_or(0), q.id))
            .collect();
        rows.sort();
        Ok(rows.into_iter().map(|(_, id)| id).collect())
    }

    async fn write_question_position(
        &mut self,
        id: Uuid,
        position: i32,
    ) -> Result<(), SaveError> {
        self.writes += 1;
        self.positions.insert(id, position);
        Ok(())
    }

    async fn clear_solo_session(&mut self, set: Uuid) -> Result<(), SaveError> {
        self.writes += 1;
        self.solo_sessions.remove(&set);
        Ok(())
    }
}
