// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::SaveError;
use crate::models::question::{
    CategoryItemRow, CategoryRow, ChoiceRow, ClozeChoiceRow, ClozeRow, QuestionRow,
};

use super::{
    CategoryItemWrite, CategoryWrite, ChoiceWrite, ClozeChoiceWrite, ClozeWrite, QuestionStore,
    QuestionWrite, SetStore,
};

/// `QuestionStore` backed by one open Postgres transaction. The handler that
/// opened the transaction commits it after a successful save; dropping it
/// uncommitted rolls every write back.
pub struct PgStore<'a> {
    tx: &'a mut Transaction<'static, Postgres>,
}

impl<'a> PgStore<'a> {
    pub fn new(tx: &'a mut Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl QuestionStore for PgStore<'_> {
    async fn question_set_exists(&mut self, id: Uuid) -> Result<bool, SaveError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM question_sets WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut **self.tx)
                .await?;
        Ok(exists)
    }

    async fn fetch_question(&mut self, id: Uuid) -> Result<Option<QuestionRow>, SaveError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, kind, title, content, raw_content, explanation, hotspot_data,
                   gap_text, gaps, is_true_correct, weight, image, audio, tags,
                   is_archived, question_set, owner, copied_from, created_at, modified_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **self.tx)
        .await?;
        Ok(row)
    }

    async fn insert_question_stub(
        &mut self,
        question_set: Uuid,
        kind: &str,
        owner: Option<Uuid>,
    ) -> Result<Uuid, SaveError> {
        let id = Uuid::new_v4();
        // New questions are appended to the end of the set's ordering.
        sqlx::query(
            r#"
            INSERT INTO questions (id, question_set, kind, title, weight, tags, is_archived, owner, position)
            VALUES ($1, $2, $3, '', 1.0, $4, FALSE, $5,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM questions WHERE question_set = $2))
            "#,
        )
        .bind(id)
        .bind(question_set)
        .bind(kind)
        .bind(Vec::<String>::new())
        .bind(owner)
        .execute(&mut **self.tx)
        .await?;
        Ok(id)
    }

    async fn write_question(&mut self, id: Uuid, write: &QuestionWrite) -> Result<(), SaveError> {
        // A question moved to another set is appended to the destination's
        // ordering; within the same set the position is untouched.
        sqlx::query(
            r#"
            UPDATE questions
            SET kind = $1, title = $2, content = $3, raw_content = $4, explanation = $5,
                hotspot_data = $6, gap_text = $7, gaps = $8, is_true_correct = $9,
                weight = $10, image = $11, audio = $12, tags = $13, is_archived = $14,
                question_set = $15, owner = $16, copied_from = $17,
                position = CASE WHEN question_set = $15 THEN position
                           ELSE (SELECT COALESCE(MAX(q2.position) + 1, 0)
                                 FROM questions q2 WHERE q2.question_set = $15) END,
                modified_at = NOW()
            WHERE id = $18
            "#,
        )
        .bind(&write.kind)
        .bind(&write.title)
        .bind(&write.content)
        .bind(&write.raw_content)
        .bind(&write.explanation)
        .bind(&write.hotspot_data)
        .bind(&write.gap_text)
        .bind(&write.gaps)
        .bind(write.is_true_correct)
        .bind(write.weight)
        .bind(&write.image)
        .bind(&write.audio)
        .bind(&write.tags)
        .bind(write.is_archived)
        .bind(write.question_set)
        .bind(write.owner)
        .bind(write.copied_from)
        .bind(id)
        .execute(&mut **self.tx)
        .await?;
        Ok(())
    }

    async fn list_choices(&mut self, question: Uuid) -> Result<Vec<ChoiceRow>, SaveError> {
        let rows = sqlx::query_as::<_, ChoiceRow>(
            "SELECT id, question_id, content, is_correct, position, image
             FROM choices WHERE question_id = $1 ORDER BY position ASC",
        )
        .bind(question)
        .fetch_all(&mut **self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_choice(
        &mut self,
        question: Uuid,
        write: &ChoiceWrite,
    ) -> Result<Uuid, SaveError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO choices (id, question_id, content, is_correct, position, image)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(question)
        .bind(&write.content)
        .bind(write.is_correct)
        .bind(write.position)
        .bind(&write.image)
        .execute(&mut **self.tx)
        .await?;
        Ok(id)
    }

    async fn update_choice(&mut self, id: Uuid, write: &ChoiceWrite) -> Result<(), SaveError> {
        sqlx::query(
            "UPDATE choices SET content = $1, is_correct = $2, position = $3, image = $4
             WHERE id = $5",
        )
        .bind(&write.content)
        .bind(write.is_correct)
        .bind(write.position)
        .bind(&write.image)
        .bind(id)
        .execute(&mut **self.tx)
        .await?;
        Ok(())
    }

    async fn delete_choice(&mut self, id: Uuid) -> Result<(), SaveError> {
        sqlx::query("DELETE FROM choices WHERE id = $1")
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }

    async fn list_categories(&mut self, question: Uuid) -> Result<Vec<CategoryRow>, SaveError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, question_id, content FROM categories WHERE question_id = $1 ORDER BY id",
        )
        .bind(question)
        .fetch_all(&mut **self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_category(
        &mut self,
        question: Uuid,
        write: &CategoryWrite,
    ) -> Result<Uuid, SaveError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO categories (id, question_id, content) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(question)
            .bind(&write.content)
            .execute(&mut **self.tx)
            .await?;
        Ok(id)
    }

    async fn update_category(&mut self, id: Uuid, write: &CategoryWrite) -> Result<(), SaveError> {
        sqlx::query("UPDATE categories SET content = $1 WHERE id = $2")
            .bind(&write.content)
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }

    async fn delete_category(&mut self, id: Uuid) -> Result<(), SaveError> {
        // item_categories rows referencing this category go with it (FK cascade).
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }

    async fn list_items(&mut self, question: Uuid) -> Result<Vec<CategoryItemRow>, SaveError> {
        let rows = sqlx::query_as::<_, CategoryItemRow>(
            r#"
            SELECT i.id, i.question_id, i.content,
                   COALESCE(ARRAY_AGG(ic.category_id) FILTER (WHERE ic.category_id IS NOT NULL),
                            '{}'::uuid[]) AS categories
            FROM category_items i
            LEFT JOIN item_categories ic ON ic.item_id = i.id
            WHERE i.question_id = $1
            GROUP BY i.id, i.question_id, i.content
            ORDER BY i.id
            "#,
        )
        .bind(question)
        .fetch_all(&mut **self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_item(
        &mut self,
        question: Uuid,
        write: &CategoryItemWrite,
    ) -> Result<Uuid, SaveError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO category_items (id, question_id, content) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(question)
            .bind(&write.content)
            .execute(&mut **self.tx)
            .await?;
        self.replace_item_links(id, &write.categories).await?;
        Ok(id)
    }

    async fn update_item(&mut self, id: Uuid, write: &CategoryItemWrite) -> Result<(), SaveError> {
        sqlx::query("UPDATE category_items SET content = $1 WHERE id = $2")
            .bind(&write.content)
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        self.replace_item_links(id, &write.categories).await?;
        Ok(())
    }

    async fn delete_item(&mut self, id: Uuid) -> Result<(), SaveError> {
        sqlx::query("DELETE FROM category_items WHERE id = $1")
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }

    async fn list_clozes(&mut self, question: Uuid) -> Result<Vec<ClozeRow>, SaveError> {
        let rows = sqlx::query_as::<_, ClozeRow>(
            "SELECT id, question_id, position FROM clozes WHERE question_id = $1
             ORDER BY position ASC",
        )
        .bind(question)
        .fetch_all(&mut **self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_cloze(
        &mut self,
        question: Uuid,
        write: &ClozeWrite,
    ) -> Result<Uuid, SaveError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO clozes (id, question_id, position) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(question)
            .bind(write.position)
            .execute(&mut **self.tx)
            .await?;
        Ok(id)
    }

    async fn update_cloze(&mut self, id: Uuid, write: &ClozeWrite) -> Result<(), SaveError> {
        sqlx::query("UPDATE clozes SET position = $1 WHERE id = $2")
            .bind(write.position)
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }

    async fn delete_cloze(&mut self, id: Uuid) -> Result<(), SaveError> {
        // cloze_choices cascade with their owning cloze.
        sqlx::query("DELETE FROM clozes WHERE id = $1")
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }

    async fn list_cloze_choices(
        &mut self,
        cloze: Uuid,
    ) -> Result<Vec<ClozeChoiceRow>, SaveError> {
        let rows = sqlx::query_as::<_, ClozeChoiceRow>(
            "SELECT id, cloze_id, question_id, content, is_correct, position
             FROM cloze_choices WHERE cloze_id = $1 ORDER BY position ASC",
        )
        .bind(cloze)
        .fetch_all(&mut **self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_cloze_choice(
        &mut self,
        question: Uuid,
        write: &ClozeChoiceWrite,
    ) -> Result<Uuid, SaveError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO cloze_choices (id, cloze_id, question_id, content, is_correct, position)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(write.cloze_id)
        .bind(question)
        .bind(&write.content)
        .bind(write.is_correct)
        .bind(write.position)
        .execute(&mut **self.tx)
        .await?;
        Ok(id)
    }

    async fn update_cloze_choice(
        &mut self,
        id: Uuid,
        write: &ClozeChoiceWrite,
    ) -> Result<(), SaveError> {
        sqlx::query(
            "UPDATE cloze_choices SET content = $1, is_correct = $2, position = $3
             WHERE id = $4",
        )
        .bind(&write.content)
        .bind(write.is_correct)
        .bind(write.position)
        .bind(id)
        .execute(&mut **self.tx)
        .await?;
        Ok(())
    }

    async fn delete_cloze_choice(&mut self, id: Uuid) -> Result<(), SaveError> {
        sqlx::query("DELETE FROM cloze_choices WHERE id = $1")
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SetStore for PgStore<'_> {
    async fn list_set_question_ids(&mut self, set: Uuid) -> Result<Vec<Uuid>, SaveError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM questions WHERE question_set = $1 ORDER BY position ASC, id",
        )
        .bind(set)
        .fetch_all(&mut **self.tx)
        .await?;
        Ok(ids)
    }

    async fn write_question_position(
        &mut self,
        id: Uuid,
        position: i32,
    ) -> Result<(), SaveError> {
        sqlx::query("UPDATE questions SET position = $1 WHERE id = $2")
            .bind(position)
            .bind(id)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }

    async fn clear_solo_session(&mut self, set: Uuid) -> Result<(), SaveError> {
        sqlx::query("UPDATE question_sets SET solo_session_id = NULL WHERE id = $1")
            .bind(set)
            .execute(&mut **self.tx)
            .await?;
        Ok(())
    }
}

impl PgStore<'_> {
    /// Replaces the many-to-many links of one category item.
    async fn replace_item_links(
        &mut self,
        item: Uuid,
        categories: &[Uuid],
    ) -> Result<(), SaveError> {
        sqlx::query("DELETE FROM item_categories WHERE item_id = $1")
            .bind(item)
            .execute(&mut **self.tx)
            .await?;
        for category in categories {
            sqlx::query("INSERT INTO item_categories (item_id, category_id) VALUES ($1, $2)")
                .bind(item)
                .bind(category)
                .execute(&mut **self.tx)
                .await?;
        }
        Ok(())
    }
}
