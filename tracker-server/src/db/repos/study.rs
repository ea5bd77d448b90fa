//! Study repository: coding problems and system design cases.
//!
//! Both kinds share the spaced-repetition columns (`srs_bucket`,
//! `next_review_at`, `last_reviewed_at`, `review_count`) and are reviewed
//! through the same code path.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracker_core::study::schedule_review;
use tracker_core::{Difficulty, ReviewOutcome};
use uuid::Uuid;

use super::{delete_owned, paginate, DbError};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Problem {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub difficulty: Difficulty,
    pub topic: Option<String>,
    pub notes: Option<String>,
    pub srs_bucket: i16,
    pub next_review_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProblemInput {
    pub title: String,
    pub url: Option<String>,
    pub difficulty: Difficulty,
    pub topic: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesignCase {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub title: String,
    pub prompt: Option<String>,
    pub difficulty: Difficulty,
    pub notes: Option<String>,
    pub srs_bucket: i16,
    pub next_review_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DesignCaseInput {
    pub title: String,
    pub prompt: Option<String>,
    pub difficulty: Difficulty,
    pub notes: Option<String>,
}

/// Table and display name for one kind of study item.
#[derive(Debug, Clone, Copy)]
struct Deck {
    table: &'static str,
    resource: &'static str,
}

const PROBLEMS: Deck = Deck {
    table: "problems",
    resource: "problem",
};

const DESIGN_CASES: Deck = Deck {
    table: "system_design_cases",
    resource: "system design case",
};

pub struct StudyRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> StudyRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // ---- problems ----

    pub async fn list_problems(&self, user_id: Uuid, page: Pagination) -> Result<Paginated<Problem>, DbError> {
        self.list(PROBLEMS, user_id, page).await
    }

    pub async fn due_problems(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Problem>, DbError> {
        self.due(PROBLEMS, user_id, now).await
    }

    pub async fn get_problem(&self, user_id: Uuid, id: Uuid) -> Result<Problem, DbError> {
        self.get(PROBLEMS, user_id, id).await
    }

    /// New problems start in bucket 0 with no review date, so they are due
    /// immediately.
    pub async fn create_problem(&self, user_id: Uuid, input: ProblemInput) -> Result<Problem, DbError> {
        let problem = sqlx::query_as::<_, Problem>(
            r#"
            INSERT INTO problems (user_id, title, url, difficulty, topic, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.url)
        .bind(input.difficulty)
        .bind(&input.topic)
        .bind(&input.notes)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(problem_id = %problem.id, "problem created");
        Ok(problem)
    }

    /// Edits content only; scheduling fields change through reviews.
    pub async fn update_problem(&self, user_id: Uuid, id: Uuid, input: ProblemInput) -> Result<Problem, DbError> {
        sqlx::query_as::<_, Problem>(
            r#"
            UPDATE problems SET
                title = $3, url = $4, difficulty = $5, topic = $6, notes = $7,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.url)
        .bind(input.difficulty)
        .bind(&input.topic)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(PROBLEMS.resource, id))
    }

    pub async fn review_problem(
        &self,
        user_id: Uuid,
        id: Uuid,
        outcome: ReviewOutcome,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Problem, DbError> {
        self.review(PROBLEMS, user_id, id, outcome, reviewed_at).await
    }

    pub async fn delete_problem(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, PROBLEMS.table, PROBLEMS.resource, user_id, id).await
    }

    // ---- system design cases ----

    pub async fn list_design_cases(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<DesignCase>, DbError> {
        self.list(DESIGN_CASES, user_id, page).await
    }

    pub async fn due_design_cases(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<DesignCase>, DbError> {
        self.due(DESIGN_CASES, user_id, now).await
    }

    pub async fn get_design_case(&self, user_id: Uuid, id: Uuid) -> Result<DesignCase, DbError> {
        self.get(DESIGN_CASES, user_id, id).await
    }

    pub async fn create_design_case(
        &self,
        user_id: Uuid,
        input: DesignCaseInput,
    ) -> Result<DesignCase, DbError> {
        let case = sqlx::query_as::<_, DesignCase>(
            r#"
            INSERT INTO system_design_cases (user_id, title, prompt, difficulty, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.prompt)
        .bind(input.difficulty)
        .bind(&input.notes)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(case_id = %case.id, "system design case created");
        Ok(case)
    }

    pub async fn update_design_case(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: DesignCaseInput,
    ) -> Result<DesignCase, DbError> {
        sqlx::query_as::<_, DesignCase>(
            r#"
            UPDATE system_design_cases SET
                title = $3, prompt = $4, difficulty = $5, notes = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.prompt)
        .bind(input.difficulty)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(DESIGN_CASES.resource, id))
    }

    pub async fn review_design_case(
        &self,
        user_id: Uuid,
        id: Uuid,
        outcome: ReviewOutcome,
        reviewed_at: DateTime<Utc>,
    ) -> Result<DesignCase, DbError> {
        self.review(DESIGN_CASES, user_id, id, outcome, reviewed_at).await
    }

    pub async fn delete_design_case(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        delete_owned(self.pool, DESIGN_CASES.table, DESIGN_CASES.resource, user_id, id).await
    }

    // ---- shared ----

    async fn list<T>(&self, deck: Deck, user_id: Uuid, page: Pagination) -> Result<Paginated<T>, DbError>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        let sql = format!(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM {}
            WHERE user_id = $1
            ORDER BY next_review_at ASC NULLS FIRST, title
            LIMIT $2 OFFSET $3
            "#,
            deck.table
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        paginate(rows, page)
    }

    /// Never-reviewed items and items whose review date has passed.
    async fn due<T>(&self, deck: Deck, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<T>, DbError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            r#"
            SELECT * FROM {}
            WHERE user_id = $1 AND (next_review_at IS NULL OR next_review_at <= $2)
            ORDER BY next_review_at ASC NULLS FIRST, srs_bucket, title
            "#,
            deck.table
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(user_id)
            .bind(now)
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    async fn get<T>(&self, deck: Deck, user_id: Uuid, id: Uuid) -> Result<T, DbError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!("SELECT * FROM {} WHERE id = $1 AND user_id = $2", deck.table);
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(deck.resource, id))
    }

    /// Lock the row, compute the next bucket from the stored one and write
    /// the new schedule in the same transaction.
    async fn review<T>(
        &self,
        deck: Deck,
        user_id: Uuid,
        id: Uuid,
        outcome: ReviewOutcome,
        reviewed_at: DateTime<Utc>,
    ) -> Result<T, DbError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT srs_bucket FROM {} WHERE id = $1 AND user_id = $2 FOR UPDATE",
            deck.table
        );
        let bucket: i16 = sqlx::query_scalar(&select)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found(deck.resource, id))?;

        let schedule = schedule_review(bucket, outcome, reviewed_at);

        let update = format!(
            r#"
            UPDATE {} SET
                srs_bucket = $2,
                next_review_at = $3,
                last_reviewed_at = $4,
                review_count = review_count + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
            deck.table
        );
        let row = sqlx::query_as::<_, T>(&update)
            .bind(id)
            .bind(schedule.srs_bucket)
            .bind(schedule.next_review_at)
            .bind(reviewed_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            table = deck.table,
            item_id = %id,
            outcome = %outcome,
            bucket = schedule.srs_bucket,
            "study item reviewed"
        );
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};
    use chrono::Duration;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn review_moves_problem_out_of_due_list() {
        let pool = pool().await;
        let repo = StudyRepo::new(&pool);
        let user = Uuid::new_v4();
        let now = Utc::now();

        let problem = repo
            .create_problem(
                user,
                ProblemInput {
                    title: "Two Sum".into(),
                    url: None,
                    difficulty: Difficulty::Easy,
                    topic: Some("arrays".into()),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(repo.due_problems(user, now).await.unwrap().len(), 1);

        let reviewed = repo
            .review_problem(user, problem.id, ReviewOutcome::Good, now)
            .await
            .unwrap();
        assert_eq!(reviewed.srs_bucket, 1);
        assert_eq!(reviewed.review_count, 1);
        assert!(repo.due_problems(user, now).await.unwrap().is_empty());
        assert_eq!(
            repo.due_problems(user, now + Duration::days(3)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn again_resets_design_case() {
        let pool = pool().await;
        let repo = StudyRepo::new(&pool);
        let user = Uuid::new_v4();
        let now = Utc::now();

        let case = repo
            .create_design_case(
                user,
                DesignCaseInput {
                    title: "URL shortener".into(),
                    prompt: None,
                    difficulty: Difficulty::Medium,
                    notes: None,
                },
            )
            .await
            .unwrap();

        repo.review_design_case(user, case.id, ReviewOutcome::Easy, now).await.unwrap();
        let reset = repo
            .review_design_case(user, case.id, ReviewOutcome::Again, now)
            .await
            .unwrap();
        assert_eq!(reset.srs_bucket, 0);
        assert_eq!(reset.review_count, 2);
    }
}
