use crate::types::tables::{Problem, ProblemTag, Solution, Submission, Tag};
use sqlx::{sqlite::Sqlite, Pool, Transaction};

type Result<T> = std::result::Result<T, sqlx::Error>;

/// Row counts of the archive tables.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub problems: i64,
    pub tags: i64,
    pub solutions: i64,
    pub submissions: i64,
}

/// Idempotent writes over the local archive.
///
/// Problems, tags and solutions are upserted so that metadata edits are picked up
/// on every run. Submissions are immutable: callers check `submission_exists`
/// before `insert_submission`.
pub struct Store<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> Store<'a> {
    pub fn new(pool: &'a Pool<Sqlite>) -> Self {
        Store { pool }
    }

    pub async fn problem_exists(&self, id: i64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM problems WHERE id = ?;")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Upserts a problem together with its topic tags in one transaction.
    pub async fn save_problem(&self, problem: &Problem, tags: &[Tag]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        match write_problem(&mut tx, problem, tags).await {
            Ok(_) => {
                tx.commit().await?;
                tracing::info!("Problem {} ({}) was saved.", problem.slug, problem.id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("an error occurred at saving problem {}: {:?}", problem.slug, e);
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    pub async fn save_solution(&self, solution: &Solution) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO solutions (problem_id, url, content)
            VALUES (?, ?, ?)
            ON CONFLICT (problem_id) DO UPDATE SET
                url = excluded.url,
                content = excluded.content;
            "#,
        )
        .bind(solution.problem_id)
        .bind(&solution.url)
        .bind(&solution.content)
        .execute(self.pool)
        .await?;

        tracing::info!("Solution for problem {} was saved.", solution.problem_id);
        Ok(())
    }

    pub async fn submission_exists(&self, id: i64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM submissions WHERE id = ?;")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Inserts a submission. Fails if the id is already stored.
    pub async fn insert_submission(&self, submission: &Submission) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, slug, language, created, source)
            VALUES (?, ?, ?, ?, ?);
            "#,
        )
        .bind(submission.id)
        .bind(&submission.slug)
        .bind(&submission.language)
        .bind(submission.created)
        .bind(&submission.source)
        .execute(self.pool)
        .await?;

        tracing::info!(
            "Submission {} for {} was saved.",
            submission.id,
            submission.slug
        );
        Ok(())
    }

    pub async fn problems(&self) -> Result<Vec<Problem>> {
        sqlx::query_as::<_, Problem>(
            "SELECT id, display_id, title, slug, level, description, accepted FROM problems ORDER BY id;",
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn tags(&self) -> Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT slug, name FROM tags ORDER BY slug;")
            .fetch_all(self.pool)
            .await
    }

    pub async fn problem_tags(&self) -> Result<Vec<ProblemTag>> {
        sqlx::query_as::<_, ProblemTag>(
            "SELECT problem_id, tag_slug FROM problem_tags ORDER BY problem_id, tag_slug;",
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn solutions(&self) -> Result<Vec<Solution>> {
        sqlx::query_as::<_, Solution>(
            "SELECT problem_id, url, content FROM solutions ORDER BY problem_id;",
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn submissions(&self) -> Result<Vec<Submission>> {
        sqlx::query_as::<_, Submission>(
            "SELECT id, slug, language, created, source FROM submissions ORDER BY id;",
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn summary(&self) -> Result<ArchiveSummary> {
        Ok(ArchiveSummary {
            problems: self.count("problems").await?,
            tags: self.count("tags").await?,
            solutions: self.count("solutions").await?,
            submissions: self.count("submissions").await?,
        })
    }

    async fn count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {};", table);
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(self.pool)
            .await
    }
}

async fn write_problem(
    tx: &mut Transaction<'_, Sqlite>,
    problem: &Problem,
    tags: &[Tag],
) -> Result<()> {
    // A slug moved to another id would violate the unique constraint on upsert.
    // The stale id takes its tag links and editorial with it.
    for sql in [
        "DELETE FROM problem_tags WHERE problem_id IN (SELECT id FROM problems WHERE slug = ? AND id <> ?);",
        "DELETE FROM solutions WHERE problem_id IN (SELECT id FROM problems WHERE slug = ? AND id <> ?);",
        "DELETE FROM problems WHERE slug = ? AND id <> ?;",
    ] {
        sqlx::query(sql)
            .bind(&problem.slug)
            .bind(problem.id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO problems (id, display_id, title, slug, level, description, accepted)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            display_id = excluded.display_id,
            title = excluded.title,
            slug = excluded.slug,
            level = excluded.level,
            description = excluded.description,
            accepted = excluded.accepted;
        "#,
    )
    .bind(problem.id)
    .bind(&problem.display_id)
    .bind(&problem.title)
    .bind(&problem.slug)
    .bind(&problem.level)
    .bind(&problem.description)
    .bind(problem.accepted)
    .execute(&mut *tx)
    .await?;

    for tag in tags.iter() {
        sqlx::query(
            r#"
            INSERT INTO tags (slug, name)
            VALUES (?, ?)
            ON CONFLICT (slug) DO UPDATE SET name = excluded.name;
            "#,
        )
        .bind(&tag.slug)
        .bind(&tag.name)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT OR REPLACE INTO problem_tags (problem_id, tag_slug) VALUES (?, ?);")
            .bind(problem.id)
            .bind(&tag.slug)
            .execute(&mut *tx)
            .await?;
    }

    Ok(())
}
