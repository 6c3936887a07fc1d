use crate::{
    modules::{extractor::CodeExtractor, store::Store, throttle::Throttle},
    types::tables::{Problem, Solution, Submission, Tag},
};
use async_trait::async_trait;
use leetcode_archive_libs::{
    leetcode::model::SubmissionDigest, ApiError, ProblemDataProvider, SubmissionPage,
};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Error)]
pub enum PageError {
    #[error("page {url} was not ready within {seconds} seconds")]
    Timeout { url: String, seconds: u64 },
    #[error("failed to navigate to {url}: {message}")]
    Navigation { url: String, message: String },
}

/// Renders submission detail pages, whose code is only present in server-rendered markup.
#[async_trait]
pub trait SubmissionPageSource: Send + Sync {
    async fn submission_page(&self, url: &str) -> Result<String, PageError>;
}

/// Failures that stop the whole crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("remote query failed: {0}")]
    Api(#[from] ApiError),
    #[error("storage failed: {0}")]
    Store(#[from] sqlx::Error),
    #[error("browser failed: {0}")]
    Browser(#[from] PageError),
    #[error("aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rows were written.
    Saved,
    /// Nothing to write for this item.
    Unchanged,
    /// The item failed in a way that does not affect the next one.
    Skipped(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub catalog_failed: bool,
    pub accepted: usize,
    pub new_problems: usize,
    pub solutions: usize,
    pub submissions: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub site_url: Url,
    /// Abort on the first skipped item instead of moving on.
    pub strict: bool,
    pub submission_page: SubmissionPage,
    /// Follow `hasNext` beyond the first submission page.
    pub all_submission_pages: bool,
}

impl CrawlOptions {
    pub fn new(site_url: Url) -> Self {
        CrawlOptions {
            site_url,
            strict: false,
            submission_page: SubmissionPage::default(),
            all_submission_pages: false,
        }
    }
}

/// Incremental crawl of the current user's accepted problems into the local store.
pub struct Crawler<'a> {
    provider: &'a dyn ProblemDataProvider,
    pages: &'a dyn SubmissionPageSource,
    extractor: &'a dyn CodeExtractor,
    store: Store<'a>,
    throttle: Throttle,
    options: CrawlOptions,
}

impl<'a> Crawler<'a> {
    pub fn new(
        provider: &'a dyn ProblemDataProvider,
        pages: &'a dyn SubmissionPageSource,
        extractor: &'a dyn CodeExtractor,
        store: Store<'a>,
        throttle: Throttle,
        options: CrawlOptions,
    ) -> Self {
        Crawler {
            provider,
            pages,
            extractor,
            store,
            throttle,
            options,
        }
    }

    /// Walks the accepted problems of the catalog.
    ///
    /// Problems without a stored row get their detail and editorial fetched;
    /// every accepted problem gets its submissions checked. A catalog that
    /// cannot be fetched ends the run without error and without writes.
    pub async fn run(&self) -> Result<CrawlReport, CrawlError> {
        let mut report = CrawlReport::default();

        tracing::info!("Start to fetch the problem catalog.");
        let catalog = match self.provider.problem_statuses().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("failed to fetch the problem catalog: {}", e);
                report.catalog_failed = true;
                return Ok(report);
            }
        };
        tracing::info!(
            "{} problems in the catalog.",
            catalog.stat_status_pairs.len()
        );

        for stat in catalog.accepted() {
            report.accepted += 1;
            let slug = stat.title_slug.as_str();

            if !self.store.problem_exists(stat.question_id).await? {
                report.new_problems += 1;
                tracing::info!("Fetching problem: {} (ID: {})", slug, stat.question_id);

                let outcome = self.fetch_problem(slug).await?;
                self.settle(outcome, &mut report)?;

                let outcome = self.fetch_solution(slug).await?;
                if self.settle(outcome, &mut report)? {
                    report.solutions += 1;
                }
            }

            self.fetch_submissions(slug, &mut report).await?;
        }

        tracing::info!("Updated {} problems", report.new_problems);
        Ok(report)
    }

    /// Upserts the problem and its topic tags.
    pub async fn fetch_problem(&self, slug: &str) -> Result<Outcome, CrawlError> {
        tracing::info!("Fetching problem: {}...", slug);
        self.throttle.wait().await;

        let question = match self.provider.question_detail(slug).await {
            Ok(question) => question,
            Err(e) => return recover(e, format!("problem {}", slug)),
        };

        let problem = Problem::from_question(&question, slug, true);
        let tags: Vec<Tag> = question.topic_tags.iter().map(Tag::from).collect();
        self.store.save_problem(&problem, &tags).await?;

        Ok(Outcome::Saved)
    }

    /// Upserts the editorial, unless it is missing or paid-only.
    pub async fn fetch_solution(&self, slug: &str) -> Result<Outcome, CrawlError> {
        tracing::info!("Fetching solution for: {}", slug);
        self.throttle.wait().await;

        let note = match self.provider.question_note(slug).await {
            Ok(note) => note,
            Err(e) => return recover(e, format!("solution of {}", slug)),
        };

        let solution = match note.readable_solution() {
            Some(solution) => solution,
            None => {
                tracing::info!("No readable solution for {}.", slug);
                return Ok(Outcome::Unchanged);
            }
        };

        let url = match self.options.site_url.join(&format!("articles/{}/", slug)) {
            Ok(url) => url,
            Err(e) => {
                return Ok(Outcome::Skipped(format!(
                    "invalid solution url of {}: {}",
                    slug, e
                )))
            }
        };

        self.store
            .save_solution(&Solution {
                problem_id: note.question_id,
                url: url.to_string(),
                content: solution.content.clone(),
            })
            .await?;

        Ok(Outcome::Saved)
    }

    /// Stores the accepted submissions of `slug` that are not stored yet.
    pub async fn fetch_submissions(
        &self,
        slug: &str,
        report: &mut CrawlReport,
    ) -> Result<(), CrawlError> {
        tracing::info!("Fetching submission for problem: {}", slug);
        let mut page = self.options.submission_page.clone();

        loop {
            self.throttle.wait().await;
            let list = match self.provider.submission_list(slug, &page).await {
                Ok(list) => list,
                Err(e) => {
                    let outcome = recover(e, format!("submissions of {}", slug))?;
                    self.settle(outcome, report)?;
                    return Ok(());
                }
            };

            for digest in list.submissions.iter() {
                let outcome = self.fetch_submission_code(slug, digest).await?;
                if self.settle(outcome, report)? {
                    report.submissions += 1;
                }
            }

            match page.next(&list) {
                Some(next) if self.options.all_submission_pages => page = next,
                _ => break,
            }
        }

        Ok(())
    }

    /// Extracts and inserts one submission. Stored and non-accepted submissions never open a page.
    pub async fn fetch_submission_code(
        &self,
        slug: &str,
        digest: &SubmissionDigest,
    ) -> Result<Outcome, CrawlError> {
        if self.store.submission_exists(digest.id).await? {
            return Ok(Outcome::Unchanged);
        }
        if !digest.is_accepted() {
            return Ok(Outcome::Unchanged);
        }

        let url = match self.options.site_url.join(&digest.url) {
            Ok(url) => url,
            Err(e) => {
                return Ok(Outcome::Skipped(format!(
                    "invalid url {} of submission {}: {}",
                    digest.url, digest.id, e
                )))
            }
        };

        let html = match self.pages.submission_page(url.as_str()).await {
            Ok(html) => html,
            Err(e @ PageError::Timeout { .. }) => return Ok(Outcome::Skipped(e.to_string())),
            Err(e) => return Err(e.into()),
        };

        let code = match self.extractor.extract(&html) {
            Some(code) => code,
            None => {
                return Ok(Outcome::Skipped(format!(
                    "Cannot get submission code for problem: {}",
                    slug
                )))
            }
        };

        self.store
            .insert_submission(&Submission::from_digest(digest, slug, code))
            .await?;

        Ok(Outcome::Saved)
    }

    /// Applies the skip policy; returns whether rows were written.
    fn settle(&self, outcome: Outcome, report: &mut CrawlReport) -> Result<bool, CrawlError> {
        match outcome {
            Outcome::Saved => Ok(true),
            Outcome::Unchanged => Ok(false),
            Outcome::Skipped(reason) if self.options.strict => {
                tracing::error!("{}", reason);
                Err(CrawlError::Aborted(reason))
            }
            Outcome::Skipped(reason) => {
                tracing::warn!("skipped: {}", reason);
                report.skipped += 1;
                Ok(false)
            }
        }
    }
}

fn recover(error: ApiError, target: String) -> Result<Outcome, CrawlError> {
    if error.is_recoverable() {
        Ok(Outcome::Skipped(format!("{}: {}", target, error)))
    } else {
        tracing::error!("failed to fetch {}: {}", target, error);
        Err(error.into())
    }
}
