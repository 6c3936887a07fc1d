use crate::leetcode::{
    model::*,
    query::{self, GraphQlOperation, SubmissionPage},
    session::SessionCredentials,
};
use async_trait::async_trait;
use reqwest::{header::InvalidHeaderValue, Client, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to request to leetcode: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("unexpected status {status} returned from {url}")]
    StatusError { status: StatusCode, url: String },
    #[error("failed to deserialize JSON data: {0}")]
    DeserializeError(#[from] serde_json::Error),
    #[error("invalid leetcode url given")]
    InvalidUrlError(#[from] url::ParseError),
    #[error("invalid header value in session credentials")]
    InvalidHeaderError(#[from] InvalidHeaderValue),
    #[error("response has no `{0}`")]
    MissingPayloadError(&'static str),
    #[error("{operation} returned errors: {message}")]
    QueryError {
        operation: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Whether the failure is confined to the record that was asked for.
    ///
    /// Transport errors and statuses meaning the session was rejected or
    /// throttled affect every following request, so they are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ApiError::DeserializeError(_)
            | ApiError::MissingPayloadError(_)
            | ApiError::QueryError { .. } => true,
            ApiError::StatusError { status, .. } => !matches!(
                *status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            ),
            _ => false,
        }
    }
}

/// Source of problem, editorial and submission data for the current user.
#[async_trait]
pub trait ProblemDataProvider: Send + Sync {
    async fn problem_statuses(&self) -> Result<ProblemCatalog>;
    async fn question_detail(&self, slug: &str) -> Result<QuestionDetail>;
    async fn question_note(&self, slug: &str) -> Result<QuestionNote>;
    async fn submission_list(&self, slug: &str, page: &SubmissionPage) -> Result<SubmissionList>;
}

/// HTTP client authenticated with cookies harvested from a browser session.
pub struct LeetCodeClient {
    site_url: Url,
    catalog_url: Url,
    graphql_url: Url,
    client: Client,
}

impl LeetCodeClient {
    pub fn new(base_url: &str, credentials: &SessionCredentials) -> Result<Self> {
        let mut site_url = Url::parse(base_url)?;
        site_url.set_path("");
        site_url.set_query(None);
        site_url.set_fragment(None);
        let catalog_url = site_url.join("api/problems/all/")?;
        let graphql_url = site_url.join("graphql")?;
        let referer = site_url.join("accounts/login/")?;

        let client = Client::builder()
            .default_headers(credentials.headers(referer.as_str())?)
            .gzip(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(LeetCodeClient {
            site_url,
            catalog_url,
            graphql_url,
            client,
        })
    }

    pub fn site_url(&self) -> &Url {
        &self.site_url
    }

    async fn query<V, T>(&self, operation: GraphQlOperation<V>) -> Result<T>
    where
        V: Serialize + Send + Sync,
        T: DeserializeOwned,
    {
        let res = self
            .client
            .post(self.graphql_url.clone())
            .json(&operation)
            .send()
            .await?;
        let body = read_body(res).await?;
        let response: GraphQlResponse<T> = serde_json::from_str(&body)?;

        match response.data {
            Some(data) => Ok(data),
            None if !response.errors.is_empty() => Err(ApiError::QueryError {
                operation: operation.operation_name,
                message: response
                    .errors
                    .into_iter()
                    .map(|error| error.message)
                    .collect::<Vec<String>>()
                    .join("; "),
            }),
            None => Err(ApiError::MissingPayloadError("data")),
        }
    }
}

/// Returns the body of a successful response, logging a snippet of failed ones.
async fn read_body(res: Response) -> Result<String> {
    let status = res.status();
    let url = res.url().to_string();

    if let Some(e) = res.error_for_status_ref().err() {
        let text = res.text().await.unwrap_or_default();
        let snippet: String = text.chars().take(500).collect();
        tracing::error!("error response returned from {}: {:?}, body: {}", url, e, snippet);
        return Err(ApiError::StatusError { status, url });
    }

    Ok(res.text().await?)
}

#[async_trait]
impl ProblemDataProvider for LeetCodeClient {
    async fn problem_statuses(&self) -> Result<ProblemCatalog> {
        let res = self.client.get(self.catalog_url.clone()).send().await?;
        tracing::debug!("catalog status code: {}", res.status());
        let body = read_body(res).await?;
        let catalog: ProblemCatalog = serde_json::from_str(&body)?;

        Ok(catalog)
    }

    async fn question_detail(&self, slug: &str) -> Result<QuestionDetail> {
        let data: QuestionDetailData = self.query(query::question_detail(slug)).await?;
        data.question
            .ok_or(ApiError::MissingPayloadError("data.question"))
    }

    async fn question_note(&self, slug: &str) -> Result<QuestionNote> {
        let data: QuestionNoteData = self.query(query::question_note(slug)).await?;
        data.question
            .ok_or(ApiError::MissingPayloadError("data.question"))
    }

    async fn submission_list(&self, slug: &str, page: &SubmissionPage) -> Result<SubmissionList> {
        let data: SubmissionListData = self.query(query::submissions(slug, page)).await?;
        data.submission_list
            .ok_or(ApiError::MissingPayloadError("data.submissionList"))
    }
}
