use crate::leetcode::model::SubmissionList;
use serde::Serialize;

const QUESTION_DETAIL_QUERY: &str = r#"query getQuestionDetail($titleSlug: String!) {
    question(titleSlug: $titleSlug) {
        questionId
        questionFrontendId
        questionTitle
        questionTitleSlug
        content
        difficulty
        stats
        similarQuestions
        categoryTitle
        topicTags {
            name
            slug
        }
    }
}"#;

const QUESTION_NOTE_QUERY: &str = r#"query QuestionNote($titleSlug: String!) {
    question(titleSlug: $titleSlug) {
        questionId
        solution {
            id
            content
            contentTypeId
            canSeeDetail
            paidOnly
        }
    }
}"#;

const SUBMISSIONS_QUERY: &str = r#"query Submissions($offset: Int!, $limit: Int!, $lastKey: String, $questionSlug: String!) {
    submissionList(offset: $offset, limit: $limit, lastKey: $lastKey, questionSlug: $questionSlug) {
        lastKey
        hasNext
        submissions {
            id
            statusDisplay
            lang
            runtime
            timestamp
            url
            isPending
            __typename
        }
        __typename
    }
}"#;

/// Body of a POST to the GraphQL endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlOperation<V: Serialize> {
    pub operation_name: &'static str,
    pub variables: V,
    pub query: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSlugVariables<'a> {
    pub title_slug: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsVariables<'a> {
    pub offset: u32,
    pub limit: u32,
    pub last_key: &'a str,
    pub question_slug: &'a str,
}

pub fn question_detail(slug: &str) -> GraphQlOperation<TitleSlugVariables<'_>> {
    GraphQlOperation {
        operation_name: "getQuestionDetail",
        variables: TitleSlugVariables { title_slug: slug },
        query: QUESTION_DETAIL_QUERY,
    }
}

pub fn question_note(slug: &str) -> GraphQlOperation<TitleSlugVariables<'_>> {
    GraphQlOperation {
        operation_name: "QuestionNote",
        variables: TitleSlugVariables { title_slug: slug },
        query: QUESTION_NOTE_QUERY,
    }
}

pub fn submissions<'a>(
    slug: &'a str,
    page: &'a SubmissionPage,
) -> GraphQlOperation<SubmissionsVariables<'a>> {
    GraphQlOperation {
        operation_name: "Submissions",
        variables: SubmissionsVariables {
            offset: page.offset,
            limit: page.limit,
            last_key: page.last_key.as_deref().unwrap_or(""),
            question_slug: slug,
        },
        query: SUBMISSIONS_QUERY,
    }
}

/// A window over the submission list of one problem.
///
/// The crawl reads only the first page unless told otherwise, so submissions
/// beyond `limit` are not retrieved by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPage {
    pub offset: u32,
    pub limit: u32,
    pub last_key: Option<String>,
}

impl SubmissionPage {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn first(limit: u32) -> Self {
        Self {
            offset: 0,
            limit,
            last_key: None,
        }
    }

    /// The page following `list`, if the server reports one.
    pub fn next(&self, list: &SubmissionList) -> Option<Self> {
        if !list.has_next {
            return None;
        }
        Some(Self {
            offset: self.offset + self.limit,
            limit: self.limit,
            last_key: list.last_key.clone(),
        })
    }
}

impl Default for SubmissionPage {
    fn default() -> Self {
        Self::first(Self::DEFAULT_LIMIT)
    }
}
