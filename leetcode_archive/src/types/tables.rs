use leetcode_archive_libs::leetcode::model::{QuestionDetail, SubmissionDigest, TopicTag};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Problem {
    pub id: i64,
    pub display_id: String,
    pub title: String,
    pub slug: String,
    pub level: String,
    pub description: Option<String>,
    pub accepted: bool,
}

impl Problem {
    pub fn from_question(question: &QuestionDetail, slug: &str, accepted: bool) -> Self {
        Problem {
            id: question.question_id,
            display_id: question.question_frontend_id.clone(),
            title: question.question_title.clone(),
            slug: slug.to_string(),
            level: question.difficulty.clone(),
            description: question.content.clone(),
            accepted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

impl From<&TopicTag> for Tag {
    fn from(tag: &TopicTag) -> Self {
        Tag {
            slug: tag.slug.clone(),
            name: tag.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ProblemTag {
    pub problem_id: i64,
    pub tag_slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Solution {
    pub problem_id: i64,
    pub url: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Submission {
    pub id: i64,
    pub slug: String,
    pub language: String,
    pub created: i64,
    pub source: Vec<u8>,
}

impl Submission {
    pub fn from_digest(digest: &SubmissionDigest, slug: &str, code: String) -> Self {
        Submission {
            id: digest.id,
            slug: slug.to_string(),
            language: digest.lang.clone(),
            created: digest.timestamp,
            source: code.into_bytes(),
        }
    }
}
