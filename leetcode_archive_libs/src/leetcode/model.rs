use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

/// Response of `/api/problems/all/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemCatalog {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub num_solved: Option<u32>,
    #[serde(default)]
    pub stat_status_pairs: Vec<ProblemStatus>,
}

impl ProblemCatalog {
    /// Problems the current user has an accepted submission for.
    pub fn accepted(&self) -> impl Iterator<Item = &ProblemStat> {
        self.stat_status_pairs
            .iter()
            .filter(|pair| pair.is_accepted())
            .map(|pair| &pair.stat)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemStatus {
    pub stat: ProblemStat,
    /// `ac`, `notac` or null when the problem has never been attempted.
    pub status: Option<String>,
    #[serde(default)]
    pub paid_only: bool,
}

impl ProblemStatus {
    pub fn is_accepted(&self) -> bool {
        self.status.as_deref() == Some("ac")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemStat {
    pub question_id: i64,
    #[serde(rename = "question__title_slug")]
    pub title_slug: String,
    #[serde(rename = "question__title", default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTag {
    pub name: String,
    pub slug: String,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub question_id: i64,
    pub question_frontend_id: String,
    pub question_title: String,
    pub question_title_slug: String,
    /// Null for paid-only problems when the user has no subscription.
    pub content: Option<String>,
    pub difficulty: String,
    #[serde(default)]
    pub topic_tags: Vec<TopicTag>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionNote {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub question_id: i64,
    pub solution: Option<EditorialSolution>,
}

impl QuestionNote {
    /// The editorial article, unless it is missing or behind the paywall.
    pub fn readable_solution(&self) -> Option<&EditorialSolution> {
        self.solution
            .as_ref()
            .filter(|solution| !solution.paid_only)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialSolution {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_type_id: Option<String>,
    #[serde(default)]
    pub can_see_detail: bool,
    #[serde(default)]
    pub paid_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionList {
    #[serde(default)]
    pub last_key: Option<String>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub submissions: Vec<SubmissionDigest>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDigest {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,
    pub status_display: String,
    pub lang: String,
    #[serde(default)]
    pub runtime: Option<String>,
    /// Unix seconds.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub timestamp: i64,
    /// Site-relative path of the submission detail page.
    pub url: String,
}

impl SubmissionDigest {
    pub fn is_accepted(&self) -> bool {
        self.status_display == "Accepted"
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionDetailData {
    pub question: Option<QuestionDetail>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionNoteData {
    pub question: Option<QuestionNote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionListData {
    pub submission_list: Option<SubmissionList>,
}
