pub mod leetcode;

pub use leetcode::client::{ApiError, LeetCodeClient, ProblemDataProvider};
pub use leetcode::query::SubmissionPage;
pub use leetcode::session::{SessionCredentials, StoredCookie};
