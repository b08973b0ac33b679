//! Progress request/response types.

use serde::{Deserialize, Serialize};

use humantree_core::{SkillId, UserProgress};

/// `POST /users/{user}/skills-checked` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckSkillRequest {
    pub skill_id: SkillId,
}

/// `GET /users/{user}/skills-checked` response.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: UserProgress,
}
