use serde::{Deserialize, Serialize};
use time::Date;

use crate::goals::repo::GoalStatus;

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_date: Option<Date>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_date: Option<Date>,
    pub status: Option<GoalStatus>,
    pub progress: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: GoalStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProgressRequest {
    pub progress: i32,
}
