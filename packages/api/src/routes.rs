use serde::{Deserialize, Serialize};

pub mod admin;
pub mod course;
pub mod educator;
pub mod health;
pub mod user;
pub mod webhook;

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct PaginationParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
