//! Post entity model

use crate::core::entity::{Entity, Resource};
use crate::core::query::ResourceSearchConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

static SEARCH: ResourceSearchConfig = ResourceSearchConfig::new(&["title", "body"]);

/// A post written by an account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Post {
    pub id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Id of the authoring account
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: impl Into<String>, body: impl Into<String>, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            author,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,

    #[serde(default)]
    pub body: String,

    pub author: Uuid,
}

impl Entity for Post {
    fn resource_name() -> &'static str {
        "posts"
    }

    fn resource_name_singular() -> &'static str {
        "post"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Resource for Post {
    type Draft = NewPost;

    fn search_config() -> &'static ResourceSearchConfig {
        &SEARCH
    }

    fn from_draft(draft: NewPost) -> Self {
        Post::new(draft.title, draft.body, draft.author)
    }

    fn patchable_fields() -> &'static [&'static str] {
        &["title", "body"]
    }
}
