use anyhow::Result;

use crate::folio::types::{Post, PostDocument};

pub trait Transformer: Send + Sync {
    fn transform(&self, doc: PostDocument) -> Result<PostDocument>;
}

pub trait Filter: Send + Sync {
    fn include(&self, post: &Post) -> bool;
}
