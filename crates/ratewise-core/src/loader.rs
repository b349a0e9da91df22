//! Ordered data sources for a member's evaluation.
//!
//! A read tries the remote backend first, then the local cache, then the bare
//! template. Each source either produces a complete item list or passes.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::model::{EvaluationItem, EvaluationKey, EvaluationRecord, MemberRating, TemplateItem};
use crate::store::evaluation_data_key;
use crate::traits::{EvaluationApi, KeyValueStore};

/// Where a loaded evaluation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Remote,
    Cache,
    Template,
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOrigin::Remote => write!(f, "remote"),
            DataOrigin::Cache => write!(f, "cache"),
            DataOrigin::Template => write!(f, "template"),
        }
    }
}

/// What a source needs to build an evaluation.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    pub key: &'a EvaluationKey,
    pub template: &'a [TemplateItem],
}

/// One step of the fallback chain.
#[async_trait]
pub trait EvaluationSource: Send + Sync {
    fn origin(&self) -> DataOrigin;

    /// Produce the full item list, or `None` to defer to the next source.
    async fn fetch(&self, ctx: &LoadContext<'_>) -> Option<Vec<EvaluationItem>>;
}

/// Overlay stored ratings onto the template.
///
/// Ratings are matched on item id; template items without a rating keep
/// zero score, zero bonus, and an empty comment.
pub fn merge_ratings(template: &[TemplateItem], ratings: &[MemberRating]) -> Vec<EvaluationItem> {
    template
        .iter()
        .map(|template_item| {
            let mut item = EvaluationItem::from_template(template_item);
            if let Some(rating) = ratings.iter().find(|r| r.item_id == template_item.id) {
                item.score = rating.score;
                item.bonus = rating.bonus;
                item.comment = rating.comment.clone();
            }
            item
        })
        .collect()
}

/// Ratings stored on the backend.
pub struct RemoteSource<A> {
    api: Arc<A>,
}

impl<A: EvaluationApi> RemoteSource<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: EvaluationApi> EvaluationSource for RemoteSource<A> {
    fn origin(&self) -> DataOrigin {
        DataOrigin::Remote
    }

    async fn fetch(&self, ctx: &LoadContext<'_>) -> Option<Vec<EvaluationItem>> {
        match self.api.member_ratings(&ctx.key.member_id).await {
            Ok(ratings) if ratings.is_empty() => {
                debug!(member = %ctx.key.member_id, "no remote ratings");
                None
            }
            Ok(ratings) => Some(merge_ratings(ctx.template, &ratings)),
            Err(e) if e.is_read_fallback() => {
                warn!(member = %ctx.key.member_id, "remote ratings unavailable: {e}");
                None
            }
            Err(e) => {
                error!(member = %ctx.key.member_id, "remote ratings rejected: {e}");
                None
            }
        }
    }
}

/// The copy cached by the last successful save on this machine.
pub struct CacheSource<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> CacheSource<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: KeyValueStore> EvaluationSource for CacheSource<S> {
    fn origin(&self) -> DataOrigin {
        DataOrigin::Cache
    }

    async fn fetch(&self, ctx: &LoadContext<'_>) -> Option<Vec<EvaluationItem>> {
        let key = evaluation_data_key(ctx.key);
        match self.store.get_json::<EvaluationRecord>(&key) {
            Ok(Some(record)) => record.items,
            Ok(None) => None,
            Err(e) => {
                warn!("ignoring cached evaluation: {e}");
                None
            }
        }
    }
}

/// Unscored template items. Always succeeds for a non-empty template.
pub struct TemplateSource;

#[async_trait]
impl EvaluationSource for TemplateSource {
    fn origin(&self) -> DataOrigin {
        DataOrigin::Template
    }

    async fn fetch(&self, ctx: &LoadContext<'_>) -> Option<Vec<EvaluationItem>> {
        if ctx.template.is_empty() {
            return None;
        }
        Some(ctx.template.iter().map(EvaluationItem::from_template).collect())
    }
}

/// Sources tried strictly in order, one at a time.
pub struct FallbackChain {
    sources: Vec<Box<dyn EvaluationSource>>,
}

impl FallbackChain {
    pub fn new(sources: Vec<Box<dyn EvaluationSource>>) -> Self {
        Self { sources }
    }

    /// Remote, then cache, then template.
    pub fn standard<A, S>(api: Arc<A>, store: Arc<S>) -> Self
    where
        A: EvaluationApi + 'static,
        S: KeyValueStore + 'static,
    {
        Self::new(vec![
            Box::new(RemoteSource::new(api)),
            Box::new(CacheSource::new(store)),
            Box::new(TemplateSource),
        ])
    }

    pub async fn load(&self, ctx: &LoadContext<'_>) -> Option<(Vec<EvaluationItem>, DataOrigin)> {
        for source in &self.sources {
            if let Some(items) = source.fetch(ctx).await {
                debug!(origin = %source.origin(), items = items.len(), "evaluation loaded");
                return Some((items, source.origin()));
            }
        }
        None
    }
}
