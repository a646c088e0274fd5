//! Article business logic.
//!
//! # Responsibilities
//! - Look up single articles and the full catalog
//! - Resolve suggested articles by chaining gateway and store lookups
//!
//! # Design Decisions
//! - Suggestion resolution is fail-fast: one unresolvable id fails the call,
//!   no partial list is ever returned
//! - Suggested ids are resolved in the order the gateway returned them

use std::sync::Arc;

use async_trait::async_trait;

use crate::articles::errors::{ArticleError, ArticleResult};
use crate::articles::gateway::SuggestionGateway;
use crate::articles::model::{Article, ArticleId};
use crate::articles::store::ArticleStore;
use crate::observability::{TraceContext, Tracer};

/// Article use cases consumed by the endpoints.
#[async_trait]
pub trait ArticleService: Send + Sync {
    async fn get_article(&self, ctx: &TraceContext, id: &ArticleId) -> ArticleResult<Article>;

    async fn get_suggested(&self, ctx: &TraceContext, id: &ArticleId) -> ArticleResult<Vec<Article>>;

    async fn get_articles(&self, ctx: &TraceContext) -> ArticleResult<Vec<Article>>;
}

/// Service over a snapshot store and a suggestions gateway.
#[derive(Clone)]
pub struct Articles {
    store: Arc<dyn ArticleStore>,
    gateway: Arc<dyn SuggestionGateway>,
    tracer: Arc<dyn Tracer>,
}

impl Articles {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        gateway: Arc<dyn SuggestionGateway>,
        tracer: Arc<dyn Tracer>,
    ) -> Self {
        Self {
            store,
            gateway,
            tracer,
        }
    }
}

#[async_trait]
impl ArticleService for Articles {
    async fn get_article(&self, ctx: &TraceContext, id: &ArticleId) -> ArticleResult<Article> {
        let (_, mut span) = self.tracer.start(ctx, "get article");
        span.set_attribute("article.id", id.as_str());
        ctx.check()?;

        self.store
            .get(id)
            .ok_or_else(|| ArticleError::NotFound(id.clone()))
    }

    async fn get_suggested(&self, ctx: &TraceContext, id: &ArticleId) -> ArticleResult<Vec<Article>> {
        let (ctx, mut span) = self.tracer.start(ctx, "get suggestion");
        span.set_attribute("article.id", id.as_str());
        ctx.check()?;

        let ids = self.gateway.fetch_suggested_ids(&ctx, id).await?;
        span.set_attribute("suggestions.count", ids.len().to_string());

        let mut suggested = Vec::with_capacity(ids.len());
        for suggested_id in &ids {
            suggested.push(self.get_article(&ctx, suggested_id).await?);
        }
        Ok(suggested)
    }

    async fn get_articles(&self, ctx: &TraceContext) -> ArticleResult<Vec<Article>> {
        let (_, mut span) = self.tracer.start(ctx, "get articles");
        ctx.check()?;

        let articles = self.store.all();
        span.set_attribute("articles.count", articles.len().to_string());
        Ok(articles)
    }
}
