//! Use-case endpoints: one per route.
//!
//! # Responsibilities
//! - Open an endpoint span around each call
//! - Invoke the service and attach suggestions when requested
//! - Shape the response envelope
//!
//! # Design Decisions
//! - Any error aborts the whole call; no partial responses
//! - Listing with suggestions resolves articles through an ordered stream with
//!   bounded concurrency; the first failure in article order wins and the
//!   outstanding lookups are dropped

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::articles::errors::{ArticleError, ArticleResult};
use crate::articles::model::{Article, ArticleId};
use crate::articles::service::ArticleService;
use crate::observability::{TraceContext, Tracer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetArticleRequest {
    pub id: ArticleId,
    pub include_suggested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetArticleResponse {
    pub article: Article,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetArticlesRequest {
    pub include_suggested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetArticlesResponse {
    pub articles: Vec<Article>,
}

/// A typed request/response use case.
#[async_trait]
pub trait Endpoint: Send + Sync {
    type Request: Send;
    type Response: Serialize + Send;

    async fn call(&self, ctx: &TraceContext, request: Self::Request) -> ArticleResult<Self::Response>;
}

pub struct GetArticleEndpoint {
    service: Arc<dyn ArticleService>,
    tracer: Arc<dyn Tracer>,
}

impl GetArticleEndpoint {
    pub fn new(service: Arc<dyn ArticleService>, tracer: Arc<dyn Tracer>) -> Self {
        Self { service, tracer }
    }
}

#[async_trait]
impl Endpoint for GetArticleEndpoint {
    type Request = GetArticleRequest;
    type Response = GetArticleResponse;

    async fn call(&self, ctx: &TraceContext, request: GetArticleRequest) -> ArticleResult<GetArticleResponse> {
        let (ctx, _span) = self.tracer.start(ctx, "get article endpoint");

        let mut article = self.service.get_article(&ctx, &request.id).await?;
        if request.include_suggested {
            article.suggested_articles = self.service.get_suggested(&ctx, &request.id).await?;
        }

        Ok(GetArticleResponse { article })
    }
}

pub struct GetArticlesEndpoint {
    service: Arc<dyn ArticleService>,
    tracer: Arc<dyn Tracer>,
    concurrency: usize,
}

impl GetArticlesEndpoint {
    /// `concurrency` bounds suggestion lookups in flight; 1 is strictly sequential.
    pub fn new(service: Arc<dyn ArticleService>, tracer: Arc<dyn Tracer>, concurrency: usize) -> Self {
        Self {
            service,
            tracer,
            concurrency: concurrency.max(1),
        }
    }
}

#[async_trait]
impl Endpoint for GetArticlesEndpoint {
    type Request = GetArticlesRequest;
    type Response = GetArticlesResponse;

    async fn call(&self, ctx: &TraceContext, request: GetArticlesRequest) -> ArticleResult<GetArticlesResponse> {
        let (ctx, _span) = self.tracer.start(ctx, "get articles endpoint");

        let articles = self.service.get_articles(&ctx).await?;
        if !request.include_suggested {
            return Ok(GetArticlesResponse { articles });
        }

        let ctx = &ctx;
        let service = &self.service;
        let articles: Vec<Article> = stream::iter(articles)
            .map(|mut article| async move {
                article.suggested_articles = service.get_suggested(ctx, &article.id).await?;
                Ok::<_, ArticleError>(article)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(GetArticlesResponse { articles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::gateway::StaticSuggestions;
    use crate::articles::service::Articles;
    use crate::articles::store::{ArticleStore, SnapshotStore};
    use crate::observability::InMemoryTracer;

    const SNAPSHOT: &str = r#"{
        "a": {"id": "a", "title": "A"},
        "b": {"id": "b", "title": "B"},
        "c": {"id": "c", "title": "C"}
    }"#;

    struct Fixture {
        service: Arc<dyn ArticleService>,
        gateway: Arc<StaticSuggestions>,
        tracer: InMemoryTracer,
        store: Arc<SnapshotStore>,
    }

    fn fixture(gateway: StaticSuggestions) -> Fixture {
        let tracer = InMemoryTracer::new();
        let store = Arc::new(SnapshotStore::from_json(SNAPSHOT).unwrap());
        let gateway = Arc::new(gateway);
        let service = Arc::new(Articles::new(
            store.clone(),
            gateway.clone(),
            Arc::new(tracer.clone()),
        ));
        Fixture {
            service,
            gateway,
            tracer,
            store,
        }
    }

    #[tokio::test]
    async fn test_get_article_without_suggestions() {
        let f = fixture(StaticSuggestions::from_pairs([("a", vec!["b"])]));
        let endpoint = GetArticleEndpoint::new(f.service.clone(), Arc::new(f.tracer.clone()));

        let response = endpoint
            .call(
                &TraceContext::background(),
                GetArticleRequest { id: "a".into(), include_suggested: false },
            )
            .await
            .unwrap();

        assert_eq!(response.article, f.store.get(&"a".into()).unwrap());
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_article_with_suggestions() {
        let f = fixture(StaticSuggestions::from_pairs([("a", vec!["b", "c"])]));
        let endpoint = GetArticleEndpoint::new(f.service.clone(), Arc::new(f.tracer.clone()));

        let response = endpoint
            .call(
                &TraceContext::background(),
                GetArticleRequest { id: "a".into(), include_suggested: true },
            )
            .await
            .unwrap();

        let expected = vec![
            f.store.get(&"b".into()).unwrap(),
            f.store.get(&"c".into()).unwrap(),
        ];
        assert_eq!(response.article.suggested_articles, expected);

        let root = f.tracer.span("get article endpoint").unwrap();
        let suggestion = f.tracer.span("get suggestion").unwrap();
        assert_eq!(suggestion.parent_span_id.as_deref(), Some(root.span_id.as_str()));
        assert!(f.tracer.spans().iter().all(|s| s.ended));
    }

    #[tokio::test]
    async fn test_get_article_suggestion_failure_aborts() {
        let f = fixture(StaticSuggestions::from_pairs([("a", vec!["b", "missing"])]));
        let endpoint = GetArticleEndpoint::new(f.service.clone(), Arc::new(f.tracer.clone()));

        let err = endpoint
            .call(
                &TraceContext::background(),
                GetArticleRequest { id: "a".into(), include_suggested: true },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleError::NotFound(ref id) if id.as_str() == "missing"));
        assert!(f.tracer.span("get article endpoint").unwrap().ended);
    }

    #[tokio::test]
    async fn test_get_article_missing_skips_suggestions() {
        let f = fixture(StaticSuggestions::from_pairs([("z", vec!["a"])]));
        let endpoint = GetArticleEndpoint::new(f.service.clone(), Arc::new(f.tracer.clone()));

        let err = endpoint
            .call(
                &TraceContext::background(),
                GetArticleRequest { id: "z".into(), include_suggested: true },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleError::NotFound(_)));
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_articles_plain() {
        let f = fixture(StaticSuggestions::default());
        let endpoint = GetArticlesEndpoint::new(f.service.clone(), Arc::new(f.tracer.clone()), 1);

        let response = endpoint
            .call(&TraceContext::background(), GetArticlesRequest { include_suggested: false })
            .await
            .unwrap();

        assert_eq!(response.articles.len(), 3);
        assert!(response.articles.iter().all(|a| a.suggested_articles.is_empty()));
    }

    #[tokio::test]
    async fn test_get_articles_with_suggestions_keeps_store_order() {
        for concurrency in [1, 3] {
            let f = fixture(StaticSuggestions::from_pairs([
                ("a", vec!["b"]),
                ("b", vec!["c", "a"]),
                ("c", vec!["a"]),
            ]));
            let endpoint =
                GetArticlesEndpoint::new(f.service.clone(), Arc::new(f.tracer.clone()), concurrency);

            let listed: Vec<ArticleId> = f.store.all().into_iter().map(|a| a.id).collect();
            let response = endpoint
                .call(&TraceContext::background(), GetArticlesRequest { include_suggested: true })
                .await
                .unwrap();

            let returned: Vec<ArticleId> = response.articles.iter().map(|a| a.id.clone()).collect();
            assert_eq!(returned, listed);

            let b = response.articles.iter().find(|a| a.id.as_str() == "b").unwrap();
            let ids: Vec<&str> = b.suggested_articles.iter().map(|a| a.id.as_str()).collect();
            assert_eq!(ids, vec!["c", "a"]);
        }
    }

    #[tokio::test]
    async fn test_get_articles_single_failure_aborts_batch() {
        let f = fixture(StaticSuggestions::from_pairs([("a", vec!["b"]), ("c", vec!["a"])]));
        let endpoint = GetArticlesEndpoint::new(f.service.clone(), Arc::new(f.tracer.clone()), 1);

        let result = endpoint
            .call(&TraceContext::background(), GetArticlesRequest { include_suggested: true })
            .await;
        assert!(matches!(result, Err(ArticleError::Upstream(_))));
    }
}
