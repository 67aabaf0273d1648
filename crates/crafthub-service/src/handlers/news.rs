//! News listing handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crafthub_core::NewsPost;

use crate::error::ApiError;
use crate::state::AppState;

/// Posts per page on the news listing.
const NEWS_PAGE_SIZE: usize = 10;

/// Featured posts returned when the query does not say how many.
const DEFAULT_FEATURED_LIMIT: usize = 3;

/// Upper bound on the featured-post list.
const MAX_FEATURED_LIMIT: usize = 20;

/// One news post as rendered by the site.
#[derive(Debug, Serialize)]
pub struct NewsPostResponse {
    /// Post id.
    pub id: i64,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Byline.
    pub author: String,
    /// Optional header image path.
    pub image: Option<String>,
    /// Section name.
    pub category: String,
    /// Whether the post is pinned to the landing page.
    pub is_featured: bool,
    /// Publication time.
    pub created_at: String,
}

impl From<NewsPost> for NewsPostResponse {
    fn from(post: NewsPost) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author: post.author,
            image: post.image,
            category: post.category,
            is_featured: post.is_featured,
            created_at: post.created_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the news listing.
#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    /// 1-based page number.
    pub page: Option<usize>,
}

/// Paginated news listing.
#[derive(Debug, Serialize)]
pub struct NewsPageResponse {
    /// Posts on this page, newest first.
    pub posts: Vec<NewsPostResponse>,
    /// The page that was returned.
    pub page: usize,
    /// Total number of pages.
    pub total_pages: u64,
    /// Total number of published posts.
    pub total_posts: u64,
}

/// List published posts, newest first, ten per page.
pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<NewsPageResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1).saturating_mul(NEWS_PAGE_SIZE);

    let (posts, total_posts) = state.store.list_news(NEWS_PAGE_SIZE, offset).await?;

    Ok(Json(NewsPageResponse {
        posts: posts.into_iter().map(NewsPostResponse::from).collect(),
        page,
        total_pages: total_posts.div_ceil(NEWS_PAGE_SIZE as u64),
        total_posts,
    }))
}

/// Query parameters for the featured-post list.
#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    /// How many featured posts to return.
    pub limit: Option<usize>,
}

/// Featured posts for the landing page.
#[derive(Debug, Serialize)]
pub struct FeaturedResponse {
    /// Featured posts, newest first.
    pub posts: Vec<NewsPostResponse>,
}

/// List the newest featured posts.
pub async fn featured_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<FeaturedResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_FEATURED_LIMIT)
        .clamp(1, MAX_FEATURED_LIMIT);
    let posts = state.store.featured_news(limit).await?;

    Ok(Json(FeaturedResponse {
        posts: posts.into_iter().map(NewsPostResponse::from).collect(),
    }))
}
