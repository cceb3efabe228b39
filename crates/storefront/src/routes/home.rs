//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use indecisive_wear_core::SortOrder;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::models::session;
use crate::services::instagram::InstagramPost;
use crate::state::AppState;
use crate::views::{PageContext, ProductCard};

/// Collection featured on the home page.
const FEATURED_COLLECTION: &str = "frontpage";

const FEATURED_LIMIT: i64 = 8;
const NEW_ARRIVALS_LIMIT: i64 = 8;
const INSTAGRAM_LIMIT: u32 = 6;

/// Instagram tile display data.
#[derive(Debug, Clone)]
pub struct InstagramTile {
    pub permalink: String,
    pub image_url: String,
    pub alt: String,
}

impl From<&InstagramPost> for InstagramTile {
    fn from(post: &InstagramPost) -> Self {
        let alt = post
            .caption
            .as_deref()
            .and_then(|c| c.lines().next())
            .map(|line| line.chars().take(120).collect())
            .unwrap_or_else(|| "Indecisive Wear on Instagram".to_string());
        Self {
            permalink: post.permalink.clone(),
            image_url: post.image_url.clone(),
            alt,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured_title: String,
    pub featured: Vec<ProductCard>,
    pub new_arrivals: Vec<ProductCard>,
    pub posts: Vec<InstagramTile>,
}

/// Display the home page.
///
/// Each section loads independently; a failing section renders empty
/// rather than failing the page.
#[instrument(skip(state, session, ctx))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> HomeTemplate {
    let storefront = state.storefront();

    let featured = storefront.get_collection_by_handle(
        FEATURED_COLLECTION,
        FEATURED_LIMIT,
        None,
        SortOrder::Featured,
    );
    let new_arrivals = storefront.get_products(NEW_ARRIVALS_LIMIT, None, None, SortOrder::Newest);
    let posts = async {
        match state.instagram() {
            Some(client) => match client.recent_posts(INSTAGRAM_LIMIT).await {
                Ok(posts) => posts.iter().map(InstagramTile::from).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load Instagram posts");
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    };

    let (featured, new_arrivals, posts) = tokio::join!(featured, new_arrivals, posts);
    let wishlist = session::wishlist(&session).await;

    let (featured_title, featured) = match featured {
        Ok(collection) => (
            collection.title,
            ProductCard::list(&collection.products, ctx.market, &wishlist),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured collection");
            (String::new(), Vec::new())
        }
    };

    let new_arrivals = match new_arrivals {
        Ok(connection) => ProductCard::list(&connection.products, ctx.market, &wishlist),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load new arrivals");
            Vec::new()
        }
    };

    HomeTemplate {
        ctx,
        featured_title,
        featured,
        new_arrivals,
        posts,
    }
}
