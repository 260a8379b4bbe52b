//! Social presence endpoints: discovery over a live page, stored profile
//! reads and edits, and cross-site platform statistics.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use super::{json_body, AppState};
use crate::domain::models::SocialProfile;
use crate::error::{ApiError, AppError};
use crate::extractor::page::url_authority;
use crate::repository::sqlite::{SocialProfileUpdate, SocialRepository, WebsiteRepository};
use crate::service::audit_runner::normalize_url;
use crate::service::social::{
    analysis_recommendations, page_recommendations, social_metrics, social_signals,
    stored_profile_recommendations,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/social/analyze", post(analyze))
        .route("/social/website/{website_id}", get(website_profiles))
        .route("/social/metrics/{website_id}", get(metrics))
        .route("/social/platforms", get(platforms))
        .route("/social/profile/{profile_id}", put(update_profile).delete(delete_profile))
        .route("/social/recommendations/{website_id}", get(recommendations))
}

fn profile_json(profile: &SocialProfile) -> Value {
    json!({
        "id": profile.id,
        "platform": profile.platform,
        "profile_url": profile.profile_url,
        "username": profile.username,
        "followers_count": profile.followers_count,
        "following_count": profile.following_count,
        "posts_count": profile.posts_count,
        "engagement_rate": profile.engagement_rate.unwrap_or(0.0),
        "last_post_date": profile.last_post_date.map(|at| at.to_rfc3339()),
        "verified": profile.verified,
        "created_at": profile.created_at.to_rfc3339(),
        "updated_at": profile.updated_at.to_rfc3339(),
    })
}

/// POST /api/social/analyze
async fn analyze(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body);
    let raw = body
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation("URL is required"))?;
    let url = normalize_url(raw)?;
    let domain = url_authority(&url)
        .ok_or_else(|| AppError::InvalidUrl(url.to_string()))?
        .to_lowercase();

    let websites = WebsiteRepository::new(state.pool.clone());
    let profiles = SocialRepository::new(state.pool.clone());

    let website = websites.upsert(&domain).await?;
    let scan = state.social.scan(&url).await?;

    profiles
        .replace_for_website(website.id, &scan.profiles)
        .await?;
    let stored = profiles.list_for_website(website.id).await?;

    let platforms_found: Vec<&str> = stored.iter().map(|p| p.platform.as_str()).collect();

    Ok(Json(json!({
        "total_profiles": stored.len(),
        "platforms_found": platforms_found,
        "profiles": scan.profiles,
        "recommendations": analysis_recommendations(&scan, &stored),
        "social_signals": social_signals(&stored),
        "analysis_date": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/social/website/{website_id}
async fn website_profiles(
    State(state): State<AppState>,
    Path(website_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let websites = WebsiteRepository::new(state.pool.clone());
    let profiles = SocialRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(website_id))?;
    let stored = profiles.list_for_website(site.id).await?;

    Ok(Json(json!({
        "website": {
            "id": site.id,
            "domain": site.domain,
        },
        "profiles": stored.iter().map(profile_json).collect::<Vec<_>>(),
    })))
}

/// GET /api/social/metrics/{website_id}
async fn metrics(
    State(state): State<AppState>,
    Path(website_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let websites = WebsiteRepository::new(state.pool.clone());
    let profiles = SocialRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(website_id))?;
    let stored = profiles.list_for_website(site.id).await?;

    Ok(Json(json!({
        "website": {
            "id": site.id,
            "domain": site.domain,
        },
        "metrics": social_metrics(&stored),
    })))
}

/// GET /api/social/platforms
async fn platforms(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let profiles = SocialRepository::new(state.pool.clone());

    let stats = profiles.platform_stats().await?;
    let top = profiles.top_profiles(10).await?;
    let recent = profiles.recent_profiles(20).await?;

    Ok(Json(json!({
        "platform_statistics": stats,
        "top_profiles": top,
        "recent_activity": recent,
    })))
}

/// PUT /api/social/profile/{profile_id}
async fn update_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<i64>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body);
    if body.as_object().map_or(true, |map| map.is_empty()) {
        return Err(AppError::validation("No data provided").into());
    }
    let update: SocialProfileUpdate = serde_json::from_value(body)
        .map_err(|error| AppError::validation(error.to_string()))?;

    let profiles = SocialRepository::new(state.pool.clone());
    let profile = profiles
        .update(profile_id, &update)
        .await?
        .ok_or(AppError::NotFound {
            entity: "Social profile",
            id: profile_id,
        })?;

    Ok(Json(json!({
        "id": profile.id,
        "platform": profile.platform,
        "message": "Social profile updated successfully",
    })))
}

/// DELETE /api/social/profile/{profile_id}
async fn delete_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let profiles = SocialRepository::new(state.pool.clone());
    if !profiles.delete(profile_id).await? {
        return Err(AppError::NotFound {
            entity: "Social profile",
            id: profile_id,
        }
        .into());
    }

    Ok(Json(json!({
        "message": "Social profile deleted successfully",
    })))
}

/// GET /api/social/recommendations/{website_id}
///
/// Combines a fresh homepage scan with checks over the stored profile rows.
/// An unreachable homepage degrades to the stored checks alone.
async fn recommendations(
    State(state): State<AppState>,
    Path(website_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let websites = WebsiteRepository::new(state.pool.clone());
    let profiles = SocialRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(website_id))?;
    let stored = profiles.list_for_website(site.id).await?;

    let mut recommendations = Vec::new();
    match normalize_url(&site.domain) {
        Ok(url) => match state.social.scan(&url).await {
            Ok(scan) => recommendations.extend(page_recommendations(&scan)),
            Err(error) => {
                tracing::warn!(domain = %site.domain, %error, "homepage scan skipped");
            }
        },
        Err(error) => {
            tracing::warn!(domain = %site.domain, %error, "homepage scan skipped");
        }
    }
    recommendations.extend(stored_profile_recommendations(&stored));

    Ok(Json(json!({
        "website": {
            "id": site.id,
            "domain": site.domain,
        },
        "total_recommendations": recommendations.len(),
        "recommendations": recommendations,
    })))
}
