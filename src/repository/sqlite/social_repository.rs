//! Social profile rows. Discovery replaces a website's profile set wholesale;
//! engagement numbers are edited through the update endpoint afterwards.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::parse_datetime;
use crate::domain::models::{DiscoveredProfile, SocialProfile};
use crate::domain::round2;

/// Distinguishes an absent field from an explicit `null` in the request body.
fn explicit<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Fields a PUT may change. `last_post_date: null` clears the stored value,
/// an absent field keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SocialProfileUpdate {
    pub followers_count: Option<i64>,
    pub following_count: Option<i64>,
    pub posts_count: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub verified: Option<bool>,
    #[serde(deserialize_with = "explicit")]
    pub last_post_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStat {
    pub platform: String,
    pub profile_count: i64,
    pub total_followers: i64,
    pub average_engagement: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopProfile {
    pub id: i64,
    pub platform: String,
    pub username: Option<String>,
    pub domain: String,
    pub followers_count: Option<i64>,
    pub engagement_rate: f64,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentProfile {
    pub id: i64,
    pub platform: String,
    pub username: Option<String>,
    pub domain: String,
    pub updated_at: DateTime<Utc>,
}

pub struct SocialRepository {
    pool: SqlitePool,
}

impl SocialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace every stored profile of a website with the freshly
    /// discovered set.
    pub async fn replace_for_website(
        &self,
        website_id: i64,
        profiles: &[DiscoveredProfile],
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin social profile transaction")?;

        sqlx::query("DELETE FROM social_profiles WHERE website_id = ?")
            .bind(website_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear stored social profiles")?;

        let now = Utc::now().to_rfc3339();
        for profile in profiles {
            sqlx::query(
                r#"
                INSERT INTO social_profiles
                    (website_id, platform, profile_url, username, verified,
                     created_at, updated_at)
                VALUES (?, ?, ?, ?, 0, ?, ?)
                "#,
            )
            .bind(website_id)
            .bind(&profile.platform)
            .bind(&profile.profile_url)
            .bind(&profile.username)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert social profile")?;
        }

        tx.commit()
            .await
            .context("Failed to commit social profile transaction")?;

        Ok(())
    }

    pub async fn list_for_website(&self, website_id: i64) -> Result<Vec<SocialProfile>> {
        let rows = sqlx::query(
            "SELECT * FROM social_profiles WHERE website_id = ? ORDER BY platform, id",
        )
        .bind(website_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list social profiles")?;

        Ok(rows.iter().map(row_to_profile).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<SocialProfile>> {
        let row = sqlx::query("SELECT * FROM social_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch social profile")?;

        Ok(row.as_ref().map(row_to_profile))
    }

    /// Applies the provided fields and stamps `updated_at`. Returns the
    /// updated row, or `None` when no such profile exists.
    pub async fn update(&self, id: i64, update: &SocialProfileUpdate) -> Result<Option<SocialProfile>> {
        // last_post_date needs a touch flag so an explicit null can clear it.
        let touch_last_post = update.last_post_date.is_some();
        let last_post = update
            .last_post_date
            .clone()
            .flatten()
            .map(|at| at.to_rfc3339());

        let result = sqlx::query(
            r#"
            UPDATE social_profiles SET
                followers_count = COALESCE(?, followers_count),
                following_count = COALESCE(?, following_count),
                posts_count = COALESCE(?, posts_count),
                engagement_rate = COALESCE(?, engagement_rate),
                verified = COALESCE(?, verified),
                last_post_date = CASE WHEN ? THEN ? ELSE last_post_date END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.followers_count)
        .bind(update.following_count)
        .bind(update.posts_count)
        .bind(update.engagement_rate)
        .bind(update.verified)
        .bind(touch_last_post)
        .bind(last_post)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update social profile")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM social_profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete social profile")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn platform_stats(&self) -> Result<Vec<PlatformStat>> {
        let rows = sqlx::query(
            r#"
            SELECT platform, COUNT(*) AS profile_count,
                   SUM(followers_count) AS total_followers,
                   AVG(engagement_rate) AS average_engagement
            FROM social_profiles
            GROUP BY platform
            ORDER BY platform
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute platform statistics")?;

        Ok(rows
            .iter()
            .map(|row| PlatformStat {
                platform: row.get("platform"),
                profile_count: row.get("profile_count"),
                total_followers: row.get::<Option<i64>, _>("total_followers").unwrap_or(0),
                average_engagement: row
                    .get::<Option<f64>, _>("average_engagement")
                    .map(round2)
                    .unwrap_or(0.0),
            })
            .collect())
    }

    pub async fn top_profiles(&self, limit: i64) -> Result<Vec<TopProfile>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.platform, p.username, p.followers_count,
                   p.engagement_rate, p.verified, w.domain
            FROM social_profiles p
            JOIN websites w ON w.id = p.website_id
            ORDER BY p.followers_count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch top social profiles")?;

        Ok(rows
            .iter()
            .map(|row| TopProfile {
                id: row.get("id"),
                platform: row.get("platform"),
                username: row.get("username"),
                domain: row.get("domain"),
                followers_count: row.get("followers_count"),
                engagement_rate: row
                    .get::<Option<f64>, _>("engagement_rate")
                    .unwrap_or(0.0),
                verified: row.get::<i64, _>("verified") != 0,
            })
            .collect())
    }

    pub async fn recent_profiles(&self, limit: i64) -> Result<Vec<RecentProfile>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.platform, p.username, p.updated_at, w.domain
            FROM social_profiles p
            JOIN websites w ON w.id = p.website_id
            ORDER BY p.updated_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recently updated social profiles")?;

        Ok(rows
            .iter()
            .map(|row| RecentProfile {
                id: row.get("id"),
                platform: row.get("platform"),
                username: row.get("username"),
                domain: row.get("domain"),
                updated_at: parse_datetime(row.get("updated_at")),
            })
            .collect())
    }
}

fn row_to_profile(row: &SqliteRow) -> SocialProfile {
    SocialProfile {
        id: row.get("id"),
        website_id: row.get("website_id"),
        platform: row.get("platform"),
        profile_url: row.get("profile_url"),
        username: row.get("username"),
        followers_count: row.get("followers_count"),
        following_count: row.get("following_count"),
        posts_count: row.get("posts_count"),
        engagement_rate: row.get("engagement_rate"),
        last_post_date: row
            .get::<Option<&str>, _>("last_post_date")
            .map(parse_datetime),
        verified: row.get::<i64, _>("verified") != 0,
        created_at: parse_datetime(row.get("created_at")),
        updated_at: parse_datetime(row.get("updated_at")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{seed_website, setup_test_db};

    fn discovered(platform: &str, username: &str) -> DiscoveredProfile {
        DiscoveredProfile {
            platform: platform.to_string(),
            profile_url: format!("https://{platform}.com/{username}"),
            username: Some(username.to_string()),
            discovered_via: "html_link".to_string(),
        }
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_profile_set() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = SocialRepository::new(pool);

        repo.replace_for_website(site_id, &[discovered("facebook", "example")])
            .await
            .unwrap();
        repo.replace_for_website(
            site_id,
            &[discovered("twitter", "example"), discovered("instagram", "example")],
        )
        .await
        .unwrap();

        let profiles = repo.list_for_website(site_id).await.unwrap();
        let platforms: Vec<&str> = profiles.iter().map(|p| p.platform.as_str()).collect();
        assert_eq!(platforms, vec!["instagram", "twitter"]);
        assert!(profiles.iter().all(|p| p.followers_count.is_none()));
        assert!(profiles.iter().all(|p| !p.verified));
    }

    #[tokio::test]
    async fn update_sets_metrics_and_null_clears_last_post() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = SocialRepository::new(pool);
        repo.replace_for_website(site_id, &[discovered("twitter", "example")])
            .await
            .unwrap();
        let id = repo.list_for_website(site_id).await.unwrap()[0].id;

        let update = SocialProfileUpdate {
            followers_count: Some(1500),
            engagement_rate: Some(3.2),
            verified: Some(true),
            last_post_date: Some(Some(Utc::now())),
            ..Default::default()
        };
        let updated = repo.update(id, &update).await.unwrap().unwrap();
        assert_eq!(updated.followers_count, Some(1500));
        assert_eq!(updated.engagement_rate, Some(3.2));
        assert!(updated.verified);
        assert!(updated.last_post_date.is_some());

        let cleared = repo
            .update(
                id,
                &SocialProfileUpdate {
                    last_post_date: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.last_post_date.is_none());
        assert_eq!(cleared.followers_count, Some(1500));
    }

    #[test]
    fn update_body_distinguishes_null_from_absent() {
        let with_null: SocialProfileUpdate =
            serde_json::from_str(r#"{"last_post_date": null, "followers_count": 10}"#).unwrap();
        assert_eq!(with_null.last_post_date, Some(None));
        assert_eq!(with_null.followers_count, Some(10));

        let absent: SocialProfileUpdate = serde_json::from_str(r#"{"verified": true}"#).unwrap();
        assert_eq!(absent.last_post_date, None);
        assert_eq!(absent.verified, Some(true));
    }

    #[tokio::test]
    async fn platform_stats_aggregate_across_websites() {
        let pool = setup_test_db().await;
        let first = seed_website(&pool, "example.com").await;
        let second = seed_website(&pool, "other.org").await;
        let repo = SocialRepository::new(pool);

        repo.replace_for_website(first, &[discovered("twitter", "example")])
            .await
            .unwrap();
        repo.replace_for_website(second, &[discovered("twitter", "other")])
            .await
            .unwrap();

        let first_id = repo.list_for_website(first).await.unwrap()[0].id;
        repo.update(
            first_id,
            &SocialProfileUpdate {
                followers_count: Some(12000),
                engagement_rate: Some(4.5),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = repo.platform_stats().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].platform, "twitter");
        assert_eq!(stats[0].profile_count, 2);
        assert_eq!(stats[0].total_followers, 12000);
        assert_eq!(stats[0].average_engagement, 4.5);

        let top = repo.top_profiles(10).await.unwrap();
        assert_eq!(top[0].domain, "example.com");
        assert_eq!(top[0].followers_count, Some(12000));

        let recent = repo.recent_profiles(20).await.unwrap();
        assert_eq!(recent.len(), 2);
    }
}
