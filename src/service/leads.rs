//! File-backed lead capture behind /api/optimization/leads.
//!
//! Leads live in one JSON file keyed by id. Repeat captures for the same
//! email merge into the existing record instead of creating a new one.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use crate::domain::round2;

const SOURCE_SCORES: [(&str, i64); 8] = [
    ("audit_form", 50),
    ("pricing_page", 70),
    ("contact_form", 60),
    ("newsletter", 30),
    ("free_trial", 80),
    ("demo_request", 90),
    ("whitepaper_download", 40),
    ("webinar_signup", 65),
];

const RELEVANT_INDUSTRIES: [&str; 5] = [
    "marketing",
    "advertising",
    "digital agency",
    "seo",
    "web development",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub email: String,
    pub source: String,
    pub status: String,
    pub metadata: Value,
    pub created_at: String,
    pub updated_at: String,
    pub last_contact: Option<String>,
    pub conversion_score: i64,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Value>,
}

pub struct LeadStore {
    path: PathBuf,
    leads: Mutex<BTreeMap<String, Lead>>,
}

impl LeadStore {
    /// Opens the store, treating a missing or unreadable file as empty.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create lead store directory")?;
        }

        let leads = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_default(),
            Err(_) => BTreeMap::new(),
        };

        Ok(Self {
            path,
            leads: Mutex::new(leads),
        })
    }

    /// New lead, or a merge when the email (case-insensitive) already exists:
    /// source replaced, metadata keys folded in, score keeps the maximum,
    /// tags unioned. Id and created_at never change on merge.
    pub async fn capture(
        &self,
        email: &str,
        source: &str,
        metadata: Option<Value>,
    ) -> anyhow::Result<Lead> {
        let mut leads = self.leads.lock().await;

        let score = conversion_score(source, metadata.as_ref());
        let tags = lead_tags(source, metadata.as_ref());
        let now = Utc::now().to_rfc3339();

        if let Some(existing) = leads
            .values_mut()
            .find(|lead| lead.email.eq_ignore_ascii_case(email))
        {
            existing.source = source.to_string();
            if let (Value::Object(merged), Some(Value::Object(incoming))) =
                (&mut existing.metadata, metadata.as_ref())
            {
                for (key, value) in incoming {
                    merged.insert(key.clone(), value.clone());
                }
            }
            existing.updated_at = now;
            existing.conversion_score = existing.conversion_score.max(score);
            for tag in tags {
                if !existing.tags.contains(&tag) {
                    existing.tags.push(tag);
                }
            }

            let merged = existing.clone();
            self.persist(&leads).await?;
            tracing::info!(lead_id = merged.id, source, "merged repeat lead");
            return Ok(merged);
        }

        let id = leads.values().map(|lead| lead.id).max().unwrap_or(0) + 1;
        let lead = Lead {
            id,
            email: email.to_string(),
            source: source.to_string(),
            status: "new".to_string(),
            metadata: metadata.unwrap_or_else(|| json!({})),
            created_at: now.clone(),
            updated_at: now,
            last_contact: None,
            conversion_score: score,
            tags,
            notes: Vec::new(),
        };

        leads.insert(id.to_string(), lead.clone());
        self.persist(&leads).await?;
        tracing::info!(lead_id = id, source, "captured lead");
        Ok(lead)
    }

    /// Returns false when the id is unknown. The status value is stored as
    /// given; an optional note is appended with its own timestamp.
    pub async fn update_status(
        &self,
        lead_id: i64,
        status: &str,
        notes: Option<&str>,
    ) -> anyhow::Result<bool> {
        let mut leads = self.leads.lock().await;

        let Some(lead) = leads.get_mut(&lead_id.to_string()) else {
            return Ok(false);
        };

        lead.status = status.to_string();
        lead.updated_at = Utc::now().to_rfc3339();
        if let Some(note) = notes {
            lead.notes.push(json!({
                "note": note,
                "created_at": Utc::now().to_rfc3339(),
            }));
        }

        self.persist(&leads).await?;
        Ok(true)
    }

    /// Filtered list, best leads first (score, then recency).
    pub async fn list(
        &self,
        status: Option<&str>,
        source: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<Lead> {
        let leads = self.leads.lock().await;

        let mut list: Vec<Lead> = leads
            .values()
            .filter(|lead| status.map_or(true, |s| lead.status == s))
            .filter(|lead| source.map_or(true, |s| lead.source == s))
            .cloned()
            .collect();

        list.sort_by_key(|lead| lead.id);
        list.sort_by(|a, b| {
            (b.conversion_score, b.created_at.as_str())
                .cmp(&(a.conversion_score, a.created_at.as_str()))
        });

        if let Some(limit) = limit {
            list.truncate(limit);
        }
        list
    }

    pub async fn analytics(&self) -> Value {
        let leads = self.leads.lock().await;

        let total = leads.len();
        if total == 0 {
            return json!({
                "total_leads": 0,
                "conversion_rate": 0,
                "avg_conversion_score": 0,
                "leads_by_source": {},
                "leads_by_status": {},
                "current_month_leads": 0,
                "high_value_leads": 0,
            });
        }

        let converted = leads
            .values()
            .filter(|lead| lead.status == "converted")
            .count();
        let score_sum: i64 = leads.values().map(|lead| lead.conversion_score).sum();

        let mut by_source = Map::new();
        let mut by_status = Map::new();
        for lead in leads.values() {
            let source = by_source.entry(lead.source.clone()).or_insert(json!(0));
            *source = json!(source.as_i64().unwrap_or(0) + 1);
            let status = by_status.entry(lead.status.clone()).or_insert(json!(0));
            *status = json!(status.as_i64().unwrap_or(0) + 1);
        }

        let month_prefix = Utc::now().format("%Y-%m").to_string();
        let current_month = leads
            .values()
            .filter(|lead| lead.created_at.starts_with(&month_prefix))
            .count();
        let high_value = leads
            .values()
            .filter(|lead| lead.conversion_score >= 70)
            .count();

        json!({
            "total_leads": total,
            "conversion_rate": round2(converted as f64 / total as f64 * 100.0),
            "avg_conversion_score": round2(score_sum as f64 / total as f64),
            "leads_by_source": by_source,
            "leads_by_status": by_status,
            "current_month_leads": current_month,
            "high_value_leads": high_value,
        })
    }

    async fn persist(&self, leads: &BTreeMap<String, Lead>) -> anyhow::Result<()> {
        let payload =
            serde_json::to_string_pretty(leads).context("Failed to serialize leads file")?;
        tokio::fs::write(&self.path, payload)
            .await
            .context("Failed to write leads file")?;
        Ok(())
    }
}

/// Score 0..=100 from the capture source plus buying-intent metadata.
pub fn conversion_score(source: &str, metadata: Option<&Value>) -> i64 {
    let mut score = SOURCE_SCORES
        .into_iter()
        .find(|(name, _)| *name == source)
        .map(|(_, base)| base)
        .unwrap_or(25);

    if let Some(metadata) = metadata {
        let field = |key: &str| metadata.get(key).and_then(Value::as_str).unwrap_or("");

        if matches!(field("company_size"), "51-200" | "201-500" | "500+") {
            score += 20;
        }

        let industry = field("industry").to_lowercase();
        if RELEVANT_INDUSTRIES.iter().any(|i| industry.contains(i)) {
            score += 15;
        }

        if matches!(field("budget"), "$1000-5000" | "$5000+") {
            score += 25;
        }

        if matches!(field("urgency"), "immediate" | "within_month") {
            score += 20;
        }

        let traffic = metadata
            .get("monthly_traffic")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        if traffic > 10_000.0 {
            score += 10;
        }
    }

    score.min(100)
}

/// Categorization tags: the source plus sanitized metadata values.
pub fn lead_tags(source: &str, metadata: Option<&Value>) -> Vec<String> {
    let mut tags = vec![source.to_string()];

    let Some(metadata) = metadata else {
        return tags;
    };
    let field = |key: &str| {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    };

    if let Some(size) = field("company_size") {
        tags.push(format!(
            "company_{}",
            size.replace('-', "_").replace('+', "plus")
        ));
    }
    if let Some(industry) = field("industry") {
        tags.push(format!(
            "industry_{}",
            industry.to_lowercase().replace(' ', "_")
        ));
    }
    if let Some(budget) = field("budget") {
        tags.push(format!(
            "budget_{}",
            budget
                .replace('$', "")
                .replace('-', "_")
                .replace('+', "plus")
        ));
    }
    if let Some(urgency) = field("urgency") {
        tags.push(format!("urgency_{urgency}"));
    }

    tags
}
