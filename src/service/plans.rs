//! Subscription plan catalog served by /api/payment/plans.

use serde_json::{json, Value};

pub fn plan_catalog() -> Value {
    json!({
        "starter": {
            "name": "Starter",
            "description": "Perfect for small businesses and freelancers",
            "monthly_price": 29,
            "annual_price": 290,
            "features": [
                "10 SEO audits per month",
                "Basic backlink monitoring",
                "Social media analysis",
                "Security scanning",
                "Email support",
                "PDF reports"
            ],
            "limits": {
                "audits_per_month": 10,
                "backlink_checks": 100,
                "reports_per_month": 10,
            },
        },
        "professional": {
            "name": "Professional",
            "description": "Ideal for agencies and growing businesses",
            "monthly_price": 79,
            "annual_price": 790,
            "features": [
                "50 SEO audits per month",
                "Advanced backlink monitoring",
                "Competitor analysis",
                "White-label reports",
                "Priority support",
                "API access",
                "Custom branding",
                "Team collaboration"
            ],
            "limits": {
                "audits_per_month": 50,
                "backlink_checks": 1000,
                "reports_per_month": 50,
                "team_members": 5,
            },
        },
        "enterprise": {
            "name": "Enterprise",
            "description": "For large organizations with custom needs",
            "monthly_price": 199,
            "annual_price": 1990,
            "features": [
                "Unlimited SEO audits",
                "Advanced competitor tracking",
                "Custom integrations",
                "Dedicated account manager",
                "SLA guarantee",
                "Custom reporting",
                "Advanced analytics",
                "Phone support"
            ],
            // -1 reads as unlimited
            "limits": {
                "audits_per_month": -1,
                "backlink_checks": -1,
                "reports_per_month": -1,
                "team_members": -1,
            },
        },
    })
}

pub fn plan(plan_id: &str) -> Option<Value> {
    plan_catalog().get(plan_id).cloned()
}

/// Price for a plan and billing cycle; unknown plans cost nothing.
pub fn plan_price(plan_id: &str, billing_cycle: &str) -> f64 {
    let Some(plan) = plan(plan_id) else {
        return 0.0;
    };
    let key = if billing_cycle == "annual" {
        "annual_price"
    } else {
        "monthly_price"
    };
    plan[key].as_f64().unwrap_or(0.0)
}

/// Yearly savings of annual billing over twelve monthly payments.
pub fn annual_savings(plan_id: &str) -> f64 {
    let Some(plan) = plan(plan_id) else {
        return 0.0;
    };
    let monthly = plan["monthly_price"].as_f64().unwrap_or(0.0);
    let annual = plan["annual_price"].as_f64().unwrap_or(0.0);
    monthly * 12.0 - annual
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_three_tiers() {
        let plans = plan_catalog();
        assert_eq!(plans["starter"]["monthly_price"], json!(29));
        assert_eq!(plans["professional"]["annual_price"], json!(790));
        assert_eq!(
            plans["enterprise"]["features"].as_array().unwrap().len(),
            8
        );
        assert_eq!(
            plans["starter"]["description"],
            json!("Perfect for small businesses and freelancers")
        );
        assert_eq!(plans["enterprise"]["limits"]["audits_per_month"], json!(-1));
    }

    #[test]
    fn prices_follow_billing_cycle() {
        assert_eq!(plan_price("starter", "monthly"), 29.0);
        assert_eq!(plan_price("starter", "annual"), 290.0);
        assert_eq!(plan_price("missing", "monthly"), 0.0);
    }

    #[test]
    fn annual_billing_saves_two_months() {
        assert_eq!(annual_savings("professional"), 79.0 * 12.0 - 790.0);
        assert_eq!(annual_savings("missing"), 0.0);
    }
}
