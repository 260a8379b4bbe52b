pub mod analyzer;
pub mod audit_runner;
pub mod fetcher;
pub mod http;
pub mod leads;
pub mod plans;
pub mod probes;
pub mod report;
pub mod security;
pub mod social;
pub mod white_label;

pub use analyzer::PageAnalyzer;
pub use audit_runner::{normalize_url, AuditRunner};
pub use fetcher::{FetchedPage, PageFetcher};
pub use leads::LeadStore;
pub use probes::{ResourceProbe, SiteProbes};
pub use report::{ReportData, ReportFormat, ReportGenerator};
pub use security::SecurityAnalyzer;
pub use social::SocialAnalyzer;
pub use white_label::{WhiteLabelConfig, WhiteLabelStore};
