//! Content models served by the CMS.
//!
//! All models accept partial JSON (missing fields take their defaults) so
//! handlers can deserialize request bodies straight into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Record, RecordMeta};

/// Newsletter topics tracked by subscriber analytics.
pub const SUBSCRIPTION_TOPICS: [&str; 6] = [
    "Monthly Newsletter",
    "Weekly Election News Update (The Ballot)",
    "GenZ Blog Series",
    "Research, Reports, Policy Briefs & Knowledge Products",
    "Press Releases, Stories & Democracy Updates",
    "Opportunities: Events Webinars & Open Calls",
];

macro_rules! impl_record {
    ($ty:ty, $collection:literal $(, $field:ident => $value:expr)* $(,)?) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn meta(&self) -> &RecordMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut RecordMeta {
                &mut self.meta
            }

            #[allow(unused_variables)]
            fn unique_keys(&self) -> Vec<(&'static str, String)> {
                let this = self;
                vec![$((stringify!($field), ($value)(this))),*]
            }
        }
    };
}

const fn default_true() -> bool {
    true
}

/// Publication state of an announcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    /// Not yet visible.
    Draft,
    /// Visible on the public site.
    #[default]
    Published,
}

/// Site announcement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Announcement {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Headline.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Display date.
    pub date: String,
    /// Link target.
    pub link: String,
    /// Image URL.
    pub image: String,
    /// Publication state.
    pub status: PublishStatus,
    /// When it was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl_record!(Announcement, "announcements");

/// Blog or news item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    /// Blog post.
    #[default]
    Blog,
    /// News item.
    News,
}

/// Blog post or news item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Title.
    pub title: String,
    /// URL slug, unique.
    pub slug: String,
    /// Teaser text.
    pub excerpt: String,
    /// Rich-text body.
    pub content: String,
    /// Display date.
    pub date: String,
    /// Cover image URL.
    pub image: String,
    /// Author name.
    pub author: String,
    /// Category, e.g. "The Ballot".
    pub category: String,
    /// Featured on the landing page.
    #[serde(rename = "featured")]
    pub is_featured: bool,
    /// Blog or news.
    #[serde(rename = "type")]
    pub kind: PostType,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Author's role line.
    pub author_role: String,
    /// Optional PDF attachment.
    pub pdf_url: String,
    /// When it was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl_record!(BlogPost, "blog_posts", slug => |p: &BlogPost| p.slug.clone());

/// Headline figure shown on an initiative page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stat {
    /// Label.
    pub label: String,
    /// Value.
    pub value: String,
}

/// Programme or initiative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Initiative {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Title.
    pub title: String,
    /// URL slug, unique.
    pub slug: String,
    /// Category.
    pub category: String,
    /// Short description.
    pub description: String,
    /// Long description.
    pub full_description: String,
    /// Rich-text body.
    pub content: String,
    /// e.g. "Ongoing", "Completed".
    pub status: String,
    /// Location.
    pub location: String,
    /// Image URL.
    pub image: String,
    /// Activities list.
    pub activities: Vec<String>,
    /// Headline figures.
    pub stats: Vec<Stat>,
    /// Accent colour.
    pub color: String,
}

impl_record!(Initiative, "initiatives", slug => |i: &Initiative| i.slug.clone());

/// Downloadable report, toolkit, or video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// e.g. "PDF Report", "Video".
    #[serde(rename = "type")]
    pub kind: String,
    /// e.g. "Reports", "Toolkits".
    pub category: String,
    /// Download URL.
    pub file_url: String,
    /// Display size.
    pub file_size: String,
    /// Display download count, e.g. "2.5K".
    pub downloads: String,
    /// Display date.
    pub date: String,
    /// When it was published.
    pub published_at: Option<DateTime<Utc>>,
    /// Frontend icon name.
    pub icon: String,
}

impl_record!(Resource, "resources");

/// Job opening.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Title.
    pub title: String,
    /// Department.
    pub department: String,
    /// Location.
    pub location: String,
    /// e.g. "Full-time", "Contract".
    #[serde(rename = "type")]
    pub kind: String,
    /// Description.
    pub description: String,
    /// Requirements list.
    pub requirements: Vec<String>,
    /// Display posting date.
    pub posted: String,
    /// Whether the opening is listed publicly.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl_record!(Job, "jobs");

/// Moderation state of a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    /// Awaiting moderation.
    #[default]
    Pending,
    /// Visible under the post.
    Approved,
    /// Hidden.
    Rejected,
}

impl std::fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for CommentStatus {
    type Err = crate::validation::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(crate::validation::ValidationError::Invalid {
                field: "status",
                reason: format!("unknown comment status: {s}"),
            }),
        }
    }
}

/// Reader comment on a blog or news post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Comment text.
    pub content: String,
    /// Display name.
    pub author: String,
    /// Contact email.
    pub email: String,
    /// Post the comment belongs to.
    pub post_id: u64,
    /// Post title, copied for the moderation view.
    pub post_title: String,
    /// Moderation state.
    pub status: CommentStatus,
    /// Display date.
    pub date: String,
}

impl_record!(Comment, "comments");

/// Entry in the admin activity log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLog {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Action name.
    pub action: String,
    /// Details.
    pub details: String,
    /// Acting user id.
    pub user_id: String,
    /// Acting user name.
    pub user_name: String,
    /// Acting user role.
    pub user_role: String,
    /// Client address.
    pub ip_address: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl_record!(AuditLog, "audit_logs");

/// Triage state of a contact message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    /// Unread.
    #[default]
    New,
    /// Read.
    Read,
    /// Archived.
    Archived,
}

/// Contact form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: String,
    /// Subject.
    pub subject: String,
    /// Message body.
    pub message: String,
    /// Triage state.
    pub status: ContactStatus,
}

impl_record!(ContactMessage, "contact_messages");

/// Newsletter subscriber.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscriber {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Email, unique.
    pub email: String,
    /// Selected topics.
    pub subscriptions: Vec<String>,
    /// Whether the subscription is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// When the subscription was made.
    pub subscribed_at: Option<DateTime<Utc>>,
}

impl_record!(Subscriber, "subscribers", email => |s: &Subscriber| s.email.clone());

/// Hero banner content for one site page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroContent {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Page key, unique ("home", "about", ...).
    pub page: String,
    /// Title.
    pub title: String,
    /// Highlighted part of the title.
    pub title_highlight: String,
    /// Description.
    pub description: String,
    /// Primary call-to-action text.
    pub cta_text: String,
    /// Primary call-to-action link.
    pub cta_link: String,
    /// Secondary call-to-action text.
    pub second_cta_text: String,
    /// Secondary call-to-action link.
    pub second_cta_link: String,
    /// Background image URL.
    pub background_image: String,
}

impl_record!(HeroContent, "hero_content", page => |h: &HeroContent| h.page.clone());

/// Partner or supporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Partner {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Name.
    pub name: String,
    /// Logo URL.
    pub logo: String,
    /// Website.
    pub website: String,
}

impl_record!(Partner, "partners");

/// Badge of excellence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Badge {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Name.
    pub name: String,
    /// Image URL.
    pub image: String,
    /// Description.
    pub description: String,
}

impl_record!(Badge, "badges");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let job: Job = serde_json::from_str(r#"{"title": "Data Analyst"}"#).unwrap();
        assert_eq!(job.title, "Data Analyst");
        assert!(job.is_active);
        assert!(job.requirements.is_empty());

        let comment: Comment = serde_json::from_str(r#"{"content": "hi", "post_id": 3}"#).unwrap();
        assert_eq!(comment.status, CommentStatus::Pending);
        assert_eq!(comment.post_id, 3);
    }

    #[test]
    fn test_wire_names() {
        let mut post = BlogPost {
            title: "Ballot".to_string(),
            kind: PostType::News,
            is_featured: true,
            ..Default::default()
        };
        post.meta.id = 7;

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["type"], "news");
        assert_eq!(json["featured"], true);
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn test_unique_keys() {
        let hero = HeroContent {
            page: "home".to_string(),
            ..Default::default()
        };
        assert_eq!(hero.unique_keys(), vec![("page", "home".to_string())]);
        assert!(Partner::default().unique_keys().is_empty());
    }

    #[test]
    fn test_comment_status_parse() {
        assert_eq!("approved".parse::<CommentStatus>().unwrap(), CommentStatus::Approved);
        assert!("spam".parse::<CommentStatus>().is_err());
        assert_eq!(CommentStatus::Rejected.to_string(), "rejected");
    }
}
