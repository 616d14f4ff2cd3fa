//! Workflow templates.
//!
//! Each template builds a complete graph for one automation pattern on newly
//! posted content. Templates never validate their output; callers run
//! [`validate`](crate::workflow::validate) before handing a graph on.

use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::workflow::reference::{interpolate, reference, trigger_output, var_path};
use crate::workflow::{
    new_action_id, Action, Edge, Inputs, Trigger, WorkflowGraph, IF_KIND, LOOP_KIND,
};

const SLACK_MESSAGE: &str = "slack_send_channel_message";
const HTTP_REQUEST: &str = "http_request";
const GET_SENTIMENT: &str = "get_sentiment";
const PERSON_ENRICHMENT: &str = "person_enrichment";
const POST_LIKES: &str = "linkedin_get_post_likes";

/// Default HTTP method for `webhook-forward`.
pub const DEFAULT_HTTP_METHOD: &str = "POST";

/// Number of likers fetched by `competitor-engagement`.
const LIKES_LIMIT: u64 = 50;

fn inputs(value: serde_json::Value) -> Inputs {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Inputs::new(),
    }
}

/// Send every new post to a Slack channel.
///
/// Trigger -> Slack Channel Message
pub fn slack_notification(channel: &str, message: &str) -> WorkflowGraph {
    let action_id = new_action_id("slack");

    WorkflowGraph {
        trigger: Trigger::new_post(),
        actions: vec![Action::new(
            &action_id,
            SLACK_MESSAGE,
            "Send Slack Notification",
            inputs(json!({
                "channel": channel,
                "message": message,
            })),
        )],
        edges: vec![Edge::from_trigger(&action_id)],
    }
}

/// Payload posted by `webhook-forward`, fields in wire order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ForwardBody {
    text: String,
    author_url: String,
    post_url: String,
    source: String,
}

/// JSON formatter writing `", "` and `": "` separators on one line.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        writer.write_all(b": ")
    }
}

fn to_spaced_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Forward every new post to an external webhook.
///
/// Trigger -> HTTP Request
pub fn webhook_forward(url: &str, method: &str) -> WorkflowGraph {
    let action_id = new_action_id("http");

    let body = ForwardBody {
        text: trigger_output("text"),
        author_url: trigger_output("authorUrl"),
        post_url: trigger_output("postUrl"),
        source: trigger_output("source"),
    };
    // A struct of plain strings written to memory cannot fail to serialize.
    let body = to_spaced_json(&body).unwrap_or_default();

    WorkflowGraph {
        trigger: Trigger::new_post(),
        actions: vec![Action::new(
            &action_id,
            HTTP_REQUEST,
            "Forward to Webhook",
            inputs(json!({
                "method": method,
                "url": url,
                "body": body,
            })),
        )],
        edges: vec![Edge::from_trigger(&action_id)],
    }
}

/// Route posts to one of two Slack channels by sentiment.
///
/// Trigger -> Sentiment -> IF -> Slack (positive) / Slack (negative)
pub fn sentiment_filter(positive_channel: &str, negative_channel: &str) -> WorkflowGraph {
    let sentiment_id = new_action_id("sentiment");
    let if_id = new_action_id("if");
    let positive_id = new_action_id("slack_pos");
    let negative_id = new_action_id("slack_neg");

    let text = trigger_output("text");
    let post_url = trigger_output("postUrl");

    let actions = vec![
        Action::new(
            &sentiment_id,
            GET_SENTIMENT,
            "Analyze Sentiment",
            inputs(json!({
                "body": text,
                "outputFormat": "text",
            })),
        ),
        Action::new(
            &if_id,
            IF_KIND,
            "Check Sentiment",
            inputs(json!({
                "condition": {
                    "==": [
                        { "var": var_path(&[sentiment_id.as_str(), "output", "result", "sentiment"]) },
                        "positive"
                    ]
                }
            })),
        ),
        Action::new(
            &positive_id,
            SLACK_MESSAGE,
            "Send to Positive Channel",
            inputs(json!({
                "channel": positive_channel,
                "message": format!("Positive post found!\n\n{}\n\nLink: {}", text, post_url),
            })),
        ),
        Action::new(
            &negative_id,
            SLACK_MESSAGE,
            "Send to Negative Channel",
            inputs(json!({
                "channel": negative_channel,
                "message": format!("Negative post needs review:\n\n{}\n\nLink: {}", text, post_url),
            })),
        ),
    ];

    let edges = vec![
        Edge::from_trigger(&sentiment_id),
        Edge::new(&sentiment_id, &if_id),
        Edge::labeled(&if_id, &positive_id, "True"),
        Edge::labeled(&if_id, &negative_id, "False"),
    ];

    WorkflowGraph {
        trigger: Trigger::new_post(),
        actions,
        edges,
    }
}

/// CRMs supported by `lead-enrich`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crm {
    Hubspot,
    Salesforce,
    Attio,
}

impl Crm {
    pub const ALL: [Crm; 3] = [Crm::Hubspot, Crm::Salesforce, Crm::Attio];

    /// Selector accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Crm::Hubspot => "hubspot",
            Crm::Salesforce => "salesforce",
            Crm::Attio => "attio",
        }
    }

    /// Action kind that creates a contact in this CRM.
    pub fn action_kind(self) -> &'static str {
        match self {
            Crm::Hubspot => "hubspot_create_contact",
            Crm::Salesforce => "salesforce_create_contact",
            Crm::Attio => "attio_create_contact",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Crm::Hubspot => "Hubspot",
            Crm::Salesforce => "Salesforce",
            Crm::Attio => "Attio",
        }
    }
}

impl FromStr for Crm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        Crm::ALL
            .into_iter()
            .find(|crm| crm.as_str() == lower)
            .ok_or_else(|| Error::UnsupportedCrm(s.to_string()))
    }
}

/// Enrich post authors and add them to a CRM.
///
/// Trigger -> Person Enrichment -> CRM Contact
///
/// Fails with [`Error::UnsupportedCrm`] before building anything if `crm`
/// is not one of hubspot, salesforce, attio (case-insensitive).
pub fn lead_enrich(crm: &str) -> Result<WorkflowGraph> {
    let crm: Crm = crm.parse()?;

    let enrich_id = new_action_id("enrich");
    let crm_id = new_action_id("crm");
    let author_url = trigger_output("authorUrl");
    let enriched = |field: &str| interpolate(&[enrich_id.as_str(), "output", "result", field]);

    let actions = vec![
        Action::new(
            &enrich_id,
            PERSON_ENRICHMENT,
            "Enrich Person",
            inputs(json!({ "linkedinUrl": author_url })),
        ),
        Action::new(
            &crm_id,
            crm.action_kind(),
            format!("Add to {}", crm.display_name()),
            inputs(json!({
                "firstName": enriched("firstName"),
                "lastName": enriched("lastName"),
                "email": enriched("email"),
                "linkedinUrl": author_url,
            })),
        ),
    ];

    Ok(WorkflowGraph {
        trigger: Trigger::new_post(),
        actions,
        edges: vec![Edge::from_trigger(&enrich_id), Edge::new(&enrich_id, &crm_id)],
    })
}

/// Enrich everyone who liked a post, then post a summary to Slack.
///
/// Trigger -> Get Likes -> Loop -> Person Enrichment (per item)
///                              -> Slack Summary (completed)
///
/// The per-item branch ends at the enrichment action; the platform drives
/// the iteration itself.
pub fn competitor_engagement(slack_channel: &str) -> WorkflowGraph {
    let likes_id = new_action_id("likes");
    let loop_id = new_action_id("loop");
    let enrich_id = new_action_id("enrich");
    let slack_id = new_action_id("slack");

    let actions = vec![
        Action::new(
            &likes_id,
            POST_LIKES,
            "Get Post Likes",
            inputs(json!({
                "postUrl": trigger_output("postUrl"),
                "limit": LIKES_LIMIT,
            })),
        ),
        Action::new(
            &loop_id,
            LOOP_KIND,
            "Loop Through Likers",
            inputs(json!({
                "collection": reference(&[likes_id.as_str(), "output", "result", "likes"]),
            })),
        ),
        Action::new(
            &enrich_id,
            PERSON_ENRICHMENT,
            "Enrich Liker",
            inputs(json!({
                "linkedinUrl": interpolate(&[loop_id.as_str(), "currentItem", "profileUrl"]),
            })),
        ),
        Action::new(
            &slack_id,
            SLACK_MESSAGE,
            "Send Summary",
            inputs(json!({
                "channel": slack_channel,
                "message": format!(
                    "Competitor engagement analysis complete.\n\nPost: {}\nTotal likers analyzed: {}",
                    trigger_output("postUrl"),
                    interpolate(&[loop_id.as_str(), "output", "totalItems"]),
                ),
            })),
        ),
    ];

    let edges = vec![
        Edge::from_trigger(&likes_id),
        Edge::new(&likes_id, &loop_id),
        Edge::labeled(&loop_id, &enrich_id, "For Each Item"),
        Edge::labeled(&loop_id, &slack_id, "Completed"),
    ];

    WorkflowGraph {
        trigger: Trigger::new_post(),
        actions,
        edges,
    }
}

/// Which constructor a template dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    SlackNotification,
    WebhookForward,
    SentimentFilter,
    LeadEnrich,
    CompetitorEngagement,
}

/// A template with its parameter contract.
#[derive(Debug, Clone)]
pub struct Template {
    /// Template name (e.g., "sentiment-filter")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Category for organization (e.g., "notifications", "enrichment")
    pub category: String,

    /// Parameters the template accepts
    pub parameters: Vec<TemplateParameter>,

    pub kind: TemplateKind,
}

/// A parameter accepted by a template.
#[derive(Debug, Clone)]
pub struct TemplateParameter {
    /// Parameter name, also used as the CLI flag name
    pub name: String,

    pub description: String,

    pub required: bool,

    /// Value used when the parameter is absent
    pub default: Option<String>,

    /// Closed set of accepted values, empty when any value is accepted
    pub choices: Vec<String>,
}

impl TemplateParameter {
    fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            default: None,
            choices: Vec::new(),
        }
    }

    fn optional(name: &str, description: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            default: Some(default.to_string()),
            choices: Vec::new(),
        }
    }

    fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Registry of the built-in templates.
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a registry with the built-in templates.
    pub fn new() -> Self {
        let mut registry = Self {
            templates: HashMap::new(),
        };
        registry.register_builtin_templates(DEFAULT_HTTP_METHOD);
        registry
    }

    /// Create a registry whose `webhook-forward` defaults to `method`.
    pub fn with_http_method(method: &str) -> Self {
        let mut registry = Self {
            templates: HashMap::new(),
        };
        registry.register_builtin_templates(method);
        registry
    }

    fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    fn register_builtin_templates(&mut self, http_method: &str) {
        self.register(Template {
            name: "slack-notification".to_string(),
            description: "Simple notification to Slack channel".to_string(),
            category: "notifications".to_string(),
            parameters: vec![
                TemplateParameter::required("channel", "Slack channel to post to"),
                TemplateParameter::required("message", "Message to send"),
            ],
            kind: TemplateKind::SlackNotification,
        });

        self.register(Template {
            name: "webhook-forward".to_string(),
            description: "Forward posts to external webhook".to_string(),
            category: "integrations".to_string(),
            parameters: vec![
                TemplateParameter::required("url", "Webhook URL"),
                TemplateParameter::optional("method", "HTTP method", http_method),
            ],
            kind: TemplateKind::WebhookForward,
        });

        self.register(Template {
            name: "sentiment-filter".to_string(),
            description: "Route posts by sentiment to different channels".to_string(),
            category: "notifications".to_string(),
            parameters: vec![
                TemplateParameter::required("positive-channel", "Channel for positive posts"),
                TemplateParameter::required("negative-channel", "Channel for negative posts"),
            ],
            kind: TemplateKind::SentimentFilter,
        });

        let crms: Vec<&str> = Crm::ALL.iter().map(|c| c.as_str()).collect();
        self.register(Template {
            name: "lead-enrich".to_string(),
            description: "Enrich post authors and add to CRM".to_string(),
            category: "enrichment".to_string(),
            parameters: vec![
                TemplateParameter::required("crm", "CRM to add contacts to").with_choices(&crms),
            ],
            kind: TemplateKind::LeadEnrich,
        });

        self.register(Template {
            name: "competitor-engagement".to_string(),
            description: "Analyze engagement on competitor posts".to_string(),
            category: "enrichment".to_string(),
            parameters: vec![TemplateParameter::required(
                "slack-channel",
                "Slack channel for the summary",
            )],
            kind: TemplateKind::CompetitorEngagement,
        });
    }

    /// List all templates, sorted by name.
    pub fn list(&self) -> Vec<&Template> {
        let mut templates: Vec<_> = self.templates.values().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates
    }

    /// List templates by category.
    pub fn list_by_category(&self) -> HashMap<String, Vec<&Template>> {
        let mut by_category: HashMap<String, Vec<&Template>> = HashMap::new();
        for template in self.templates.values() {
            let category = if template.category.is_empty() {
                "other".to_string()
            } else {
                template.category.clone()
            };
            by_category.entry(category).or_default().push(template);
        }

        for templates in by_category.values_mut() {
            templates.sort_by(|a, b| a.name.cmp(&b.name));
        }

        by_category
    }

    /// Get a template by name.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Names of required parameters that are absent or empty.
    pub fn missing_parameters(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Vec<String>> {
        let template = self
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?;

        Ok(template
            .parameters
            .iter()
            .filter(|p| p.required && p.default.is_none() && lookup(params, &p.name).is_none())
            .map(|p| p.name.clone())
            .collect())
    }

    /// Build a graph from a template and its parameters.
    pub fn instantiate(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<WorkflowGraph> {
        let template = self
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?;

        let missing = self.missing_parameters(name, params)?;
        if !missing.is_empty() {
            return Err(Error::MissingParameter {
                template: name.to_string(),
                parameters: missing,
            });
        }

        // Every required parameter is present past this point; defaults fill the rest.
        let mut resolved: HashMap<&str, &str> = HashMap::new();
        for p in &template.parameters {
            if let Some(value) = lookup(params, &p.name).or(p.default.as_deref()) {
                resolved.insert(p.name.as_str(), value);
            }
        }
        let arg = |key: &str| resolved.get(key).copied().unwrap_or_default();

        let graph = match template.kind {
            TemplateKind::SlackNotification => slack_notification(arg("channel"), arg("message")),
            TemplateKind::WebhookForward => webhook_forward(arg("url"), arg("method")),
            TemplateKind::SentimentFilter => {
                sentiment_filter(arg("positive-channel"), arg("negative-channel"))
            }
            TemplateKind::LeadEnrich => lead_enrich(arg("crm"))?,
            TemplateKind::CompetitorEngagement => competitor_engagement(arg("slack-channel")),
        };

        debug!(
            template = name,
            actions = graph.actions.len(),
            edges = graph.edges.len(),
            "instantiated template"
        );

        Ok(graph)
    }
}

fn lookup<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.as_str())
        .filter(|v| !v.trim().is_empty())
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
