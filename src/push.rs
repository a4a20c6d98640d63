//! Push-notification payloads and the action buttons shown for each type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PushData {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub circle_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub data: PushData,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationAction {
    pub action: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub tag: String,
    pub url: String,
    pub actions: Vec<NotificationAction>,
}

pub const DEFAULT_ICON: &str = "/static/icon-192.png";

const fn action(action: &'static str, title: &'static str) -> NotificationAction {
    NotificationAction { action, title }
}

pub fn actions_for(kind: &str) -> Vec<NotificationAction> {
    match kind {
        "fast_complete" => vec![
            action("view", "View results"),
            action("start_new", "Start new fast"),
        ],
        "zone_change" | "milestone" => vec![action("view", "View progress")],
        "hydration_reminder" => vec![action("log_water", "Log water"), action("snooze", "Snooze")],
        "checkin_reminder" => vec![action("checkin", "Check in")],
        "circle_activity" => vec![action("open_circle", "Open circle")],
        _ => Vec::new(),
    }
}

fn default_url(kind: &str, data: &PushData) -> String {
    match kind {
        "hydration_reminder" | "checkin_reminder" => "/?tab=tracking".to_string(),
        "circle_activity" => match &data.circle_id {
            Some(id) => format!("/?tab=social&circle={id}"),
            None => "/?tab=social".to_string(),
        },
        "fast_complete" | "zone_change" | "milestone" => "/?tab=timer".to_string(),
        _ => "/".to_string(),
    }
}

pub fn render(payload: PushPayload) -> Notification {
    let kind = payload.data.kind.clone().unwrap_or_default();
    let url = payload
        .data
        .url
        .clone()
        .unwrap_or_else(|| default_url(&kind, &payload.data));
    Notification {
        actions: actions_for(&kind),
        tag: payload.tag.unwrap_or_else(|| {
            if kind.is_empty() {
                "general".to_string()
            } else {
                kind
            }
        }),
        icon: payload.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
        title: payload.title,
        body: payload.body,
        url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: Option<&str>) -> PushPayload {
        PushPayload {
            title: "Fast complete".into(),
            body: "You hit 16 hours".into(),
            icon: None,
            tag: None,
            data: PushData {
                kind: kind.map(str::to_string),
                ..PushData::default()
            },
        }
    }

    #[test]
    fn known_types_get_actions() {
        let rendered = render(payload(Some("fast_complete")));
        let names: Vec<_> = rendered.actions.iter().map(|a| a.action).collect();
        assert_eq!(names, vec!["view", "start_new"]);
        assert_eq!(rendered.tag, "fast_complete");
        assert_eq!(rendered.icon, DEFAULT_ICON);
        assert_eq!(rendered.url, "/?tab=timer");
        assert_eq!(actions_for("hydration_reminder").len(), 2);
    }

    #[test]
    fn unknown_or_missing_type_has_no_actions() {
        assert!(render(payload(Some("marketing"))).actions.is_empty());
        let rendered = render(payload(None));
        assert!(rendered.actions.is_empty());
        assert_eq!(rendered.tag, "general");
        assert_eq!(rendered.url, "/");
    }

    #[test]
    fn payload_parses_type_field() {
        let body = r#"{"title":"Circle","body":"Ana started a fast",
            "data":{"type":"circle_activity","circle_id":"12"}}"#;
        let parsed: PushPayload = serde_json::from_str(body).unwrap();
        let rendered = render(parsed);
        assert_eq!(rendered.url, "/?tab=social&circle=12");
        assert_eq!(rendered.actions[0].action, "open_circle");
    }
}
