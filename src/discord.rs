//! Renders status groups into discord webhook messages.
//!
//! Each status group becomes one [WebhookMessage], each alert of the group one
//! [Embed] inside it.

use std::fmt::Write;

use serde::Serialize;

use crate::alert::Alert;

/// display name of the webhook user
pub const USERNAME: &str = "Prometheus";
/// avatar of the webhook user
pub const AVATAR_URL: &str = "https://avatars1.githubusercontent.com/u/3380462?s=200&v=4";

/// author icon of firing alerts
const FIRING_ICON_URL: &str = "https://www.iconfinder.com/icons/116853/download/png/128";
/// author icon of every other alert
const RESOLVED_ICON_URL: &str = "https://www.iconfinder.com/icons/2682848/download/png/128";

/// name of the embed field listing the labels
pub const LABELS_FIELD_NAME: &str = "Labels:";

/// How an alert status is presented. Anything that isn't firing is shown as
/// resolved, including statuses alertmanager doesn't send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
	Firing,
	Resolved,
}

impl Presentation {
	pub fn of(status: &str) -> Self {
		if status.to_uppercase() == "FIRING" {
			Self::Firing
		} else {
			Self::Resolved
		}
	}

	/// metric label, bounded to the two presentations
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Firing => "firing",
			Self::Resolved => "resolved",
		}
	}

	pub fn icon_url(self) -> &'static str {
		match self {
			Self::Firing => FIRING_ICON_URL,
			Self::Resolved => RESOLVED_ICON_URL,
		}
	}

	/// embed color, discord renders 0 as the default color and 255 as blue
	pub fn color(self) -> u32 {
		match self {
			Self::Firing => 0,
			Self::Resolved => 255,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// body of a discord webhook execution
pub struct WebhookMessage {
	pub content: String,
	pub username: String,
	pub avatar_url: String,
	pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
	pub title: String,
	pub author: Author,
	pub description: String,
	pub fields: Vec<Field>,
	pub color: u32,
	pub footer: Footer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
	pub name: String,
	pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
	pub name: String,
	pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Footer {
	pub text: String,
}

// TODO: discord rejects messages with more than 10 embeds, split larger status
// groups over several messages
/// Builds the message for one status group.
///
/// # Arguments
///
/// * `status` - the status shared by all `alerts`
///
/// * `alerts` - the alerts of the group, one embed is rendered per alert in
///   the given order
pub fn build_message(status: &str, alerts: &[Alert]) -> WebhookMessage {
	let presentation = Presentation::of(status);
	let badge = status.to_uppercase();

	WebhookMessage {
		content: String::new(),
		username: USERNAME.to_owned(),
		avatar_url: AVATAR_URL.to_owned(),
		embeds: alerts.iter().map(|alert| render_embed(alert, &badge, presentation)).collect(),
	}
}

fn render_embed(alert: &Alert, badge: &str, presentation: Presentation) -> Embed {
	Embed {
		title: format!("**{}**", alert.summary()),
		author: Author { name: badge.to_owned(), icon_url: presentation.icon_url().to_owned() },
		description: alert.description().to_owned(),
		fields: vec![Field { name: LABELS_FIELD_NAME.to_owned(), value: render_labels(alert) }],
		color: presentation.color(),
		footer: Footer::default(),
	}
}

/// one `**key:** value` line per label, sorted by key
fn render_labels(alert: &Alert) -> String {
	alert.labels.iter().fold(String::new(), |mut value, (key, label)| {
		// writing into a String can't fail
		let _ = writeln!(value, "**{key}:** {label}");
		value
	})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::alert::Data;

	fn alert(status: &str, summary: &str) -> Alert {
		Alert {
			status: status.to_owned(),
			labels: [("alertname".to_owned(), "HighCPU".to_owned()), ("severity".to_owned(), "page".to_owned())]
				.into_iter()
				.collect(),
			annotations: [("summary".to_owned(), summary.to_owned())].into_iter().collect(),
			..Alert::default()
		}
	}

	#[test]
	fn classifies_status_case_insensitively() {
		for status in ["firing", "FIRING"] {
			let message = build_message(status, &[alert(status, "x")]);
			assert_eq!(message.embeds[0].color, 0);
			assert_eq!(message.embeds[0].author.icon_url, FIRING_ICON_URL);
		}

		for status in ["resolved", "flapping"] {
			let message = build_message(status, &[alert(status, "x")]);
			assert_eq!(message.embeds[0].color, 255);
			assert_eq!(message.embeds[0].author.icon_url, RESOLVED_ICON_URL);
		}
	}

	#[test]
	fn badge_and_color_agree_for_unicode_case() {
		// dotless i uppercases to a plain I
		let message = build_message("fıring", &[alert("fıring", "x")]);
		assert_eq!(message.embeds[0].author.name, "FIRING");
		assert_eq!(message.embeds[0].color, 0);
		assert_eq!(Presentation::of("fıring"), Presentation::Firing);
	}

	#[test]
	fn badge_is_uppercased_status() {
		let message = build_message("resolved", &[alert("resolved", "x")]);
		assert_eq!(message.embeds[0].author.name, "RESOLVED");
	}

	#[test]
	fn renders_single_firing_alert() {
		let data = Data::decode(br#"{"alerts":[{"status":"firing","labels":{"alertname":"HighCPU"},"annotations":{"summary":"CPU high","description":"CPU > 90%"}}]}"#).unwrap();

		let message = build_message("firing", &data.alerts[..1]);

		assert_eq!(
			serde_json::to_value(&message).unwrap(),
			json!({
				"content": "",
				"username": "Prometheus",
				"avatar_url": AVATAR_URL,
				"embeds": [{
					"title": "**CPU high**",
					"author": {"name": "FIRING", "icon_url": FIRING_ICON_URL},
					"description": "CPU > 90%",
					"fields": [{"name": "Labels:", "value": "**alertname:** HighCPU\n"}],
					"color": 0,
					"footer": {"text": ""}
				}]
			})
		);
	}

	#[test]
	fn one_embed_per_alert_in_group_order() {
		let alerts = [alert("firing", "first"), alert("firing", "second"), alert("firing", "third")];

		let message = build_message("firing", &alerts);

		let titles: Vec<_> = message.embeds.iter().map(|embed| embed.title.as_str()).collect();
		assert_eq!(titles, ["**first**", "**second**", "**third**"]);
	}

	#[test]
	fn renders_every_label() {
		let message = build_message("firing", &[alert("firing", "x")]);

		let value = &message.embeds[0].fields[0].value;
		let mut lines: Vec<_> = value.lines().collect();
		lines.sort_unstable();
		assert_eq!(lines, ["**alertname:** HighCPU", "**severity:** page"]);
		assert!(value.ends_with('\n'));
	}

	#[test]
	fn missing_annotations_and_labels_render_empty() {
		let message = build_message("firing", &[Alert::default()]);

		let embed = &message.embeds[0];
		assert_eq!(embed.title, "****");
		assert_eq!(embed.description, "");
		assert_eq!(embed.fields.len(), 1);
		assert_eq!(embed.fields[0].name, LABELS_FIELD_NAME);
		assert_eq!(embed.fields[0].value, "");
	}

	#[test]
	fn rebuilding_is_identical() {
		let alerts = [alert("resolved", "a"), alert("resolved", "b")];

		let first = serde_json::to_vec(&build_message("resolved", &alerts)).unwrap();
		let second = serde_json::to_vec(&build_message("resolved", &alerts)).unwrap();

		assert_eq!(first, second);
	}

	#[test]
	fn empty_group_has_no_embeds() {
		assert!(build_message("firing", &[]).embeds.is_empty());
	}
}
