//! Partitions the alerts of a notification by their status. Every status
//! group is forwarded as its own discord message.
use indexmap::IndexMap;

use crate::alert::Alert;

/// alerts keyed by their verbatim status, groups in order of first appearance
pub type StatusGroups = IndexMap<String, Vec<Alert>>;

/// Groups `alerts` by status. The status is compared case-sensitively, the
/// order of alerts inside a group is the order they were received in.
pub fn group_by_status(alerts: Vec<Alert>) -> StatusGroups {
	let mut groups = StatusGroups::new();

	for alert in alerts {
		groups.entry(alert.status.clone()).or_default().push(alert);
	}

	groups
}
