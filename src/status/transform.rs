//! Node selection, display-zone timestamp rendering, and message text.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

use crate::status::model::{NodeEntry, StatusRecord};

/// Node type tag of CLI nodes, the only kind that earns testnet points.
pub const CLI_NODE_TYPE: i64 = 2;

/// WIB (Asia/Jakarta): UTC+7, no daylight saving.
pub const WIB_OFFSET_SECS: i32 = 7 * 3600;

/// Rendered timestamp layout, seconds precision, no zone suffix.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sent when the status endpoint could not be reached after all retries.
pub const FETCH_FAILED_TEXT: &str = "Failed to fetch data after multiple attempts.";

/// Sent when the status endpoint answered with data of the wrong shape.
pub const MALFORMED_UPSTREAM_TEXT: &str =
    "Status endpoint returned data in an unexpected format.";

/// A rendered node row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLine {
    pub id: String,
    /// Points as upstream reported them.
    pub points: String,
    /// Already shifted to the display offset.
    pub last_updated: String,
}

/// Notification content for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMessage {
    /// At least one node passed the filter.
    Listing {
        /// Wallet the report is for.
        wallet_address: String,
        /// Selected nodes, upstream order.
        lines: Vec<NodeLine>,
    },
    /// The wallet has no CLI node with positive points.
    NoMatchingNodes {
        /// Wallet the report is for.
        wallet_address: String,
    },
    /// [`FETCH_FAILED_TEXT`].
    FetchFailed,
    /// [`MALFORMED_UPSTREAM_TEXT`].
    MalformedUpstream,
}

impl DisplayMessage {
    /// Message body as sent.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DisplayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing {
                wallet_address,
                lines,
            } => {
                write!(f, "Wallet Address: {wallet_address}\n\nNodes CLI Points:\n\n")?;
                for line in lines {
                    write!(
                        f,
                        "Node ID: {} | Points: {} | Last Updated: {}\n\n",
                        line.id, line.points, line.last_updated
                    )?;
                }
                Ok(())
            }
            Self::NoMatchingNodes { wallet_address } => write!(
                f,
                "Wallet Address: {wallet_address}\nNo nodeType {CLI_NODE_TYPE} nodes with points > 0 found."
            ),
            Self::FetchFailed => f.write_str(FETCH_FAILED_TEXT),
            Self::MalformedUpstream => f.write_str(MALFORMED_UPSTREAM_TEXT),
        }
    }
}

/// Whether a node belongs in the report.
#[must_use]
pub fn is_selected(node: &NodeEntry) -> bool {
    node.node_type == CLI_NODE_TYPE && node.points.is_positive()
}

/// Reportable nodes in upstream order.
#[must_use]
pub fn select_nodes(record: &StatusRecord) -> Vec<&NodeEntry> {
    record.nodes.iter().filter(|node| is_selected(node)).collect()
}

/// Render a UTC instant as wall-clock time at `offset`.
#[must_use]
pub fn normalize_timestamp(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format(DISPLAY_TIMESTAMP_FORMAT)
        .to_string()
}

/// Turns a [`StatusRecord`] into the message for its wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformer {
    offset: FixedOffset,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::wib()
    }
}

impl Transformer {
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Renders in UTC+7.
    #[must_use]
    pub fn wib() -> Self {
        Self::new(FixedOffset::east_opt(WIB_OFFSET_SECS).expect("UTC+7 is a valid offset"))
    }

    /// Select reportable nodes and render them for the record's wallet.
    #[must_use]
    pub fn filter_and_format(&self, record: &StatusRecord) -> DisplayMessage {
        let lines: Vec<NodeLine> = select_nodes(record)
            .into_iter()
            .map(|node| NodeLine {
                id: node.id.clone(),
                points: node.points.to_string(),
                last_updated: normalize_timestamp(node.last_updated, self.offset),
            })
            .collect();

        if lines.is_empty() {
            DisplayMessage::NoMatchingNodes {
                wallet_address: record.wallet_address.clone(),
            }
        } else {
            DisplayMessage::Listing {
                wallet_address: record.wallet_address.clone(),
                lines,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone, Utc};
    use proptest::prelude::*;

    use super::{
        DisplayMessage, FETCH_FAILED_TEXT, Transformer, is_selected, normalize_timestamp,
        select_nodes,
    };
    use crate::status::model::{NodeEntry, Points, StatusRecord};

    fn node(id: &str, node_type: i64, points: i64) -> NodeEntry {
        NodeEntry {
            id: id.to_string(),
            node_type,
            points: Points::from(points),
            last_updated: Utc.with_ymd_and_hms(2025, 2, 21, 3, 10, 6).unwrap(),
        }
    }

    fn record(nodes: Vec<NodeEntry>) -> StatusRecord {
        StatusRecord {
            wallet_address: "0xABC".to_string(),
            nodes,
        }
    }

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn listing_matches_expected_layout() {
        let message = Transformer::wib().filter_and_format(&record(vec![
            node("n1", 2, 5),
            node("web", 1, 40),
            node("idle", 2, 0),
            node("n2", 2, 12),
        ]));
        assert_eq!(
            message.text(),
            "Wallet Address: 0xABC\n\nNodes CLI Points:\n\n\
             Node ID: n1 | Points: 5 | Last Updated: 2025-02-21 10:10:06\n\n\
             Node ID: n2 | Points: 12 | Last Updated: 2025-02-21 10:10:06\n\n"
        );
    }

    #[test]
    fn empty_selection_uses_dedicated_variant() {
        let message =
            Transformer::wib().filter_and_format(&record(vec![node("web", 1, 9), node("z", 2, 0)]));
        assert_eq!(
            message,
            DisplayMessage::NoMatchingNodes {
                wallet_address: "0xABC".to_string()
            }
        );
        assert_eq!(
            message.text(),
            "Wallet Address: 0xABC\nNo nodeType 2 nodes with points > 0 found."
        );
    }

    #[test]
    fn fixed_failure_text() {
        assert_eq!(DisplayMessage::FetchFailed.text(), FETCH_FAILED_TEXT);
    }

    #[test]
    fn midnight_rollover_advances_the_date() {
        let late = Utc.with_ymd_and_hms(2024, 12, 31, 20, 30, 0).unwrap();
        assert_eq!(normalize_timestamp(late, wib()), "2025-01-01 03:30:00");
    }

    #[test]
    fn leap_day_rollover() {
        let late = Utc.with_ymd_and_hms(2024, 2, 28, 17, 0, 0).unwrap();
        assert_eq!(normalize_timestamp(late, wib()), "2024-02-29 00:00:00");
    }

    #[test]
    fn fractional_seconds_are_truncated() {
        let instant = Utc.with_ymd_and_hms(2025, 2, 21, 3, 10, 6).unwrap()
            + Duration::milliseconds(999);
        assert_eq!(normalize_timestamp(instant, wib()), "2025-02-21 10:10:06");
    }

    #[test]
    fn formatting_does_not_mutate_and_is_idempotent() {
        let input = record(vec![node("n1", 2, 5), node("n3", 3, 7)]);
        let snapshot = input.clone();
        let transformer = Transformer::wib();
        let first = transformer.filter_and_format(&input).text();
        let second = transformer.filter_and_format(&input).text();
        assert_eq!(first, second);
        assert_eq!(input, snapshot);
    }

    fn arb_node() -> impl Strategy<Value = NodeEntry> {
        ("[a-z0-9]{1,8}", 0_i64..4, -5_i64..20, 0_i64..4_000_000_000).prop_map(
            |(id, node_type, points, secs)| NodeEntry {
                id,
                node_type,
                points: Points::from(points),
                last_updated: Utc.timestamp_opt(secs, 0).unwrap(),
            },
        )
    }

    proptest! {
        #[test]
        fn selection_is_exact_and_order_preserving(nodes in prop::collection::vec(arb_node(), 0..24)) {
            let input = record(nodes.clone());
            let selected: Vec<NodeEntry> = select_nodes(&input).into_iter().cloned().collect();
            let expected: Vec<NodeEntry> = nodes
                .into_iter()
                .filter(|n| n.node_type == 2 && n.points.to_string().parse::<i64>().unwrap() > 0)
                .collect();
            prop_assert_eq!(&selected, &expected);
            prop_assert!(selected.iter().all(is_selected));
        }

        #[test]
        fn normalization_adds_exactly_seven_hours(secs in 0_i64..4_000_000_000) {
            let instant = Utc.timestamp_opt(secs, 0).unwrap();
            let shifted = (instant + Duration::hours(7)).format("%Y-%m-%d %H:%M:%S").to_string();
            prop_assert_eq!(normalize_timestamp(instant, wib()), shifted);
        }

        #[test]
        fn message_lists_one_line_per_selected_node(nodes in prop::collection::vec(arb_node(), 0..24)) {
            let input = record(nodes);
            let selected = select_nodes(&input).len();
            let text = Transformer::wib().filter_and_format(&input).text();
            prop_assert!(text.starts_with("Wallet Address: 0xABC"));
            prop_assert_eq!(text.matches("Node ID: ").count(), selected);
        }
    }
}
