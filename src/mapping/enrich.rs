use std::time::Duration;

use chrono::{DateTime, Utc};
use educe::Educe;
use serde_json::Value;

use super::options::{
    EventSourceMappingOptions, FilterCriteria, FilterRule, ProvisionedPollerConfig,
    StartingPosition,
};
use crate::error::{BindError, BindResult};

pub const MAX_BATCH_SIZE: u32 = 10_000;
pub const MAX_BATCHING_WINDOW: Duration = Duration::from_secs(300);
pub const MAX_MINIMUM_POLLERS: u32 = 200;
pub const MAX_MAXIMUM_POLLERS: u32 = 2_000;

pub const MISSING_TIMESTAMP: &str =
    "startingPositionTimestamp must be provided when startingPosition is AT_TIMESTAMP";
pub const UNEXPECTED_TIMESTAMP: &str =
    "startingPositionTimestamp can only be used when startingPosition is AT_TIMESTAMP";

/// Settings every stream-based source carries, independent of the cluster kind.
#[derive(Educe, Clone, PartialEq)]
#[educe(Debug, Default)]
pub struct StreamSourceOptions {
    pub starting_position: Option<StartingPosition>,
    /// Epoch seconds.
    pub starting_position_timestamp: Option<f64>,
    pub batch_size: Option<u32>,
    pub max_batching_window: Option<Duration>,
    #[educe(Default = true)]
    pub enabled: bool,
    pub provisioned_poller_config: Option<ProvisionedPollerConfig>,
    /// Event filter patterns, one JSON object per rule.
    pub filters: Vec<Value>,
}

impl StreamSourceOptions {
    pub fn starting_at(&mut self, at: DateTime<Utc>) {
        self.starting_position = Some(StartingPosition::AtTimestamp);
        self.starting_position_timestamp = Some(at.timestamp_millis() as f64 / 1000.0);
    }
}

/// Returns the violated rule when the starting position and its timestamp
/// disagree.
pub fn starting_position_issue(
    position: Option<StartingPosition>,
    timestamp: Option<f64>,
) -> Option<&'static str> {
    let at_timestamp = position == Some(StartingPosition::AtTimestamp);
    match (at_timestamp, timestamp.is_some()) {
        (true, false) => Some(MISSING_TIMESTAMP),
        (false, true) => Some(UNEXPECTED_TIMESTAMP),
        _ => None,
    }
}

/// Merges the common stream options into `options`.
///
/// Numeric limits are checked here; the starting position rule is left to the
/// caller, which decides whether a violation is fatal.
pub fn enrich_mapping_options(
    stream: &StreamSourceOptions,
    mut options: EventSourceMappingOptions,
) -> BindResult<EventSourceMappingOptions> {
    if let Some(size) = stream.batch_size
        && !(1..=MAX_BATCH_SIZE).contains(&size)
    {
        return Err(BindError::validation(format!(
            "Maximum batch size must be between 1 and {MAX_BATCH_SIZE} inclusive (given {size})"
        )));
    }
    if let Some(window) = stream.max_batching_window
        && window.subsec_nanos() != 0
    {
        return Err(BindError::validation(format!(
            "maxBatchingWindow must be a whole number of seconds, got {}ms",
            window.as_millis()
        )));
    }
    if let Some(window) = stream.max_batching_window
        && window > MAX_BATCHING_WINDOW
    {
        return Err(BindError::validation(format!(
            "maxBatchingWindow cannot be over 300 seconds, got {}",
            window.as_secs()
        )));
    }
    if let Some(pollers) = &stream.provisioned_poller_config {
        validate_pollers(pollers)?;
    }

    options.starting_position = stream.starting_position;
    options.starting_position_timestamp = stream.starting_position_timestamp;
    options.batch_size = stream.batch_size;
    options.maximum_batching_window_in_seconds = stream.max_batching_window.map(|w| w.as_secs());
    options.enabled = Some(stream.enabled);
    options.provisioned_poller_config = stream.provisioned_poller_config;
    options.filter_criteria = render_filters(&stream.filters);
    Ok(options)
}

fn validate_pollers(pollers: &ProvisionedPollerConfig) -> BindResult<()> {
    if let Some(min) = pollers.minimum_pollers
        && !(1..=MAX_MINIMUM_POLLERS).contains(&min)
    {
        return Err(BindError::validation(format!(
            "Minimum provisioned pollers must be between 1 and {MAX_MINIMUM_POLLERS} inclusive (given {min})"
        )));
    }
    if let Some(max) = pollers.maximum_pollers
        && !(1..=MAX_MAXIMUM_POLLERS).contains(&max)
    {
        return Err(BindError::validation(format!(
            "Maximum provisioned pollers must be between 1 and {MAX_MAXIMUM_POLLERS} inclusive (given {max})"
        )));
    }
    if let (Some(min), Some(max)) = (pollers.minimum_pollers, pollers.maximum_pollers)
        && min > max
    {
        return Err(BindError::validation(
            "Minimum provisioned pollers must be less than or equal to maximum provisioned pollers",
        ));
    }
    Ok(())
}

fn render_filters(filters: &[Value]) -> Option<FilterCriteria> {
    if filters.is_empty() {
        return None;
    }
    Some(FilterCriteria {
        filters: filters
            .iter()
            .map(|f| FilterRule {
                pattern: f.to_string(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn timestamp_rule_covers_both_directions() {
        assert_eq!(
            starting_position_issue(Some(StartingPosition::AtTimestamp), None),
            Some(MISSING_TIMESTAMP)
        );
        assert_eq!(
            starting_position_issue(Some(StartingPosition::Latest), Some(1.0)),
            Some(UNEXPECTED_TIMESTAMP)
        );
        assert_eq!(starting_position_issue(None, Some(1.0)), Some(UNEXPECTED_TIMESTAMP));
        assert_eq!(
            starting_position_issue(Some(StartingPosition::AtTimestamp), Some(1.0)),
            None
        );
        assert_eq!(starting_position_issue(None, None), None);
    }

    #[test]
    fn enrich_copies_stream_settings() {
        let stream = StreamSourceOptions {
            starting_position: Some(StartingPosition::TrimHorizon),
            batch_size: Some(500),
            max_batching_window: Some(Duration::from_secs(30)),
            enabled: false,
            filters: vec![json!({"value": {"type": ["order"]}})],
            ..StreamSourceOptions::default()
        };
        let base = EventSourceMappingOptions {
            event_source_arn: Some("arn:x".into()),
            ..EventSourceMappingOptions::default()
        };

        let out = enrich_mapping_options(&stream, base).expect("valid options");
        assert_eq!(out.event_source_arn.as_deref(), Some("arn:x"));
        assert_eq!(out.starting_position, Some(StartingPosition::TrimHorizon));
        assert_eq!(out.batch_size, Some(500));
        assert_eq!(out.maximum_batching_window_in_seconds, Some(30));
        assert_eq!(out.enabled, Some(false));
        let criteria = out.filter_criteria.expect("filters rendered");
        assert_eq!(criteria.filters[0].pattern, r#"{"value":{"type":["order"]}}"#);
    }

    #[test]
    fn enrich_omits_filters_when_none_given() {
        let out = enrich_mapping_options(
            &StreamSourceOptions::default(),
            EventSourceMappingOptions::default(),
        )
        .expect("valid options");
        assert!(out.filter_criteria.is_none());
        assert_eq!(out.enabled, Some(true));
    }

    #[test]
    fn enrich_rejects_out_of_range_batch_size() {
        for size in [0, MAX_BATCH_SIZE + 1] {
            let stream = StreamSourceOptions {
                batch_size: Some(size),
                ..StreamSourceOptions::default()
            };
            let err = enrich_mapping_options(&stream, EventSourceMappingOptions::default())
                .expect_err("batch size out of range");
            assert!(format!("{err}").contains("Maximum batch size"));
        }
    }

    #[test]
    fn enrich_rejects_long_batching_window() {
        let stream = StreamSourceOptions {
            max_batching_window: Some(Duration::from_secs(301)),
            ..StreamSourceOptions::default()
        };
        let err = enrich_mapping_options(&stream, EventSourceMappingOptions::default())
            .expect_err("window too long");
        assert!(format!("{err}").contains("maxBatchingWindow"));
    }

    #[test]
    fn enrich_rejects_fractional_batching_window() {
        for window in [Duration::from_millis(500), Duration::from_millis(1_500)] {
            let stream = StreamSourceOptions {
                max_batching_window: Some(window),
                ..StreamSourceOptions::default()
            };
            let err = enrich_mapping_options(&stream, EventSourceMappingOptions::default())
                .expect_err("sub-second window");
            assert!(format!("{err}").contains("whole number of seconds"), "{err}");
        }
    }

    #[test]
    fn enrich_checks_poller_bounds() {
        let cases = [
            (Some(0), None, "Minimum provisioned pollers must be between"),
            (None, Some(2001), "Maximum provisioned pollers must be between"),
            (Some(10), Some(5), "less than or equal"),
        ];
        for (min, max, expected) in cases {
            let stream = StreamSourceOptions {
                provisioned_poller_config: Some(ProvisionedPollerConfig {
                    minimum_pollers: min,
                    maximum_pollers: max,
                }),
                ..StreamSourceOptions::default()
            };
            let err = enrich_mapping_options(&stream, EventSourceMappingOptions::default())
                .expect_err("invalid pollers");
            assert!(format!("{err}").contains(expected), "{err}");
        }
    }

    #[test]
    fn starting_at_sets_mode_and_epoch_seconds() {
        let mut stream = StreamSourceOptions::default();
        stream.starting_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(stream.starting_position, Some(StartingPosition::AtTimestamp));
        assert_eq!(stream.starting_position_timestamp, Some(1_704_067_200.0));
    }
}
