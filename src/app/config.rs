//! Configuration values assembled once by the CLI and passed by reference
//! into the query builder, the client and the formatter.

#![warn(clippy::all, rust_2018_idioms)]

use aws_config::BehaviorVersion;
use aws_types::region::Region;

use crate::app::data_plane::cloudwatch_logs::OrderBy;
use crate::app::tail::formatter::{EmitMode, EventFormatter, TimeZoneDisplay};

/// What to query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Log group name
    pub group: String,
    /// Group name prefix for `groups`, stream name prefix otherwise
    pub prefix: Option<String>,
    /// Start time expression (relative or absolute)
    pub start: Option<String>,
    /// End time expression (relative or absolute)
    pub end: Option<String>,
    /// CloudWatch Logs filter pattern
    pub filter: Option<String>,
    pub order_by: OrderBy,
    pub descending: bool,
}

impl Configuration {
    /// Configuration for one log group with everything else unset
    pub fn for_group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Self::default()
        }
    }

    /// Non-empty prefix, if any
    pub fn prefix(&self) -> Option<&str> {
        non_empty(self.prefix.as_deref())
    }

    /// Non-empty filter pattern, if any
    pub fn filter(&self) -> Option<&str> {
        non_empty(self.filter.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Where and as whom to connect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsConfiguration {
    pub region: Option<String>,
    /// Shared config profile name
    pub profile: Option<String>,
    /// Endpoint override (e.g. a local emulator)
    pub endpoint_url: Option<String>,
}

impl AwsConfiguration {
    /// Load the SDK configuration, falling back to the default provider chain
    /// for anything not set explicitly.
    pub async fn load_sdk_config(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = non_empty(self.region.as_deref()) {
            loader = loader.region(Region::new(region.to_string()));
        }

        if let Some(profile) = non_empty(self.profile.as_deref()) {
            loader = loader.profile_name(profile);
        }

        if let Some(endpoint_url) = non_empty(self.endpoint_url.as_deref()) {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }
}

/// How to print events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfiguration {
    /// Print only the message, without timestamp, stream or colors
    pub raw: bool,
    /// Print timestamp and stream for one-shot queries
    pub pretty: bool,
    /// Print each event as a JSON object; overrides `raw` and `pretty`
    pub json: bool,
    /// Indent JSON messages
    pub expand: bool,
    /// Use dark keys for light terminal themes
    pub invert: bool,
    /// Print JSON strings without escaping
    pub raw_string: bool,
    pub no_color: bool,
    /// Render timestamps in UTC instead of local time
    pub utc: bool,
}

impl OutputConfiguration {
    /// Live tails are decorated unless `raw` is set
    pub fn tail_mode(&self) -> EmitMode {
        if self.json {
            EmitMode::Json
        } else if self.raw {
            EmitMode::Raw
        } else {
            EmitMode::Pretty
        }
    }

    /// One-shot queries print bare messages unless `pretty` is set
    pub fn fetch_mode(&self) -> EmitMode {
        if self.json {
            EmitMode::Json
        } else if self.pretty {
            EmitMode::Pretty
        } else {
            EmitMode::Raw
        }
    }

    /// Build the event formatter described by these options
    pub fn formatter(&self) -> EventFormatter {
        let color = !self.no_color && std::env::var_os("NO_COLOR").is_none();

        let mut formatter = EventFormatter::new()
            .with_color(color)
            .with_raw_strings(self.raw_string)
            .with_inverted_keys(self.invert);

        if self.expand {
            formatter = formatter.with_indent(4);
        }

        if self.utc {
            formatter = formatter.with_time_zone(TimeZoneDisplay::Utc);
        }

        formatter
    }
}
