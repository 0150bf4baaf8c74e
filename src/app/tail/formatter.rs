//! Renders a [`LogEvent`] as one line (or, with indentation, one block) of
//! display text.
//!
//! Pretty output is `[<timestamp>] (<stream>) <message>`. Messages that parse
//! as a JSON object are re-rendered with colored keys and values; anything
//! else is shown verbatim.

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, Local, SecondsFormat};
use owo_colors::{OwoColorize, Style};
use serde_json::Value;

use crate::app::data_plane::cloudwatch_logs::LogEvent;

/// Time zone used for the timestamp column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneDisplay {
    #[default]
    Local,
    Utc,
}

/// Whether an event is printed with or without decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// Message only
    Raw,
    /// Timestamp, stream and formatted message
    Pretty,
    /// The whole event as one JSON object per line
    Json,
}

#[derive(Debug, Clone)]
pub struct EventFormatter {
    indent: usize,
    raw_strings: bool,
    color: bool,
    inverted_keys: bool,
    time_zone: TimeZoneDisplay,
}

impl Default for EventFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFormatter {
    /// Compact, colored output in local time
    pub fn new() -> Self {
        Self {
            indent: 0,
            raw_strings: false,
            color: true,
            inverted_keys: false,
            time_zone: TimeZoneDisplay::Local,
        }
    }

    /// Indent nested JSON by `indent` spaces (0 = single line)
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Print JSON strings without escaping
    pub fn with_raw_strings(mut self, raw_strings: bool) -> Self {
        self.raw_strings = raw_strings;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Black instead of white keys, for light backgrounds
    pub fn with_inverted_keys(mut self, inverted: bool) -> Self {
        self.inverted_keys = inverted;
        self
    }

    pub fn with_time_zone(mut self, time_zone: TimeZoneDisplay) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn time_zone(&self) -> TimeZoneDisplay {
        self.time_zone
    }

    /// Render an event for output, without trailing line feeds
    pub fn render(&self, event: &LogEvent, mode: EmitMode) -> String {
        let text = match mode {
            EmitMode::Raw => self.format_raw(event),
            EmitMode::Pretty => self.format(event),
            EmitMode::Json => self.format_event_json(event),
        };
        text.trim_end_matches('\n').to_string()
    }

    /// `{"eventId":...,"timestamp":...,"message":...,...}` on one line
    pub fn format_event_json(&self, event: &LogEvent) -> String {
        serde_json::to_string(event).unwrap_or_else(|_| self.format_raw(event))
    }

    /// The unmodified message
    pub fn format_raw(&self, event: &LogEvent) -> String {
        event.message.clone()
    }

    /// `[<timestamp>] (<stream>) <message>`
    pub fn format(&self, event: &LogEvent) -> String {
        let timestamp = self.format_timestamp(event.timestamp);
        let stream = self.paint(&event.log_stream_name, Style::new().white());

        let message = match serde_json::from_str::<Value>(&event.message) {
            Ok(object @ Value::Object(_)) => self.format_json(&object),
            _ => event.message.clone(),
        };

        format!(
            "[{}] ({}) {}",
            self.paint(&timestamp, Style::new().red()),
            stream,
            message
        )
    }

    /// RFC 3339 timestamp with second precision
    pub fn format_timestamp(&self, millis: i64) -> String {
        let Some(utc) = DateTime::from_timestamp_millis(millis) else {
            return millis.to_string();
        };
        match self.time_zone {
            TimeZoneDisplay::Utc => utc.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimeZoneDisplay::Local => utc
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Render a JSON value with this formatter's colors and indentation.
    /// Object keys come out sorted.
    pub fn format_json(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, 0);
        out
    }

    fn write_value(&self, out: &mut String, value: &Value, depth: usize) {
        match value {
            Value::Null => out.push_str(&self.paint("null", Style::new().bright_black())),
            Value::Bool(b) => out.push_str(&self.paint(&b.to_string(), Style::new().yellow())),
            Value::Number(n) => out.push_str(&self.paint(&n.to_string(), Style::new().cyan())),
            Value::String(s) => {
                out.push_str(&self.paint(&self.quote(s), Style::new().green()));
            }
            Value::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_newline(out, depth + 1);
                    self.write_value(out, item, depth + 1);
                }
                self.write_newline(out, depth);
                out.push(']');
            }
            Value::Object(map) => {
                if map.is_empty() {
                    out.push_str("{}");
                    return;
                }
                let key_style = if self.inverted_keys {
                    Style::new().black()
                } else {
                    Style::new().white()
                };
                let separator = if self.indent > 0 { ": " } else { ":" };

                out.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_newline(out, depth + 1);
                    out.push_str(&self.paint(&self.quote(key), key_style));
                    out.push_str(separator);
                    self.write_value(out, item, depth + 1);
                }
                self.write_newline(out, depth);
                out.push('}');
            }
        }
    }

    fn write_newline(&self, out: &mut String, depth: usize) {
        if self.indent > 0 {
            out.push('\n');
            out.push_str(&" ".repeat(self.indent * depth));
        }
    }

    fn quote(&self, s: &str) -> String {
        if self.raw_strings {
            return format!("\"{}\"", s);
        }
        serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s))
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}
