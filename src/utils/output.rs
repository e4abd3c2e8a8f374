use crate::domain::model::{Draft, NewDraft, Notification};
use crate::utils::error::{Result, TypefullyError};
use serde::{Deserialize, Serialize};
use std::fmt;

const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

pub fn render_drafts(drafts: &[Draft], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(drafts)?),
        OutputFormat::Csv => to_csv(
            &["id", "status", "date", "num_tweets", "share_url", "text"],
            drafts.iter().map(|d| {
                vec![
                    d.id.clone(),
                    d.status.clone().unwrap_or_default(),
                    d.display_date().unwrap_or_default().to_string(),
                    d.num_tweets.map(|n| n.to_string()).unwrap_or_default(),
                    d.share_url.clone().unwrap_or_default(),
                    d.text.clone().unwrap_or_default(),
                ]
            }),
        ),
        OutputFormat::Text => {
            if drafts.is_empty() {
                return Ok("No drafts found.".to_string());
            }
            Ok(to_table(
                &["ID", "STATUS", "DATE", "TWEETS", "PREVIEW"],
                drafts.iter().map(|d| {
                    vec![
                        d.id.clone(),
                        d.status.clone().unwrap_or_else(|| "-".to_string()),
                        d.display_date().unwrap_or("-").to_string(),
                        d.num_tweets
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        d.preview(PREVIEW_CHARS),
                    ]
                }),
            ))
        }
    }
}

/// A single created draft, with its links in text mode.
pub fn render_created_draft(draft: &Draft, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut lines = vec![format!("Created draft {}", draft.id)];
            if let Some(date) = &draft.scheduled_date {
                lines.push(format!("Scheduled for: {}", date));
            }
            if let Some(url) = &draft.share_url {
                lines.push(format!("Share URL: {}", url));
            }
            if let Some(url) = &draft.twitter_url {
                lines.push(format!("Twitter URL: {}", url));
            }
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(draft)?),
        OutputFormat::Csv => render_drafts(std::slice::from_ref(draft), format),
    }
}

/// Output of `create --dry-run`: the request body that would be sent.
pub fn render_draft_request(draft: &NewDraft, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut lines = vec!["Dry run: nothing was sent.".to_string()];
            let body = serde_json::to_string_pretty(draft)?;
            lines.push(body);
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(draft)?),
        OutputFormat::Csv => to_csv(
            &[
                "content",
                "threadify",
                "share",
                "schedule_date",
                "auto_retweet_enabled",
                "auto_plug_enabled",
            ],
            std::iter::once(vec![
                draft.content.clone(),
                opt_bool(draft.threadify),
                opt_bool(draft.share),
                draft.schedule_date.map(|d| d.to_wire()).unwrap_or_default(),
                opt_bool(draft.auto_retweet_enabled),
                opt_bool(draft.auto_plug_enabled),
            ]),
        ),
    }
}

pub fn render_notifications(notifications: &[Notification], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(notifications)?),
        OutputFormat::Csv => to_csv(
            &["id", "kind", "created_at", "payload"],
            notifications.iter().map(|n| {
                vec![
                    n.id.as_ref().map(value_to_string).unwrap_or_default(),
                    n.kind.clone().unwrap_or_default(),
                    n.created_at.clone().unwrap_or_default(),
                    n.payload.as_ref().map(|p| p.to_string()).unwrap_or_default(),
                ]
            }),
        ),
        OutputFormat::Text => {
            if notifications.is_empty() {
                return Ok("No notifications.".to_string());
            }
            Ok(to_table(
                &["KIND", "CREATED", "SUMMARY"],
                notifications.iter().map(|n| {
                    vec![
                        n.kind.clone().unwrap_or_else(|| "-".to_string()),
                        n.created_at.clone().unwrap_or_else(|| "-".to_string()),
                        n.summary(PREVIEW_CHARS),
                    ]
                }),
            ))
        }
    }
}

pub fn render_message(message: &str, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "ok": true,
            "message": message,
        }))?),
        OutputFormat::Text | OutputFormat::Csv => Ok(message.to_string()),
    }
}

fn opt_bool(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_csv<I>(header: &[&str], rows: I) -> Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TypefullyError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| TypefullyError::validation(format!("CSV output is not UTF-8: {}", e)))
}

/// Left-aligned columns; the last column is not padded.
fn to_table<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let rows: Vec<Vec<String>> = rows.into_iter().collect();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == last {
                    cell.to_string()
                } else {
                    let pad = widths[i].saturating_sub(cell.chars().count());
                    format!("{}{}", cell, " ".repeat(pad))
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = vec![format_row(header.to_vec())];
    for row in &rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ScheduleDate;

    fn drafts() -> Vec<Draft> {
        serde_json::from_value(serde_json::json!([
            {
                "id": 1,
                "text": "Hello, world\n\n\n\nsecond tweet",
                "status": "scheduled",
                "num_tweets": 2,
                "scheduled_date": "2026-10-20T09:00:00Z"
            },
            {
                "id": 22,
                "text": "Published one",
                "status": "published",
                "published_on": "2026-10-01T08:00:00Z",
                "share_url": "https://typefully.com/t/abc"
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_text_table() {
        let out = render_drafts(&drafts(), OutputFormat::Text).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID  STATUS     DATE"));
        assert!(lines[1].starts_with("1   scheduled  2026-10-20T09:00:00Z  2       Hello, world"));
        assert!(lines[2].contains("published  2026-10-01T08:00:00Z  -       Published one"));
    }

    #[test]
    fn test_empty_text_output() {
        assert_eq!(render_drafts(&[], OutputFormat::Text).unwrap(), "No drafts found.");
        assert_eq!(
            render_notifications(&[], OutputFormat::Text).unwrap(),
            "No notifications."
        );
    }

    #[test]
    fn test_csv_quotes_multiline_text() {
        let out = render_drafts(&drafts(), OutputFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["id", "status", "date", "num_tweets", "share_url", "text"]
        );
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][5], "Hello, world\n\n\n\nsecond tweet");
        assert_eq!(&records[1][4], "https://typefully.com/t/abc");
    }

    #[test]
    fn test_json_keeps_unknown_fields() {
        let mut list = drafts();
        list[0]
            .extra
            .insert("x_custom".to_string(), serde_json::json!(7));

        let out = render_drafts(&list, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["x_custom"], 7);
        assert_eq!(parsed[0]["id"], "1");
    }

    #[test]
    fn test_created_draft_text() {
        let draft = &drafts()[0];
        let out = render_created_draft(draft, OutputFormat::Text).unwrap();
        assert_eq!(out, "Created draft 1\nScheduled for: 2026-10-20T09:00:00Z");
    }

    #[test]
    fn test_dry_run_csv() {
        let request = NewDraft {
            content: "hi".to_string(),
            schedule_date: Some(ScheduleDate::NextFreeSlot),
            share: Some(false),
            ..Default::default()
        };
        let out = render_draft_request(&request, OutputFormat::Csv).unwrap();
        assert_eq!(
            out,
            "content,threadify,share,schedule_date,auto_retweet_enabled,auto_plug_enabled\nhi,,false,next-free-slot,,\n"
        );
    }

    #[test]
    fn test_notification_table() {
        let notifications: Vec<Notification> = serde_json::from_value(serde_json::json!([
            {"id": 5, "kind": "inbox", "created_at": "2026-10-17", "payload": {"title": "New reply"}}
        ]))
        .unwrap();
        let out = render_notifications(&notifications, OutputFormat::Text).unwrap();
        assert_eq!(out, "KIND   CREATED     SUMMARY\ninbox  2026-10-17  New reply");

        let out = render_notifications(&notifications, OutputFormat::Csv).unwrap();
        assert!(out.starts_with("id,kind,created_at,payload\n5,inbox,2026-10-17,"));
    }

    #[test]
    fn test_message_json() {
        let out = render_message("done", OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["ok"], true);
        assert_eq!(parsed["message"], "done");
    }
}
