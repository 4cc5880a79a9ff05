use crate::exit::ExitSignal;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::collections::BTreeMap;
use std::path::Path;
use waypoint_core::failure::{self, FailureCategory, NewFailure};
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum FailureSubcommand {
    /// Record a failure for a story
    Record {
        story: String,
        #[arg(required = true)]
        message: Vec<String>,
        /// code, test, infra, external or timeout (default: inferred from the message)
        #[arg(long)]
        category: Option<String>,
        /// Extra context as key=value (repeatable); values that parse as JSON are kept typed
        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,
    },
    /// List failures recorded for a story
    List { story: String },
    /// Retry advice from the story's last three failures (exit 4 to escalate)
    Advice { story: String },
    /// Classify a message without recording it
    Categorize {
        #[arg(required = true)]
        message: Vec<String>,
    },
}

pub fn run(root: &Path, subcmd: FailureSubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    match subcmd {
        FailureSubcommand::Record {
            story,
            message,
            category,
            context,
        } => record(&store, story, message.join(" "), category, &context, json),
        FailureSubcommand::List { story } => list(&store, &story, json),
        FailureSubcommand::Advice { story } => advice(&store, &story, json),
        FailureSubcommand::Categorize { message } => {
            let category = failure::categorize(&message.join(" "));
            if json {
                let policy = category.policy();
                print_json(&serde_json::json!({
                    "category": category,
                    "description": policy.description,
                    "retryable": policy.retryable,
                    "needsBackoff": policy.needs_backoff,
                    "shouldEscalate": policy.should_escalate,
                }))?;
            } else {
                println!("{category}");
            }
            Ok(())
        }
    }
}

fn parse_context(pairs: &[String]) -> anyhow::Result<BTreeMap<String, serde_json::Value>> {
    pairs
        .iter()
        .map(|pair| -> anyhow::Result<(String, serde_json::Value)> {
            let (key, raw) = pair
                .split_once('=')
                .with_context(|| format!("context '{pair}' is not KEY=VALUE"))?;
            let value = serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
            Ok((key.to_string(), value))
        })
        .collect()
}

fn record(
    store: &Store,
    story: String,
    message: String,
    category: Option<String>,
    context: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let category = category
        .map(|c| c.parse::<FailureCategory>())
        .transpose()?;
    let context = parse_context(context)?;
    let f = failure::record_failure(
        store,
        NewFailure {
            story_id: story,
            message,
            category,
            context,
        },
    )
    .context("failed to record failure")?;

    if json {
        print_json(&f)?;
    } else {
        println!("Recorded {} [{}] for {}", f.id, f.category, f.story_id);
    }
    Ok(())
}

fn list(store: &Store, story: &str, json: bool) -> anyhow::Result<()> {
    let failures = failure::failures_for(store, story);
    if json {
        return print_json(&failures);
    }
    if failures.is_empty() {
        println!("No failures recorded for {story}.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = failures
        .iter()
        .map(|f| {
            vec![
                f.id.clone(),
                f.category.to_string(),
                f.iteration.to_string(),
                f.message.chars().take(60).collect(),
            ]
        })
        .collect();
    print_table(&["ID", "CATEGORY", "ITER", "MESSAGE"], &rows);
    Ok(())
}

fn advice(store: &Store, story: &str, json: bool) -> anyhow::Result<()> {
    let rec = failure::retry_recommendation(store, story);
    if json {
        print_json(&rec)?;
    } else if rec.retry {
        match rec.backoff_seconds {
            Some(secs) => println!("retry after {secs}s ({})", rec.reason),
            None => println!("retry ({})", rec.reason),
        }
    } else {
        println!("do not retry ({})", rec.reason);
    }

    if rec.escalate {
        return Err(ExitSignal::Escalate { reason: rec.reason }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_values_keep_json_types() {
        let ctx = parse_context(&[
            "exitCode=101".to_string(),
            "file=src/lib.rs".to_string(),
            "flaky=true".to_string(),
        ])
        .unwrap();
        assert_eq!(ctx["exitCode"], serde_json::json!(101));
        assert_eq!(ctx["file"], serde_json::json!("src/lib.rs"));
        assert_eq!(ctx["flaky"], serde_json::json!(true));
    }

    #[test]
    fn context_requires_equals() {
        assert!(parse_context(&["oops".to_string()]).is_err());
    }
}
