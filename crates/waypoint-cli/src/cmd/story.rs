use crate::exit::ExitSignal;
use crate::output::{print_json, print_table, yes_no};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use waypoint_core::story::{self, NewStory, Story};
use waypoint_core::types::{StorySize, StoryStatus};
use waypoint_core::Store;

#[derive(Subcommand)]
pub enum StorySubcommand {
    /// Append a story
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        /// S, M, L or XL
        #[arg(long, default_value = "M")]
        size: String,
        /// Acceptance criterion (repeatable)
        #[arg(long = "criterion", short = 'c')]
        criteria: Vec<String>,
        /// Require an explicit security clearance before completion
        #[arg(long)]
        security: bool,
    },
    /// Move a story to a new status
    Status {
        id: String,
        /// pending, in_progress, testing, review, verified, completed, blocked, skipped
        status: String,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Show the story the driver should work on next
    Next,
    /// List stories
    List {
        /// Only stories not yet completed or skipped
        #[arg(long)]
        incomplete: bool,
    },
    /// Show full details for a story
    Show { id: String },
    /// Check the story against its timeout (exit 3 when exceeded)
    Timeout { id: String },
}

pub fn run(root: &Path, subcmd: StorySubcommand, json: bool) -> anyhow::Result<()> {
    let store = Store::new(root);
    match subcmd {
        StorySubcommand::Add {
            title,
            size,
            criteria,
            security,
        } => add(&store, &title.join(" "), &size, criteria, security, json),
        StorySubcommand::Status { id, status, agent } => {
            set_status(&store, &id, &status, agent.as_deref(), json)
        }
        StorySubcommand::Next => next(&store, json),
        StorySubcommand::List { incomplete } => list(&store, incomplete, json),
        StorySubcommand::Show { id } => show(&store, &id, json),
        StorySubcommand::Timeout { id } => timeout(&store, &id, json),
    }
}

fn add(
    store: &Store,
    title: &str,
    size: &str,
    criteria: Vec<String>,
    security: bool,
    json: bool,
) -> anyhow::Result<()> {
    let size: StorySize = size.parse()?;
    let id = story::add_story(
        store,
        NewStory {
            title: title.to_string(),
            size,
            acceptance_criteria: criteria,
            security_sensitive: security,
        },
    )
    .context("failed to add story")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "title": title, "size": size }))?;
    } else {
        println!("Added story [{id}]: {title}");
    }
    Ok(())
}

fn set_status(
    store: &Store,
    id: &str,
    status: &str,
    agent: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let status: StoryStatus = status.parse()?;
    let change = story::set_status(store, id, status, agent)
        .with_context(|| format!("failed to update story '{id}'"))?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "from": change.from,
            "requested": change.requested,
            "status": change.stored,
        }))?;
    } else if change.downgraded() {
        let open = story::get(store, id)?
            .verification_checks
            .failing()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!("[{id}] {} -> {} (open checks: {open})", change.from, change.stored);
    } else {
        println!("[{id}] {} -> {}", change.from, change.stored);
    }
    Ok(())
}

fn next(store: &Store, json: bool) -> anyhow::Result<()> {
    let next = story::next_story(store);
    if json {
        return print_json(&next);
    }
    match next {
        Some(s) => println!("[{}] {} ({})", s.id, s.title, s.status),
        None => println!("No actionable story."),
    }
    Ok(())
}

fn list(store: &Store, incomplete: bool, json: bool) -> anyhow::Result<()> {
    let stories: Vec<Story> = if incomplete {
        story::incomplete_stories(store)
    } else {
        store
            .require()
            .context("failed to load workflow")?
            .stories
    };

    if json {
        return print_json(&stories);
    }
    if stories.is_empty() {
        println!("No stories.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = stories
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.status.to_string(),
                s.size.to_string(),
                s.attempts.to_string(),
                s.title.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "SIZE", "ATTEMPTS", "TITLE"], &rows);
    Ok(())
}

fn show(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let s = story::get(store, id).with_context(|| format!("failed to load story '{id}'"))?;
    if json {
        return print_json(&s);
    }

    println!("[{}] {}", s.id, s.title);
    println!("Status:    {}", s.status);
    println!("Size:      {}", s.size);
    println!("Attempts:  {}", s.attempts);
    if let Some(agent) = &s.assigned_agent {
        println!("Agent:     {agent}");
    }
    if let Some(phase) = s.tdd_phase {
        println!("TDD phase: {phase}");
    }
    println!("Security:  {}", if s.security_sensitive { "sensitive" } else { "normal" });
    let checks = &s.verification_checks;
    println!("Checks:");
    println!("  testsPass:       {}", yes_no(checks.tests_pass));
    println!("  coverageMet:     {}", yes_no(checks.coverage_met));
    println!("  reviewApproved:  {}", yes_no(checks.review_approved));
    println!("  securityCleared: {}", yes_no(checks.security_cleared));
    if !s.acceptance_criteria.is_empty() {
        println!("Acceptance criteria:");
        for c in &s.acceptance_criteria {
            println!("  - {c}");
        }
    }
    Ok(())
}

fn timeout(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let t = story::check_story_timeout(store, id)
        .with_context(|| format!("failed to check timeout for '{id}'"))?;

    if json {
        print_json(&t)?;
    } else if t.active {
        println!(
            "[{id}] active {:.1} of {} min",
            t.elapsed_minutes, t.max_minutes
        );
    } else {
        println!("[{id}] not active");
    }

    if t.exceeded {
        return Err(ExitSignal::TimeoutExceeded {
            story_id: id.to_string(),
        }
        .into());
    }
    Ok(())
}
