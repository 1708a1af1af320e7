//! Attach ranked comments to the Tesla timeline documents.

use crate::config::AppConfig;
use crate::models::{CommentSeed, TimelineDoc};
use crate::store::{read_doc, write_doc};
use crate::timeline::attach_comments;
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

pub const MASTER_FILE: &str = "tesla-master-db.json";
pub const TIMELINE_FILE: &str = "tesla-timeline.json";
pub const SEED_FILE: &str = "tesla-comments-seed.json";

/// Re-rank seeded comments onto the master DB and its timeline mirror.
/// Unlike the fetch jobs, missing inputs here are fatal: there is nothing
/// sensible to do without the documents.
pub fn run(config: &AppConfig) -> Result<()> {
    let master_path = config.storage.data_path(MASTER_FILE);
    let timeline_path = config.storage.data_path(TIMELINE_FILE);

    let mut master: TimelineDoc =
        read_doc(&master_path).with_context(|| format!("{} missing or malformed", MASTER_FILE))?;
    let mut timeline: TimelineDoc = read_doc(&timeline_path)
        .with_context(|| format!("{} missing or malformed", TIMELINE_FILE))?;
    let seed: CommentSeed = read_doc(&config.storage.data_path(SEED_FILE))
        .with_context(|| format!("{} missing or malformed", SEED_FILE))?;

    attach_comments(&mut master.events, &seed.by_status_id);
    attach_comments(&mut timeline.events, &seed.by_status_id);

    let now = Utc::now()
        .with_timezone(&config.report.tz()?)
        .format("%Y-%m-%d %H:%M")
        .to_string();
    master
        .meta
        .insert("last_updated".to_string(), Value::String(now.clone()));
    timeline
        .meta
        .insert("last_updated".to_string(), Value::String(now.clone()));
    timeline.meta.insert(
        "note".to_string(),
        Value::String("Mirrored from tesla-master-db.json (with post comments)".to_string()),
    );

    write_doc(&master_path, &master)?;
    write_doc(&timeline_path, &timeline)?;

    info!(
        "Updated Tesla DB + timeline ({} / {} events) at {}",
        master.events.len(),
        timeline.events.len(),
        now
    );
    Ok(())
}
