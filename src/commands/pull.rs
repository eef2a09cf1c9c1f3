//! Download direction: remote calendar into the Remind file.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use remdav_core::diff::DownloadDiff;
use remdav_core::ics::parse_event;

use super::{host_of, local_store, window_of, zone_of};
use crate::PullArgs;
use crate::credentials;
use crate::remote::RemoteCalendar;

pub async fn run(args: PullArgs) -> Result<()> {
    let zone = zone_of(&args.window)?;
    let window = window_of(&args.window);

    let store = local_store(args.remfile.as_deref(), false)?;

    let host = host_of(&args.conn.davurl)?;
    let credentials = credentials::resolve(
        &host,
        args.conn.davuser.as_deref(),
        args.conn.davpass.as_deref(),
    )?;

    // A first run has no local file yet; an empty one is a valid store.
    store.ensure_exists()?;
    let local = store.snapshot(&window).await?;

    let remote = RemoteCalendar::open(&args.conn.davurl, &credentials, args.conn.insecure).await?;
    let refs = remote.list().await?;

    let diff = DownloadDiff::compute(&local, &refs, args.delete);
    if diff.is_empty() {
        println!("Already in sync.");
        return Ok(());
    }

    // Removals first; both sets were computed from the pre-mutation
    // snapshots, so the order is about failure behavior, not correctness.
    for uid in &diff.to_remove {
        store.remove(uid)?;
        debug!(%uid, "removed local event");
    }

    let mut appended = 0usize;
    for uid in &diff.to_append {
        let body = remote
            .fetch_body(&refs[uid])
            .await
            .with_context(|| format!("Failed to fetch event {}", uid))?;

        let Some(mut event) = parse_event(&body, zone) else {
            warn!(%uid, "skipping an event body that has no Remind representation");
            continue;
        };
        // Local identity is the canonical UID from the href, not whatever
        // the body claims; this is what makes a second pull a no-op.
        event.uid = uid.clone();

        store.append(&event)?;
        debug!(%uid, "appended local event");
        appended += 1;
    }

    println!(
        "Appended {} event(s), removed {}.",
        appended,
        diff.to_remove.len()
    );

    Ok(())
}
