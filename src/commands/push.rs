//! Upload direction: the Remind file onto the remote calendar.

use anyhow::{Context, Result};
use tracing::debug;

use remdav_core::diff::UploadDiff;
use remdav_core::ics::generate_ics;
use remdav_core::remind::RemindStore;

use super::{host_of, local_store, window_of, zone_of};
use crate::PushArgs;
use crate::credentials;
use crate::remote::RemoteCalendar;

pub async fn run(args: PushArgs) -> Result<()> {
    let zone = zone_of(&args.window)?;
    let window = window_of(&args.window);

    let store = local_store(args.infile.as_deref(), true)?;
    let local = store.snapshot(&window).await?;

    // The reference file is expanded over the same window, otherwise the
    // eligibility set compares snapshots of different scopes.
    let reference = match &args.old {
        Some(path) => Some(RemindStore::from_file(path).snapshot(&window).await?),
        None => None,
    };

    let host = host_of(&args.conn.davurl)?;
    let credentials = credentials::resolve(
        &host,
        args.conn.davuser.as_deref(),
        args.conn.davpass.as_deref(),
    )?;

    let remote = RemoteCalendar::open(&args.conn.davurl, &credentials, args.conn.insecure).await?;
    let refs = remote.list().await?;

    let diff = UploadDiff::compute(&local, &refs, reference.as_ref(), args.delete);
    if diff.is_empty() {
        println!("Already in sync.");
        return Ok(());
    }

    for uid in &diff.to_create {
        let ics = generate_ics(&local[uid], zone)?;
        remote
            .create(uid, &ics)
            .await
            .with_context(|| format!("Failed to upload event {}", uid))?;
        debug!(%uid, "uploaded event");
    }

    for uid in &diff.to_delete {
        remote.delete(&refs[uid]).await?;
        debug!(%uid, "deleted remote event");
    }

    println!(
        "Uploaded {} event(s), deleted {}.",
        diff.to_create.len(),
        diff.to_delete.len()
    );

    Ok(())
}
