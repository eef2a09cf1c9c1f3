//! The two sync directions.

pub mod pull;
pub mod push;

use std::io::Read;

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use url::Url;

use remdav_core::constants::DEFAULT_REMIND_FILE;
use remdav_core::remind::{RemindSource, RemindStore};
use remdav_core::window::SyncWindow;

use crate::WindowArgs;

/// Resolve the positional FILE argument into a store.
///
/// `-` captures standard input; only directions that never mutate the
/// local store may allow it.
pub(crate) fn local_store(arg: Option<&str>, allow_stdin: bool) -> Result<RemindStore> {
    match arg {
        Some("-") if allow_stdin => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read standard input")?;
            Ok(RemindStore::new(RemindSource::Stdin(content)))
        }
        Some("-") => bail!("standard input cannot be modified; pass a file path"),
        Some(path) => Ok(RemindStore::from_file(path)),
        None => {
            let home = dirs::home_dir().context("Could not determine home directory")?;
            Ok(RemindStore::from_file(home.join(DEFAULT_REMIND_FILE)))
        }
    }
}

/// The host name credentials are keyed by.
pub(crate) fn host_of(davurl: &str) -> Result<String> {
    let url = Url::parse(davurl).with_context(|| format!("Invalid URL: {}", davurl))?;
    let host = url
        .host_str()
        .with_context(|| format!("URL has no host: {}", davurl))?;
    Ok(host.to_string())
}

pub(crate) fn zone_of(args: &WindowArgs) -> Result<Tz> {
    args.zone
        .parse::<Tz>()
        .map_err(|_| anyhow::anyhow!("unknown timezone: {}", args.zone))
}

pub(crate) fn window_of(args: &WindowArgs) -> SyncWindow {
    SyncWindow::new(args.startdate, Some(args.month))
}
