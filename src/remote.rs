//! The remote calendar store.
//!
//! Wraps discovery and the four operations the sync engine needs: cheap
//! listing, lazy body fetch, create, delete. Events are keyed by the
//! canonical UID derived from the resource href, which must agree exactly
//! with the UIDs the Remind store produces.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use libdav::caldav::{FindCalendarHomeSet, GetCalendarResources};
use libdav::dav::{PutResource, mime_types};
use tracing::debug;

use remdav_core::uid::{escape_uid, uid_from_href};

use crate::caldav::{self, DavClient, DeleteEvent, EventRef, ListCalendars, ListEventRefs};
use crate::credentials::Credentials;

/// One CalDAV calendar collection, discovered from the server URL the way
/// the original clients do it: current-user-principal, then the calendar
/// home set, then its first calendar.
pub struct RemoteCalendar {
    client: DavClient,
    collection_href: String,
}

impl RemoteCalendar {
    pub async fn open(url: &str, credentials: &Credentials, insecure: bool) -> Result<Self> {
        let client = caldav::create_caldav_client(
            url,
            &credentials.username,
            &credentials.password,
            insecure,
        )?;

        let principal = client
            .find_current_user_principal()
            .await
            .context("Failed to find current user principal")?
            .ok_or_else(|| anyhow!("No principal found; check the server URL and credentials"))?;

        let home_set = client
            .request(FindCalendarHomeSet::new(principal.path()))
            .await
            .context("Failed to find calendar home set")?
            .home_sets
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No calendar home set for this account"))?;

        let collection_href = client
            .request(ListCalendars::new(home_set.path()))
            .await
            .context("Failed to list calendars")?
            .hrefs
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No calendar found under {}", home_set.path()))?;

        debug!(collection = %collection_href, "using calendar collection");

        Ok(RemoteCalendar {
            client,
            collection_href,
        })
    }

    /// Snapshot of the collection as `{canonical uid -> ref}`. Bodies are
    /// not fetched here. Duplicate canonical UIDs keep the last href seen.
    pub async fn list(&self) -> Result<HashMap<String, EventRef>> {
        let response = self
            .client
            .request(ListEventRefs::new(&self.collection_href))
            .await
            .context("Failed to list remote events")?;

        let mut events = HashMap::new();
        for event_ref in response.refs {
            events.insert(uid_from_href(&event_ref.href), event_ref);
        }
        Ok(events)
    }

    /// Fetch the full iCalendar body of one event.
    pub async fn fetch_body(&self, event: &EventRef) -> Result<String> {
        let response = self
            .client
            .request(GetCalendarResources::new(&self.collection_href).with_hrefs([&event.href]))
            .await
            .with_context(|| format!("Failed to fetch {}", event.href))?;

        let resource = response
            .resources
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Server returned no resource for {}", event.href))?;

        let content = resource
            .content
            .map_err(|e| anyhow!("Bad resource content for {}: {:?}", event.href, e))?;

        Ok(content.data)
    }

    /// Upload a new event under `<collection>/<uid>.ics`.
    pub async fn create(&self, uid: &str, ics: &str) -> Result<()> {
        let href = format!(
            "{}/{}.ics",
            self.collection_href.trim_end_matches('/'),
            escape_uid(uid)
        );

        self.client
            .request(PutResource::new(&href).create(ics, mime_types::CALENDAR))
            .await
            .with_context(|| format!("Failed to create event {}", uid))?;

        Ok(())
    }

    /// Delete an event resource. Missing resources count as deleted.
    pub async fn delete(&self, event: &EventRef) -> Result<()> {
        self.client
            .request(DeleteEvent::new(&event.href))
            .await
            .with_context(|| format!("Failed to delete {}", event.href))?;

        Ok(())
    }
}
