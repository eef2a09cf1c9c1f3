//! Credential resolution for the CalDAV server.
//!
//! An ordered chain of fallible sources, first hit wins:
//! explicit flags, then `~/.netrc` by host, then the OS secret store by
//! host + username, then an interactive prompt. A run that cannot even
//! determine a username aborts before anything is touched.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Resolve credentials for `host`.
pub fn resolve(host: &str, username: Option<&str>, password: Option<&str>) -> Result<Credentials> {
    let netrc = Netrc::load();
    if let Some(credentials) = resolve_static(host, username, password, netrc.as_ref()) {
        return Ok(credentials);
    }

    let Some(username) = username else {
        bail!(
            "no username for {}: pass --davuser or add a ~/.netrc entry",
            host
        );
    };

    if let Some(password) = keyring_store::get(host, username)? {
        debug!(host, username, "using password from the OS secret store");
        return Ok(Credentials {
            username: username.to_string(),
            password,
        });
    }

    let password = rpassword::prompt_password(format!("Password for {}@{}: ", username, host))
        .context("Failed to read password")?;
    Ok(Credentials {
        username: username.to_string(),
        password,
    })
}

/// The side-effect-free prefix of the chain: explicit flags, then netrc.
fn resolve_static(
    host: &str,
    username: Option<&str>,
    password: Option<&str>,
    netrc: Option<&Netrc>,
) -> Option<Credentials> {
    if let (Some(username), Some(password)) = (username, password) {
        return Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    netrc
        .and_then(|n| n.lookup(host))
        .map(|(username, password)| Credentials { username, password })
}

/// A parsed `~/.netrc`.
#[derive(Debug, Default)]
struct Netrc {
    machines: HashMap<String, NetrcEntry>,
    default: Option<NetrcEntry>,
}

#[derive(Debug, Default, Clone)]
struct NetrcEntry {
    login: Option<String>,
    password: Option<String>,
}

impl Netrc {
    fn load() -> Option<Self> {
        let path = dirs::home_dir()?.join(".netrc");
        let text = std::fs::read_to_string(path).ok()?;
        Some(Netrc::parse(&text))
    }

    /// Token-level parse of the netrc grammar: `machine <name>`,
    /// `default`, `login <value>`, `password <value>`. Unknown tokens are
    /// skipped.
    fn parse(text: &str) -> Self {
        let mut netrc = Netrc::default();
        let mut current: Option<(Option<String>, NetrcEntry)> = None;

        let mut tokens = text.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "machine" => {
                    netrc.flush(current.take());
                    current = tokens
                        .next()
                        .map(|name| (Some(name.to_string()), NetrcEntry::default()));
                }
                "default" => {
                    netrc.flush(current.take());
                    current = Some((None, NetrcEntry::default()));
                }
                "login" => {
                    if let Some((_, entry)) = current.as_mut() {
                        entry.login = tokens.next().map(str::to_string);
                    }
                }
                "password" => {
                    if let Some((_, entry)) = current.as_mut() {
                        entry.password = tokens.next().map(str::to_string);
                    }
                }
                "account" => {
                    tokens.next();
                }
                _ => {}
            }
        }
        netrc.flush(current);
        netrc
    }

    fn flush(&mut self, current: Option<(Option<String>, NetrcEntry)>) {
        match current {
            Some((Some(name), entry)) => {
                self.machines.insert(name, entry);
            }
            Some((None, entry)) => {
                self.default = Some(entry);
            }
            None => {}
        }
    }

    /// The `(login, password)` pair for a host, falling back to the
    /// `default` entry. Entries missing either half do not match.
    fn lookup(&self, host: &str) -> Option<(String, String)> {
        let entry = self.machines.get(host).or(self.default.as_ref())?;
        match (&entry.login, &entry.password) {
            (Some(login), Some(password)) => Some((login.clone(), password.clone())),
            _ => None,
        }
    }
}

/// Thin wrapper around the OS keyring, keyed by host and username.
mod keyring_store {
    use anyhow::Result;

    pub(super) fn get(host: &str, username: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(host, username)?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETRC: &str = "\
machine dav.example.org login carol password hunter2
machine other.example.org
  login dave
  password swordfish
default login fallback password letmein
";

    #[test]
    fn test_netrc_parse_machines_and_default() {
        let netrc = Netrc::parse(NETRC);

        assert_eq!(
            netrc.lookup("dav.example.org"),
            Some(("carol".to_string(), "hunter2".to_string()))
        );
        assert_eq!(
            netrc.lookup("other.example.org"),
            Some(("dave".to_string(), "swordfish".to_string()))
        );
        assert_eq!(
            netrc.lookup("unknown.example.org"),
            Some(("fallback".to_string(), "letmein".to_string()))
        );
    }

    #[test]
    fn test_netrc_entry_missing_password_does_not_match() {
        let netrc = Netrc::parse("machine dav.example.org login carol");
        assert_eq!(netrc.lookup("dav.example.org"), None);
    }

    #[test]
    fn test_explicit_credentials_short_circuit() {
        // A netrc with different credentials is present but must not be
        // consulted when both flags are given.
        let netrc = Netrc::parse(NETRC);

        let credentials =
            resolve_static("dav.example.org", Some("alice"), Some("secret"), Some(&netrc))
                .expect("explicit credentials resolve");
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password, "secret");
    }

    #[test]
    fn test_netrc_is_consulted_when_password_missing() {
        let netrc = Netrc::parse(NETRC);

        let credentials = resolve_static("dav.example.org", Some("alice"), None, Some(&netrc))
            .expect("netrc resolves");
        // The netrc entry wins wholesale, like the original tools.
        assert_eq!(credentials.username, "carol");
        assert_eq!(credentials.password, "hunter2");
    }

    #[test]
    fn test_static_chain_exhausted_without_netrc() {
        assert_eq!(resolve_static("dav.example.org", None, None, None), None);
        assert_eq!(
            resolve_static("dav.example.org", Some("alice"), None, None),
            None
        );
    }
}
