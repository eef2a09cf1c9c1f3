//! CalDAV client helpers built on libdav.
//!
//! Provides the HTTP/TLS client stack plus the custom DAV requests libdav
//! has no ready-made type for: the cheap event listing (PROPFIND) used by
//! both sync directions, calendar discovery under a home set, and DELETE.

use std::sync::Arc;

use anyhow::{Context, Result};
use http::{Method, Request, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use libdav::CalDavClient;
use libdav::dav::{WebDavClient, make_relative_url};
use libdav::requests::{DavRequest, ParseResponseError};
use tower::ServiceBuilder;
use tower_http::{auth::AddAuthorization, follow_redirect::FollowRedirect};

/// Type alias for the HTTP client with auth and redirect following.
pub type HttpClient = FollowRedirect<AddAuthorization<Client<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, String>>>;

/// Type alias for our CalDAV client.
pub type DavClient = CalDavClient<HttpClient>;

/// Create a libdav CalDavClient for the given server.
///
/// The client is configured with basic authentication and automatic
/// redirect following (servers commonly redirect to user-specific hosts).
/// With `insecure`, certificate verification is disabled entirely.
pub fn create_caldav_client(
    base_url: &str,
    username: &str,
    password: &str,
    insecure: bool,
) -> Result<DavClient> {
    let uri: Uri = base_url
        .parse()
        .with_context(|| format!("Invalid base URL: {}", base_url))?;

    let https_connector = if insecure {
        let tls = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(danger::NoVerification::new()))
            .with_no_client_auth();
        HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .build()
    } else {
        HttpsConnectorBuilder::new()
            .with_native_roots()
            .context("Failed to load native TLS roots")?
            .https_or_http()
            .enable_http1()
            .build()
    };

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);

    let auth_client = AddAuthorization::basic(http_client, username, password);

    let client = ServiceBuilder::new()
        .layer(tower_http::follow_redirect::FollowRedirectLayer::new())
        .service(auth_client);

    let webdav = WebDavClient::new(uri, client);
    Ok(CalDavClient::new(webdav))
}

mod danger {
    use rustls::client::danger::{
        HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
    };
    use rustls::crypto::CryptoProvider;
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, Error, SignatureScheme};

    /// Certificate verifier for `--insecure`: accepts any server
    /// certificate. Signatures are still checked so the handshake itself
    /// stays well-formed.
    #[derive(Debug)]
    pub(super) struct NoVerification(CryptoProvider);

    impl NoVerification {
        pub(super) fn new() -> Self {
            NoVerification(rustls::crypto::ring::default_provider())
        }
    }

    impl ServerCertVerifier for NoVerification {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            rustls::crypto::verify_tls12_signature(
                message,
                cert,
                dss,
                &self.0.signature_verification_algorithms,
            )
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            rustls::crypto::verify_tls13_signature(
                message,
                cert,
                dss,
                &self.0.signature_verification_algorithms,
            )
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0.signature_verification_algorithms.supported_schemes()
        }
    }
}

// ============================================================================
// Custom DAV requests
// ============================================================================

/// A remote event reference: enough to fetch or delete the resource
/// without its body.
#[derive(Debug, Clone)]
pub struct EventRef {
    pub href: String,
    pub etag: Option<String>,
}

/// Cheap listing of the event resources in a calendar collection.
///
/// A PROPFIND at Depth 1 asking for `getetag` only; bodies are fetched
/// separately, and only for the events a diff actually needs.
pub struct ListEventRefs<'a> {
    collection_href: &'a str,
}

impl<'a> ListEventRefs<'a> {
    pub fn new(collection_href: &'a str) -> Self {
        Self { collection_href }
    }
}

/// Response from a [`ListEventRefs`] request.
#[derive(Debug)]
pub struct ListEventRefsResponse {
    pub refs: Vec<EventRef>,
}

impl DavRequest for ListEventRefs<'_> {
    type Response = ListEventRefsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self, base_url: Uri) -> std::result::Result<Request<String>, http::Error> {
        let body = r#"<propfind xmlns="DAV:">
    <prop>
        <getetag/>
    </prop>
</propfind>"#
            .to_string();

        Request::builder()
            .method(Method::from_bytes(b"PROPFIND")?)
            .uri(make_relative_url(base_url, self.collection_href)?)
            .header("Depth", "1")
            .body(body)
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let text = std::str::from_utf8(body)?;
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();

        let mut refs = Vec::new();

        for response in root
            .descendants()
            .filter(|n| n.tag_name().name() == "response")
        {
            let href = response
                .descendants()
                .find(|n| n.tag_name().name() == "href")
                .and_then(|n| n.text())
                .map(|s| s.to_string());

            let Some(href) = href else { continue };

            // Depth 1 lists the collection itself too; only .ics members
            // are events.
            if !href.ends_with(".ics") {
                continue;
            }

            let etag = response
                .descendants()
                .find(|n| n.tag_name().name() == "getetag")
                .and_then(|n| n.text())
                .map(|s| s.to_string());

            refs.push(EventRef { href, etag });
        }

        Ok(ListEventRefsResponse { refs })
    }
}

/// Find the calendar collections under a calendar home set.
pub struct ListCalendars<'a> {
    home_set_href: &'a str,
}

impl<'a> ListCalendars<'a> {
    pub fn new(home_set_href: &'a str) -> Self {
        Self { home_set_href }
    }
}

/// Response from a [`ListCalendars`] request.
#[derive(Debug)]
pub struct ListCalendarsResponse {
    pub hrefs: Vec<String>,
}

impl DavRequest for ListCalendars<'_> {
    type Response = ListCalendarsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self, base_url: Uri) -> std::result::Result<Request<String>, http::Error> {
        let body = r#"<propfind xmlns="DAV:">
    <prop>
        <resourcetype/>
    </prop>
</propfind>"#
            .to_string();

        Request::builder()
            .method(Method::from_bytes(b"PROPFIND")?)
            .uri(make_relative_url(base_url, self.home_set_href)?)
            .header("Depth", "1")
            .body(body)
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let text = std::str::from_utf8(body)?;
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();

        let mut hrefs = Vec::new();

        for response in root
            .descendants()
            .filter(|n| n.tag_name().name() == "response")
        {
            let is_calendar = response
                .descendants()
                .find(|n| n.tag_name().name() == "resourcetype")
                .map(|rt| rt.children().any(|c| c.tag_name().name() == "calendar"))
                .unwrap_or(false);

            if !is_calendar {
                continue;
            }

            if let Some(href) = response
                .descendants()
                .find(|n| n.tag_name().name() == "href")
                .and_then(|n| n.text())
            {
                hrefs.push(href.to_string());
            }
        }

        Ok(ListCalendarsResponse { hrefs })
    }
}

/// Delete an event resource by href.
pub struct DeleteEvent<'a> {
    href: &'a str,
}

impl<'a> DeleteEvent<'a> {
    pub fn new(href: &'a str) -> Self {
        Self { href }
    }
}

impl DavRequest for DeleteEvent<'_> {
    type Response = ();
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self, base_url: Uri) -> std::result::Result<Request<String>, http::Error> {
        Request::builder()
            .method(Method::DELETE)
            .uri(make_relative_url(base_url, self.href)?)
            .body(String::new())
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        _body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        // 404 means the event is already gone, which is what we wanted.
        if parts.status.is_success() || parts.status.as_u16() == 404 {
            Ok(())
        } else {
            Err(ParseResponseError::BadStatusCode(parts.status))
        }
    }
}
