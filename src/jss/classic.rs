// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Classic API client.
//!
//! Blocking HTTP client for the `/JSSResource` endpoints of Jamf Pro. Every
//! call is attempted exactly once. Credentials are sent as HTTP basic
//! authentication on every request.

use crate::{
    jss::{xml, JssApi, JssError, ObjectId, ObjectKind, ObjectRecord, Result},
    session::Session,
};

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, instrument};
use ureq::{Agent, AgentBuilder};

/// JSS access through the Classic API.
#[derive(Debug)]
pub struct ClassicClient {
    agent: Agent,
    base_url: String,
    user: String,
    authorization: String,
}

impl ClassicClient {
    /// Construct new client for session.
    pub fn new(session: &Session) -> Self {
        let token = STANDARD.encode(format!("{}:{}", session.user, session.password));

        Self {
            agent: AgentBuilder::new().build(),
            base_url: session.url.trim_end_matches('/').to_owned(),
            user: session.user.clone(),
            authorization: format!("Basic {token}"),
        }
    }

    /// Base URL of the JSS, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_url(&self, kind: ObjectKind, tail: &str) -> String {
        format!("{}/JSSResource/{}{tail}", self.base_url, kind.endpoint())
    }

    fn call(&self, method: &str, url: &str, body: Option<String>) -> Result<String> {
        debug!("{method} {url}");
        let request = self
            .agent
            .request(method, url)
            .set("Authorization", &self.authorization)
            .set("Accept", "application/xml");

        let response = match body {
            Some(body) => request
                .set("Content-Type", "application/xml")
                .send_string(&body),
            None => request.call(),
        };

        match response {
            Ok(response) => Ok(response.into_string()?),
            Err(ureq::Error::Status(401 | 403, _)) => Err(JssError::Auth { url: url.into() }),
            Err(ureq::Error::Status(status, response)) => Err(JssError::Status {
                status,
                url: url.into(),
                message: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(JssError::Transport(Box::new(transport))),
        }
    }
}

impl JssApi for ClassicClient {
    fn user(&self) -> &str {
        &self.user
    }

    /// Find object by name in full object listing.
    ///
    /// Lookup by name through the API itself is case-insensitive, so the
    /// listing is fetched and compared locally instead.
    #[instrument(skip(self), level = "debug")]
    fn find_by_name(&self, kind: ObjectKind, name: &str) -> Result<Option<ObjectId>> {
        let url = self.resource_url(kind, "");
        let document = self.call("GET", &url, None)?;

        Ok(xml::parse_summaries(&document)
            .into_iter()
            .find(|(_, candidate)| candidate == name)
            .map(|(id, _)| id))
    }

    #[instrument(skip(self, record), level = "debug")]
    fn create(&self, kind: ObjectKind, record: &ObjectRecord) -> Result<ObjectId> {
        let url = self.resource_url(kind, "/id/0");
        let document = self.call("POST", &url, Some(xml::render(kind, record)))?;

        xml::parse_id(&document).ok_or(JssError::Malformed { url })
    }

    #[instrument(skip(self, record), level = "debug")]
    fn update(&self, kind: ObjectKind, id: ObjectId, record: &ObjectRecord) -> Result<()> {
        let url = self.resource_url(kind, &format!("/id/{id}"));
        self.call("PUT", &url, Some(xml::render(kind, record)))?;

        Ok(())
    }
}
