use super::message::{decode_message, MailMessage};
use super::{MailFilter, MailboxReader};
use crate::config::Config;
use crate::error::{mailbox_error, SyncResult};
use async_trait::async_trait;
use native_tls::{TlsConnector, TlsStream};
use std::net::TcpStream;
use tracing::{debug, info, warn};

/// STORE argument flagging a message as read
const SEEN_FLAG_UPDATE: &str = "+FLAGS (\\Seen)";

/// Connection settings for the IMAP server
#[derive(Debug, Clone)]
pub struct ImapSettings {
    pub host: String,
    pub port: u16,
    pub mailbox: String,
    pub username: String,
}

impl ImapSettings {
    /// Take the IMAP settings from the application config
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.imap_host.clone(),
            port: config.imap_port,
            mailbox: config.imap_mailbox.clone(),
            username: config.gmail_address.clone(),
        }
    }
}

/// Mailbox reader backed by an IMAP server with XOAUTH2 login
pub struct ImapMailbox {
    settings: ImapSettings,
    access_token: String,
}

impl ImapMailbox {
    pub fn new(settings: ImapSettings, access_token: String) -> Self {
        Self {
            settings,
            access_token,
        }
    }
}

#[async_trait]
impl MailboxReader for ImapMailbox {
    async fn fetch_unread(&self, filter: &MailFilter) -> SyncResult<Vec<MailMessage>> {
        let settings = self.settings.clone();
        let access_token = self.access_token.clone();
        let filter = filter.clone();

        // The imap client is blocking
        tokio::task::spawn_blocking(move || fetch_unread_blocking(&settings, &access_token, &filter))
            .await
            .map_err(|e| mailbox_error(&format!("Mailbox task failed: {}", e)))?
    }

    async fn mark_read(&self, message: &MailMessage) -> SyncResult<()> {
        let settings = self.settings.clone();
        let access_token = self.access_token.clone();
        let uid = message.uid;

        tokio::task::spawn_blocking(move || mark_read_blocking(&settings, &access_token, uid))
            .await
            .map_err(|e| mailbox_error(&format!("Mailbox task failed: {}", e)))?
    }
}

struct Xoauth2Authenticator<'a> {
    username: &'a str,
    access_token: &'a str,
}

impl imap::Authenticator for Xoauth2Authenticator<'_> {
    type Response = String;

    fn process(&self, _challenge: &[u8]) -> Self::Response {
        format!(
            "user={}\x01auth=Bearer {}\x01\x01",
            self.username, self.access_token
        )
    }
}

type ImapSession = imap::Session<TlsStream<TcpStream>>;

/// Connect, authenticate and select the configured mailbox
fn open_session(settings: &ImapSettings, access_token: &str) -> SyncResult<ImapSession> {
    let tls = TlsConnector::builder()
        .build()
        .map_err(|e| mailbox_error(&format!("TLS setup failed: {}", e)))?;

    let client = imap::connect(
        (settings.host.as_str(), settings.port),
        &settings.host,
        &tls,
    )
    .map_err(|e| {
        mailbox_error(&format!(
            "Failed to connect to {}:{}: {}",
            settings.host, settings.port, e
        ))
    })?;
    debug!("Connected to IMAP server {}", settings.host);

    let authenticator = Xoauth2Authenticator {
        username: &settings.username,
        access_token,
    };
    let mut session = client
        .authenticate("XOAUTH2", &authenticator)
        .map_err(|(e, _)| mailbox_error(&format!("XOAUTH2 authentication failed: {}", e)))?;
    debug!("Authenticated as {}", settings.username);

    if let Err(e) = session.select(&settings.mailbox) {
        close_session(&mut session);
        return Err(mailbox_error(&format!(
            "Failed to select '{}': {}",
            settings.mailbox, e
        )));
    }

    Ok(session)
}

fn close_session(session: &mut ImapSession) {
    if let Err(e) = session.logout() {
        warn!("IMAP logout failed: {}", e);
    } else {
        debug!("Logged out of IMAP server");
    }
}

fn fetch_unread_blocking(
    settings: &ImapSettings,
    access_token: &str,
    filter: &MailFilter,
) -> SyncResult<Vec<MailMessage>> {
    info!("Starting email fetch for {}", settings.username);

    let mut session = open_session(settings, access_token)?;
    let result = fetch_from_session(&mut session, filter);
    close_session(&mut session);

    result
}

fn fetch_from_session(
    session: &mut ImapSession,
    filter: &MailFilter,
) -> SyncResult<Vec<MailMessage>> {
    let query = search_query(filter);
    debug!("IMAP search: {}", query);

    let mut uids: Vec<u32> = session
        .uid_search(&query)
        .map_err(|e| mailbox_error(&format!("Search failed: {}", e)))?
        .into_iter()
        .collect();

    if uids.is_empty() {
        info!("No unread emails from {} found", filter.sender_contains);
        return Ok(Vec::new());
    }
    uids.sort_unstable();
    info!(
        "Found {} unread emails from {}",
        uids.len(),
        filter.sender_contains
    );

    // BODY.PEEK leaves \Seen alone; messages are marked read once handled
    let fetches = session
        .uid_fetch(uid_set(&uids), "(UID BODY.PEEK[])")
        .map_err(|e| mailbox_error(&format!("Fetch failed: {}", e)))?;

    let mut messages = Vec::new();
    for fetch in fetches.iter() {
        let (Some(uid), Some(raw)) = (fetch.uid, fetch.body()) else {
            warn!("Could not extract content for email {}", fetch.message);
            continue;
        };

        match decode_message(uid, raw) {
            Ok(message) if message.subject.contains(&filter.subject_contains) => {
                info!("Processing email with subject: {}", message.subject);
                messages.push(message);
            }
            Ok(message) => {
                info!("Skipping email with subject: {}", message.subject);
            }
            Err(e) => {
                warn!("Could not decode email {}: {}", uid, e);
            }
        }
    }

    Ok(messages)
}

fn mark_read_blocking(settings: &ImapSettings, access_token: &str, uid: u32) -> SyncResult<()> {
    let mut session = open_session(settings, access_token)?;
    let result = session
        .uid_store(uid_set(&[uid]), SEEN_FLAG_UPDATE)
        .map(|_| ())
        .map_err(|e| mailbox_error(&format!("Failed to mark email {} as read: {}", uid, e)));
    close_session(&mut session);

    if result.is_ok() {
        debug!("Marked email {} as read", uid);
    }
    result
}

/// Comma separated UID set for FETCH and STORE
pub(crate) fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(|uid| uid.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the IMAP SEARCH criteria for unread messages matching the filter
pub(crate) fn search_query(filter: &MailFilter) -> String {
    format!(
        "UNSEEN FROM {} SUBJECT {}",
        quote(&filter.sender_contains),
        quote(&filter.subject_contains)
    )
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
