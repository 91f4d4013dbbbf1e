//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Client, check_ok, parse_untagged};
use super::authenticated::parse_mailbox_info;
use super::states::Selected;
use crate::command::{Command, FetchItems, SearchCriteria, StoreAction};
use crate::connection::framed::CommandResponse;
use crate::parser::{FetchItem, MessageHeader, UntaggedResponse};
use crate::types::{Flag, Mailbox, MailboxInfo, SeqNum, SequenceSet, Uid, UidSet};
use crate::Result;

/// Maximum UIDs per `UID FETCH` command; larger requests are batched.
const UID_FETCH_BATCH: usize = 100;

/// The raw BODY[HEADER] and BODY[TEXT] literals of one message.
#[derive(Debug, Clone, Default)]
pub struct BodySections {
    /// Raw header block.
    pub header: Option<Vec<u8>>,
    /// Raw body text (undecoded; may be multipart).
    pub text: Option<Vec<u8>>,
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the snapshot of the selected mailbox.
    #[must_use]
    pub const fn info(&self) -> &MailboxInfo {
        self.state.info()
    }

    /// Returns the selected mailbox name.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.state.info().name
    }

    /// Selects a different mailbox, replacing the current selection.
    pub async fn select(mut self, mailbox: &str) -> Result<Self> {
        let cmd = Command::Select {
            mailbox: Mailbox::new(mailbox),
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)?;
        let info = parse_mailbox_info(mailbox, &response);

        self.state = Selected::new(info);
        Ok(self)
    }

    /// Fetches a page of header summaries, newest first.
    ///
    /// `start` is an offset from the newest message; the page maps onto
    /// the ascending sequence range `[max(1, end - count + 1), end]` with
    /// `end = exists - start`. An empty page is returned when the offset
    /// runs past the oldest message.
    pub async fn fetch_page(&mut self, start: u32, count: u32) -> Result<Vec<MessageHeader>> {
        let total = self.state.info().exists;
        let end = total.saturating_sub(start);
        if end == 0 || count == 0 {
            return Ok(Vec::new());
        }
        let begin = if end > count { end - count + 1 } else { 1 };

        let Some(sequence) = SequenceSet::range(begin, end) else {
            return Ok(Vec::new());
        };
        let cmd = Command::Fetch {
            sequence,
            items: FetchItems::header_summary(),
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)?;

        let mut headers = collect_headers(&response);
        headers.sort_by_key(|(seq, _)| *seq);
        // Newest first.
        Ok(headers.into_iter().rev().map(|(_, h)| h).collect())
    }

    /// Fetches header summaries for specific UIDs, batching the UID list
    /// into groups of at most 100 per command.
    ///
    /// Results follow server order within each batch; callers needing a
    /// specific order sort afterwards.
    pub async fn fetch_headers_by_uids(&mut self, uids: &[Uid]) -> Result<Vec<MessageHeader>> {
        let mut headers = Vec::with_capacity(uids.len());

        for batch in uids.chunks(UID_FETCH_BATCH) {
            let cmd = Command::UidFetch {
                uids: UidSet::from_uids(batch),
                items: FetchItems::header_summary(),
            };

            let response = self.send_command(&cmd).await?;
            check_ok(&response)?;
            headers.extend(collect_headers(&response).into_iter().map(|(_, h)| h));
        }

        Ok(headers)
    }

    /// Searches by UID with arbitrary criteria.
    pub async fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        let cmd = Command::Search {
            criteria: criteria.clone(),
            uid: true,
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)?;

        Ok(parse_untagged(&response)
            .into_iter()
            .filter_map(|untagged| match untagged {
                UntaggedResponse::Search(numbers) => Some(numbers),
                _ => None,
            })
            .flatten()
            .filter_map(Uid::new)
            .collect())
    }

    /// Finds messages addressed to any of the given recipients.
    ///
    /// Builds the left-associative OR chain over `TO` terms and returns
    /// the matching UIDs sorted descending (newest first).
    pub async fn search_recipients(&mut self, recipients: &[String]) -> Result<Vec<Uid>> {
        let Some(criteria) = SearchCriteria::any_recipient(recipients) else {
            return Ok(Vec::new());
        };

        let mut uids = self.uid_search(&criteria).await?;
        uids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(uids)
    }

    /// Fetches the raw header and text sections of one message.
    pub async fn fetch_body_sections(&mut self, uid: Uid) -> Result<BodySections> {
        let cmd = Command::UidFetch {
            uids: UidSet::single(uid),
            items: FetchItems::body_sections(),
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)?;

        let mut sections = BodySections::default();
        for untagged in parse_untagged(&response) {
            let UntaggedResponse::Fetch { items, .. } = untagged else {
                continue;
            };
            for item in items {
                if let FetchItem::Body {
                    section: Some(section),
                    data,
                } = item
                {
                    match section.to_uppercase().as_str() {
                        "HEADER" => sections.header = data,
                        "TEXT" => sections.text = data,
                        _ => {}
                    }
                }
            }
        }

        Ok(sections)
    }

    /// Marks a message as read (`+FLAGS (\Seen)`).
    pub async fn mark_read(&mut self, uid: Uid) -> Result<()> {
        self.uid_store(uid, StoreAction::AddFlags(vec![Flag::Seen]))
            .await
    }

    /// Marks a message as unread (`-FLAGS (\Seen)`).
    pub async fn mark_unread(&mut self, uid: Uid) -> Result<()> {
        self.uid_store(uid, StoreAction::RemoveFlags(vec![Flag::Seen]))
            .await
    }

    /// Deletes a message: `+FLAGS (\Deleted)` followed by EXPUNGE. Both
    /// must complete with a tagged OK.
    pub async fn delete_message(&mut self, uid: Uid) -> Result<()> {
        self.uid_store(uid, StoreAction::AddFlags(vec![Flag::Deleted]))
            .await?;
        self.expunge().await?;
        Ok(())
    }

    /// Modifies message flags by UID.
    pub async fn uid_store(&mut self, uid: Uid, action: StoreAction) -> Result<()> {
        let cmd = Command::UidStore {
            uids: UidSet::single(uid),
            action,
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)
    }

    /// Permanently removes messages marked \Deleted.
    ///
    /// Returns the sequence numbers of expunged messages.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let response = self.send_command(&Command::Expunge).await?;
        check_ok(&response)?;

        Ok(parse_untagged(&response)
            .into_iter()
            .filter_map(|untagged| match untagged {
                UntaggedResponse::Expunge(seq) => Some(seq),
                _ => None,
            })
            .collect())
    }
}

/// Extracts `(seq, header)` pairs from the FETCH responses of a command.
/// Entries without a UID are dropped.
fn collect_headers(response: &CommandResponse) -> Vec<(SeqNum, MessageHeader)> {
    parse_untagged(response)
        .into_iter()
        .filter_map(|untagged| match untagged {
            UntaggedResponse::Fetch { seq, items } => {
                MessageHeader::from_items(items).map(|h| (seq, h))
            }
            _ => None,
        })
        .collect()
}
