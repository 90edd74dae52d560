//! Renders a stored message into a deliverable wire-format mail.

use chrono::{Local, TimeZone};
use mailchat_mime::encoding::encode_rfc2047;
use mailchat_mime::{ContentType, MimeMessage, Part, format_mailbox};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::chat::{Chat, ChatType};
use crate::encrypt::Encryptor;
use crate::message::{Message, MsgId, MsgType, SystemCommand, summary_text_by_raw};
use crate::param::keys;
use crate::storage::Storage;
use crate::{Error, Result};

/// Messages closer together than this share one thread reference; a
/// longer gap starts a new mail thread.
const NEW_THREAD_THRESHOLD: i64 = 60 * 60;

/// Approximate length of the subject content summary.
const APPROX_SUBJECT_CHARS: usize = 32;

/// Prefix marking chat mails in the subject line.
const CHAT_PREFIX: &str = "Chat:";

struct Recipient {
    name: Option<String>,
    addr: String,
}

/// A message loaded and prepared for rendering.
///
/// Construct with [`MimeFactory::load`]; [`MimeFactory::render`]
/// consumes the factory, so a loaded state can never be rendered twice
/// or reused for another message.
pub struct MimeFactory {
    message: Message,
    chat: Chat,
    recipients: Vec<Recipient>,
    from_addr: String,
    from_name: Option<String>,
    request_read_receipt: bool,
    predecessor: Option<String>,
    references: String,
    signature: String,
}

/// The serialized wire message.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// RFC 5322 message bytes.
    pub bytes: Vec<u8>,
    /// Whether the encryption collaborator rewrote the message.
    pub encrypted: bool,
}

impl MimeFactory {
    /// Loads the message, its chat, and the recipient set.
    ///
    /// Recipients are the chat members minus reserved contacts,
    /// deduplicated case-insensitively by address in first-encounter
    /// order. For a "member removed" system message the removed address
    /// is appended so the notice still reaches the departed member.
    ///
    /// # Errors
    ///
    /// Fails on a reserved message id, a missing message or chat, or
    /// when no own address is configured.
    pub async fn load(storage: &Storage, msg_id: MsgId) -> Result<Self> {
        if msg_id.is_special() {
            return Err(Error::ReservedId(msg_id.0));
        }

        let guard = storage.lock().await;

        let message = guard.load_message(msg_id).await?;
        let mut chat = guard.load_chat(message.chat_id).await?;

        let mut recipients: Vec<Recipient> = Vec::new();
        for (name, addr) in guard.chat_recipients(message.chat_id).await? {
            if !recipients
                .iter()
                .any(|r| r.addr.eq_ignore_ascii_case(&addr))
            {
                recipients.push(Recipient {
                    name: (!name.is_empty()).then_some(name),
                    addr,
                });
            }
        }

        let from_addr = guard
            .get_config_opt("configured_addr")
            .await?
            .ok_or_else(|| Error::Config("configured_addr is not set".to_string()))?;

        // The member list no longer contains a removed member, but the
        // removal notice must still reach them
        if message.system_command() == SystemCommand::MemberRemovedFromGroup {
            if let Some(removed) = message.param.get(keys::MEMBER_ADDR) {
                if !removed.eq_ignore_ascii_case(&from_addr)
                    && !recipients
                        .iter()
                        .any(|r| r.addr.eq_ignore_ascii_case(removed))
                {
                    recipients.push(Recipient {
                        name: None,
                        addr: removed.to_string(),
                    });
                }
            }
        }

        let from_name = guard.get_config_opt("displayname").await?;

        // Read receipts for groups are ambiguous to collect; request
        // them only from a single recipient
        let request_read_receipt =
            guard.get_config_bool("readreceipts", true).await? && recipients.len() == 1;

        // The last message not sent by us serves as a correlation hint.
        // It is carried in a private header, not In-Reply-To: real
        // reply chains produce ever-deepening thread views in classic
        // mailers.
        let predecessor = guard.newest_foreign_global_id(message.chat_id).await?;

        let prev_timestamp = guard
            .newest_message_timestamp_excluding(message.chat_id, msg_id)
            .await?;

        let cached = match prev_timestamp {
            Some(prev) if message.timestamp - prev < NEW_THREAD_THRESHOLD => {
                chat.param.get(keys::REFERENCES).map(str::to_string)
            }
            _ => None,
        };
        let references = match cached {
            Some(references) => references,
            None => {
                let fresh = create_reference_id();
                chat.param.set(keys::REFERENCES, fresh.as_str());
                guard.update_chat_param(&chat).await?;
                fresh
            }
        };

        let signature = guard.get_config("signature", "").await?;

        Ok(Self {
            message,
            chat,
            recipients,
            from_addr,
            from_name,
            request_read_receipt,
            predecessor,
            references,
            signature,
        })
    }

    /// Renders the loaded message to wire format.
    ///
    /// The encryption collaborator is invoked unless this render is the
    /// encrypt-to-self copy of a message without guaranteed encryption;
    /// its `release` runs after serialization either way. On successful
    /// encryption the subject collapses to a fixed placeholder so that
    /// no content leaks through subject metadata.
    ///
    /// # Errors
    ///
    /// Fails when no body part carries content, on a malformed stored
    /// mime type, or when the attachment file cannot be read.
    pub async fn render(
        self,
        encryptor: &impl Encryptor,
        encrypt_to_self: bool,
    ) -> Result<RenderedEmail> {
        let msg = &self.message;
        let mut wire = MimeMessage::new();

        wire.headers.add("Date", format_date(msg.timestamp));
        wire.headers.add(
            "From",
            format_mailbox(self.from_name.as_deref(), &self.from_addr),
        );
        if !self.recipients.is_empty() {
            let to = self
                .recipients
                .iter()
                .map(|r| format_mailbox(r.name.as_deref(), &r.addr))
                .collect::<Vec<_>>()
                .join(", ");
            wire.headers.add("To", to);
        }
        wire.headers
            .add("Message-ID", format!("<{}>", msg.global_id));
        wire.headers
            .add("References", format!("<{}>", self.references));
        wire.headers
            .add("X-Mailer", format!("mailchat {}", env!("CARGO_PKG_VERSION")));
        wire.headers.add("X-Chat-Version", "1.0");
        if let Some(predecessor) = &self.predecessor {
            wire.headers.add("X-Chat-Predecessor", predecessor);
        }
        if self.request_read_receipt {
            wire.headers
                .add("Disposition-Notification-To", &self.from_addr);
        }

        if self.chat.chat_type == ChatType::Group {
            wire.headers.add("X-Chat-Group-Id", &self.chat.group_id);
            wire.headers
                .add("X-Chat-Group-Name", encode_rfc2047(&self.chat.name));

            match msg.system_command() {
                SystemCommand::MemberRemovedFromGroup => {
                    if let Some(addr) = msg.param.get(keys::MEMBER_ADDR) {
                        wire.headers.add("X-Chat-Group-Member-Removed", addr);
                    }
                }
                SystemCommand::MemberAddedToGroup => {
                    if let Some(addr) = msg.param.get(keys::MEMBER_ADDR) {
                        wire.headers.add("X-Chat-Group-Member-Added", addr);
                    }
                }
                SystemCommand::GroupNameChanged => {
                    wire.headers.add("X-Chat-Group-Name-Changed", "1");
                }
                SystemCommand::None => {}
            }
        }

        if matches!(msg.msg_type, MsgType::Voice | MsgType::Audio | MsgType::Video) {
            if msg.msg_type == MsgType::Voice {
                wire.headers.add("X-Chat-Voice-Message", "1");
            }
            if let Some(duration_ms) = msg.param.get_int(keys::DURATION_MS).filter(|&d| d > 0) {
                wire.headers
                    .add("X-Chat-Duration-Ms", duration_ms.to_string());
            }
        }

        // The text part is always present, even when empty: some mail
        // clients mishandle non-text content in the main part, and the
        // forward hint needs a place to live
        let forwarded_addr = msg.param.get(keys::FORWARDED_ADDR).map(str::to_string);
        let mut body = String::new();
        if let Some(addr) = &forwarded_addr {
            let name = msg.param.get(keys::FORWARDED_NAME).unwrap_or_default();
            let who = if name.is_empty() {
                addr.clone()
            } else {
                format!("{name} <{addr}>")
            };
            // The receiving side detects forwarding by this exact marker
            body.push_str(&format!(
                "---------- Forwarded message ----------\nFrom: {who}\n\n"
            ));
        }

        // For attachments the text field carries auxiliary data, not a
        // body
        let write_text = msg.msg_type == MsgType::Text && !msg.text.is_empty();
        if write_text {
            body.push_str(&msg.text);
        }
        if !self.signature.is_empty() {
            if !body.is_empty() {
                body.push_str("\n\n");
            }
            body.push_str("-- \n");
            body.push_str(&self.signature);
        }

        let mut content_parts = usize::from(!body.is_empty());
        wire.push_part(Part::text(body));

        if msg.msg_type.needs_attachment() {
            if let Some(part) = build_attachment_part(msg).await? {
                wire.push_part(part);
                content_parts += 1;
            }
        }

        if content_parts == 0 {
            return Err(Error::EmptyMessage);
        }

        let guarantee = msg.param.get_int(keys::GUARANTEE_E2EE).unwrap_or(0) != 0;
        let mut encrypted = false;
        if !encrypt_to_self || guarantee {
            let addrs: Vec<String> = self.recipients.iter().map(|r| r.addr.clone()).collect();
            encrypted = encryptor
                .encrypt(&addrs, guarantee, encrypt_to_self, &mut wire)
                .await;
        }

        let subject = if encrypted {
            // Deliberately non-informative: the subject travels outside
            // the encrypted payload
            format!("{CHAT_PREFIX} Encrypted message")
        } else {
            let fwd = if forwarded_addr.is_some() { "Fwd: " } else { "" };
            let summary = summary_text_by_raw(msg.msg_type, &msg.text, APPROX_SUBJECT_CHARS);
            if self.chat.chat_type == ChatType::Group {
                format!("{CHAT_PREFIX} {}: {fwd}{summary}", self.chat.name)
            } else {
                format!("{CHAT_PREFIX} {fwd}{summary}")
            }
        };
        wire.headers.add("Subject", encode_rfc2047(&subject));

        let bytes = wire.render();
        encryptor.release();

        Ok(RenderedEmail { bytes, encrypted })
    }
}

/// Builds the attachment part, or `None` when the message has no file
/// path or no way to determine a mime type.
async fn build_attachment_part(msg: &Message) -> Result<Option<Part>> {
    let Some(path) = msg.param.get(keys::FILE) else {
        return Ok(None);
    };

    let suffix = file_suffix(path);

    // Original filenames often carry timestamps or running numbers; for
    // media we substitute generic names and keep them only where they
    // are the payload's identity
    let filename = match msg.msg_type {
        MsgType::Voice => format!(
            "voice-message_{}.{}",
            format_voice_timestamp(msg.timestamp),
            suffix.as_deref().unwrap_or("dat")
        ),
        MsgType::Audio => {
            let author = msg.param.get(keys::MEDIA_AUTHOR).unwrap_or_default();
            let title = msg.param.get(keys::MEDIA_TITLE).unwrap_or_default();
            match (&suffix, author.is_empty() || title.is_empty()) {
                // The ` - ` separator is parsed back out on the
                // receiving side instead of trusting ID3 scanners
                (Some(suffix), false) => format!("{author} - {title}.{suffix}"),
                _ => file_name(path),
            }
        }
        MsgType::Image | MsgType::Gif => {
            format!("image.{}", suffix.as_deref().unwrap_or("dat"))
        }
        MsgType::Video => format!("video.{}", suffix.as_deref().unwrap_or("dat")),
        _ => file_name(path),
    };

    let content_type = match msg.param.get(keys::MIME_TYPE) {
        Some(stored) => ContentType::parse(stored)?,
        None => match &suffix {
            Some(suffix) => ContentType::from_extension(suffix),
            None => return Ok(None),
        },
    };

    let data = tokio::fs::read(path).await?;
    Ok(Some(Part::attachment(&filename, &content_type, &data)))
}

fn format_date(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .to_rfc2822()
}

fn format_voice_timestamp(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map_or_else(String::new, |dt| {
            dt.format("%Y-%m-%d_%H-%M-%S").to_string()
        })
}

/// Lowercased file suffix, if any.
fn file_suffix(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Last path component, falling back to the whole path.
fn file_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |name| name.to_string_lossy().into_owned())
}

/// Mints a fresh thread-reference id.
fn create_reference_id() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("Rf.{token}@mailchat.invalid")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::chat::ChatId;
    use crate::contact::ContactId;
    use crate::encrypt::PlaintextEncryptor;
    use crate::message::MsgState;
    use crate::param::Param;
    use crate::test_utils::{
        MsgSeed, add_chat_member, insert_chat, insert_contact, insert_msg, set_config,
    };

    const T0: i64 = 1_700_000_000;

    async fn storage_with_single_chat() -> Storage {
        let storage = Storage::in_memory().await.unwrap();
        set_config(&storage, "configured_addr", "me@example.com").await;
        insert_chat(&storage, 10, ChatType::Single, "Bob").await;
        let bob = insert_contact(&storage, 20, "Bob", "bob@x.com").await;
        add_chat_member(&storage, ChatId::new(10), bob).await;
        storage
    }

    #[tokio::test]
    async fn test_load_rejects_special_ids() {
        let storage = Storage::in_memory().await.unwrap();
        let result = MimeFactory::load(&storage, MsgId::new(9)).await;
        assert!(matches!(result, Err(Error::ReservedId(9))));
    }

    #[tokio::test]
    async fn test_recipient_dedup_is_case_insensitive() {
        let storage = storage_with_single_chat().await;
        let bob2 = insert_contact(&storage, 21, "Bobby", "Bob@X.com").await;
        add_chat_member(&storage, ChatId::new(10), bob2).await;
        insert_msg(&storage, &MsgSeed::new(100, ChatId::new(10))).await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        assert_eq!(factory.recipients.len(), 1);
        assert_eq!(factory.recipients[0].addr, "bob@x.com");
        assert!(factory.request_read_receipt);
    }

    #[tokio::test]
    async fn test_read_receipt_only_for_single_recipient() {
        let storage = storage_with_single_chat().await;
        let carol = insert_contact(&storage, 22, "Carol", "carol@x.com").await;
        add_chat_member(&storage, ChatId::new(10), carol).await;
        insert_msg(&storage, &MsgSeed::new(100, ChatId::new(10))).await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        assert_eq!(factory.recipients.len(), 2);
        assert!(!factory.request_read_receipt);
    }

    #[tokio::test]
    async fn test_read_receipt_disabled_by_config() {
        let storage = storage_with_single_chat().await;
        set_config(&storage, "readreceipts", "0").await;
        insert_msg(&storage, &MsgSeed::new(100, ChatId::new(10))).await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        assert!(!factory.request_read_receipt);
    }

    #[tokio::test]
    async fn test_member_removed_address_is_appended() {
        let storage = storage_with_single_chat().await;
        let mut param = Param::new();
        param.set_int(crate::param::keys::SYSTEM_COMMAND, 2);
        param.set(crate::param::keys::MEMBER_ADDR, "gone@x.com");
        insert_msg(
            &storage,
            &MsgSeed {
                param,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        assert_eq!(factory.recipients.len(), 2);
        assert_eq!(factory.recipients[1].addr, "gone@x.com");
    }

    #[tokio::test]
    async fn test_member_removed_self_is_not_appended() {
        let storage = storage_with_single_chat().await;
        let mut param = Param::new();
        param.set_int(crate::param::keys::SYSTEM_COMMAND, 2);
        param.set(crate::param::keys::MEMBER_ADDR, "ME@example.com");
        insert_msg(
            &storage,
            &MsgSeed {
                param,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        assert_eq!(factory.recipients.len(), 1);
    }

    #[tokio::test]
    async fn test_references_reused_within_threshold() {
        // Messages are rendered as they are sent, so each load sees
        // only the messages that exist at that point
        let storage = storage_with_single_chat().await;
        insert_msg(
            &storage,
            &MsgSeed {
                timestamp: T0,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;
        let first = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();

        insert_msg(
            &storage,
            &MsgSeed {
                timestamp: T0 + 30 * 60,
                ..MsgSeed::new(101, ChatId::new(10))
            },
        )
        .await;
        let second = MimeFactory::load(&storage, MsgId::new(101)).await.unwrap();

        assert_eq!(first.references, second.references);
    }

    #[tokio::test]
    async fn test_references_rotate_after_gap() {
        let storage = storage_with_single_chat().await;
        insert_msg(
            &storage,
            &MsgSeed {
                timestamp: T0,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;
        let first = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();

        insert_msg(
            &storage,
            &MsgSeed {
                timestamp: T0 + 2 * 60 * 60,
                ..MsgSeed::new(101, ChatId::new(10))
            },
        )
        .await;
        let second = MimeFactory::load(&storage, MsgId::new(101)).await.unwrap();
        assert_ne!(first.references, second.references);

        // The rotated reference is persisted and reused by the next
        // message inside the threshold
        insert_msg(
            &storage,
            &MsgSeed {
                timestamp: T0 + 2 * 60 * 60 + 10 * 60,
                ..MsgSeed::new(102, ChatId::new(10))
            },
        )
        .await;
        let third = MimeFactory::load(&storage, MsgId::new(102)).await.unwrap();
        assert_eq!(second.references, third.references);
    }

    #[tokio::test]
    async fn test_predecessor_skips_own_messages() {
        let storage = storage_with_single_chat().await;
        insert_msg(
            &storage,
            &MsgSeed {
                from_id: ContactId::new(20),
                global_id: "from-bob@x.com".to_string(),
                timestamp: T0,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;
        insert_msg(
            &storage,
            &MsgSeed {
                timestamp: T0 + 10,
                ..MsgSeed::new(101, ChatId::new(10))
            },
        )
        .await;
        insert_msg(
            &storage,
            &MsgSeed {
                timestamp: T0 + 20,
                ..MsgSeed::new(102, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(102)).await.unwrap();
        assert_eq!(factory.predecessor.as_deref(), Some("from-bob@x.com"));
    }

    #[tokio::test]
    async fn test_render_empty_text_fails() {
        let storage = storage_with_single_chat().await;
        insert_msg(
            &storage,
            &MsgSeed {
                text: String::new(),
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let result = factory.render(&PlaintextEncryptor, false).await;
        assert!(matches!(result, Err(Error::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_render_signature_alone_is_content() {
        let storage = storage_with_single_chat().await;
        set_config(&storage, "signature", "Sent from mailchat").await;
        insert_msg(
            &storage,
            &MsgSeed {
                text: String::new(),
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&PlaintextEncryptor, false).await.unwrap();
        assert!(!rendered.encrypted);

        let wire = String::from_utf8(rendered.bytes).unwrap();
        assert!(wire.contains("-- \nSent from mailchat"));
    }

    #[tokio::test]
    async fn test_render_headers_and_subject() {
        let storage = storage_with_single_chat().await;
        set_config(&storage, "displayname", "Me").await;
        insert_msg(
            &storage,
            &MsgSeed {
                text: "hello there".to_string(),
                global_id: "msg-1@example.com".to_string(),
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&PlaintextEncryptor, false).await.unwrap();
        let wire = String::from_utf8(rendered.bytes).unwrap();

        assert!(wire.contains("From: Me <me@example.com>\r\n"));
        assert!(wire.contains("To: Bob <bob@x.com>\r\n"));
        assert!(wire.contains("Message-ID: <msg-1@example.com>\r\n"));
        assert!(wire.contains("X-Chat-Version: 1.0\r\n"));
        assert!(wire.contains("Disposition-Notification-To: me@example.com\r\n"));
        assert!(wire.contains("Subject: Chat: hello there\r\n"));
        assert!(wire.contains("\r\nhello there\r\n"));
    }

    #[tokio::test]
    async fn test_render_group_headers() {
        let storage = Storage::in_memory().await.unwrap();
        set_config(&storage, "configured_addr", "me@example.com").await;
        insert_chat(&storage, 11, ChatType::Group, "Rust circle").await;
        let bob = insert_contact(&storage, 20, "Bob", "bob@x.com").await;
        add_chat_member(&storage, ChatId::new(11), bob).await;
        insert_msg(
            &storage,
            &MsgSeed {
                text: "hi all".to_string(),
                ..MsgSeed::new(100, ChatId::new(11))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&PlaintextEncryptor, false).await.unwrap();
        let wire = String::from_utf8(rendered.bytes).unwrap();

        assert!(wire.contains("X-Chat-Group-Id: grp11\r\n"));
        assert!(wire.contains("X-Chat-Group-Name: Rust circle\r\n"));
        assert!(wire.contains("Subject: Chat: Rust circle: hi all\r\n"));
    }

    #[tokio::test]
    async fn test_render_forward_hint_and_subject() {
        let storage = storage_with_single_chat().await;
        let mut param = Param::new();
        param.set(crate::param::keys::FORWARDED_ADDR, "alice@x.com");
        param.set(crate::param::keys::FORWARDED_NAME, "Alice");
        insert_msg(
            &storage,
            &MsgSeed {
                text: "original words".to_string(),
                param,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&PlaintextEncryptor, false).await.unwrap();
        let wire = String::from_utf8(rendered.bytes).unwrap();

        assert!(wire.contains(
            "---------- Forwarded message ----------\nFrom: Alice <alice@x.com>\n\n"
        ));
        assert!(wire.contains("Subject: Chat: Fwd: original words\r\n"));
    }

    #[tokio::test]
    async fn test_render_encrypted_subject_placeholder() {
        struct AlwaysEncrypts;
        impl Encryptor for AlwaysEncrypts {
            async fn encrypt(
                &self,
                _recipients: &[String],
                _guarantee: bool,
                _encrypt_to_self: bool,
                _message: &mut MimeMessage,
            ) -> bool {
                true
            }
            fn release(&self) {}
        }

        let storage = storage_with_single_chat().await;
        insert_msg(
            &storage,
            &MsgSeed {
                text: "secret".to_string(),
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&AlwaysEncrypts, false).await.unwrap();
        assert!(rendered.encrypted);

        let wire = String::from_utf8(rendered.bytes).unwrap();
        assert!(wire.contains("Subject: Chat: Encrypted message\r\n"));
        assert!(!wire.contains("Subject: Chat: secret"));
    }

    #[tokio::test]
    async fn test_encrypt_to_self_bypasses_encryptor() {
        struct Panicking;
        impl Encryptor for Panicking {
            async fn encrypt(
                &self,
                _recipients: &[String],
                _guarantee: bool,
                _encrypt_to_self: bool,
                _message: &mut MimeMessage,
            ) -> bool {
                panic!("encryptor must not run for the plain self-copy");
            }
            fn release(&self) {}
        }

        let storage = storage_with_single_chat().await;
        insert_msg(
            &storage,
            &MsgSeed {
                text: "plain self copy".to_string(),
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&Panicking, true).await.unwrap();
        assert!(!rendered.encrypted);
    }

    #[tokio::test]
    async fn test_render_image_attachment() {
        let dir = std::env::temp_dir().join("mailchat-mimefactory-test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("IMG_20260101_123456.PNG");
        tokio::fs::write(&path, b"\x89PNG fake").await.unwrap();

        let storage = storage_with_single_chat().await;
        let mut param = Param::new();
        param.set(crate::param::keys::FILE, path.to_string_lossy());
        insert_msg(
            &storage,
            &MsgSeed {
                msg_type: MsgType::Image,
                text: String::new(),
                param,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&PlaintextEncryptor, false).await.unwrap();
        let wire = String::from_utf8(rendered.bytes).unwrap();

        // Generic name instead of the camera filename, type inferred
        // from the suffix
        assert!(wire.contains("attachment; filename=\"image.png\""));
        assert!(wire.contains("Content-Type: image/png\r\n"));
        assert!(wire.contains("Content-Transfer-Encoding: base64\r\n"));
    }

    #[tokio::test]
    async fn test_attachment_missing_path_is_omitted() {
        let storage = storage_with_single_chat().await;
        insert_msg(
            &storage,
            &MsgSeed {
                msg_type: MsgType::Image,
                text: "caption in text field".to_string(),
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        // No file path: render fails because the text field of an
        // image message is not body content
        let result = factory.render(&PlaintextEncryptor, false).await;
        assert!(matches!(result, Err(Error::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_voice_message_headers() {
        let dir = std::env::temp_dir().join("mailchat-mimefactory-test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("rec-77.ogg");
        tokio::fs::write(&path, b"oggdata").await.unwrap();

        let storage = storage_with_single_chat().await;
        let mut param = Param::new();
        param.set(crate::param::keys::FILE, path.to_string_lossy());
        param.set_int(crate::param::keys::DURATION_MS, 2500);
        insert_msg(
            &storage,
            &MsgSeed {
                msg_type: MsgType::Voice,
                text: String::new(),
                param,
                state: MsgState::OutPending,
                ..MsgSeed::new(100, ChatId::new(10))
            },
        )
        .await;

        let factory = MimeFactory::load(&storage, MsgId::new(100)).await.unwrap();
        let rendered = factory.render(&PlaintextEncryptor, false).await.unwrap();
        let wire = String::from_utf8(rendered.bytes).unwrap();

        assert!(wire.contains("X-Chat-Voice-Message: 1\r\n"));
        assert!(wire.contains("X-Chat-Duration-Ms: 2500\r\n"));
        assert!(wire.contains("filename=\"voice-message_"));
        assert!(wire.contains(".ogg\""));
    }
}
