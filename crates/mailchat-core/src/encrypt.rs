//! Contract of the end-to-end encryption collaborator.
//!
//! The cryptographic scheme is implemented elsewhere. The collaborator
//! may rewrite the message headers and parts in place; whatever
//! resources it attaches are freed by `release`, which the renderer
//! calls after serialization regardless of the encryption outcome.

use mailchat_mime::MimeMessage;

/// Contract of the encryption collaborator.
pub trait Encryptor {
    /// Attempts to encrypt the message in place for the given
    /// recipients; returns whether encryption succeeded.
    ///
    /// `guarantee` is set when the message insists on end-to-end
    /// encryption; `encrypt_to_self` marks the copy uploaded to the
    /// sender's own mailbox.
    fn encrypt(
        &self,
        recipients: &[String],
        guarantee: bool,
        encrypt_to_self: bool,
        message: &mut MimeMessage,
    ) -> impl Future<Output = bool> + Send;

    /// Frees resources attached to the message during `encrypt`.
    fn release(&self);
}

/// No-op encryptor for callers without key material and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextEncryptor;

impl Encryptor for PlaintextEncryptor {
    async fn encrypt(
        &self,
        _recipients: &[String],
        _guarantee: bool,
        _encrypt_to_self: bool,
        _message: &mut MimeMessage,
    ) -> bool {
        false
    }

    fn release(&self) {}
}
