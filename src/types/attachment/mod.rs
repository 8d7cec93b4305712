//! Message attachments
//!
//! Rocket.Chat sends attachments as one open-ended JSON object with no type
//! tag: the kind of attachment is implied by which fields are present. The
//! decoder in [`decode`] resolves that shape into one [`Attachment`] variant
//! and the encoder in [`encode`] writes the canonical object back.
//!
//! Variant selection uses a fixed priority. When an object carries several
//! trigger fields, the first match in this list wins:
//!
//! 1. `image_url`  → [`Attachment::Image`]
//! 2. `video_url`  → [`Attachment::Video`]
//! 3. `audio_url`  → [`Attachment::Audio`]
//! 4. `text`       → [`Attachment::Message`]
//! 5. `author_link` → [`Attachment::Author`]

mod decode;
mod encode;

use serde::{Deserialize, Serialize};

pub use decode::{decode, decode_attachment, decode_list};
pub use encode::{encode, encode_attachment};

/// A rich-content block attached to a chat message
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Image(ImageAttachment),
    Video(VideoAttachment),
    Audio(AudioAttachment),
    Message(MessageAttachment),
    Author(AuthorAttachment),
}

impl Attachment {
    /// Name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Attachment::Image(_) => "image",
            Attachment::Video(_) => "video",
            Attachment::Audio(_) => "audio",
            Attachment::Message(_) => "message",
            Attachment::Author(_) => "author",
        }
    }
}

/// An image file, optionally with an inline base64 preview
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageAttachment {
    pub title: Option<String>,
    pub description: Option<String>,
    pub title_link: Option<String>,
    pub title_link_download: bool,
    /// `image_url`
    pub url: String,
    pub image_type: Option<String>,
    pub image_size: Option<i64>,
    /// `data:{image_type};base64,{payload}` when the server sent a preview.
    /// Not encoded unless `image_type` is set.
    pub preview: Option<String>,
}

impl ImageAttachment {
    pub fn new(url: impl Into<String>) -> Self {
        ImageAttachment {
            url: url.into(),
            ..Default::default()
        }
    }

    /// The raw base64 payload of the preview, without the data-URI prefix
    pub fn preview_payload(&self) -> Option<&str> {
        let preview = self.preview.as_deref()?;
        let stripped = self
            .image_type
            .as_deref()
            .and_then(|t| preview.strip_prefix("data:")?.strip_prefix(t)?.strip_prefix(";base64,"));
        Some(stripped.unwrap_or(preview))
    }
}

/// A video file. Type and size are mandatory on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAttachment {
    pub title: Option<String>,
    pub description: Option<String>,
    pub title_link: Option<String>,
    pub title_link_download: bool,
    /// `video_url`
    pub url: String,
    pub video_type: String,
    pub video_size: i64,
}

/// An audio file. Type and size are mandatory on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAttachment {
    pub title: Option<String>,
    pub description: Option<String>,
    pub title_link: Option<String>,
    pub title_link_download: bool,
    /// `audio_url`
    pub url: String,
    pub audio_type: String,
    pub audio_size: i64,
}

/// A quoted message, possibly carrying its own attachments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageAttachment {
    pub author_name: Option<String>,
    pub author_icon: Option<String>,
    pub text: String,
    pub thumb_url: Option<String>,
    pub color: Option<String>,
    pub message_link: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    /// Epoch milliseconds (`ts`)
    pub timestamp: Option<i64>,
}

impl MessageAttachment {
    pub fn new(text: impl Into<String>) -> Self {
        MessageAttachment {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// An author card with an optional table of fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorAttachment {
    pub author_link: String,
    pub author_icon: Option<String>,
    pub author_name: Option<String>,
    pub fields: Option<Vec<Field>>,
}

impl AuthorAttachment {
    pub fn new(author_link: impl Into<String>) -> Self {
        AuthorAttachment {
            author_link: author_link.into(),
            ..Default::default()
        }
    }
}

/// One row of an author card
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, deserialize_with = "decode::string_or_number")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "decode::string_or_number")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "decode::bool_or_false")]
    pub short: bool,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Field {
            title: Some(title.into()),
            value: Some(value.into()),
            short,
        }
    }
}
