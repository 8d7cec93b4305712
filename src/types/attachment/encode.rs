use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};

use super::{
    Attachment, AudioAttachment, AuthorAttachment, ImageAttachment, MessageAttachment,
    VideoAttachment,
};

/// Encode an attachment, writing JSON `null` for `None`
pub fn encode<S>(attachment: Option<&Attachment>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match attachment {
        Some(attachment) => attachment.serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// Encode an attachment to a JSON string
pub fn encode_attachment(attachment: Option<&Attachment>) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::new(&mut out);
    encode(attachment, &mut serializer)?;
    String::from_utf8(out).map_err(|e| Error::parse(format!("Encoded attachment is not UTF-8: {e}")))
}

/// Write `key` only when `value` is present
fn entry<M, T>(map: &mut M, key: &'static str, value: &Option<T>) -> std::result::Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize,
{
    match value {
        Some(value) => map.serialize_entry(key, value),
        None => Ok(()),
    }
}

/// Common header of the file attachments (image, video, audio)
fn file_header<M: SerializeMap>(
    map: &mut M,
    title: &Option<String>,
    description: &Option<String>,
    title_link: &Option<String>,
    title_link_download: bool,
) -> std::result::Result<(), M::Error> {
    entry(map, "title", title)?;
    entry(map, "description", description)?;
    entry(map, "title_link", title_link)?;
    map.serialize_entry("title_link_download", &title_link_download)
}

impl Serialize for Attachment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Attachment::Image(image) => image.serialize(serializer),
            Attachment::Video(video) => video.serialize(serializer),
            Attachment::Audio(audio) => audio.serialize(serializer),
            Attachment::Message(message) => message.serialize(serializer),
            Attachment::Author(author) => author.serialize(serializer),
        }
    }
}

impl Serialize for ImageAttachment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        file_header(&mut map, &self.title, &self.description, &self.title_link, self.title_link_download)?;
        map.serialize_entry("image_url", &self.url)?;
        entry(&mut map, "image_type", &self.image_type)?;
        entry(&mut map, "image_size", &self.image_size)?;
        // a preview can only be decoded alongside its type
        entry(&mut map, "image_preview", &self.image_type.as_ref().and(self.preview_payload()))?;
        map.end()
    }
}

impl Serialize for VideoAttachment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        file_header(&mut map, &self.title, &self.description, &self.title_link, self.title_link_download)?;
        map.serialize_entry("video_url", &self.url)?;
        map.serialize_entry("video_type", &self.video_type)?;
        map.serialize_entry("video_size", &self.video_size)?;
        map.end()
    }
}

impl Serialize for AudioAttachment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        file_header(&mut map, &self.title, &self.description, &self.title_link, self.title_link_download)?;
        map.serialize_entry("audio_url", &self.url)?;
        map.serialize_entry("audio_type", &self.audio_type)?;
        map.serialize_entry("audio_size", &self.audio_size)?;
        map.end()
    }
}

impl Serialize for MessageAttachment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        entry(&mut map, "author_name", &self.author_name)?;
        entry(&mut map, "author_icon", &self.author_icon)?;
        map.serialize_entry("text", &self.text)?;
        entry(&mut map, "thumb_url", &self.thumb_url)?;
        entry(&mut map, "color", &self.color)?;
        entry(&mut map, "message_link", &self.message_link)?;
        entry(&mut map, "attachments", &self.attachments)?;
        entry(&mut map, "ts", &self.timestamp)?;
        map.end()
    }
}

impl Serialize for AuthorAttachment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("author_link", &self.author_link)?;
        entry(&mut map, "author_icon", &self.author_icon)?;
        entry(&mut map, "author_name", &self.author_name)?;
        if let Some(fields) = self.fields.as_ref().filter(|fields| !fields.is_empty()) {
            map.serialize_entry("fields", fields)?;
        }
        map.end()
    }
}
