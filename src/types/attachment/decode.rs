use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::error::Result;
use crate::types::timestamp::Millis;

use super::{
    Attachment, AudioAttachment, AuthorAttachment, Field, ImageAttachment, MessageAttachment,
    VideoAttachment,
};

/// Decode one attachment from `deserializer`.
///
/// Returns `Ok(None)` for a JSON `null` and for objects that carry none of
/// the trigger fields. Unknown keys are logged and skipped. A video or audio
/// attachment without its type or size fails with a `missing field` error;
/// by then the whole object has been consumed.
pub fn decode<'de, D>(deserializer: D) -> std::result::Result<Option<Attachment>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(AttachmentVisitor)
}

/// `#[serde(deserialize_with = ...)]` helper for a nullable list of attachments.
///
/// Elements that decode to `None` are dropped. Any element error fails the
/// whole list.
pub fn decode_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<Attachment>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<AttachmentList>::deserialize(deserializer)?.map(|list| list.0))
}

/// Decode a single attachment from a JSON string
pub fn decode_attachment(json: &str) -> Result<Option<Attachment>> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let attachment = decode(&mut deserializer)?;
    deserializer.end()?;
    Ok(attachment)
}

pub(super) fn bool_or_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// `deserialize_with` helper: a nullable string that also takes a number,
/// rendered as its decimal text
pub(super) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LenientString::deserialize(deserializer)?.0)
}

/// A nullable string; numbers are accepted and converted to text
struct LenientString(Option<String>);

impl<'de> Deserialize<'de> for LenientString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<LenientString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientStringVisitor)
    }
}

struct LenientStringVisitor;

impl<'de> Visitor<'de> for LenientStringVisitor {
    type Value = LenientString;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, a number or null")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
        Ok(LenientString(Some(value.to_owned())))
    }

    fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Self::Value, E> {
        Ok(LenientString(Some(value)))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
        Ok(LenientString(Some(value.to_string())))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
        Ok(LenientString(Some(value.to_string())))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Self::Value, E> {
        Ok(LenientString(Some(value.to_string())))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

/// A nullable integer; integral floats and numeric strings are accepted
struct LenientLong(Option<i64>);

impl<'de> Deserialize<'de> for LenientLong {
    fn deserialize<D>(deserializer: D) -> std::result::Result<LenientLong, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientLongVisitor)
    }
}

struct LenientLongVisitor;

impl<'de> Visitor<'de> for LenientLongVisitor {
    type Value = LenientLong;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer, an integral float, a numeric string or null")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
        Ok(LenientLong(Some(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
        i64::try_from(value)
            .map(|v| LenientLong(Some(v)))
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Self::Value, E> {
        if value.is_finite() && value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
            Ok(LenientLong(Some(value as i64)))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
        value
            .trim()
            .parse::<i64>()
            .map(|v| LenientLong(Some(v)))
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(LenientLong(None))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(LenientLong(None))
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

/// Attachment keys, matched case-sensitively
#[derive(Debug, PartialEq)]
enum Key {
    Title,
    Type,
    Description,
    AuthorName,
    Text,
    ThumbUrl,
    Color,
    TitleLink,
    TitleLinkDownload,
    ImageUrl,
    ImageType,
    ImageSize,
    VideoUrl,
    VideoType,
    VideoSize,
    AudioUrl,
    AudioType,
    AudioSize,
    MessageLink,
    Attachments,
    Ts,
    AuthorIcon,
    AuthorLink,
    ImagePreview,
    Fields,
    Unknown(String),
}

impl Key {
    fn from_name(name: &str) -> Key {
        match name {
            "title" => Key::Title,
            "type" => Key::Type,
            "description" => Key::Description,
            "author_name" => Key::AuthorName,
            "text" => Key::Text,
            "thumb_url" => Key::ThumbUrl,
            "color" => Key::Color,
            "title_link" => Key::TitleLink,
            "title_link_download" => Key::TitleLinkDownload,
            "image_url" => Key::ImageUrl,
            "image_type" => Key::ImageType,
            "image_size" => Key::ImageSize,
            "video_url" => Key::VideoUrl,
            "video_type" => Key::VideoType,
            "video_size" => Key::VideoSize,
            "audio_url" => Key::AudioUrl,
            "audio_type" => Key::AudioType,
            "audio_size" => Key::AudioSize,
            "message_link" => Key::MessageLink,
            "attachments" => Key::Attachments,
            "ts" => Key::Ts,
            "author_icon" => Key::AuthorIcon,
            "author_link" => Key::AuthorLink,
            "image_preview" => Key::ImagePreview,
            "fields" => Key::Fields,
            other => Key::Unknown(other.to_owned()),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Key, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_identifier(KeyVisitor)
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an attachment field name")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Key, E> {
        Ok(Key::from_name(value))
    }
}

/// Everything read from one attachment object, before a variant is chosen
#[derive(Default)]
struct Accumulator {
    title: Option<String>,
    declared_type: Option<String>,
    description: Option<String>,
    author_name: Option<String>,
    text: Option<String>,
    thumb_url: Option<String>,
    color: Option<String>,
    title_link: Option<String>,
    title_link_download: bool,
    image_url: Option<String>,
    image_type: Option<String>,
    image_size: Option<i64>,
    video_url: Option<String>,
    video_type: Option<String>,
    video_size: Option<i64>,
    audio_url: Option<String>,
    audio_type: Option<String>,
    audio_size: Option<i64>,
    message_link: Option<String>,
    attachments: Option<Vec<Attachment>>,
    timestamp: Option<i64>,
    author_icon: Option<String>,
    author_link: Option<String>,
    image_preview: Option<String>,
    fields: Option<Vec<Field>>,
    unknown: Vec<String>,
}

impl Accumulator {
    fn into_attachment<E: de::Error>(self) -> std::result::Result<Option<Attachment>, E> {
        if let Some(url) = self.image_url {
            let preview = match (self.image_preview, &self.image_type) {
                (Some(payload), Some(image_type)) => {
                    Some(format!("data:{};base64,{}", image_type, payload))
                }
                (Some(_), None) => {
                    return Err(E::custom("image_preview is present but imageType is null"))
                }
                (None, _) => None,
            };
            return Ok(Some(Attachment::Image(ImageAttachment {
                title: self.title,
                description: self.description,
                title_link: self.title_link,
                title_link_download: self.title_link_download,
                url,
                image_type: self.image_type,
                image_size: self.image_size,
                preview,
            })));
        }

        if let Some(url) = self.video_url {
            let video_type = self.video_type.ok_or_else(|| E::missing_field("videoType"))?;
            let video_size = self.video_size.ok_or_else(|| E::missing_field("videoSize"))?;
            return Ok(Some(Attachment::Video(VideoAttachment {
                title: self.title,
                description: self.description,
                title_link: self.title_link,
                title_link_download: self.title_link_download,
                url,
                video_type,
                video_size,
            })));
        }

        if let Some(url) = self.audio_url {
            let audio_type = self.audio_type.ok_or_else(|| E::missing_field("audioType"))?;
            let audio_size = self.audio_size.ok_or_else(|| E::missing_field("audioSize"))?;
            return Ok(Some(Attachment::Audio(AudioAttachment {
                title: self.title,
                description: self.description,
                title_link: self.title_link,
                title_link_download: self.title_link_download,
                url,
                audio_type,
                audio_size,
            })));
        }

        if let Some(text) = self.text {
            return Ok(Some(Attachment::Message(MessageAttachment {
                author_name: self.author_name,
                author_icon: self.author_icon,
                text,
                thumb_url: self.thumb_url,
                color: self.color,
                message_link: self.message_link,
                attachments: self.attachments,
                timestamp: self.timestamp,
            })));
        }

        if let Some(author_link) = self.author_link {
            return Ok(Some(Attachment::Author(AuthorAttachment {
                author_link,
                author_icon: self.author_icon,
                author_name: self.author_name,
                fields: self.fields,
            })));
        }

        log::debug!(
            "Invalid attachment: supported are image, video, audio, message and author - type: {:?}, unknown fields: {:?}",
            self.declared_type,
            self.unknown
        );
        Ok(None)
    }
}

struct AttachmentVisitor;

impl<'de> Visitor<'de> for AttachmentVisitor {
    type Value = Option<Attachment>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an attachment object or null")
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut acc = Accumulator::default();

        while let Some(key) = map.next_key::<Key>()? {
            match key {
                Key::Title => acc.title = map.next_value::<LenientString>()?.0,
                Key::Type => acc.declared_type = map.next_value::<LenientString>()?.0,
                Key::Description => acc.description = map.next_value::<LenientString>()?.0,
                Key::AuthorName => acc.author_name = map.next_value::<LenientString>()?.0,
                Key::Text => acc.text = map.next_value::<LenientString>()?.0,
                Key::ThumbUrl => acc.thumb_url = map.next_value::<LenientString>()?.0,
                Key::Color => acc.color = map.next_value::<LenientString>()?.0,
                Key::TitleLink => acc.title_link = map.next_value::<LenientString>()?.0,
                Key::TitleLinkDownload => {
                    acc.title_link_download = map.next_value::<Option<bool>>()?.unwrap_or(false)
                }
                Key::ImageUrl => acc.image_url = map.next_value::<LenientString>()?.0,
                Key::ImageType => acc.image_type = map.next_value::<LenientString>()?.0,
                Key::ImageSize => acc.image_size = map.next_value::<LenientLong>()?.0,
                Key::VideoUrl => acc.video_url = map.next_value::<LenientString>()?.0,
                Key::VideoType => acc.video_type = map.next_value::<LenientString>()?.0,
                Key::VideoSize => acc.video_size = map.next_value::<LenientLong>()?.0,
                Key::AudioUrl => acc.audio_url = map.next_value::<LenientString>()?.0,
                Key::AudioType => acc.audio_type = map.next_value::<LenientString>()?.0,
                Key::AudioSize => acc.audio_size = map.next_value::<LenientLong>()?.0,
                Key::MessageLink => acc.message_link = map.next_value::<LenientString>()?.0,
                Key::Attachments => {
                    acc.attachments = map.next_value::<Option<AttachmentList>>()?.map(|list| list.0)
                }
                Key::Ts => acc.timestamp = map.next_value::<Option<Millis>>()?.map(|m| m.0),
                Key::AuthorIcon => acc.author_icon = map.next_value::<LenientString>()?.0,
                Key::AuthorLink => acc.author_link = map.next_value::<LenientString>()?.0,
                Key::ImagePreview => acc.image_preview = map.next_value::<LenientString>()?.0,
                Key::Fields => acc.fields = map.next_value()?,
                Key::Unknown(name) => {
                    log::debug!("Unknown/unmapped attachment field: {}", name);
                    map.next_value::<IgnoredAny>()?;
                    acc.unknown.push(name);
                }
            }
        }

        acc.into_attachment()
    }
}

/// One list element; `None` when the element was null or unmatched
struct MaybeAttachment(Option<Attachment>);

impl<'de> Deserialize<'de> for MaybeAttachment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<MaybeAttachment, D::Error>
    where
        D: Deserializer<'de>,
    {
        decode(deserializer).map(MaybeAttachment)
    }
}

struct AttachmentList(Vec<Attachment>);

impl<'de> Deserialize<'de> for AttachmentList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<AttachmentList, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(AttachmentListVisitor)
    }
}

struct AttachmentListVisitor;

impl<'de> Visitor<'de> for AttachmentListVisitor {
    type Value = AttachmentList;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a list of attachments")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut attachments = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(MaybeAttachment(item)) = seq.next_element()? {
            if let Some(attachment) = item {
                attachments.push(attachment);
            }
        }
        Ok(AttachmentList(attachments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn decode_str(json: &str) -> Option<Attachment> {
        decode_attachment(json).unwrap()
    }

    #[test]
    fn test_null_is_none() {
        assert_eq!(decode_str("null"), None);
    }

    #[test]
    fn test_no_trigger_is_none() {
        assert_eq!(decode_str(r#"{"foo": "bar"}"#), None);
        assert_eq!(decode_str(r#"{"title": "t", "type": "file"}"#), None);
        assert_eq!(decode_str("{}"), None);
    }

    #[test]
    fn test_image_with_preview() {
        let json = r#"{"image_url": "u", "image_preview": "AAAA", "image_type": "image/png"}"#;
        match decode_str(json) {
            Some(Attachment::Image(image)) => {
                assert_eq!(image.url, "u");
                assert_eq!(image.image_type.as_deref(), Some("image/png"));
                assert_eq!(image.preview.as_deref(), Some("data:image/png;base64,AAAA"));
                assert!(!image.title_link_download);
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_image_full() {
        let json = r#"{
            "title": "cat.png",
            "description": "a cat",
            "title_link": "/file-upload/cat.png",
            "title_link_download": true,
            "image_url": "/file-upload/cat.png",
            "image_type": "image/png",
            "image_size": 2048
        }"#;
        let expected = ImageAttachment {
            title: Some("cat.png".to_string()),
            description: Some("a cat".to_string()),
            title_link: Some("/file-upload/cat.png".to_string()),
            title_link_download: true,
            url: "/file-upload/cat.png".to_string(),
            image_type: Some("image/png".to_string()),
            image_size: Some(2048),
            preview: None,
        };
        assert_eq!(decode_str(json), Some(Attachment::Image(expected)));
    }

    #[test]
    fn test_image_preview_without_type_fails() {
        let err = decode_attachment(r#"{"image_url": "u", "image_preview": "AAAA"}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
        assert!(err.message.contains("imageType"), "{}", err.message);
    }

    #[test]
    fn test_video_missing_type_fails() {
        let err = decode_attachment(r#"{"video_url": "u"}"#).unwrap_err();
        assert!(err.message.contains("videoType"), "{}", err.message);
    }

    #[test]
    fn test_video_missing_size_fails() {
        let err = decode_attachment(r#"{"video_url": "u", "video_type": "video/mp4"}"#).unwrap_err();
        assert!(err.message.contains("videoSize"), "{}", err.message);
    }

    #[test]
    fn test_video() {
        let json = r#"{"video_url": "v", "video_type": "video/mp4", "video_size": 10, "title": "clip"}"#;
        match decode_str(json) {
            Some(Attachment::Video(video)) => {
                assert_eq!(video.url, "v");
                assert_eq!(video.video_type, "video/mp4");
                assert_eq!(video.video_size, 10);
                assert_eq!(video.title.as_deref(), Some("clip"));
            }
            other => panic!("expected video, got {:?}", other),
        }
    }

    #[test]
    fn test_audio_missing_fields_fail() {
        let err = decode_attachment(r#"{"audio_url": "a", "audio_size": 3}"#).unwrap_err();
        assert!(err.message.contains("audioType"), "{}", err.message);
        let err = decode_attachment(r#"{"audio_url": "a", "audio_type": "audio/mp3"}"#).unwrap_err();
        assert!(err.message.contains("audioSize"), "{}", err.message);
    }

    #[test]
    fn test_audio() {
        let json = r#"{"audio_url": "a", "audio_type": "audio/mp3", "audio_size": 3}"#;
        match decode_str(json) {
            Some(Attachment::Audio(audio)) => {
                assert_eq!(audio.url, "a");
                assert_eq!(audio.audio_type, "audio/mp3");
                assert_eq!(audio.audio_size, 3);
            }
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[test]
    fn test_priority_image_wins() {
        let json = r#"{"text": "hi", "author_link": "l", "audio_url": "a", "video_url": "v", "image_url": "i"}"#;
        assert!(matches!(decode_str(json), Some(Attachment::Image(_))));
    }

    #[test]
    fn test_priority_video_over_audio_and_text() {
        let json = r#"{"text": "hi", "audio_url": "a", "video_url": "v", "video_type": "video/mp4", "video_size": 1}"#;
        assert!(matches!(decode_str(json), Some(Attachment::Video(_))));
    }

    #[test]
    fn test_priority_video_missing_fields_does_not_fall_through() {
        let json = r#"{"text": "hi", "video_url": "v"}"#;
        assert!(decode_attachment(json).is_err());
    }

    #[test]
    fn test_priority_text_over_author() {
        let json = r#"{"text": "hi", "author_link": "l"}"#;
        assert!(matches!(decode_str(json), Some(Attachment::Message(_))));
    }

    #[test]
    fn test_message_with_nested_attachments() {
        let json = r#"{"text": "hi", "attachments": [{"image_url": "u2"}]}"#;
        match decode_str(json) {
            Some(Attachment::Message(message)) => {
                assert_eq!(message.text, "hi");
                let nested = message.attachments.expect("nested attachments");
                assert_eq!(nested, vec![Attachment::Image(ImageAttachment::new("u2"))]);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_unmatched_and_null_elements_are_dropped() {
        let json = r#"{"text": "hi", "attachments": [null, {"foo": 1}, {"text": "inner"}]}"#;
        match decode_str(json) {
            Some(Attachment::Message(message)) => {
                let nested = message.attachments.unwrap();
                assert_eq!(nested, vec![Attachment::Message(MessageAttachment::new("inner"))]);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_error_fails_enclosing_attachment() {
        let json = r#"{"text": "hi", "attachments": [{"image_url": "ok"}, {"video_url": "bad"}]}"#;
        let err = decode_attachment(json).unwrap_err();
        assert!(err.message.contains("videoType"), "{}", err.message);
    }

    #[test]
    fn test_message_fields_and_timestamp() {
        let json = r##"{
            "author_name": "testuser",
            "author_icon": "/avatar/testuser",
            "text": "quoted",
            "thumb_url": "/thumb",
            "color": "#ff0000",
            "message_link": "https://chat.example.com/channel/general?msg=abc",
            "ts": "2017-11-23T13:32:44.798Z"
        }"##;
        match decode_str(json) {
            Some(Attachment::Message(message)) => {
                assert_eq!(message.author_name.as_deref(), Some("testuser"));
                assert_eq!(message.author_icon.as_deref(), Some("/avatar/testuser"));
                assert_eq!(message.thumb_url.as_deref(), Some("/thumb"));
                assert_eq!(message.color.as_deref(), Some("#ff0000"));
                assert!(message.message_link.is_some());
                assert_eq!(message.timestamp, Some(1511443964798));
                assert!(message.attachments.is_none());
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_ddp_shape() {
        let json = r#"{"text": "t", "ts": {"$date": 1511443964798}}"#;
        match decode_str(json) {
            Some(Attachment::Message(message)) => assert_eq!(message.timestamp, Some(1511443964798)),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_author_with_fields() {
        let json = r#"{"author_link": "l", "fields": [{"title": "t", "value": "v", "short": true}]}"#;
        match decode_str(json) {
            Some(Attachment::Author(author)) => {
                assert_eq!(author.author_link, "l");
                assert_eq!(author.fields, Some(vec![Field::new("t", "v", true)]));
            }
            other => panic!("expected author, got {:?}", other),
        }
    }

    #[test]
    fn test_field_nulls() {
        let json = r#"{"author_link": "l", "fields": [{"title": null, "value": null, "short": null}]}"#;
        match decode_str(json) {
            Some(Attachment::Author(author)) => {
                assert_eq!(author.fields, Some(vec![Field::default()]));
            }
            other => panic!("expected author, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let json = r#"{"foo": {"deep": [1, 2, {"x": null}]}, "image_url": "u", "bar": [true]}"#;
        assert_eq!(decode_str(json), Some(Attachment::Image(ImageAttachment::new("u"))));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        assert_eq!(decode_str(r#"{"Image_Url": "u"}"#), None);
    }

    #[test]
    fn test_null_values() {
        let json = r#"{"image_url": "u", "title": null, "title_link_download": null, "image_size": null, "attachments": null, "fields": null, "ts": null}"#;
        assert_eq!(decode_str(json), Some(Attachment::Image(ImageAttachment::new("u"))));
    }

    #[test]
    fn test_wrong_value_type_is_an_error() {
        assert!(decode_attachment(r#"{"image_url": true}"#).is_err());
        assert!(decode_attachment(r#"{"image_url": ["u"]}"#).is_err());
        assert!(decode_attachment(r#"{"image_url": "u", "image_size": "big"}"#).is_err());
        assert!(decode_attachment(r#"{"image_url": "u", "image_size": 1.5}"#).is_err());
        assert!(decode_attachment(r#"{"image_url": "u", "image_size": {"n": 1}}"#).is_err());
    }

    #[test]
    fn test_numeric_field_value_becomes_text() {
        let json = r#"{"author_link": "l", "fields": [{"title": "Count", "value": 5}, {"title": 7, "value": 2.5}]}"#;
        match decode_str(json) {
            Some(Attachment::Author(author)) => {
                let fields = author.fields.unwrap();
                assert_eq!(fields[0], Field::new("Count", "5", false));
                assert_eq!(fields[1], Field::new("7", "2.5", false));
            }
            other => panic!("expected author, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_string_members_become_text() {
        match decode_str(r#"{"text": "hi", "title": 42}"#) {
            Some(Attachment::Message(message)) => assert_eq!(message.text, "hi"),
            other => panic!("expected message, got {:?}", other),
        }
        // a numeric trigger still selects its variant
        match decode_str(r#"{"text": 12}"#) {
            Some(Attachment::Message(message)) => assert_eq!(message.text, "12"),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_sizes() {
        for json in [
            r#"{"image_url": "u", "image_size": 2048.0}"#,
            r#"{"image_url": "u", "image_size": "2048"}"#,
            r#"{"image_url": "u", "image_size": 2048}"#,
        ] {
            match decode_str(json) {
                Some(Attachment::Image(image)) => assert_eq!(image.image_size, Some(2048)),
                other => panic!("expected image for {}, got {:?}", json, other),
            }
        }

        let json = r#"{"video_url": "v", "video_type": "video/mp4", "video_size": "99"}"#;
        match decode_str(json) {
            Some(Attachment::Video(video)) => assert_eq!(video.video_size, 99),
            other => panic!("expected video, got {:?}", other),
        }
    }

    #[test]
    fn test_message_with_lenient_attachment() {
        let json = r#"{
            "_id": "m1", "rid": "GENERAL", "msg": "", "ts": 1511443964798,
            "attachments": [
                {"author_link": "l", "fields": [{"title": "Count", "value": 5}]},
                {"image_url": "u", "image_size": 2048.0, "title": 3}
            ]
        }"#;
        let message: crate::types::Message = serde_json::from_str(json).unwrap();
        let attachments = message.attachments.unwrap();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].kind(), "author");
        match &attachments[1] {
            Attachment::Image(image) => {
                assert_eq!(image.image_size, Some(2048));
                assert_eq!(image.title.as_deref(), Some("3"));
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_position_after_object() {
        let json = r#"[{"foo": "bar"}, {"video_url": "v", "video_type": "video/mp4", "video_size": 1}]"#;
        #[derive(Deserialize)]
        struct Holder(
            #[serde(deserialize_with = "decode")] Option<Attachment>,
            #[serde(deserialize_with = "decode")] Option<Attachment>,
        );
        let Holder(first, second) = serde_json::from_str(json).unwrap();
        assert_eq!(first, None);
        assert!(matches!(second, Some(Attachment::Video(_))));
    }

    #[test]
    fn test_decode_list_helper() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "decode_list")]
            attachments: Option<Vec<Attachment>>,
        }

        let holder: Holder = serde_json::from_str(r#"{"attachments": [{"text": "a"}, {"x": 1}]}"#).unwrap();
        assert_eq!(holder.attachments.map(|a| a.len()), Some(1));

        let holder: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert!(holder.attachments.is_none());

        let holder: Holder = serde_json::from_str(r#"{"attachments": null}"#).unwrap();
        assert!(holder.attachments.is_none());
    }

    #[test]
    fn test_trailing_data_is_rejected() {
        assert!(decode_attachment(r#"{"text": "a"} {"text": "b"}"#).is_err());
    }
}
