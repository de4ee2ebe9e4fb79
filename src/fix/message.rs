// src/fix/message.rs - FIX Message Model
//! Outbound and inbound FIX application messages
//!
//! Both sides are plain field maps. Session-level framing (BodyLength,
//! sequence numbers, CheckSum) is applied by the transport engine, so neither
//! type carries it.

use rust_decimal::Decimal;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::{self, Display},
    str::FromStr,
};

use crate::{core::types::SessionId, fix::tags, OmsError, OmsResult};

const SOH: char = '\x01';
const DISPLAY_DELIMITER: char = '|';

/// Version-specific application message ready for the transport
///
/// Body fields are kept ordered by tag so two messages built from the same
/// order compare and render identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    begin_string: String,
    msg_type: String,
    body: BTreeMap<u32, String>,
}

impl WireMessage {
    /// Empty message of the given type
    pub fn new(begin_string: &str, msg_type: &str) -> Self {
        Self {
            begin_string: begin_string.to_string(),
            msg_type: msg_type.to_string(),
            body: BTreeMap::new(),
        }
    }

    /// Set a body field, replacing any previous value
    pub fn set(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        self.body.insert(tag, value.into());
        self
    }

    /// BeginString this message was built for
    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    /// MsgType
    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    /// Body field value
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.body.get(&tag).map(String::as_str)
    }

    /// Whether the body carries `tag`
    pub fn has(&self, tag: u32) -> bool {
        self.body.contains_key(&tag)
    }

    /// Body tags in ascending order
    pub fn tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.body.keys().copied()
    }

    /// Render as `tag=value` pairs joined by `delimiter`, header first
    pub fn to_tag_value(&self, delimiter: char) -> String {
        let mut out = format!(
            "{}={}{delimiter}{}={}",
            tags::BEGIN_STRING,
            self.begin_string,
            tags::MSG_TYPE,
            self.msg_type
        );
        for (tag, value) in &self.body {
            out.push(delimiter);
            out.push_str(&format!("{tag}={value}"));
        }
        out
    }
}

impl Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tag_value(DISPLAY_DELIMITER))
    }
}

/// Application message delivered by the transport engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// MsgType
    pub msg_type: String,
    /// All fields by tag, header included
    pub fields: HashMap<u32, String>,
}

impl InboundMessage {
    /// Message with only its MsgType set
    pub fn new(msg_type: &str) -> Self {
        let mut fields = HashMap::new();
        fields.insert(tags::MSG_TYPE, msg_type.to_string());
        Self {
            msg_type: msg_type.to_string(),
            fields,
        }
    }

    /// Add a field
    #[must_use]
    pub fn with(mut self, tag: u32, value: impl Into<String>) -> Self {
        self.fields.insert(tag, value.into());
        self
    }

    /// Parse SOH- or `|`-delimited `tag=value` text
    ///
    /// Text containing SOH is split on SOH alone, so values may carry `|`.
    /// `|` is only a delimiter in SOH-free, display-form text.
    pub fn parse(raw: &str) -> OmsResult<Self> {
        let raw = raw.trim();
        let delimiter = if raw.contains(SOH) { SOH } else { DISPLAY_DELIMITER };
        let mut fields = HashMap::new();

        for part in raw.split(delimiter).filter(|p| !p.is_empty()) {
            let (tag, value) = part.split_once('=').ok_or_else(|| OmsError::MalformedMessage {
                tag: None,
                reason: format!("expected tag=value, got {part:?}"),
            })?;
            let tag = tag.parse::<u32>().map_err(|_| OmsError::MalformedMessage {
                tag: None,
                reason: format!("invalid tag {tag:?}"),
            })?;
            fields.insert(tag, value.to_string());
        }

        let msg_type = fields
            .get(&tags::MSG_TYPE)
            .cloned()
            .ok_or_else(|| OmsError::missing_field(tags::MSG_TYPE))?;

        Ok(Self { msg_type, fields })
    }

    /// Field value, if present
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    /// Whether `tag` is present
    pub fn has(&self, tag: u32) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Field value, failing if absent or empty
    pub fn require(&self, tag: u32) -> OmsResult<&str> {
        self.get(tag)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OmsError::missing_field(tag))
    }

    /// Required decimal field
    pub fn decimal(&self, tag: u32) -> OmsResult<Decimal> {
        let raw = self.require(tag)?;
        Decimal::from_str(raw).map_err(|_| OmsError::MalformedMessage {
            tag: Some(tag),
            reason: format!("not a decimal: {raw:?}"),
        })
    }

    /// Our side of the session the message arrived on
    ///
    /// The counter-party's SenderCompID is our TargetCompID and vice versa.
    pub fn local_session(&self) -> OmsResult<SessionId> {
        Ok(SessionId::new(
            self.require(tags::BEGIN_STRING)?,
            self.require(tags::TARGET_COMP_ID)?,
            self.require(tags::SENDER_COMP_ID)?,
        ))
    }

    /// Decimal field that may be absent
    pub fn optional_decimal(&self, tag: u32) -> OmsResult<Option<Decimal>> {
        if self.has(tag) {
            self.decimal(tag).map(Some)
        } else {
            Ok(None)
        }
    }
}
