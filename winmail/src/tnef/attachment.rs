//! Assembly of attachments from consecutive attachment-level attributes.
//!
//! Every `attAttachRendData` opens a new attachment; the attributes following
//! it fill in its fields until the next one (or the end of the stream)
//! closes it.

use std::mem;

use log::{debug, warn};
use msox::TnefAttributeId;
use serde::Serialize;

use crate::mime::{extension_of, mime_type_for_extension, DEFAULT_MIME_TYPE};
use crate::tnef::props::AttachmentProps;


/// The name given to attachments that carry none of their own.
pub const FALLBACK_NAME: &str = "attachment";


/// An attachment whose fields are still being collected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawAttachment {
    pub title: Option<String>,
    pub filename: Option<String>,
    pub long_filename: Option<String>,
    pub display_name: Option<String>,
    pub data: Option<Vec<u8>>,
    pub mime_type: String,
    pub extension: Option<String>,
    pub content_id: Option<String>,
}
impl Default for RawAttachment {
    fn default() -> Self {
        Self {
            title: None,
            filename: None,
            long_filename: None,
            display_name: None,
            data: None,
            mime_type: DEFAULT_MIME_TYPE.to_owned(),
            extension: None,
            content_id: None,
        }
    }
}
impl RawAttachment {
    fn apply_props(&mut self, props: AttachmentProps) {
        let AttachmentProps { filename, long_filename, display_name, mime_tag, extension, content_id, data } = props;
        if filename.is_some() {
            self.filename = filename;
        }
        if long_filename.is_some() {
            self.long_filename = long_filename;
        }
        if display_name.is_some() {
            self.display_name = display_name;
        }
        if let Some(mt) = mime_tag {
            self.mime_type = mt;
        }
        if extension.is_some() {
            self.extension = extension;
        }
        if content_id.is_some() {
            self.content_id = content_id;
        }
        if data.is_some() {
            self.data = data;
        }
    }

    /// Picks the best available name: long filename, short filename, display
    /// name, legacy title, then [`FALLBACK_NAME`].
    pub fn resolve_name(&self) -> &str {
        [&self.long_filename, &self.filename, &self.display_name, &self.title]
            .into_iter()
            .flatten()
            .map(|n| n.as_str())
            .find(|n| !n.is_empty())
            .unwrap_or(FALLBACK_NAME)
    }

    /// Returns the MIME type, inferring it from the file extension when no
    /// explicit one was given.
    pub fn resolve_mime_type(&self, name: &str) -> String {
        if self.mime_type != DEFAULT_MIME_TYPE {
            return self.mime_type.clone();
        }

        let extension = extension_of(name).or_else(|| {
            self.extension
                .as_deref()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
        });
        extension
            .as_deref()
            .and_then(mime_type_for_extension)
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_owned()
    }

    /// Turns the collected fields into a final attachment, or `None` if no
    /// content was ever supplied.
    pub fn finish(self) -> Option<FinalAttachment> {
        if self.data.as_ref().map_or(true, |d| d.is_empty()) {
            return None;
        }
        let name = self.resolve_name().to_owned();
        let mime_type = self.resolve_mime_type(&name);
        let data = self.data.unwrap_or_default();
        Some(FinalAttachment {
            size: data.len(),
            name,
            data,
            mime_type,
            content_id: self.content_id,
        })
    }
}

/// A decoded attachment.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalAttachment {
    pub name: String,
    pub size: usize,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}


/// Something an attachment-level attribute can do to the assembler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttachmentEvent {
    RendData,
    Title(String),
    Data(Vec<u8>),
    Props(AttachmentProps),
    Other(TnefAttributeId),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum AttachmentState {
    #[default]
    Idle,
    Accumulating(RawAttachment),
}

/// What happened to an event handed to the assembler.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Transition {
    Opened,
    Updated,
    /// The event carried nothing the assembler uses.
    Unused,
    /// The event arrived while no attachment was open and was dropped.
    Orphaned,
}


#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttachmentAssembler {
    state: AttachmentState,
    closed: Vec<RawAttachment>,
}
impl AttachmentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AttachmentState {
        &self.state
    }

    pub fn handle(&mut self, event: AttachmentEvent) -> Transition {
        let state = mem::take(&mut self.state);
        let (next_state, transition) = match (state, event) {
            (AttachmentState::Idle, AttachmentEvent::RendData) => {
                (AttachmentState::Accumulating(RawAttachment::default()), Transition::Opened)
            },
            (AttachmentState::Accumulating(open), AttachmentEvent::RendData) => {
                self.closed.push(open);
                (AttachmentState::Accumulating(RawAttachment::default()), Transition::Opened)
            },
            (AttachmentState::Accumulating(mut open), AttachmentEvent::Title(title)) => {
                open.title = Some(title);
                (AttachmentState::Accumulating(open), Transition::Updated)
            },
            (AttachmentState::Accumulating(mut open), AttachmentEvent::Data(data)) => {
                open.data = Some(data);
                (AttachmentState::Accumulating(open), Transition::Updated)
            },
            (AttachmentState::Accumulating(mut open), AttachmentEvent::Props(props)) => {
                open.apply_props(props);
                (AttachmentState::Accumulating(open), Transition::Updated)
            },
            (AttachmentState::Accumulating(open), AttachmentEvent::Other(id)) => {
                debug!("attachment attribute {:?} not used", id);
                (AttachmentState::Accumulating(open), Transition::Unused)
            },
            (AttachmentState::Idle, AttachmentEvent::Other(id)) => {
                debug!("attachment attribute {:?} outside of an attachment not used", id);
                (AttachmentState::Idle, Transition::Unused)
            },
            (AttachmentState::Idle, AttachmentEvent::Title(_)|AttachmentEvent::Data(_)|AttachmentEvent::Props(_)) => {
                warn!("attachment attribute before any attAttachRendData; dropping it");
                (AttachmentState::Idle, Transition::Orphaned)
            },
        };
        self.state = next_state;
        transition
    }

    /// Closes the open attachment, if any, and returns every attachment that
    /// has content, in stream order.
    pub fn finish(mut self) -> Vec<FinalAttachment> {
        if let AttachmentState::Accumulating(open) = mem::take(&mut self.state) {
            self.closed.push(open);
        }

        let total = self.closed.len();
        let attachments: Vec<FinalAttachment> = self.closed
            .into_iter()
            .filter_map(RawAttachment::finish)
            .collect();
        if attachments.len() < total {
            debug!("dropped {} attachments without content", total - attachments.len());
        }
        attachments
    }
}
