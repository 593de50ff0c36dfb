use from_to_repr::from_to_other;


/// Property tags (the upper 16 bits of a property identifier) used by TNEF
/// message and attachment property blocks.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u16, derive_compare = "as_int")]
pub enum PropTag {
    TagMessageClass = 0x001A,
    TagSubject = 0x0037,
    TagClientSubmitTime = 0x0039,
    TagSentRepresentingName = 0x0042,
    TagSentRepresentingEmailAddress = 0x0065,
    TagTransportMessageHeaders = 0x007D,
    TagSenderName = 0x0C1A,
    TagSenderEmailAddress = 0x0C1F,
    TagMessageDeliveryTime = 0x0E06,
    TagMessageFlags = 0x0E07,
    TagAttachSize = 0x0E20,
    TagBody = 0x1000,
    TagRtfCompressed = 0x1009,
    TagBodyHtml = 0x1013,
    TagDisplayName = 0x3001,
    TagCreationTime = 0x3007,
    TagLastModificationTime = 0x3008,
    TagAttachDataBinary = 0x3701,
    TagAttachExtension = 0x3703,
    TagAttachFilename = 0x3704,
    TagAttachMethod = 0x3705,
    TagAttachLongFilename = 0x3707,
    TagRenderingPosition = 0x370B,
    TagAttachMimeTag = 0x370E,
    TagAttachContentId = 0x3712,
    TagInternetCodepage = 0x3FDE,
    Other(u16),
}
