use from_to_repr::from_to_other;


/// The scope of a TNEF attribute.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u8, derive_compare = "as_int")]
pub enum TnefAttributeLevel {
    Message = 0x01,
    Attachment = 0x02,
    Other(u8),
}

/// TNEF attribute identifiers.
///
/// These are the lower 16 bits of the attribute word; the upper 16 bits hold
/// the attribute's data type, which is implied by the identifier.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u16, derive_compare = "as_int")]
pub enum TnefAttributeId {
    Owner = 0x0000,
    SentFor = 0x0001,
    Delegate = 0x0002,
    DateStart = 0x0006,
    DateEnd = 0x0007,
    AidOwner = 0x0008,
    RequestRes = 0x0009,
    OriginalMessageClass = 0x0600,
    From = 0x8000,
    Subject = 0x8004,
    DateSent = 0x8005,
    DateReceived = 0x8006,
    MessageStatus = 0x8007,
    MessageClass = 0x8008,
    MessageId = 0x8009,
    ParentId = 0x800A,
    ConversationId = 0x800B,
    Body = 0x800C,
    Priority = 0x800D,
    AttachData = 0x800F,
    AttachTitle = 0x8010,
    AttachMetaFile = 0x8011,
    AttachCreateDate = 0x8012,
    AttachModifyDate = 0x8013,
    DateModified = 0x8020,
    AttachTransportFilename = 0x9001,
    AttachRendData = 0x9002,
    MsgProps = 0x9003,
    RecipTable = 0x9004,
    Attachment = 0x9005,
    TnefVersion = 0x9006,
    OemCodepage = 0x9007,
    Other(u16),
}
