//! Extension-based MIME type inference for attachments without a MIME tag.

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";


/// Returns the MIME type registered for a lowercase file extension (without
/// the leading dot).
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let mime_type = match extension {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "rtf" => "application/rtf",
        "zip" => "application/zip",
        "7z" => "application/x-7z-compressed",
        "gz" => "application/gzip",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "htm" | "html" => "text/html",
        "ics" => "text/calendar",
        "vcf" => "text/vcard",
        "eml" => "message/rfc822",
        "msg" => "application/vnd.ms-outlook",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime_type)
}

/// Extracts the lowercase extension of a file name, if it has one.
///
/// Both `/` and `\` count as path separators; a leading dot (as in
/// `.profile`) does not start an extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    let base_name = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    match base_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty()
            => Some(extension.to_lowercase()),
        _ => None,
    }
}
