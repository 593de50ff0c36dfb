use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use winmail::{decode, Diagnostics, FinalAttachment, ParseResult};
use winmail::tnef::attachment::FALLBACK_NAME;


/// Decode a TNEF (winmail.dat) file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Print the decoded message as JSON.
    #[arg(long)]
    json: bool,

    /// Write the attachments into this directory.
    #[arg(short = 'x', long, value_name = "DIR")]
    extract: Option<PathBuf>,

    /// The TNEF file to decode.
    file: PathBuf,
}


/// Reduces an attachment name to a single path component that is safe to
/// create inside the extraction directory.
fn safe_file_name(name: &str) -> String {
    let base_name = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = base_name
        .chars()
        .map(|c| if c.is_control() || c == ':' { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => FALLBACK_NAME.to_owned(),
        trimmed => trimmed.to_owned(),
    }
}

fn unique_file_name(name: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = name.to_owned();
    let mut counter = 1;
    while !taken.insert(candidate.clone()) {
        counter += 1;
        candidate = match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => format!("{} ({}).{}", stem, counter, extension),
            _ => format!("{} ({})", name, counter),
        };
    }
    candidate
}

fn extract_attachments(attachments: &[FinalAttachment], dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut taken = HashSet::new();
    for attachment in attachments {
        let file_name = unique_file_name(&safe_file_name(&attachment.name), &mut taken);
        let path = dir.join(&file_name);
        fs::write(&path, &attachment.data)?;
        info!("wrote {} ({} bytes)", path.display(), attachment.data.len());
    }
    Ok(())
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_clean() {
        return;
    }
    println!("warnings:");
    if let Some(offset) = diagnostics.truncated_at {
        println!("    stream truncated at offset {}", offset);
    }
    for mismatch in &diagnostics.checksum_mismatches {
        println!(
            "    checksum mismatch in {:?} at offset {} (calculated 0x{:04X}, obtained 0x{:04X})",
            mismatch.id, mismatch.attribute_offset, mismatch.calculated, mismatch.obtained,
        );
    }
    for skipped in &diagnostics.skipped_properties {
        println!(
            "    skipped {:?} property {:?} in attribute at offset {}: {:?}",
            skipped.note.prop_type, skipped.note.tag, skipped.attribute_offset, skipped.note.reason,
        );
    }
    for stopped in &diagnostics.stopped_blocks {
        println!("    property block at offset {} abandoned: {:?}", stopped.attribute_offset, stopped.note);
    }
    for ignored in &diagnostics.ignored_attributes {
        println!("    ignored {:?}.{:?} at offset {}", ignored.level, ignored.id, ignored.attribute_offset);
    }
    if let Some(rtf_error) = &diagnostics.rtf_error {
        println!("    RTF body not decoded: {}", rtf_error);
    }
}

fn print_summary(result: &ParseResult) {
    println!("subject: {}", result.subject);
    println!("from: {}", result.from);
    if let Some(codepage) = result.diagnostics.codepage {
        println!("codepage: {}", codepage);
    }
    println!("body: {} characters", result.body.chars().count());
    println!("HTML body: {} characters", result.body_html.chars().count());
    if let Some(rtf) = &result.body_rtf {
        println!("RTF body: {} bytes", rtf.len());
    }
    println!("attachments: {}", result.attachments.len());
    for attachment in &result.attachments {
        println!("    {} ({}, {} bytes)", attachment.name, attachment.mime_type, attachment.size);
    }
    print_diagnostics(&result.diagnostics);
}


fn run(args: &Args) -> anyhow::Result<()> {
    let buf = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let result = decode(&buf)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("failed to serialize result")?;
        println!("{}", json);
    } else {
        print_summary(&result);
    }

    if let Some(dir) = &args.extract {
        extract_attachments(&result.attachments, dir)
            .with_context(|| format!("failed to extract attachments to {}", dir.display()))?;
    }

    Ok(())
}


fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("report.pdf"), "report.pdf");
        assert_eq!(safe_file_name("..\\..\\evil.exe"), "evil.exe");
        assert_eq!(safe_file_name("/etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:notes.txt"), "C_notes.txt");
        assert_eq!(safe_file_name(".."), FALLBACK_NAME);
        assert_eq!(safe_file_name("dir/"), FALLBACK_NAME);
    }

    #[test]
    fn test_unique_file_name() {
        let mut taken = HashSet::new();
        assert_eq!(unique_file_name("a.txt", &mut taken), "a.txt");
        assert_eq!(unique_file_name("a.txt", &mut taken), "a (2).txt");
        assert_eq!(unique_file_name("a.txt", &mut taken), "a (3).txt");
        assert_eq!(unique_file_name("noext", &mut taken), "noext");
        assert_eq!(unique_file_name("noext", &mut taken), "noext (2)");
    }

    #[test]
    fn test_run_reports_error_chain() {
        let tmp = tempfile::tempdir().unwrap();

        let missing = Args { json: false, extract: None, file: tmp.path().join("missing.dat") };
        let message = format!("{:#}", run(&missing).unwrap_err());
        assert!(message.starts_with("failed to read "), "{}", message);
        assert!(message.contains("missing.dat"), "{}", message);

        let not_tnef = tmp.path().join("not_tnef.dat");
        fs::write(&not_tnef, b"PK\x03\x04").unwrap();
        let args = Args { json: false, extract: None, file: not_tnef };
        let message = format!("{:#}", run(&args).unwrap_err());
        assert!(message.starts_with("failed to decode "), "{}", message);
        assert!(message.contains("not a recognized container"), "{}", message);
    }

    #[test]
    fn test_run_extracts_attachments() {
        let tmp = tempfile::tempdir().unwrap();
        let mut data = winmail::TNEF_SIGNATURE.to_le_bytes().to_vec();
        data.extend_from_slice(&[0x01, 0x00]);
        for (id, payload) in [(0x0006_9002u32, &b"rend"[..]), (0x0006_800F, &b"abc"[..])] {
            data.push(0x02);
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            data.extend_from_slice(payload);
            let checksum = payload.iter().fold(0u16, |sum, &b| sum.wrapping_add(b.into()));
            data.extend_from_slice(&checksum.to_le_bytes());
        }
        let file = tmp.path().join("winmail.dat");
        fs::write(&file, &data).unwrap();

        let out = tmp.path().join("out");
        let args = Args { json: true, extract: Some(out.clone()), file };
        run(&args).unwrap();
        assert_eq!(fs::read(out.join(FALLBACK_NAME)).unwrap(), b"abc");
    }
}
