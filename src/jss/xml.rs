// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Classic API XML documents.
//!
//! The Classic API speaks XML. git2jss only writes a handful of elements and
//! only reads back names and identifiers, so documents are rendered and
//! scanned directly instead of going through a full XML object model.
//!
//! # Script Layout
//!
//! Script bodies are sent base64 encoded through `script_contents_encoded`,
//! because the JSS mangles some characters that survive XML escaping. The
//! change log goes into `notes`.
//!
//! # Extension Attribute Layout
//!
//! Extension attributes carry their script inside the `Mac` platform entry of
//! `input_type`. The change log goes into `description`.

use crate::jss::{ObjectId, ObjectKind, ObjectRecord};

use base64::{engine::general_purpose::STANDARD, Engine};
use regex::Regex;
use std::sync::LazyLock;

static ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<id>\s*(\d+)\s*</id>").expect("id pattern is valid"));

static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<id>\s*(\d+)\s*</id>\s*<name>(.*?)</name>").expect("summary pattern is valid")
});

/// Render record as document for target kind.
pub fn render(kind: ObjectKind, record: &ObjectRecord) -> String {
    let name = escape(&record.name);
    let notes = escape(&record.notes);

    match kind {
        ObjectKind::Script => format!(
            "<script>\
             <name>{name}</name>\
             <notes>{notes}</notes>\
             <script_contents_encoded>{}</script_contents_encoded>\
             </script>",
            STANDARD.encode(record.body.as_bytes())
        ),
        ObjectKind::ComputerExtensionAttribute => format!(
            "<computer_extension_attribute>\
             <name>{name}</name>\
             <description>{notes}</description>\
             <input_type>\
             <type>script</type>\
             <platform>Mac</platform>\
             <script>{}</script>\
             </input_type>\
             </computer_extension_attribute>",
            escape(&record.body)
        ),
    }
}

/// Extract id and name of every object in a list document.
///
/// Names are unescaped so they compare equal to local file names.
pub fn parse_summaries(document: &str) -> Vec<(ObjectId, String)> {
    SUMMARY
        .captures_iter(document)
        .filter_map(|caps| {
            let id = caps[1].parse().ok()?;
            Some((ObjectId(id), unescape(&caps[2])))
        })
        .collect()
}

/// Extract first object id in a document.
pub fn parse_id(document: &str) -> Option<ObjectId> {
    ID.captures(document)
        .and_then(|caps| caps[1].parse().ok())
        .map(ObjectId)
}

/// Escape text for use inside an element.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }

    out
}

/// Undo [`escape`], plus numeric character references.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let Some(end) = rest.find(';') else {
            break;
        };

        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
