//! Tabular text codec for the directory snapshot
//!
//! The snapshot is serialized as comma-separated text with a fixed header
//! row, one record per line. Fields containing the delimiter, quotes or
//! newlines are quoted with doubled inner quotes, so round-tripping is
//! lossless. This is the plaintext that gets encrypted; it is not a public
//! wire format.

use crate::directory::{DirectorySnapshot, UserRecord};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

/// Fixed column order; parsing rejects any other header.
const HEADER: &str = "id,username,email,displayName,isActive,lastLogin";

const COLUMNS: usize = 6;

/// Serialize a snapshot to tabular text
pub fn to_table(snapshot: &DirectorySnapshot) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for user in &snapshot.users {
        let last_login = user
            .last_login
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();

        let fields = [
            user.id.as_str(),
            user.username.as_str(),
            user.email.as_str(),
            user.name.as_str(),
            if user.is_active { "true" } else { "false" },
            last_login.as_str(),
        ];

        let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Parse tabular text back into a snapshot
pub fn from_table(text: &str) -> Result<DirectorySnapshot> {
    let mut rows = parse_rows(text)?;

    if rows.is_empty() {
        return Err(Error::CorruptSnapshot("Missing header row".to_string()));
    }

    let header = rows.remove(0);
    if header.join(",") != HEADER {
        return Err(Error::CorruptSnapshot(format!(
            "Unexpected header: {}",
            header.join(",")
        )));
    }

    let mut users = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != COLUMNS {
            return Err(Error::CorruptSnapshot(format!(
                "Row {} has {} columns, expected {}",
                i + 1,
                row.len(),
                COLUMNS
            )));
        }

        let is_active = match row[4].as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(Error::CorruptSnapshot(format!(
                    "Row {}: invalid isActive value '{}'",
                    i + 1,
                    other
                )))
            }
        };

        let last_login = if row[5].is_empty() {
            None
        } else {
            let parsed = DateTime::parse_from_rfc3339(&row[5]).map_err(|e| {
                Error::CorruptSnapshot(format!("Row {}: invalid lastLogin: {}", i + 1, e))
            })?;
            Some(parsed.with_timezone(&Utc))
        };

        users.push(UserRecord {
            id: row[0].clone(),
            username: row[1].clone(),
            email: row[2].clone(),
            name: row[3].clone(),
            is_active,
            last_login,
        });
    }

    Ok(DirectorySnapshot::new(users))
}

/// Quote a field if it contains the delimiter, a quote or a line break
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split text into rows of fields, honoring quoted fields
fn parse_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    let mut saw_any = false;

    while let Some(c) = chars.next() {
        saw_any = true;
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    row.push(std::mem::take(&mut field));
                }
                '\r' => {
                    // Tolerate CRLF line endings
                    if chars.peek() == Some(&'\n') {
                        continue;
                    }
                    field.push(c);
                }
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(Error::CorruptSnapshot(
            "Unterminated quoted field".to_string(),
        ));
    }

    // Final row without a trailing newline
    if saw_any && (!field.is_empty() || !row.is_empty()) {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}
