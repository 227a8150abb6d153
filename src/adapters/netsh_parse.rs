use super::{AdapterRecord, AdapterStatus, Diagnostic, Listing};
use crate::error::NicError;
use tracing::warn;

/// Parse the table printed by `netsh interface show interface`.
///
/// ```text
/// Admin State    State          Type             Interface Name
/// -------------------------------------------------------------------------
/// Enabled        Connected      Dedicated        Ethernet
/// Disabled       Disconnected   Dedicated        Wi-Fi Adapter #2
/// ```
///
/// Data starts on the line following the first `---` separator. A missing
/// separator, or one with nothing after it, is a [`NicError::ParseFormat`].
/// Lines that cannot be turned into a record are skipped and reported in
/// [`Listing::diagnostics`].
pub fn parse_interface_table(netsh_output: &str) -> Result<Listing, NicError> {
    let lines: Vec<&str> = netsh_output.lines().collect();
    let start = match lines
        .iter()
        .position(|line| line.trim().starts_with("---"))
    {
        Some(separator) if separator + 1 < lines.len() => separator + 1,
        _ => return Err(NicError::ParseFormat),
    };

    let mut listing = Listing::default();
    for line in lines[start..].iter().filter(|l| !l.trim().is_empty()) {
        match parse_line(line) {
            Ok(record) => listing.adapters.push(record),
            Err(diagnostic) => {
                warn!("{}", diagnostic);
                listing.diagnostics.push(diagnostic);
            }
        }
    }

    if listing.adapters.is_empty() && !netsh_output.trim().is_empty() {
        let diagnostic = Diagnostic::NoAdapters {
            output: netsh_output.to_owned(),
        };
        warn!("{}", diagnostic);
        listing.diagnostics.push(diagnostic);
    }
    Ok(listing)
}

fn parse_line(line: &str) -> Result<AdapterRecord, Diagnostic> {
    // Admin state, connect state, type, then at least one name token.
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(Diagnostic::MalformedLine {
            line: line.trim().to_owned(),
            tokens: tokens.len(),
        });
    }
    let name = extract_name(line, &tokens);
    if name.is_empty() {
        return Err(Diagnostic::EmptyName {
            line: line.trim().to_owned(),
        });
    }
    Ok(AdapterRecord {
        name,
        status: AdapterStatus::from_token(tokens[0]),
    })
}

/// Name of the adapter described by `line`, split into `tokens`.
///
/// The text following the type column in the original line wins, as it keeps
/// runs of spaces inside the name. When the type cannot be located, the
/// tokens after the type are joined with single spaces.
pub(crate) fn extract_name(line: &str, tokens: &[&str]) -> String {
    match name_after_type(line, tokens) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => tokens[3..].join(" "),
    }
}

fn name_after_type<'a>(line: &'a str, tokens: &[&str]) -> Option<&'a str> {
    // The type is searched after both status columns so that a type token
    // which is also a substring of a status cannot match too early.
    let mut rest = line;
    for token in &tokens[..3] {
        let at = rest.find(token)?;
        rest = &rest[at + token.len()..];
    }
    Some(rest.trim())
}
