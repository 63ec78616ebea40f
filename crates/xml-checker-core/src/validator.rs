use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Why a file is not well-formed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// The document violates XML well-formedness rules.
    #[error("{message}: line {line}, column {column}")]
    Malformed {
        message: String,
        line: usize,
        column: usize,
    },

    /// The file could not be opened or read.
    #[error("{message}")]
    Access { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    WellFormed,
    NotWellFormed(CheckFailure),
}

/// Outcome of checking a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheckResult {
    path: PathBuf,
    verdict: Verdict,
}

impl FileCheckResult {
    pub fn new(path: impl Into<PathBuf>, verdict: Verdict) -> Self {
        Self {
            path: path.into(),
            verdict,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn well_formed(&self) -> bool {
        matches!(self.verdict, Verdict::WellFormed)
    }

    pub fn failure(&self) -> Option<&CheckFailure> {
        match &self.verdict {
            Verdict::WellFormed => None,
            Verdict::NotWellFormed(failure) => Some(failure),
        }
    }

    /// Human-readable diagnostic naming the file and the cause, `None` when well-formed.
    pub fn diagnostic(&self) -> Option<String> {
        self.failure()
            .map(|failure| Diagnostic(&self.path, failure).to_string())
    }
}

struct Diagnostic<'a>(&'a Path, &'a CheckFailure);

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            CheckFailure::Malformed { .. } => write!(
                f,
                "{}: XML is not well-formed. Error: {}",
                self.0.display(),
                self.1
            ),
            CheckFailure::Access { .. } => {
                write!(f, "{}: Unable to read file: {}", self.0.display(), self.1)
            }
        }
    }
}

/// Read `path` and check that it holds a well-formed XML document.
///
/// Never fails: I/O problems and parse errors are both folded into the
/// returned [`FileCheckResult`]. The file handle is closed before returning.
pub fn validate(path: &Path) -> FileCheckResult {
    let verdict = match fs::read(path) {
        Ok(bytes) => match check_bytes(&bytes) {
            Ok(()) => Verdict::WellFormed,
            Err(failure) => Verdict::NotWellFormed(failure),
        },
        Err(err) => Verdict::NotWellFormed(CheckFailure::Access {
            message: err.to_string(),
        }),
    };

    match &verdict {
        Verdict::WellFormed => trace!("{} is well-formed", path.display()),
        Verdict::NotWellFormed(failure) => debug!("{} failed: {}", path.display(), failure),
    }

    FileCheckResult::new(path, verdict)
}

/// Decode raw file contents and check them.
///
/// UTF-8 (with or without BOM) and BOM-marked UTF-16 are accepted, as is
/// any other encoding named in the XML declaration.
pub fn check_bytes(bytes: &[u8]) -> Result<(), CheckFailure> {
    let text = decode(bytes)?;
    check_document(&text)
}

fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, CheckFailure> {
    let utf16 = match bytes {
        [0xFF, 0xFE, rest @ ..] => Some((rest, true)),
        [0xFE, 0xFF, rest @ ..] => Some((rest, false)),
        _ => None,
    };

    if let Some((rest, little_endian)) = utf16 {
        if rest.len() % 2 != 0 {
            return Err(CheckFailure::Malformed {
                message: "not well-formed (truncated UTF-16 sequence)".to_string(),
                line: 1,
                column: 1,
            });
        }
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| {
                let pair = [pair[0], pair[1]];
                if little_endian {
                    u16::from_le_bytes(pair)
                } else {
                    u16::from_be_bytes(pair)
                }
            })
            .collect();
        return String::from_utf16(&units)
            .map(Cow::Owned)
            .map_err(|_| CheckFailure::Malformed {
                message: "not well-formed (invalid UTF-16 sequence)".to_string(),
                line: 1,
                column: 1,
            });
    }

    if let Some(label) = declared_encoding(bytes) {
        let encoding = match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => encoding,
            None => {
                return Err(CheckFailure::Malformed {
                    message: format!("unknown encoding '{label}'"),
                    line: 1,
                    column: 1,
                })
            }
        };
        if encoding == UTF_16LE || encoding == UTF_16BE {
            return Err(CheckFailure::Malformed {
                message: format!("encoding '{label}' declared without a byte order mark"),
                line: 1,
                column: 1,
            });
        }
        if encoding != UTF_8 {
            return encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or_else(|| CheckFailure::Malformed {
                    message: format!("not well-formed (invalid {} sequence)", encoding.name()),
                    line: 1,
                    column: 1,
                });
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(err) => {
            let valid = &bytes[..err.valid_up_to()];
            let (line, column) = line_column(valid, valid.len());
            Err(CheckFailure::Malformed {
                message: "not well-formed (invalid UTF-8 sequence)".to_string(),
                line,
                column,
            })
        }
    }
}

/// The `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let end = bytes.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&bytes[..end]).ok()?;
    let (_, after) = declaration.split_once("encoding")?;
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &after[1..];
    let close = rest.find(quote)?;
    Some(rest[..close].to_string())
}

/// Check an in-memory document for well-formedness.
pub fn check_document(text: &str) -> Result<(), CheckFailure> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    DocumentChecker::new(text).run()
}

struct DocumentChecker<'a> {
    text: &'a str,
    reader: Reader<&'a [u8]>,
    open: Vec<String>,
    entities: HashMap<String, String>,
    seen_root: bool,
    seen_doctype: bool,
    seen_any: bool,
}

impl<'a> DocumentChecker<'a> {
    fn new(text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        let config = reader.config_mut();
        config.check_end_names = true;
        config.check_comments = true;
        config.expand_empty_elements = false;
        config.trim_text(false);

        Self {
            text,
            reader,
            open: Vec::new(),
            entities: HashMap::new(),
            seen_root: false,
            seen_doctype: false,
            seen_any: false,
        }
    }

    fn run(mut self) -> Result<(), CheckFailure> {
        if let Some((offset, c)) = self.text.char_indices().find(|(_, c)| !is_xml_char(*c)) {
            return Err(self.fail_at(
                offset,
                format!("not well-formed (invalid character U+{:04X})", c as u32),
            ));
        }

        loop {
            let start = self.reader.buffer_position() as usize;
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    let offset = self.reader.error_position() as usize;
                    return Err(self.fail_at(offset, err.to_string()));
                }
            };

            match event {
                Event::Decl(decl) => {
                    if self.seen_any {
                        return Err(self.fail_at(
                            start,
                            "XML or text declaration not at start of entity",
                        ));
                    }
                    if let Err(err) = decl.version() {
                        return Err(self.fail_at(start, err.to_string()));
                    }
                }
                Event::DocType(doctype) => {
                    if self.seen_root {
                        return Err(self.fail_at(start, "DOCTYPE after the root element"));
                    }
                    if self.seen_doctype {
                        return Err(self.fail_at(start, "syntax error (second DOCTYPE)"));
                    }
                    self.seen_doctype = true;
                    let declarations = String::from_utf8_lossy(&doctype);
                    self.entities.extend(entity_declarations(&declarations));
                }
                Event::Start(element) => {
                    let name = self.open_element(&element, start)?;
                    self.open.push(name);
                }
                Event::Empty(element) => {
                    self.open_element(&element, start)?;
                }
                Event::End(element) => {
                    let found = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    match self.open.pop() {
                        Some(expected) if expected == found => {}
                        Some(expected) => {
                            return Err(self.fail_at(
                                start,
                                format!("mismatched tag: expected </{expected}>, found </{found}>"),
                            ))
                        }
                        None => {
                            return Err(self.fail_at(
                                start,
                                format!("unmatched end tag </{found}>"),
                            ))
                        }
                    }
                }
                Event::Text(text) => {
                    if let Some(pos) = text.windows(3).position(|w| w == b"]]>") {
                        return Err(self.fail_at(
                            start + pos,
                            "not well-formed (']]>' in character data)",
                        ));
                    }
                    let entities = &self.entities;
                    let content = match text.unescape_with(|name| resolve_entity(entities, name)) {
                        Ok(content) => content,
                        Err(err) => return Err(self.fail_at(start, err.to_string())),
                    };
                    if self.open.is_empty() && !content.trim().is_empty() {
                        return Err(self.fail_at(
                            start,
                            "syntax error (text outside the root element)",
                        ));
                    }
                    self.check_chars(&content, start)?;
                }
                Event::CData(_) => {
                    if self.open.is_empty() {
                        return Err(self.fail_at(start, "CDATA section outside the root element"));
                    }
                }
                Event::Comment(_) | Event::PI(_) => {}
                Event::Eof => break,
            }
            self.seen_any = true;
        }

        let end = self.text.len();
        if let Some(name) = self.open.last() {
            return Err(self.fail_at(end, format!("unclosed tag <{name}> at end of document")));
        }
        if !self.seen_root {
            return Err(self.fail_at(end, "no element found"));
        }
        Ok(())
    }

    /// Validate a start or empty-element tag and return its name.
    fn open_element(&mut self, element: &BytesStart<'_>, at: usize) -> Result<String, CheckFailure> {
        if self.open.is_empty() {
            if self.seen_root {
                return Err(self.fail_at(at, "junk after document element"));
            }
            self.seen_root = true;
        }

        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        if !is_xml_name(&name) {
            return Err(self.fail_at(at, format!("not well-formed (invalid element name '{name}')")));
        }

        if let Some(pos) = unseparated_attribute(element) {
            return Err(self.fail_at(
                at + 1 + pos,
                "not well-formed (attributes must be separated by whitespace)",
            ));
        }

        for attribute in element.attributes() {
            let attribute = match attribute {
                Ok(attribute) => attribute,
                Err(err) => return Err(self.fail_at(at, err.to_string())),
            };
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            if !is_xml_name(&key) {
                return Err(
                    self.fail_at(at, format!("not well-formed (invalid attribute name '{key}')"))
                );
            }
            if attribute.value.contains(&b'<') {
                return Err(self.fail_at(
                    at,
                    format!("not well-formed ('<' in value of attribute '{key}')"),
                ));
            }
            let entities = &self.entities;
            let value = match attribute.unescape_value_with(|name| resolve_entity(entities, name)) {
                Ok(value) => value,
                Err(err) => return Err(self.fail_at(at, err.to_string())),
            };
            self.check_chars(&value, at)?;
        }

        Ok(name)
    }

    /// Rejects illegal code points, including those produced by character references.
    fn check_chars(&self, content: &str, at: usize) -> Result<(), CheckFailure> {
        match content.chars().find(|c| !is_xml_char(*c)) {
            Some(c) => Err(self.fail_at(
                at,
                format!("reference to invalid character number U+{:04X}", c as u32),
            )),
            None => Ok(()),
        }
    }

    fn fail_at(&self, offset: usize, message: impl Into<String>) -> CheckFailure {
        let (line, column) = line_column(self.text.as_bytes(), offset);
        CheckFailure::Malformed {
            message: message.into(),
            line,
            column,
        }
    }
}

fn resolve_entity<'e>(entities: &'e HashMap<String, String>, name: &str) -> Option<&'e str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => entities.get(name).map(String::as_str),
    }
}

/// General entities declared in a DOCTYPE internal subset. Parameter
/// entities are skipped; external entities resolve to nothing.
fn entity_declarations(doctype: &str) -> Vec<(String, String)> {
    let mut declared = Vec::new();
    for chunk in doctype.split("<!ENTITY").skip(1) {
        let chunk = chunk.trim_start();
        if chunk.starts_with('%') {
            continue;
        }
        let Some(name_end) = chunk.find(|c: char| c.is_whitespace()) else {
            continue;
        };
        let name = &chunk[..name_end];
        let rest = chunk[name_end..].trim_start();
        let value = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => match rest[1..].find(quote) {
                Some(close) => rest[1..1 + close].to_string(),
                None => continue,
            },
            _ => String::new(),
        };
        declared.push((name.to_string(), value));
    }
    declared
}

/// Offset within the tag content of an attribute that directly follows the
/// closing quote of the previous one.
fn unseparated_attribute(element: &BytesStart<'_>) -> Option<usize> {
    let raw: &[u8] = element;
    let mut quote = None;
    for (pos, byte) in raw.iter().enumerate() {
        match quote {
            Some(open) if *byte == open => {
                quote = None;
                match raw.get(pos + 1) {
                    None | Some(b'/') => {}
                    Some(next) if next.is_ascii_whitespace() => {}
                    Some(_) => return Some(pos + 1),
                }
            }
            Some(_) => {}
            None if *byte == b'"' || *byte == b'\'' => quote = Some(*byte),
            None => {}
        }
    }
    None
}

/// 1-based line and column (in characters) of a byte offset.
fn line_column(bytes: &[u8], offset: usize) -> (usize, usize) {
    let prefix = &bytes[..offset.min(bytes.len())];
    let line_start = prefix
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |pos| pos + 1);
    let line = prefix.iter().filter(|b| **b == b'\n').count() + 1;
    let column = prefix[line_start..]
        .iter()
        .filter(|b| (**b & 0xC0) != 0x80)
        .count()
        + 1;
    (line, column)
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn is_name_start_char(c: char) -> bool {
    c == ':' || c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_alphabetic())
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || c.is_ascii_digit()
        || c == '-'
        || c == '.'
        || (!c.is_ascii() && c.is_alphanumeric())
        || c == '\u{B7}'
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}
