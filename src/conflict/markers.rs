//! Conflict delimiter scanning over working-tree content.

/// Length of a git conflict delimiter run.
pub const MARKER_LEN: usize = 7;

/// Which delimiter a line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `<<<<<<<`: start of the ours section.
    Ours,
    /// `|||||||`: start of the recorded base section (diff3 style).
    Base,
    /// `=======`: start of the theirs section.
    Separator,
    /// `>>>>>>>`: end of the region.
    Theirs,
}

/// Classifies a line as a conflict delimiter.
///
/// The run must be exactly seven characters, followed by end of line or a
/// space-separated label. A bare `=======` takes no label.
pub fn delimiter(line: &str) -> Option<Delimiter> {
    let line = line.trim_end_matches(['\n', '\r']);
    let (kind, ch) = match line.chars().next()? {
        '<' => (Delimiter::Ours, '<'),
        '|' => (Delimiter::Base, '|'),
        '=' => (Delimiter::Separator, '='),
        '>' => (Delimiter::Theirs, '>'),
        _ => return None,
    };
    let run = line.chars().take_while(|&c| c == ch).count();
    if run != MARKER_LEN {
        return None;
    }
    let rest = &line[MARKER_LEN..];
    match kind {
        Delimiter::Separator if rest.trim().is_empty() => Some(kind),
        Delimiter::Separator => None,
        _ if rest.is_empty() || rest.starts_with(' ') => Some(kind),
        _ => None,
    }
}

/// One delimited region as found in the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRegion {
    /// 1-based line of the `<<<<<<<` delimiter.
    pub start_line: usize,
    /// 1-based line of the `>>>>>>>` delimiter.
    pub end_line: usize,
    /// Ours section, line terminators preserved.
    pub ours_text: String,
    /// Theirs section, line terminators preserved.
    pub theirs_text: String,
    /// Recorded base section when the file uses diff3 style.
    pub recorded_base: Option<String>,
    /// Text after `<<<<<<<`.
    pub ours_label: Option<String>,
    /// Text after `>>>>>>>`.
    pub theirs_label: Option<String>,
    /// Number of context lines preceding this region.
    pub context_before: usize,
}

/// Working-tree content split into regions and the context around them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedContent<'a> {
    /// Regions in file order.
    pub regions: Vec<RawRegion>,
    /// Lines outside any region, terminators stripped.
    pub context: Vec<&'a str>,
}

impl ScannedContent<'_> {
    /// Whether any region was found.
    pub fn has_conflicts(&self) -> bool {
        !self.regions.is_empty()
    }
}

fn label(line: &str) -> Option<String> {
    let rest = line.trim_end_matches(['\n', '\r']).get(MARKER_LEN..)?.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Scans content for conflict regions.
///
/// A region that never reaches its closing delimiter is treated as ordinary
/// content, so every line lands either in a region or in the context.
pub fn scan(content: &str) -> ScannedContent<'_> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let mut scanned = ScannedContent::default();
    let mut i = 0;

    while i < lines.len() {
        if delimiter(lines[i]) == Some(Delimiter::Ours) {
            if let Some((region, next)) = scan_region(&lines, i, scanned.context.len()) {
                scanned.regions.push(region);
                i = next;
                continue;
            }
            tracing::debug!(line = i + 1, "unterminated conflict region treated as content");
        }
        scanned.context.push(strip_terminator(lines[i]));
        i += 1;
    }

    scanned
}

fn scan_region(lines: &[&str], start: usize, context_before: usize) -> Option<(RawRegion, usize)> {
    let mut ours = String::new();
    let mut base: Option<String> = None;
    let mut theirs = String::new();
    let mut section = Delimiter::Ours;

    for (offset, line) in lines[start + 1..].iter().enumerate() {
        let idx = start + 1 + offset;
        match (delimiter(line), section) {
            (Some(Delimiter::Base), Delimiter::Ours) => {
                base = Some(String::new());
                section = Delimiter::Base;
            }
            (Some(Delimiter::Separator), Delimiter::Ours | Delimiter::Base) => {
                section = Delimiter::Separator;
            }
            (Some(Delimiter::Theirs), Delimiter::Separator) => {
                let region = RawRegion {
                    start_line: start + 1,
                    end_line: idx + 1,
                    ours_text: ours,
                    theirs_text: theirs,
                    recorded_base: base,
                    ours_label: label(lines[start]),
                    theirs_label: label(line),
                    context_before,
                };
                return Some((region, idx + 1));
            }
            // A new region opening before this one closed means this one is broken.
            (Some(Delimiter::Ours), _) => return None,
            _ => match section {
                Delimiter::Ours => ours.push_str(line),
                Delimiter::Base => base.get_or_insert_with(String::new).push_str(line),
                Delimiter::Separator | Delimiter::Theirs => theirs.push_str(line),
            },
        }
    }
    None
}

/// Line of the first leftover conflict delimiter, 1-based.
pub fn first_delimiter_line(content: &str) -> Option<usize> {
    content
        .split_inclusive('\n')
        .position(|line| delimiter(line).is_some())
        .map(|idx| idx + 1)
}
