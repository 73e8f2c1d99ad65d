use once_cell::sync::Lazy;
use regex::Regex;

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid regex"));
static DESTINATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\] Destination: (.+)").expect("valid regex"));
static MERGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[Merger\] Merging formats into "(.+)""#).expect("valid regex"));

#[derive(Debug, PartialEq)]
pub enum ScanEvent {
    Progress(f32),
}

/// Incremental parser for the converter's stdout.
///
/// Chunks may end in the middle of a line; the unfinished tail is carried
/// over to the next call. Both extractors run on every completed line. A
/// merged output filename always wins over a destination filename.
#[derive(Debug, Default)]
pub struct ProgressScanner {
    carry: Vec<u8>,
    destination: Option<String>,
    merged: Option<String>,
}

impl ProgressScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ScanEvent> {
        self.carry.extend_from_slice(chunk);

        let mut events = vec![];
        while let Some(position) = self.carry.iter().position(|b| *b == b'\n') {
            let line = self.carry.drain(..=position).collect::<Vec<_>>();
            self.scan_line(&String::from_utf8_lossy(&line), &mut events);
        }

        events
    }

    /// Flushes the unterminated tail, if any.
    pub fn finish(&mut self) -> Vec<ScanEvent> {
        let mut events = vec![];

        if !self.carry.is_empty() {
            let line = std::mem::take(&mut self.carry);
            self.scan_line(&String::from_utf8_lossy(&line), &mut events);
        }

        events
    }

    pub fn output_path(&self) -> Option<&str> {
        self.merged.as_deref().or(self.destination.as_deref())
    }

    fn scan_line(&mut self, line: &str, events: &mut Vec<ScanEvent>) {
        let line = line.trim_end_matches(|c| c == '\n' || c == '\r');

        if let Some(percent) = PERCENT_RE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f32>().ok())
        {
            events.push(ScanEvent::Progress(percent.clamp(0.0, 100.0)));
        }

        if let Some(path) = MERGER_RE.captures(line).and_then(|caps| caps.get(1)) {
            self.merged.replace(path.as_str().trim().to_string());
        } else if let Some(path) = DESTINATION_RE.captures(line).and_then(|caps| caps.get(1)) {
            self.destination.replace(path.as_str().trim().to_string());
        }
    }
}
