//! Translation units and per-file totals

use std::ops::AddAssign;
use serde::Serialize;

/// Translation state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    /// No usable translation
    Untranslated,
    /// First target form filled in, not fuzzy
    Translated,
    /// Marked fuzzy with the first target form filled in
    Fuzzy,
}

/// One msgid/msgstr entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// `msgctxt`, if any
    pub context: Option<String>,
    /// `msgid`, followed by `msgid_plural` for plural units
    pub source: Vec<String>,
    /// `msgstr`, or `msgstr[n]` in index order
    pub target: Vec<String>,
    /// Carries the `fuzzy` flag
    pub fuzzy: bool,
    /// Line of the unit's first keyword
    pub line: usize,
}

impl Unit {
    /// Whether the unit has a plural form
    pub fn has_plural(&self) -> bool {
        self.source.len() > 1
    }

    /// Translation state
    ///
    /// Decided on the first target form only: a plural unit with `msgstr[0]`
    /// filled is translated even if later forms are empty.
    pub fn state(&self) -> UnitState {
        let has_target = self.target.first().map_or(false, |t| !t.is_empty());

        if has_target && !self.fuzzy {
            UnitState::Translated
        } else if has_target {
            UnitState::Fuzzy
        } else {
            UnitState::Untranslated
        }
    }

    /// Source and target word counts
    ///
    /// Target words only count once the unit is translated.
    pub fn words(&self) -> (usize, usize) {
        let source = self.source.iter().map(|s| word_count(s)).sum();
        let target = match self.state() {
            UnitState::Translated => self.target.iter().map(|s| word_count(s)).sum(),
            _ => 0,
        };
        (source, target)
    }
}

/// Count words, ignoring markup tags
///
/// `<br>` separates words; every other tag is dropped in place.
pub fn word_count(text: &str) -> usize {
    let mut stripped = String::with_capacity(text.len());
    let mut tag: Option<String> = None;

    for ch in text.chars() {
        if let Some(name) = tag.as_mut() {
            if ch == '>' {
                let name = name.trim().trim_matches('/').trim().to_ascii_lowercase();
                if name == "br" || name.starts_with("br ") {
                    stripped.push(' ');
                }
                tag = None;
            } else {
                name.push(ch);
            }
        } else if ch == '<' {
            tag = Some(String::new());
        } else {
            stripped.push(ch);
        }
    }
    // Unterminated tag: keep it as text
    if let Some(name) = tag {
        stripped.push('<');
        stripped.push_str(&name);
    }

    stripped.split_whitespace().count()
}

/// Unit and word counts for one state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateTotals {
    /// Number of units
    pub units: usize,
    /// Words in source strings
    pub source_words: usize,
    /// Words in target strings
    pub target_words: usize,
}

impl StateTotals {
    fn record(&mut self, source_words: usize, target_words: usize) {
        self.units += 1;
        self.source_words += source_words;
        self.target_words += target_words;
    }
}

impl AddAssign for StateTotals {
    fn add_assign(&mut self, other: Self) {
        self.units += other.units;
        self.source_words += other.source_words;
        self.target_words += other.target_words;
    }
}

/// Quick statistics for a translation file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileTotals {
    /// All units
    pub total: StateTotals,
    /// Translated units
    pub translated: StateTotals,
    /// Fuzzy units
    pub fuzzy: StateTotals,
    /// Untranslated units
    pub untranslated: StateTotals,
}

impl FileTotals {
    /// Tally the given units
    pub fn from_units<'a, I>(units: I) -> Self
    where
        I: IntoIterator<Item = &'a Unit>,
    {
        let mut totals = FileTotals::default();
        for unit in units {
            let (source, target) = unit.words();
            totals.total.record(source, target);
            match unit.state() {
                UnitState::Translated => totals.translated.record(source, target),
                UnitState::Fuzzy => totals.fuzzy.record(source, target),
                UnitState::Untranslated => totals.untranslated.record(source, target),
            }
        }
        totals
    }

    /// Share of source words that are translated, as a percentage
    pub fn translated_percent(&self) -> f64 {
        if self.total.source_words == 0 {
            0.0
        } else {
            self.translated.source_words as f64 * 100.0 / self.total.source_words as f64
        }
    }
}

impl AddAssign for FileTotals {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.translated += other.translated;
        self.fuzzy += other.fuzzy;
        self.untranslated += other.untranslated;
    }
}
