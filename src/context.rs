use std::collections::BTreeSet;

/// A subdivision header waiting for its metrics line.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PendingStand {
    pub(crate) vydel: Option<u32>,
    /// Dictionary description of the header, empty when unresolved.
    pub(crate) description: String,
    /// Composition formula captured from a line between header and metrics.
    pub(crate) composition: Option<String>,
}

impl PendingStand {
    /// Headers of planted or multi-storey stands are followed by a bare
    /// composition line.
    pub(crate) fn describes_stand(&self) -> bool {
        let description = self.description.to_lowercase();
        ["насажд", "культ", "полог"]
            .iter()
            .any(|stem| description.contains(stem))
    }
}

/// State carried from line to line and from page to page during one
/// conversion. Record indexes point into the assembler's output.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParseContext {
    pub(crate) quarter: Option<u32>,
    pub(crate) category: Option<String>,
    pub(crate) vydel: Option<u32>,
    pub(crate) in_single_trees: bool,
    pub(crate) expecting_species_totals: bool,
    /// Totals header record that still waits for its numeric line.
    pub(crate) pending_totals: Option<usize>,
    pub(crate) pending_stand: Option<PendingStand>,
    pub(crate) last_main: Option<usize>,
    pub(crate) last_species: Option<usize>,
    /// Species appended to the current `MAIN` formula from lonely lines.
    pub(crate) main_extra: BTreeSet<String>,
    /// `(subdivision, species)` pairs that already got an element-only record.
    pub(crate) emitted_lonely: BTreeSet<(u32, String)>,
}

impl ParseContext {
    /// A new `MAIN` or `OBJECT` opens a fresh assembly scope. Continuations
    /// only ever attach to a `MAIN`, so an `OBJECT` closes the previous one.
    pub(crate) fn open_record(&mut self, vydel: Option<u32>, index: usize, is_main: bool) {
        self.vydel = vydel;
        self.in_single_trees = false;
        self.pending_stand = None;
        self.main_extra.clear();
        self.emitted_lonely.clear();
        self.last_species = None;
        self.last_main = is_main.then_some(index);
    }
}
