//! Alignment record store.
//!
//! Parses the two delimited files written by the conformance tool (optimal
//! alignments per trace type, and per-case fitness/trace type) and indexes
//! them for constant-time lookup during repair.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    AlignError, AlignmentTemplate, CaseAlignmentInfo, Move, MoveKind, ParseError, Result,
    TraceError,
};
use crate::obs::emit_store_loaded;

/// Header lines preceding the data rows of the alignment-info file.
pub const ALIGNMENT_HEADER_LINES: usize = 3;

/// Header lines preceding the data rows of the case-fitness file.
pub const CASE_INFO_HEADER_LINES: usize = 7;

const CASE_TRACE_TYPE_FIELD: usize = 1;
const CASE_ID_FIELD: usize = 2;
const CASE_FITNESS_FIELD: usize = 11;

const MOVE_CELL_PATTERN: &str = r"^(\w+)\((.*)\)$";

/// A comma that opens the next `MARKER(` cell.
const MOVE_BOUNDARY_PATTERN: &str = r",\s*\w+\(";

fn move_cell_regex() -> &'static Regex {
    static MOVE_CELL: OnceLock<Regex> = OnceLock::new();
    MOVE_CELL.get_or_init(|| Regex::new(MOVE_CELL_PATTERN).expect("move cell pattern is valid"))
}

fn move_boundary_regex() -> &'static Regex {
    static MOVE_BOUNDARY: OnceLock<Regex> = OnceLock::new();
    MOVE_BOUNDARY.get_or_init(|| {
        Regex::new(MOVE_BOUNDARY_PATTERN).expect("move boundary pattern is valid")
    })
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// How malformed rows are treated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// The first malformed row fails the whole file.
    Strict,

    /// Malformed rows are skipped and reported.
    #[default]
    Lenient,
}

/// Records parsed from one file, plus the rows rejected in lenient mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub rejected: Vec<ParseError>,
}

/// Parse the alignment-info file body into one template per trace type.
///
/// Each data row is `trace_type, <ignored>, MOVE(task), ...`. Invisible
/// transitions (`MINVI`) are dropped.
pub fn parse_alignments(
    content: &str,
    mode: ParseMode,
) -> std::result::Result<Parsed<AlignmentTemplate>, ParseError> {
    collect_rows(content, ALIGNMENT_HEADER_LINES, mode, parse_alignment_row)
}

/// Parse the case-fitness file body into one record per case.
pub fn parse_case_info(
    content: &str,
    mode: ParseMode,
) -> std::result::Result<Parsed<CaseAlignmentInfo>, ParseError> {
    collect_rows(content, CASE_INFO_HEADER_LINES, mode, parse_case_info_row)
}

fn collect_rows<T>(
    content: &str,
    header_lines: usize,
    mode: ParseMode,
    parse_row: impl Fn(usize, &str) -> std::result::Result<T, ParseError>,
) -> std::result::Result<Parsed<T>, ParseError> {
    let total = content.lines().count();
    if total < header_lines {
        return Err(ParseError::TruncatedHeader {
            expected: header_lines,
            found: total,
        });
    }

    let mut parsed = Parsed {
        records: Vec::new(),
        rejected: Vec::new(),
    };

    for (idx, line) in content.lines().enumerate().skip(header_lines) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(idx + 1, line) {
            Ok(record) => parsed.records.push(record),
            Err(err) if mode == ParseMode::Lenient => {
                warn!(event = "store.row_rejected", error = %err);
                parsed.rejected.push(err);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(parsed)
}

fn parse_alignment_row(
    line_no: usize,
    line: &str,
) -> std::result::Result<AlignmentTemplate, ParseError> {
    let mut head = line.splitn(3, ',');
    let raw_type = head.next().unwrap_or_default().trim();
    if head.next().is_none() {
        return Err(ParseError::MissingField {
            line: line_no,
            index: 1,
        });
    }
    let trace_type = raw_type
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidTraceType {
            line: line_no,
            value: raw_type.to_string(),
        })?;

    let cells = split_move_cells(head.next().unwrap_or_default());
    let mut moves = Vec::with_capacity(cells.len());
    for cell in cells.into_iter().map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(step) = parse_move_cell(line_no, cell)? {
            moves.push(step);
        }
    }

    Ok(AlignmentTemplate { trace_type, moves })
}

/// Decode one `TYPE(task)` cell; `Ok(None)` for invisible transitions.
fn parse_move_cell(line_no: usize, cell: &str) -> std::result::Result<Option<Move>, ParseError> {
    let caps = move_cell_regex()
        .captures(cell)
        .ok_or_else(|| ParseError::MalformedMove {
            line: line_no,
            cell: cell.to_string(),
        })?;

    let kind = match &caps[1] {
        "LMGOOD" | "SYNC" => MoveKind::Synchronous,
        "MREAL" => MoveKind::ModelOnly,
        "L" => MoveKind::LogOnly,
        "MINVI" => return Ok(None),
        other => {
            return Err(ParseError::UnknownMoveKind {
                line: line_no,
                marker: other.to_string(),
            })
        }
    };

    Ok(Some(Move::new(kind, caps[2].trim())))
}

fn parse_case_info_row(
    line_no: usize,
    line: &str,
) -> std::result::Result<CaseAlignmentInfo, ParseError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let field = |index: usize| {
        fields
            .get(index)
            .copied()
            .ok_or(ParseError::MissingField {
                line: line_no,
                index,
            })
    };

    let raw_type = field(CASE_TRACE_TYPE_FIELD)?;
    let trace_type = raw_type
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidTraceType {
            line: line_no,
            value: raw_type.to_string(),
        })?;

    let raw_fitness = field(CASE_FITNESS_FIELD)?;
    let fitness = raw_fitness
        .parse::<f64>()
        .ok()
        .filter(|f| (0.0..=1.0).contains(f))
        .ok_or_else(|| ParseError::InvalidFitness {
            line: line_no,
            value: raw_fitness.to_string(),
        })?;

    Ok(CaseAlignmentInfo {
        case_id: field(CASE_ID_FIELD)?.to_string(),
        trace_type,
        fitness,
    })
}

/// Split the move list at commas followed by a `MARKER(` opener.
///
/// Commas and parentheses inside a task name stay in the cell. Trailing
/// commas are ignored.
fn split_move_cells(moves: &str) -> Vec<&str> {
    let moves = moves.trim_end().trim_end_matches(',');
    let mut cells = Vec::new();
    let mut start = 0;
    for boundary in move_boundary_regex().find_iter(moves) {
        cells.push(&moves[start..boundary.start()]);
        start = boundary.start() + 1;
    }
    cells.push(&moves[start..]);
    cells
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Counts gathered while loading the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub templates: usize,
    pub cases: usize,
    pub rejected_alignments: Vec<ParseError>,
    pub rejected_cases: Vec<ParseError>,
}

impl LoadReport {
    pub fn rejected_total(&self) -> usize {
        self.rejected_alignments.len() + self.rejected_cases.len()
    }
}

/// Read-only lookup tables built once before any trace is repaired.
#[derive(Debug, Clone, Default)]
pub struct AlignmentStore {
    templates: HashMap<u32, AlignmentTemplate>,
    cases: HashMap<String, CaseAlignmentInfo>,
}

impl AlignmentStore {
    /// Index parsed records. On duplicate keys the first record wins.
    pub fn from_records(
        templates: impl IntoIterator<Item = AlignmentTemplate>,
        cases: impl IntoIterator<Item = CaseAlignmentInfo>,
    ) -> Self {
        let mut store = Self::default();
        for template in templates {
            if store.templates.contains_key(&template.trace_type) {
                warn!(event = "store.duplicate_trace_type", trace_type = template.trace_type);
                continue;
            }
            store.templates.insert(template.trace_type, template);
        }
        for info in cases {
            if store.cases.contains_key(&info.case_id) {
                warn!(event = "store.duplicate_case", case_id = %info.case_id);
                continue;
            }
            store.cases.insert(info.case_id.clone(), info);
        }
        store
    }

    /// Read and index both conformance tool output files.
    pub fn load(
        alignment_path: &Path,
        case_info_path: &Path,
        mode: ParseMode,
    ) -> Result<(Self, LoadReport)> {
        let alignments = read_parsed(alignment_path, mode, parse_alignments)?;
        let cases = read_parsed(case_info_path, mode, parse_case_info)?;

        let report = LoadReport {
            templates: alignments.records.len(),
            cases: cases.records.len(),
            rejected_alignments: alignments.rejected,
            rejected_cases: cases.rejected,
        };
        let store = Self::from_records(alignments.records, cases.records);
        emit_store_loaded(
            store.template_count(),
            store.case_count(),
            report.rejected_total(),
        );
        Ok((store, report))
    }

    pub fn case_info(&self, case_id: &str) -> std::result::Result<&CaseAlignmentInfo, TraceError> {
        self.cases.get(case_id).ok_or_else(|| TraceError::UnknownCase {
            case_id: case_id.to_string(),
        })
    }

    /// Move sequence of the template selected by `info.trace_type`.
    pub fn moves_for(&self, info: &CaseAlignmentInfo) -> std::result::Result<&[Move], TraceError> {
        self.templates
            .get(&info.trace_type)
            .map(|t| t.moves.as_slice())
            .ok_or_else(|| TraceError::UnknownTraceType {
                case_id: info.case_id.clone(),
                trace_type: info.trace_type,
            })
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }
}

fn read_parsed<T>(
    path: &Path,
    mode: ParseMode,
    parse: fn(&str, ParseMode) -> std::result::Result<Parsed<T>, ParseError>,
) -> Result<Parsed<T>> {
    let content = std::fs::read_to_string(path)?;
    parse(&content, mode).map_err(|error| AlignError::Parse {
        source_name: path.display().to_string(),
        error,
    })
}
