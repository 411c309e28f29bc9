//! Patch IR: Edit, Anchor, PatchSet for atomic refactoring transactions.
//!
//! This module implements the patch infrastructure shared by every cxxsig
//! refactoring:
//! - Anchored edits with hash verification
//! - Conflict detection (overlapping spans, stale anchors)
//! - Atomic apply semantics (all-or-nothing)
//! - Patch materialization (output edits plus unified diff)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::diff::generate_unified_diff;
use crate::text::byte_offset_to_position_str;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Core Types
// ============================================================================

/// Stable file identifier within one refactoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Byte offsets into file content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Zero-length span at `offset`.
    pub fn point(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Anchor Model
// ============================================================================

/// How an edit finds and validates its target location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// Exact span with hash verification.
    ///
    /// The edit only applies if the bytes at `span` hash to `expected_before_hash`.
    SpanExact {
        /// The exact byte range to edit.
        span: Span,
        /// SHA-256 hash of the bytes in `span` before the edit.
        expected_before_hash: ContentHash,
    },
}

impl Anchor {
    /// Create a SpanExact anchor from the text currently at `span`.
    pub fn span_exact(span: Span, before: &str) -> Self {
        Anchor::SpanExact {
            span,
            expected_before_hash: ContentHash::compute(before.as_bytes()),
        }
    }

    /// Get the span for this anchor.
    pub fn span(&self) -> Span {
        match self {
            Anchor::SpanExact { span, .. } => *span,
        }
    }

    /// Resolve this anchor against the given file content.
    pub fn resolve(&self, content: &str) -> AnchorResolution {
        match self {
            Anchor::SpanExact {
                span,
                expected_before_hash,
            } => {
                let Some(slice) = content.get(span.start..span.end) else {
                    return AnchorResolution::OutOfBounds {
                        span: *span,
                        file_len: content.len(),
                    };
                };
                let actual = ContentHash::compute(slice.as_bytes());
                if &actual != expected_before_hash {
                    return AnchorResolution::HashMismatch {
                        span: *span,
                        expected: expected_before_hash.clone(),
                        actual,
                    };
                }
                AnchorResolution::Resolved(*span)
            }
        }
    }
}

/// Result of attempting to resolve an anchor against file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorResolution {
    /// Anchor resolved successfully to a specific span.
    Resolved(Span),
    /// Content at span doesn't match the expected hash.
    HashMismatch {
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },
    /// Span is out of bounds (or not on a char boundary) for the file content.
    OutOfBounds { span: Span, file_len: usize },
}

// ============================================================================
// Conflict Detection
// ============================================================================

/// A detected overlap or invalidation that prevents apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conflict {
    /// Two edits have overlapping spans in the same file.
    OverlappingSpans {
        file_id: FileId,
        edit1_span: Span,
        edit2_span: Span,
    },

    /// Anchor hash mismatch (file changed since the edit was computed).
    AnchorHashMismatch {
        file_id: FileId,
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Span is out of bounds for the file.
    SpanOutOfBounds {
        file_id: FileId,
        span: Span,
        file_len: usize,
    },

    /// File not found in the apply context.
    FileMissing { file_id: FileId },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::OverlappingSpans {
                file_id,
                edit1_span,
                edit2_span,
            } => write!(
                f,
                "overlapping edits in {}: {} and {}",
                file_id, edit1_span, edit2_span
            ),
            Conflict::AnchorHashMismatch { file_id, span, .. } => {
                write!(f, "content changed at {} in {}", span, file_id)
            }
            Conflict::SpanOutOfBounds {
                file_id,
                span,
                file_len,
            } => write!(
                f,
                "span {} out of bounds in {} (length {})",
                span, file_id, file_len
            ),
            Conflict::FileMissing { file_id } => write!(f, "missing content for {}", file_id),
        }
    }
}

// ============================================================================
// Edit Operations
// ============================================================================

/// The kind of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    /// Insert text at `anchor.span.start`.
    Insert,
    /// Delete the bytes in `anchor.span`.
    Delete,
    /// Replace the bytes in `anchor.span` with new text.
    Replace,
}

/// Optional labels for provenance tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLabels {
    /// The refactor operation that generated this edit.
    pub refactor_op: Option<String>,
    /// Human-readable reason for the edit.
    pub reason: Option<String>,
}

/// A single atomic text change anchored in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Stable identifier for ordering.
    pub id: u32,
    /// The file this edit applies to.
    pub file_id: FileId,
    /// The kind of operation.
    pub kind: EditKind,
    /// How to find/verify the target location.
    pub anchor: Anchor,
    /// The new text (empty for Delete).
    pub text: String,
    /// Optional provenance labels.
    pub labels: EditLabels,
}

impl Edit {
    /// Create an Insert edit.
    ///
    /// # Panics
    /// Panics if the anchor span is not zero-length.
    pub fn insert(id: u32, file_id: FileId, anchor: Anchor, text: impl Into<String>) -> Self {
        assert!(
            anchor.span().is_empty(),
            "insert anchors must be zero-length, got {}",
            anchor.span()
        );
        Edit {
            id,
            file_id,
            kind: EditKind::Insert,
            anchor,
            text: text.into(),
            labels: EditLabels::default(),
        }
    }

    /// Create a Delete edit.
    pub fn delete(id: u32, file_id: FileId, anchor: Anchor) -> Self {
        Edit {
            id,
            file_id,
            kind: EditKind::Delete,
            anchor,
            text: String::new(),
            labels: EditLabels::default(),
        }
    }

    /// Create a Replace edit.
    pub fn replace(id: u32, file_id: FileId, anchor: Anchor, text: impl Into<String>) -> Self {
        Edit {
            id,
            file_id,
            kind: EditKind::Replace,
            anchor,
            text: text.into(),
            labels: EditLabels::default(),
        }
    }

    /// Attach provenance labels.
    pub fn with_labels(mut self, labels: EditLabels) -> Self {
        self.labels = labels;
        self
    }

    /// The span this edit targets.
    pub fn span(&self) -> Span {
        self.anchor.span()
    }
}

// ============================================================================
// PatchSet
// ============================================================================

/// An ordered set of edits, applied atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchSet {
    /// The edits to apply, in deterministic order once sorted.
    pub edits: Vec<Edit>,

    /// Mapping from FileId to file path (for materialization).
    pub file_paths: HashMap<FileId, String>,
}

impl PatchSet {
    /// Create a new empty PatchSet.
    pub fn new() -> Self {
        PatchSet::default()
    }

    /// Add an edit.
    pub fn with_edit(mut self, edit: Edit) -> Self {
        self.edits.push(edit);
        self
    }

    /// Add an edit in place.
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Register a file path mapping.
    pub fn with_file_path(mut self, file_id: FileId, path: impl Into<String>) -> Self {
        self.file_paths.insert(file_id, path.into());
        self
    }

    /// Check if this PatchSet contains any edits.
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Get the number of edits in this PatchSet.
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Sort edits in deterministic order: by file path, then by span start, then by edit ID.
    pub fn sort_edits(&mut self) {
        let file_paths = &self.file_paths;
        self.edits.sort_by(|a, b| {
            let path_a = file_paths.get(&a.file_id).map(String::as_str);
            let path_b = file_paths.get(&b.file_id).map(String::as_str);
            path_a
                .cmp(&path_b)
                .then_with(|| a.span().start.cmp(&b.span().start))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Detect overlapping edits within this PatchSet.
    ///
    /// Returns a list of all detected conflicts. An empty list means no conflicts.
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        let mut edits_by_file: HashMap<FileId, Vec<&Edit>> = HashMap::new();
        for edit in &self.edits {
            edits_by_file.entry(edit.file_id).or_default().push(edit);
        }

        let mut files: Vec<_> = edits_by_file.into_iter().collect();
        files.sort_by_key(|(file_id, _)| *file_id);

        for (file_id, edits) in files {
            for i in 0..edits.len() {
                for j in (i + 1)..edits.len() {
                    let span_i = edits[i].span();
                    let span_j = edits[j].span();
                    if span_i.overlaps(&span_j) {
                        conflicts.push(Conflict::OverlappingSpans {
                            file_id,
                            edit1_span: span_i,
                            edit2_span: span_j,
                        });
                    }
                }
            }
        }

        conflicts
    }
}

// ============================================================================
// Atomic Apply
// ============================================================================

/// Result of attempting to apply a PatchSet.
#[derive(Debug, Clone)]
pub enum ApplyResult {
    /// All edits applied successfully.
    Success {
        /// The new content for each modified file.
        modified_files: HashMap<FileId, String>,
    },

    /// Apply failed due to conflicts.
    Failed {
        /// The conflicts that prevented apply.
        conflicts: Vec<Conflict>,
    },
}

impl PatchSet {
    /// Apply this PatchSet atomically against in-memory file contents.
    ///
    /// Either all edits apply, or none do. Edits are applied in reverse offset
    /// order within each file so earlier spans stay valid.
    #[must_use]
    pub fn apply(&self, file_contents: &HashMap<FileId, String>) -> ApplyResult {
        let mut conflicts = self.detect_conflicts();
        let mut resolved: HashMap<FileId, Vec<(Span, &Edit)>> = HashMap::new();

        for edit in &self.edits {
            let Some(content) = file_contents.get(&edit.file_id) else {
                conflicts.push(Conflict::FileMissing {
                    file_id: edit.file_id,
                });
                continue;
            };

            match edit.anchor.resolve(content) {
                AnchorResolution::Resolved(span) => {
                    resolved.entry(edit.file_id).or_default().push((span, edit));
                }
                AnchorResolution::HashMismatch {
                    span,
                    expected,
                    actual,
                } => conflicts.push(Conflict::AnchorHashMismatch {
                    file_id: edit.file_id,
                    span,
                    expected,
                    actual,
                }),
                AnchorResolution::OutOfBounds { span, file_len } => {
                    conflicts.push(Conflict::SpanOutOfBounds {
                        file_id: edit.file_id,
                        span,
                        file_len,
                    })
                }
            }
        }

        if !conflicts.is_empty() {
            debug!(conflicts = conflicts.len(), "patch rejected");
            return ApplyResult::Failed { conflicts };
        }

        let mut modified_files = HashMap::new();
        for (file_id, mut file_edits) in resolved {
            let Some(original) = file_contents.get(&file_id) else {
                continue;
            };
            let mut content = original.clone();

            // Descending start; at equal starts apply the higher id first so
            // lower ids end up leftmost.
            file_edits.sort_by(|a, b| b.0.start.cmp(&a.0.start).then(b.1.id.cmp(&a.1.id)));

            for (span, edit) in file_edits {
                match edit.kind {
                    EditKind::Insert => content.insert_str(span.start, &edit.text),
                    EditKind::Delete => content.replace_range(span.start..span.end, ""),
                    EditKind::Replace => content.replace_range(span.start..span.end, &edit.text),
                }
            }

            modified_files.insert(file_id, content);
        }

        ApplyResult::Success { modified_files }
    }
}

// ============================================================================
// Patch Materialization
// ============================================================================

/// A single edit as it appears in output (for JSON serialization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEdit {
    /// File path as given by the caller.
    pub file: String,
    /// Byte range being replaced.
    pub span: Span,
    /// Original text.
    pub old_text: String,
    /// Replacement text.
    pub new_text: String,
    /// 1-indexed line number (for display).
    pub line: u32,
    /// 1-indexed column (for display).
    pub col: u32,
}

/// Materialized patch output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedPatch {
    /// Individual edits (ordered by file, then span.start).
    pub edits: Vec<OutputEdit>,
    /// Standard unified diff format.
    pub unified_diff: String,
}

impl PatchSet {
    /// Materialize this PatchSet to output format.
    ///
    /// Requires file contents to compute old_text and line/col positions.
    pub fn materialize(&self, file_contents: &HashMap<FileId, String>) -> MaterializedPatch {
        let mut sorted = self.clone();
        sorted.sort_edits();

        let edits: Vec<OutputEdit> = sorted
            .edits
            .iter()
            .map(|edit| {
                let file = self
                    .file_paths
                    .get(&edit.file_id)
                    .cloned()
                    .unwrap_or_else(|| edit.file_id.to_string());
                let span = edit.span();

                let (old_text, line, col) = match file_contents.get(&edit.file_id) {
                    Some(content) => {
                        let old = content.get(span.start..span.end).unwrap_or_default();
                        let (line, col) = byte_offset_to_position_str(content, span.start);
                        (old.to_string(), line, col)
                    }
                    None => (String::new(), 1, 1),
                };

                let new_text = match edit.kind {
                    EditKind::Delete => String::new(),
                    _ => edit.text.clone(),
                };

                OutputEdit {
                    file,
                    span,
                    old_text,
                    new_text,
                    line,
                    col,
                }
            })
            .collect();

        let unified_diff = generate_unified_diff(&edits);
        MaterializedPatch {
            edits,
            unified_diff,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
