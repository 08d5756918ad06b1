//! Location schema shared by every engine.
//!
//! A location names a file and either a coarse line span or a precise
//! begin/end position pair. Lines and columns are 1-based everywhere; engines
//! reporting 0-based coordinates are corrected before reaching these types.

use crate::error::LocationError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// A 1-based line/column pair.
pub struct LineColumnPosition {
    line: u32,
    column: u32,
}

impl LineColumnPosition {
    /// Build a position from already 1-based coordinates.
    pub fn new(line: i64, column: i64) -> Result<Self, LocationError> {
        if line < 1 {
            return Err(LocationError::Line(line));
        }
        if column < 1 {
            return Err(LocationError::Column(column));
        }
        Ok(Self {
            line: u32::try_from(line).map_err(|_| LocationError::Line(line))?,
            column: u32::try_from(column).map_err(|_| LocationError::Column(column))?,
        })
    }

    /// Build a position from 0-based coordinates.
    pub fn from_zero_based(line: i64, column: i64) -> Result<Self, LocationError> {
        Self::new(line.saturating_add(1), column.saturating_add(1))
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// A 0-based byte offset into the file.
pub struct OffsetPosition {
    offset: u64,
}

impl OffsetPosition {
    pub fn new(offset: i64) -> Result<Self, LocationError> {
        u64::try_from(offset)
            .map(|offset| Self { offset })
            .map_err(|_| LocationError::Offset(offset))
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Position {
    LineColumn(LineColumnPosition),
    Offset(OffsetPosition),
}

impl From<LineColumnPosition> for Position {
    fn from(p: LineColumnPosition) -> Self {
        Position::LineColumn(p)
    }
}

impl From<OffsetPosition> for Position {
    fn from(p: OffsetPosition) -> Self {
        Position::Offset(p)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PositionRange {
    begin: Position,
    end: Position,
}

impl PositionRange {
    /// Range whose ends are both line/column positions.
    pub fn lines_columns(begin: LineColumnPosition, end: LineColumnPosition) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// Range collapsed to a single point.
    pub fn point(at: LineColumnPosition) -> Self {
        Self::lines_columns(at, at)
    }

    pub fn begin(&self) -> Position {
        self.begin
    }

    pub fn end(&self) -> Position {
        self.end
    }

    /// Build a range, rejecting ends of different kinds.
    pub fn new(begin: Position, end: Position) -> Result<Self, LocationError> {
        match (begin, end) {
            (Position::LineColumn(_), Position::LineColumn(_))
            | (Position::Offset(_), Position::Offset(_)) => Ok(Self { begin, end }),
            _ => Err(LocationError::MixedRange),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineRange {
    begin: u32,
    end: u32,
}

impl LineRange {
    pub fn new(begin: i64, end: i64) -> Result<Self, LocationError> {
        let begin_ok = u32::try_from(begin).ok().filter(|v| *v >= 1);
        let end_ok = u32::try_from(end).ok().filter(|v| *v >= 1);
        match (begin_ok, end_ok) {
            (Some(begin), Some(end)) => Ok(Self { begin, end }),
            (None, _) => Err(LocationError::Line(begin)),
            (_, None) => Err(LocationError::Line(end)),
        }
    }

    pub fn begin(&self) -> u32 {
        self.begin
    }

    pub fn end(&self) -> u32 {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
/// Where an issue lives. Exactly one of `lines` or `positions` is set.
pub struct Location {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lines: Option<LineRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    positions: Option<PositionRange>,
}

impl Location {
    pub fn new(
        path: impl Into<String>,
        lines: Option<LineRange>,
        positions: Option<PositionRange>,
    ) -> Result<Self, LocationError> {
        match (&lines, &positions) {
            (None, None) => Err(LocationError::Missing),
            (Some(_), Some(_)) => Err(LocationError::Both),
            _ => Ok(Self {
                path: path.into(),
                lines,
                positions,
            }),
        }
    }

    pub fn with_positions(path: impl Into<String>, positions: PositionRange) -> Self {
        Self {
            path: path.into(),
            lines: None,
            positions: Some(positions),
        }
    }

    pub fn with_lines(path: impl Into<String>, lines: LineRange) -> Self {
        Self {
            path: path.into(),
            lines: Some(lines),
            positions: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn lines(&self) -> Option<&LineRange> {
        self.lines.as_ref()
    }

    pub fn positions(&self) -> Option<&PositionRange> {
        self.positions.as_ref()
    }

    /// First line and column of the location, if it has line information.
    pub fn start(&self) -> Option<(u32, Option<u32>)> {
        if let Some(lr) = &self.lines {
            return Some((lr.begin, None));
        }
        match self.positions.as_ref()?.begin {
            Position::LineColumn(p) => Some((p.line, Some(p.column))),
            Position::Offset(_) => None,
        }
    }
}
