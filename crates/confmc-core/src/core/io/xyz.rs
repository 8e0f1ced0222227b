use super::frame::Frame;
use super::traits::FrameFile;
use crate::core::elements;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const PROPERTIES_WITH_CHARGES: &str =
    "Properties=species:S:1:pos:R:3:initial_charges:R:1 pbc=\"F F F\"";
const CHARGE_PROPERTY: &str = "initial_charges:R:1";

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("No element symbol for atomic number {0}")]
    UnknownAtomicNumber(u8),
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidCount(String),
    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("Invalid float in column {column} (value: '{value}')")]
    InvalidFloat { column: usize, value: String },
    #[error("Expected at least {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },
    #[error("Unexpected end of file")]
    UnexpectedEof,
}

/// Extended XYZ: element symbol, Cartesian position and an `initial_charges`
/// column per atom.
pub struct XyzFile;

impl XyzFile {
    fn next_line(
        lines: &mut impl Iterator<Item = io::Result<String>>,
        line_num: &mut usize,
    ) -> Result<String, XyzError> {
        *line_num += 1;
        match lines.next() {
            Some(line) => Ok(line?),
            None => Err(XyzError::Parse {
                line: *line_num,
                kind: XyzParseErrorKind::UnexpectedEof,
            }),
        }
    }

    fn parse_float(value: &str, column: usize, line: usize) -> Result<f64, XyzError> {
        value.parse().map_err(|_| XyzError::Parse {
            line,
            kind: XyzParseErrorKind::InvalidFloat {
                column,
                value: value.to_string(),
            },
        })
    }
}

impl FrameFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Frame, Self::Error> {
        let mut lines = reader.lines();
        let mut line_num = 0;

        let count_line = Self::next_line(&mut lines, &mut line_num)?;
        let count: usize = count_line.trim().parse().map_err(|_| XyzError::Parse {
            line: line_num,
            kind: XyzParseErrorKind::InvalidCount(count_line.trim().to_string()),
        })?;

        let comment = Self::next_line(&mut lines, &mut line_num)?;
        let has_charges = comment.contains(CHARGE_PROPERTY);
        let expected_columns = if has_charges { 5 } else { 4 };

        let mut frame = Frame::new(
            Vec::with_capacity(count),
            Vec::with_capacity(count),
            Vec::with_capacity(count),
        );
        for _ in 0..count {
            let line = Self::next_line(&mut lines, &mut line_num)?;
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < expected_columns {
                return Err(XyzError::Parse {
                    line: line_num,
                    kind: XyzParseErrorKind::TooFewColumns {
                        expected: expected_columns,
                        found: columns.len(),
                    },
                });
            }

            let z = elements::atomic_number(columns[0]).ok_or_else(|| XyzError::Parse {
                line: line_num,
                kind: XyzParseErrorKind::UnknownElement(columns[0].to_string()),
            })?;
            let x = Self::parse_float(columns[1], 2, line_num)?;
            let y = Self::parse_float(columns[2], 3, line_num)?;
            let zc = Self::parse_float(columns[3], 4, line_num)?;
            let charge = if has_charges {
                Self::parse_float(columns[4], 5, line_num)?
            } else {
                0.0
            };

            frame.atomic_numbers.push(z);
            frame.positions.push(Point3::new(x, y, zc));
            frame.charges.push(charge);
        }

        Ok(frame)
    }

    fn write_to(frame: &Frame, writer: &mut impl Write) -> Result<(), Self::Error> {
        if frame.positions.len() != frame.len() || frame.charges.len() != frame.len() {
            return Err(XyzError::Inconsistency(format!(
                "{} atomic numbers, {} positions, {} charges",
                frame.len(),
                frame.positions.len(),
                frame.charges.len()
            )));
        }

        writeln!(writer, "{}", frame.len())?;
        writeln!(writer, "{}", PROPERTIES_WITH_CHARGES)?;
        for ((&z, p), q) in frame
            .atomic_numbers
            .iter()
            .zip(&frame.positions)
            .zip(&frame.charges)
        {
            let symbol = elements::symbol(z).ok_or(XyzError::UnknownAtomicNumber(z))?;
            writeln!(
                writer,
                "{:<2} {:>16.8} {:>16.8} {:>16.8} {:>16.8}",
                symbol, p.x, p.y, p.z, q
            )?;
        }
        Ok(())
    }
}
