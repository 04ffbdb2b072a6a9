//! Artifact emitter
//!
//! Values are written with serde_json through a formatter that swaps the
//! string delimiter to `'`, escapes embedded `'` as `\'` and leaves `"` bare.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::ser::{CharEscape, Formatter, PrettyFormatter};
use std::io;

use crate::dataset::Datasets;
use crate::error::ArtifactError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the complete artifact for `datasets`, stamped with `generated_at`
pub fn write_artifact(datasets: &Datasets, generated_at: NaiveDateTime) -> Result<String, ArtifactError> {
    let mut out = String::new();
    out.push_str("// Dashboard data file\n");
    out.push_str(&format!(
        "// Last updated: {}\n",
        generated_at.format(TIMESTAMP_FORMAT)
    ));

    for (kind, dataset) in datasets.iter() {
        let literal = to_literal(dataset).map_err(|source| ArtifactError::Serialize {
            name: kind.const_name().to_string(),
            source,
        })?;
        out.push_str(&format!("\nconst {} = {};\n", kind.const_name(), literal));
    }

    Ok(out)
}

/// Serialize any value as a single-quoted literal with 2-space indentation
pub fn to_literal<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SingleQuoteFormatter::new());
    value.serialize(&mut ser)?;
    // The formatter only emits UTF-8 produced by serde_json
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Pretty formatter with single-quoted strings
struct SingleQuoteFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl SingleQuoteFormatter<'_> {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for SingleQuoteFormatter<'_> {
    fn begin_string<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"'")
    }

    fn end_string<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"'")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut rest = fragment;
        while let Some(pos) = rest.find('\'') {
            writer.write_all(rest[..pos].as_bytes())?;
            writer.write_all(b"\\'")?;
            rest = &rest[pos + 1..];
        }
        writer.write_all(rest.as_bytes())
    }

    fn write_char_escape<W: ?Sized + io::Write>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()> {
        match char_escape {
            CharEscape::Quote => writer.write_all(b"\""),
            other => self.inner.write_char_escape(writer, other),
        }
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Fields, Record};
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_literal_layout() {
        let record = Record::with_summary(Fields::from([("deposits".to_string(), 250.0)]));
        let literal = to_literal(&record).unwrap();

        assert_eq!(literal, "{\n  'summary': {\n    'deposits': 250.0\n  }\n}");
    }

    #[test]
    fn test_quotes_are_escaped_for_single_quote_delimiters() {
        let fields = Fields::from([("it's \"GGR\"\\".to_string(), 1.0)]);
        let literal = to_literal(&fields).unwrap();

        assert_eq!(literal, "{\n  'it\\'s \"GGR\"\\\\': 1.0\n}");
    }

    #[test]
    fn test_artifact_layout() {
        let mut datasets = Datasets::default();
        datasets.konibet.insert(
            "2024年3月".to_string(),
            Record::with_summary(Fields::from([("deposits".to_string(), 250.0)])),
        );

        let text = write_artifact(&datasets, stamp()).unwrap();
        let expected = "// Dashboard data file\n\
                        // Last updated: 2024-03-31 09:05:00\n\
                        \n\
                        const MOTO_AMUSE_DATA = {};\n\
                        \n\
                        const DSC_DATA = {};\n\
                        \n\
                        const SLOTEN_DATA = {};\n\
                        \n\
                        const KONIBET_DATA = {\n  '2024年3月': {\n    'summary': {\n      'deposits': 250.0\n    }\n  }\n};\n";
        assert_eq!(text, expected);
    }
}
