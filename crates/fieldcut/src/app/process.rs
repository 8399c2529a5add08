//! Streaming field extraction over delimited lines.

use std::io::{BufRead, Read, Write};
use std::ops::AddAssign;

use crate::domain::errors::ProcessError;
use crate::domain::model::FieldSelection;

pub const DEFAULT_DELIMITER: &[u8] = b"\t";
pub const DEFAULT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Counters describing one pass over an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub lines_read: u64,
    pub lines_written: u64,
    pub lines_suppressed: u64,
}

impl AddAssign for ProcessStats {
    fn add_assign(&mut self, rhs: Self) {
        self.lines_read += rhs.lines_read;
        self.lines_written += rhs.lines_written;
        self.lines_suppressed += rhs.lines_suppressed;
    }
}

/// Selects fields from each line and writes them back joined by the same delimiter.
#[derive(Debug, Clone)]
pub struct Processor {
    delimiter: Vec<u8>,
    separated_only: bool,
    selection: FieldSelection,
    max_line_bytes: usize,
}

impl Processor {
    /// Create a processor using the tab delimiter.
    pub fn new(selection: FieldSelection) -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_vec(),
            separated_only: false,
            selection,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Replace the delimiter. An empty delimiter falls back to tab.
    pub fn with_delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        let delimiter = delimiter.into();
        self.delimiter = if delimiter.is_empty() {
            DEFAULT_DELIMITER.to_vec()
        } else {
            delimiter
        };
        self
    }

    /// Drop lines that do not contain the delimiter at all.
    pub fn with_separated_only(mut self, separated_only: bool) -> Self {
        self.separated_only = separated_only;
        self
    }

    /// Set the per-line byte ceiling. Zero is treated as one.
    pub fn with_max_line_bytes(mut self, bytes: usize) -> Self {
        self.max_line_bytes = bytes.max(1);
        self
    }

    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// Cut a single line given without its newline. The returned bytes are
    /// the reassembled fields followed by `\n`, exactly as [`Processor::process`]
    /// writes them. Returns `None` when the line is suppressed by
    /// separated-only mode.
    pub fn cut_line(&self, line: &[u8]) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(line.len());
        self.write_line(line, &mut out)
            .ok()
            .and_then(|written| written.then_some(out))
    }

    /// Stream every line of `reader` through the selection into `writer`.
    ///
    /// Output already written before a failure is left in place. The writer
    /// is flushed once the input is exhausted.
    pub fn process<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
    ) -> Result<ProcessStats, ProcessError> {
        let mut stats = ProcessStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let limit = (self.max_line_bytes as u64).saturating_add(1);
            let read = reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            stats.lines_read += 1;

            let line = match buf.strip_suffix(b"\n") {
                Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
                None if buf.len() > self.max_line_bytes => {
                    return Err(ProcessError::LineTooLong {
                        line: stats.lines_read,
                        limit: self.max_line_bytes,
                    });
                }
                None => buf.strip_suffix(b"\r").unwrap_or(&buf[..]),
            };

            if self.write_line(line, &mut writer)? {
                stats.lines_written += 1;
            } else {
                stats.lines_suppressed += 1;
            }
        }

        writer.flush()?;
        Ok(stats)
    }

    fn write_line<W: Write>(&self, line: &[u8], writer: &mut W) -> std::io::Result<bool> {
        if self.separated_only && find(line, &self.delimiter).is_none() {
            return Ok(false);
        }

        let selected = split_fields(line, &self.delimiter)
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| self.selection.includes(idx + 1))
            .map(|(_, field)| field);

        for (n, field) in selected.enumerate() {
            if n > 0 {
                writer.write_all(&self.delimiter)?;
            }
            writer.write_all(field)?;
        }
        writer.write_all(b"\n")?;
        Ok(true)
    }
}

/// Split `line` on every non-overlapping occurrence of `delimiter`, keeping
/// empty fields, including a trailing one after a final delimiter.
pub fn split_fields<'a>(line: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    if let [byte] = delimiter {
        return line.split(|b| b == byte).collect();
    }

    let mut fields = Vec::new();
    let mut rest = line;
    while let Some(idx) = find(rest, delimiter) {
        fields.push(&rest[..idx]);
        rest = &rest[idx + delimiter.len()..];
    }
    fields.push(rest);
    fields
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{self, Cursor};

    use crate::app::fields::parse;

    fn run(processor: &Processor, input: &str) -> String {
        let mut out = Vec::new();
        processor
            .process(Cursor::new(input), &mut out)
            .expect("process input");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn selects_fields_with_default_tab() {
        let processor = Processor::new(parse("1,3").unwrap());
        assert_eq!(
            run(&processor, "a\tb\tc\n1\t2\t3\nno_delim\n"),
            "a\tc\n1\t3\nno_delim\n"
        );
    }

    #[test]
    fn separated_only_drops_lines_without_delimiter() {
        let processor = Processor::new(parse("1").unwrap())
            .with_delimiter(",")
            .with_separated_only(true);
        let mut out = Vec::new();
        let stats = processor
            .process(Cursor::new("a,b,c\nnode\n1,2\n"), &mut out)
            .unwrap();
        assert_eq!(out, b"a\n1\n");
        assert_eq!(
            stats,
            ProcessStats {
                lines_read: 3,
                lines_written: 2,
                lines_suppressed: 1,
            }
        );
    }

    #[test]
    fn open_and_closed_ranges() {
        let processor = Processor::new(parse("2-3,5-").unwrap()).with_delimiter("|");
        assert_eq!(
            run(&processor, "a|b|c|d|e|f\n1|2|3|4\n"),
            "b|c|e|f\n2|3\n"
        );
    }

    #[test]
    fn multi_byte_delimiter() {
        let processor = Processor::new(parse("1,3").unwrap()).with_delimiter("<->");
        assert_eq!(
            run(&processor, "a<->b<->c\n1<->2<->3\n"),
            "a<->c\n1<->3\n"
        );
    }

    fn split<'a>(line: &'a str, delimiter: &str) -> Vec<&'a str> {
        split_fields(line.as_bytes(), delimiter.as_bytes())
            .into_iter()
            .map(|field| std::str::from_utf8(field).expect("utf8 field"))
            .collect()
    }

    #[test]
    fn split_keeps_empty_fields() {
        assert_eq!(split("a,,c", ","), ["a", "", "c"]);
        assert_eq!(split(",a,", ","), ["", "a", ""]);
        assert_eq!(split("a::b::", "::"), ["a", "b", ""]);
        assert_eq!(split("::", "::"), ["", ""]);
        assert_eq!(split("", "::"), [""]);
        assert_eq!(split("a:::b", "::"), ["a", ":b"]);
    }

    #[test]
    fn selection_order_does_not_reorder_fields() {
        let processor = Processor::new(parse("3,1").unwrap()).with_delimiter(",");
        assert_eq!(processor.cut_line(b"x,y,z"), Some(b"x,z\n".to_vec()));
    }

    #[test]
    fn no_selected_fields_yields_empty_line() {
        let processor = Processor::new(parse("2-").unwrap()).with_delimiter(",");
        assert_eq!(run(&processor, "single\na,b\n"), "\nb\n");
    }

    #[test]
    fn selecting_everything_round_trips() {
        let input = "a,,c,\n,\nplain\n\n";
        let processor = Processor::new(parse("1-").unwrap()).with_delimiter(",");
        assert_eq!(run(&processor, input), input);

        let processor = Processor::new(parse("1-").unwrap()).with_delimiter("<>");
        let input = "<>x<><>y<>\n";
        assert_eq!(run(&processor, input), input);
    }

    #[test]
    fn running_twice_is_identical() {
        let processor = Processor::new(parse("2,4-").unwrap()).with_delimiter(";");
        let input = "a;b;c;d;e\n1;2\nlone\n";
        assert_eq!(run(&processor, input), run(&processor, input));
    }

    #[test]
    fn final_line_without_newline_and_crlf() {
        let processor = Processor::new(parse("2").unwrap()).with_delimiter(",");
        assert_eq!(run(&processor, "a,b\r\nc,d"), "b\nd\n");
    }

    #[test]
    fn empty_delimiter_falls_back_to_tab() {
        let processor = Processor::new(parse("2").unwrap()).with_delimiter("");
        assert_eq!(processor.delimiter(), b"\t");
        assert_eq!(run(&processor, "a\tb\n"), "b\n");
    }

    #[test]
    fn non_utf8_bytes_pass_through() {
        let processor = Processor::new(parse("2").unwrap()).with_delimiter(",");
        let mut out = Vec::new();
        processor
            .process(Cursor::new(b"a,\xff\xfe\n".to_vec()), &mut out)
            .unwrap();
        assert_eq!(out, b"\xff\xfe\n");
    }

    #[test]
    fn line_over_limit_is_rejected() {
        let processor = Processor::new(parse("1").unwrap()).with_max_line_bytes(4);
        let mut out = Vec::new();
        let err = processor
            .process(Cursor::new("ab\ncdefgh\n"), &mut out)
            .unwrap_err();
        assert!(matches!(err, ProcessError::LineTooLong { line: 2, limit: 4 }));
        assert_eq!(out, b"ab\n");
    }

    #[test]
    fn unbounded_limit_still_reads_input() {
        let processor = Processor::new(parse("1-").unwrap()).with_max_line_bytes(usize::MAX);
        assert_eq!(run(&processor, "a\tb\nc\n"), "a\tb\nc\n");
    }

    #[test]
    fn cut_line_output_ends_with_newline() {
        let processor = Processor::new(parse("2").unwrap()).with_delimiter(",");
        assert_eq!(processor.cut_line(b"a,b"), Some(b"b\n".to_vec()));
        assert_eq!(processor.cut_line(b"a"), Some(b"\n".to_vec()));

        let processor = processor.with_separated_only(true);
        assert_eq!(processor.cut_line(b"a"), None);
    }

    #[test]
    fn line_at_limit_is_accepted() {
        let processor = Processor::new(parse("1").unwrap()).with_max_line_bytes(4);
        assert_eq!(run(&processor, "abcd\nwxyz"), "abcd\nwxyz\n");
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("device unplugged"));
            }
            self.served = true;
            let data = b"a\tb\n";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    #[test]
    fn read_failure_keeps_partial_output() {
        let processor = Processor::new(parse("2").unwrap());
        let reader = io::BufReader::new(FailingReader { served: false });
        let mut out = Vec::new();
        let err = processor.process(reader, &mut out).unwrap_err();
        assert!(matches!(err, ProcessError::Io(_)));
        assert_eq!(out, b"b\n");
    }

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_stops_processing() {
        let processor = Processor::new(parse("1").unwrap());
        let err = processor
            .process(Cursor::new("a\nb\n"), ClosedSink)
            .unwrap_err();
        match err {
            ProcessError::Io(err) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn stats_accumulate() {
        let mut total = ProcessStats::default();
        total += ProcessStats {
            lines_read: 2,
            lines_written: 1,
            lines_suppressed: 1,
        };
        total += ProcessStats {
            lines_read: 1,
            lines_written: 1,
            lines_suppressed: 0,
        };
        assert_eq!(total.lines_read, 3);
        assert_eq!(total.lines_written, 2);
        assert_eq!(total.lines_suppressed, 1);
    }
}
