//! CSV table reader/writer with encoding and delimiter auto-detection.
//!
//! Loads survey exports into a [`Table`] and writes them back in the same
//! delimited text format. Empty cells are treated as missing values.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{Column, Table};

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is always reported as `utf-8`; chardet is only consulted
/// for other byte sequences.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding label
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "utf-8-sig" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => {
            let codec = encoding_rs::Encoding::for_label(other.as_bytes())
                .ok_or_else(|| CsvError::Encoding(other.to_string()))?;
            codec.decode(bytes).0.into_owned()
        }
    };

    Ok(strip_bom(decoded))
}

fn strip_bom(content: String) -> String {
    match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn delimiter_byte(delimiter: char) -> CsvResult<u8> {
    u8::try_from(delimiter).map_err(|_| CsvError::Parse {
        line: 1,
        message: format!("Delimiter '{}' is not a single-byte character", delimiter),
    })
}

/// Make header names unique by suffixing repeats with `.1`, `.2`, ...
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());

    for header in headers {
        let mut name = header.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", header, n);
            n += 1;
        }
        seen.insert(name.clone());
        result.push(name);
    }

    result
}

/// Parse CSV text into a table with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use recode::parse_table;
///
/// let table = parse_table("name;age\nAlice;30\nBob;", ';').unwrap();
///
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.column("age").unwrap().cells[1], None);
/// ```
pub fn parse_table(content: &str, delimiter: char) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_parse_error)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let headers = dedupe_headers(headers);
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record.map_err(csv_parse_error)?;

        // Short rows are padded with missing cells, extra cells are ignored
        for (i, column) in cells.iter_mut().enumerate() {
            let value = record
                .get(i)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            column.push(value);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| Column::new(name, cells))
        .collect();

    Ok(Table::new(columns)?)
}

fn csv_parse_error(err: csv::Error) -> CsvError {
    let line = err.position().map_or(0, csv::Position::line);
    CsvError::Parse {
        line,
        message: err.to_string(),
    }
}

/// Parse CSV file with auto-detection of encoding and (optionally) delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("/path/to/export.csv", None)?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.table.row_count());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(
    path: P,
    delimiter: Option<char>,
) -> CsvResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes_auto(&bytes, delimiter)
}

/// Parse CSV bytes with auto-detection of encoding and (optionally) delimiter.
pub fn parse_bytes_auto(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)
        .unwrap_or_else(|_| strip_bom(String::from_utf8_lossy(bytes).into_owned()));
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    let table = parse_table(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Write a table as delimited UTF-8 text: header row first, missing cells
/// as empty fields.
pub fn write_table<W: Write>(table: &Table, writer: W, delimiter: char) -> CsvResult<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .from_writer(writer);

    out.write_record(table.column_names())
        .map_err(|e| CsvError::Write(e.to_string()))?;

    for row in table.rows() {
        out.write_record(row.iter().map(|cell| cell.unwrap_or("")))
            .map_err(|e| CsvError::Write(e.to_string()))?;
    }

    out.flush().map_err(|e| CsvError::Write(e.to_string()))
}

/// Write a table to a file, overwriting it.
pub fn write_table_file<P: AsRef<Path>>(table: &Table, path: P, delimiter: char) -> CsvResult<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_table(table, std::io::BufWriter::new(file), delimiter)
}
