// Delimited text reading: encoding fallback, delimiter sniffing, records

use std::io::Read;
use std::path::Path;

/// Header row plus data records of a delimited file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Field delimiter the records were split on
    pub delimiter: u8,
}

impl Records {
    /// Index of a header, ignoring surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Read a delimited file with a header row. The delimiter is sniffed.
pub fn read_records(path: &Path) -> Result<Records, String> {
    let content = read_file_as_utf8(path)?;
    parse_records(&content, sniff_delimiter(&content))
}

pub fn parse_records(content: &str, delimiter: u8) -> Result<Records, String> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| format!("CSV header error: {}", e))?
        .iter()
        // Spreadsheet exports often start with a UTF-8 BOM
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("CSV parse error: {}", e))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Records { headers, rows, delimiter })
}

/// Pick the delimiter that splits the first lines most consistently.
///
/// Candidates are tab, semicolon, comma and pipe. A candidate must give more
/// than one field on the header line; among those, the one with the most
/// lines matching the header's field count (times that count) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let field_count = |line: &str, delim: u8| -> usize {
        ::csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes())
            .records()
            .next()
            .and_then(|r| r.ok())
            .map(|r| r.len())
            .unwrap_or(1)
    };

    CANDIDATES
        .iter()
        .filter_map(|&delim| {
            let counts: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();
            let target = *counts.first()?;
            if target <= 1 {
                return None;
            }
            let consistent = counts.iter().filter(|&&c| c == target).count();
            Some((delim, consistent * target))
        })
        // Earlier candidates win ties
        .fold(None, |best: Option<(u8, usize)>, (delim, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((delim, score)),
        })
        .map(|(delim, _)| delim)
        .unwrap_or(b',')
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback for
/// spreadsheet exports).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}
