//! Strips broker preamble and blank lines ahead of CSV parsing.

/// Header row of the positions export. Everything above the first line
/// carrying it is broker noise.
pub const HEADER_LINE: &str = "Symbol,Last,Pos Qty,%Change,Avg Price,Days";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedExport {
    /// Header line followed by the non-blank data lines, newline separated.
    /// Empty when no header was found.
    pub text: String,
    pub header_found: bool,
    pub data_lines: usize,
}

pub fn clean_export(raw: &str) -> CleanedExport {
    let mut lines = raw.lines();

    let Some(header) = lines.by_ref().find(|line| line.contains(HEADER_LINE)) else {
        tracing::warn!("positions header not found, export yields no rows");
        return CleanedExport {
            text: String::new(),
            header_found: false,
            data_lines: 0,
        };
    };

    let mut kept: Vec<&str> = vec![header];
    kept.extend(lines.filter(|line| !line.trim().is_empty()));
    let data_lines = kept.len() - 1;

    tracing::debug!(data_lines, "export preprocessed");

    CleanedExport {
        text: kept.join("\n"),
        header_found: true,
        data_lines,
    }
}
