use tracing::warn;

use crate::error::KiraError;

pub const HEADING_SECTION: &str = "Heading";

const SECTION_OPEN: char = '[';
const SECTION_CLOSE: char = ']';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn with_header(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            header: Some(header),
            rows,
        }
    }

    pub fn headerless(rows: Vec<Vec<String>>) -> Self {
        Self { header: None, rows }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header
            .as_ref()
            .and_then(|header| header.iter().position(|name| name == column))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.cell_at(row, index)
    }

    pub fn cell_at(&self, row: usize, index: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(index))
            .map(String::as_str)
    }

    pub fn records(&self) -> Vec<Vec<(&str, &str)>> {
        let Some(header) = &self.header else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|row| {
                header
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().map(String::as_str))
                    .collect()
            })
            .collect()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            if header.is_empty() {
                return out;
            }
            out.push_str(&header.join("\t"));
            out.push('\n');
        }
        // a lone empty cell becomes a blank line, which parse_sections skips
        for row in &self.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSet {
    entries: Vec<(String, Table)>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    // a replaced table keeps its slot
    pub fn insert(&mut self, name: String, table: Table) -> Option<Table> {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            return Some(std::mem::replace(slot, table));
        }
        self.entries.push((name, table));
        None
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, table)| table)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.entries.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_sectioned_text(&self) -> String {
        let mut out = String::new();
        for (name, table) in &self.entries {
            out.push(SECTION_OPEN);
            out.push_str(name);
            out.push(SECTION_CLOSE);
            out.push('\n');
            out.push_str(&table.to_tsv());
        }
        out
    }
}

pub fn parse_sections(text: &str) -> Result<TableSet, KiraError> {
    let mut tables = TableSet::new();
    let mut current: Option<String> = None;
    let mut buffer: Vec<(usize, &str)> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.starts_with(SECTION_OPEN) {
            if let Some(name) = current.take() {
                flush_section(&mut tables, name, &buffer)?;
            }
            buffer.clear();
            current = Some(section_name(line));
            continue;
        }
        if current.is_some() {
            buffer.push((index + 1, line));
        }
    }

    if let Some(name) = current {
        flush_section(&mut tables, name, &buffer)?;
    }
    Ok(tables)
}

fn section_name(line: &str) -> String {
    let inner = line.trim_start_matches(SECTION_OPEN);
    let inner = match inner.find(SECTION_CLOSE) {
        Some(end) => &inner[..end],
        None => inner,
    };
    inner.trim().to_string()
}

fn flush_section(
    tables: &mut TableSet,
    name: String,
    buffer: &[(usize, &str)],
) -> Result<(), KiraError> {
    let table = parse_body(&name, buffer)?;
    if tables.insert(name.clone(), table).is_some() {
        warn!(section = %name, "duplicate section, keeping the last occurrence");
    }
    Ok(())
}

fn parse_body(name: &str, buffer: &[(usize, &str)]) -> Result<Table, KiraError> {
    let mut lines = buffer.iter().filter(|(_, line)| !line.is_empty());

    if name == HEADING_SECTION {
        let rows = lines.map(|(_, line)| split_cells(line)).collect();
        return Ok(Table::headerless(rows));
    }

    let Some((_, header_line)) = lines.next() else {
        return Ok(Table::with_header(Vec::new(), Vec::new()));
    };
    let header = split_cells(header_line);
    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let row = split_cells(line);
        if row.len() != header.len() {
            return Err(KiraError::SourceCorruption {
                section: name.to_string(),
                line: *line_no,
                expected: header.len(),
                found: row.len(),
            });
        }
        rows.push(row);
    }
    Ok(Table::with_header(header, rows))
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}
