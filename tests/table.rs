use assert_matches::assert_matches;

use kira_geo_pipeline::error::KiraError;
use kira_geo_pipeline::table::{HEADING_SECTION, Table, TableSet, parse_sections};

const SAMPLE: &str = "\
preamble line that is ignored
[Heading]
Investigator Name\tunknown
Date\t2/8/2013
[Probes]
Array_Address_Id\tProbe_Id\tSymbol\tDefinition
1\tILMN_1\tGAPDH\tglyceraldehyde
2\tILMN_2\tACTB\tactin
[Controls]
Array_Address_Id\tProbe_Id\tReporter_Group_Name
10\tILMN_c1\thousekeeping
";

fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

#[test]
fn heading_and_probes_are_split() {
    let set = parse_sections("[Heading]\nA\tB\n[Probes]\nID\tName\n1\tfoo\n").unwrap();

    assert_eq!(set.names().collect::<Vec<_>>(), vec!["Heading", "Probes"]);

    let heading = set.get(HEADING_SECTION).unwrap();
    assert_eq!(heading.header(), None);
    assert_eq!(heading.rows(), &[strings(&["A", "B"])]);

    let probes = set.get("Probes").unwrap();
    assert_eq!(probes.records(), vec![vec![("ID", "1"), ("Name", "foo")]]);
}

#[test]
fn sections_keep_file_order_and_skip_preamble() {
    let set = parse_sections(SAMPLE).unwrap();
    assert_eq!(
        set.names().collect::<Vec<_>>(),
        vec!["Heading", "Probes", "Controls"]
    );
    assert_eq!(set.get("Heading").unwrap().row_count(), 2);
    assert_eq!(set.get("Probes").unwrap().row_count(), 2);
    assert_eq!(set.get("Probes").unwrap().cell(1, "Symbol"), Some("ACTB"));
    assert_eq!(
        set.get("Controls").unwrap().cell(0, "Reporter_Group_Name"),
        Some("housekeeping")
    );
}

#[test]
fn content_without_any_header_yields_empty_set() {
    let set = parse_sections("just\ttext\nno sections\n").unwrap();
    assert!(set.is_empty());
}

#[test]
fn empty_section_is_header_only_zero_rows() {
    let set = parse_sections("[Probes]\n[Controls]\nID\n").unwrap();
    let probes = set.get("Probes").unwrap();
    assert_eq!(probes.header(), Some(&[][..]));
    assert_eq!(probes.row_count(), 0);

    let controls = set.get("Controls").unwrap();
    assert_eq!(controls.header().unwrap(), &strings(&["ID"])[..]);
    assert_eq!(controls.row_count(), 0);
}

#[test]
fn heading_as_last_section_is_headerless() {
    let set = parse_sections("[Probes]\nID\n1\n[Heading]\nKey\tValue\nOther\tThing\n").unwrap();
    let heading = set.get(HEADING_SECTION).unwrap();
    assert_eq!(heading.header(), None);
    assert_eq!(heading.row_count(), 2);
    assert_eq!(heading.cell_at(0, 0), Some("Key"));
}

#[test]
fn duplicate_section_keeps_last_table_at_first_position() {
    let set = parse_sections("[Probes]\nID\n1\n[Controls]\nC\nx\n[Probes]\nID\n2\n3\n").unwrap();
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["Probes", "Controls"]);
    let probes = set.get("Probes").unwrap();
    assert_eq!(probes.row_count(), 2);
    assert_eq!(probes.cell(0, "ID"), Some("2"));
}

#[test]
fn short_row_is_source_corruption() {
    let text = "[Heading]\nA\tB\n[Probes]\nID\tName\tSymbol\n1\tfoo\tbar\n2\n";
    let err = parse_sections(text).unwrap_err();
    assert_matches!(
        err,
        KiraError::SourceCorruption { ref section, line: 6, expected: 3, found: 1 }
            if section == "Probes"
    );
}

#[test]
fn serialising_and_reparsing_is_identity() {
    let set = parse_sections(SAMPLE).unwrap();
    let rebuilt = set.to_sectioned_text();
    let reparsed = parse_sections(&rebuilt).unwrap();
    assert_eq!(reparsed, set);
    assert_eq!(reparsed.to_sectioned_text(), rebuilt);
}

#[test]
fn table_tsv_has_header_then_rows() {
    let table = Table::with_header(
        strings(&["ID", "Name"]),
        vec![strings(&["1", "foo"]), strings(&["2", "bar"])],
    );
    assert_eq!(table.to_tsv(), "ID\tName\n1\tfoo\n2\tbar\n");

    let heading = Table::headerless(vec![strings(&["A", "B"])]);
    assert_eq!(heading.to_tsv(), "A\tB\n");
}

#[test]
fn table_set_insert_replaces_in_place() {
    let mut set = TableSet::new();
    assert!(set.insert("A".to_string(), Table::headerless(Vec::new())).is_none());
    assert!(set.insert("B".to_string(), Table::headerless(Vec::new())).is_none());
    let previous = set.insert(
        "A".to_string(),
        Table::headerless(vec![strings(&["x"])]),
    );
    assert!(previous.is_some());
    assert_eq!(set.len(), 2);
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["A", "B"]);
    assert!(set.contains("B"));
}
