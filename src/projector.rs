use crate::table::{Table, TableSet};

pub const PROBES_SECTION: &str = "Probes";
pub const REDUCED_PROBES: &str = "Probes_reduced";

pub fn default_probe_columns_to_drop() -> Vec<String> {
    [
        "Definition",
        "Ontology_Component",
        "Ontology_Process",
        "Ontology_Function",
        "Synonyms",
        "Obsolete_Probe_Id",
        "Probe_Sequence",
    ]
    .iter()
    .map(|column| column.to_string())
    .collect()
}

// absent columns are ignored
pub fn drop_columns<S: AsRef<str>>(table: &Table, columns: &[S]) -> Table {
    let Some(header) = table.header() else {
        return table.clone();
    };

    let keep: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| !columns.iter().any(|column| column.as_ref() == name.as_str()))
        .map(|(index, _)| index)
        .collect();

    let project = |cells: &[String]| -> Vec<String> {
        keep.iter()
            .filter_map(|&index| cells.get(index).cloned())
            .collect()
    };

    Table::with_header(
        project(header),
        table.rows().iter().map(|row| project(row.as_slice())).collect(),
    )
}

pub fn reduce_probes<S: AsRef<str>>(tables: &TableSet, columns: &[S]) -> Option<Table> {
    tables
        .get(PROBES_SECTION)
        .map(|probes| drop_columns(probes, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_sections;

    #[test]
    fn missing_probes_yields_nothing() {
        let set = parse_sections("[Heading]\nA\tB\n").unwrap();
        assert!(reduce_probes(&set, &default_probe_columns_to_drop()).is_none());
    }

    #[test]
    fn reduce_probes_drops_default_columns() {
        let set = parse_sections(
            "[Probes]\nProbe_Id\tSymbol\tDefinition\tSynonyms\nILMN_1\tGAPDH\tdesc\tG3PD\n",
        )
        .unwrap();
        let reduced = reduce_probes(&set, &default_probe_columns_to_drop()).unwrap();
        assert_eq!(
            reduced.header().unwrap(),
            &["Probe_Id".to_string(), "Symbol".to_string()]
        );
        assert_eq!(reduced.cell(0, "Symbol"), Some("GAPDH"));
    }
}
