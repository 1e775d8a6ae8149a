use csv::{QuoteStyle, WriterBuilder};

/// Spreadsheet apps evaluate cells starting with these characters.
fn needs_formula_guard(value: &str) -> bool {
    matches!(value.chars().next(), Some('=' | '+' | '-' | '@'))
}

fn guard_cell(value: &str) -> String {
    if needs_formula_guard(value) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Renders rows as a fully quoted CSV document.
pub fn to_csv(header: &[&str], rows: &[Vec<String>]) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(|cell| guard_cell(cell)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_quoted_rows() {
        let out = to_csv(
            &["employee", "hours"],
            &[vec!["Asha \"AV\" Verma".into(), "8.50".into()]],
        )
        .unwrap();
        assert_eq!(out, "\"employee\",\"hours\"\n\"Asha \"\"AV\"\" Verma\",\"8.50\"\n");
    }

    #[test]
    fn guards_formula_cells() {
        let out = to_csv(&["name"], &[vec!["=HYPERLINK(\"x\")".into()]]).unwrap();
        assert!(out.contains("\"'=HYPERLINK"));
    }
}
