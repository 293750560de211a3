//! Rendering bundles for the evaluation spreadsheet.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::Value;

use crate::row::{Bundle, pretty_json};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-indented JSON, one document per bundle.
    #[default]
    Json,
    /// One tab-separated line per row, ready to paste into the sheet.
    Tsv,
}

pub fn render<B: Bundle>(bundle: &B, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => pretty_json(bundle),
        OutputFormat::Tsv => render_tsv(bundle),
    }
}

fn render_tsv<B: Bundle>(bundle: &B) -> Result<String> {
    let mut lines = Vec::new();
    for (step, row) in bundle.rows() {
        let body = compact_body(&row.body_or_response)
            .with_context(|| format!("compact {} {step} body", B::RESOURCE))?;
        let status = row.status_code.to_string();
        let id = row.id.to_string();
        let fields: [&str; 8] = [
            B::RESOURCE.path(),
            step,
            &status,
            &row.license,
            &id,
            &row.name,
            &row.request,
            &body,
        ];
        lines.push(fields.join("\t"));
    }
    Ok(lines.join("\n"))
}

/// Single-line form of a recorded JSON body, so it fits one spreadsheet cell.
///
/// Keys stay in recorded order (`preserve_order`), matching the JSON output.
fn compact_body(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).context("parse recorded body")?;
    serde_json::to_string(&value).context("encode compact body")
}

#[cfg(test)]
mod tests {
    use metrc::test_support::StubMetrc;

    use super::*;
    use crate::test_support::{LICENSE, verifier};

    #[test]
    fn tsv_has_one_line_per_row() {
        let stub = StubMetrc::new().with_next_id(4);
        let bundle = verifier(&stub).verify_locations(LICENSE).expect("verify");
        let text = render(&bundle, OutputFormat::Tsv).expect("tsv");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(&fields[..5], &["locations", "update", "200", LICENSE, "4"]);
        assert_eq!(
            fields[7],
            r#"[{"Id":4,"Name":"Metrc Eval Location 2021.01.01 12:00:00 Updated","LocationTypeName":"Default Location type"}]"#
        );
    }

    #[test]
    fn compact_body_keeps_recorded_key_order() {
        let body = "[\n\t{\n\t\t\"Name\": \"Vault\",\n\t\t\"LocationTypeName\": \"Default Location type\"\n\t}\n]";
        assert_eq!(
            compact_body(body).expect("compact"),
            r#"[{"Name":"Vault","LocationTypeName":"Default Location type"}]"#
        );
    }

    #[test]
    fn json_output_round_trips_bundle() {
        let stub = StubMetrc::new();
        let bundle = verifier(&stub).verify_strains(LICENSE).expect("verify");
        let text = render(&bundle, OutputFormat::Json).expect("json");
        let parsed: crate::strains::StrainsBundle = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed, bundle);
    }
}
