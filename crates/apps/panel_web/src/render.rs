//! HTML fragments for the panel. Pure string builders so they can be tested
//! off the browser.

use sweeps::{CurrentLocation, NO_CONVERSIONS, TableView};

pub const HELP_HTML: &str = r#"<h3>Sweep ID Tool Help</h3>
<p><strong>SDK Key:</strong> You need a valid Matterport SDK key to use this tool. Click "Set SDK Key" to enter or update your key.</p>
<p><strong>Navigate to Location:</strong> Enter either a Sweep ID or a Pano ID to jump to that location in the model.</p>
<p><strong>Change Model:</strong> Enter a different Matterport Model ID to load a new model.</p>
<p><strong>Sweep ID Conversion Table:</strong> Shows the relationship between Sweep IDs and Pano IDs. You can export this as a CSV file.</p>
<p><strong>Current Location:</strong> Shows details about your current position in the model.</p>"#;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rows for the conversion table's `<tbody>`.
pub fn table_body_html(view: TableView<'_>) -> String {
    match view {
        TableView::Placeholder => format!("<tr><td colspan=\"3\">{NO_CONVERSIONS}</td></tr>"),
        TableView::Rows(rows) => rows
            .iter()
            .map(|row| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(row.label.as_str()),
                    escape_html(row.sweep_id.as_str()),
                    escape_html(row.pano_id.as_str()),
                )
            })
            .collect(),
    }
}

/// One "current location" field, e.g. `<span>Sweep ID:</span> abc`.
pub fn location_field_html(caption: &str, value: &str) -> String {
    format!("<span>{caption}:</span> {}", escape_html(value))
}

/// Sweep id, pano id and label fields, in display order.
pub fn location_fields(location: &CurrentLocation) -> [String; 3] {
    [
        location_field_html("Sweep ID", location.sweep_id.as_str()),
        location_field_html("Pano ID", location.pano_text()),
        location_field_html("Scan #", location.label.as_str()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sweeps::{Label, PanoId, ReconciliationRow, SweepId};

    #[test]
    fn empty_table_shows_placeholder_row() {
        assert_eq!(
            table_body_html(TableView::Placeholder),
            "<tr><td colspan=\"3\">No sweep ID conversions available.</td></tr>"
        );
    }

    #[test]
    fn rows_are_escaped() {
        let rows = [ReconciliationRow::new(
            Label::Resolved("<b>1</b>".into()),
            SweepId::new("s1"),
            PanoId::new("p&1"),
        )];
        assert_eq!(
            table_body_html(TableView::Rows(&rows)),
            "<tr><td>&lt;b&gt;1&lt;/b&gt;</td><td>s1</td><td>p&amp;1</td></tr>"
        );
    }

    #[test]
    fn location_without_pano_shows_sentinel() {
        let location = CurrentLocation {
            sweep_id: SweepId::new("s9"),
            pano_id: None,
            label: Label::Failed,
        };
        assert_eq!(
            location_fields(&location),
            [
                "<span>Sweep ID:</span> s9".to_string(),
                "<span>Pano ID:</span> N/A".to_string(),
                "<span>Scan #:</span> Error".to_string(),
            ]
        );
    }
}
