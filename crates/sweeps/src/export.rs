use foundation::ModelSid;

use crate::table::ReconciliationRow;

pub const CSV_HEADER: [&str; 3] = ["Sweep #", "Sweep ID", "Pano ID"];

pub const CSV_MIME: &str = "text/csv;charset=utf-8;";

/// `sweep_id_map_<model>.csv`
pub fn export_file_name(model: &ModelSid) -> String {
    format!("sweep_id_map_{model}.csv")
}

/// Encodes rows as quoted CSV: a header record, then one record per row,
/// joined by `\n` with no trailing newline.
///
/// Every field is wrapped in double quotes and embedded quotes are doubled,
/// so commas and line breaks inside a field survive intact.
pub fn encode_csv(rows: &[ReconciliationRow]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER);
    for row in rows {
        out.push('\n');
        push_record(
            &mut out,
            [row.label.as_str(), row.sweep_id.as_str(), row.pano_id.as_str()],
        );
    }
    out
}

fn push_record(out: &mut String, fields: [&str; 3]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
}
