use linkhunter_core::{Error, Result, UrlCount};
use std::path::Path;

/// `URL,Count` CSV, one quoted URL per line, no trailing newline.
pub fn to_csv(rows: &[UrlCount]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push("URL,Count".to_string());
    for r in rows {
        lines.push(format!("\"{}\",{}", r.url.replace('"', "\"\""), r.count));
    }
    lines.join("\n")
}

pub fn write_csv(path: &Path, rows: &[UrlCount]) -> Result<()> {
    if rows.is_empty() {
        return Err(Error::Export("no URLs selected".to_string()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Export(e.to_string()))?;
        }
    }
    std::fs::write(path, to_csv(rows)).map_err(|e| Error::Export(e.to_string()))
}
