use anyhow::Result;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Non-empty, non-comment lines of `path` (`-` reads stdin).
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let s = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    Ok(lines_of(&s))
}

fn lines_of(s: &str) -> Vec<String> {
    s.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect()
}

/// File URLs first, then inline ones, each in their original order.
pub fn load_urls(files: &[PathBuf], inline: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for p in files {
        out.extend(read_lines(p)?);
    }
    out.extend(inline.iter().cloned());
    Ok(out)
}

/// Apply `KEY=VALUE` lines from an env file without overriding the process env.
///
/// Blank lines and `#` comments are skipped. Values are never logged.
pub fn apply_env_file(path: &Path) -> Result<usize> {
    let txt = fs::read_to_string(path)?;
    let mut applied = 0usize;
    for (k, v) in parse_env_lines(&txt) {
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v);
            applied += 1;
        }
    }
    Ok(applied)
}

fn parse_env_lines(txt: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        out.push((k, v.trim()));
    }
    out
}
