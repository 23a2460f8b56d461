//! ANSI helpers for the CLI tables. Cells are padded by visible width so
//! colored text still lines up.

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

pub fn bold(s: &str) -> String {
    format!("{BOLD}{s}{RESET}")
}
pub fn dim(s: &str) -> String {
    format!("{DIM}{s}{RESET}")
}
pub fn green(s: &str) -> String {
    format!("{GREEN}{s}{RESET}")
}
pub fn red(s: &str) -> String {
    format!("{RED}{s}{RESET}")
}
pub fn yellow(s: &str) -> String {
    format!("{YELLOW}{s}{RESET}")
}
pub fn cyan(s: &str) -> String {
    format!("{CYAN}{s}{RESET}")
}

pub fn online_badge(online: bool) -> String {
    if online {
        green("online")
    } else {
        dim("offline")
    }
}

pub fn yes_no(value: bool) -> String {
    if value { green("yes") } else { dim("no") }
}

pub fn visible_len(s: &str) -> usize {
    let mut n = 0usize;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for x in chars.by_ref() {
                if x == 'm' {
                    break;
                }
            }
            continue;
        }
        n += 1;
    }
    n
}

pub fn pad_cell(s: &str, width: usize) -> String {
    let vis = visible_len(s);
    if vis >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - vis))
    }
}

/// Column widths fitted to the widest visible cell of each column.
pub fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| visible_len(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(visible_len(cell));
            }
        }
    }
    widths
}

/// Render a titled table; the last column is never padded.
pub fn render_table(title: &str, header: &[&str], rows: &[Vec<String>]) -> String {
    let header: Vec<String> = header.iter().map(|h| dim(h)).collect();
    let widths = column_widths(&header, rows);

    let line = |cells: &[String]| {
        let last = cells.len().saturating_sub(1);
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| if i == last { c.clone() } else { pad_cell(c, widths[i]) })
            .collect();
        format!("  {}", padded.join(" "))
    };

    let mut out = vec![bold(title), line(&header)];
    out.extend(rows.iter().map(|r| line(r)));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_len_ignores_ansi() {
        assert_eq!(visible_len("online"), 6);
        assert_eq!(visible_len(&green("online")), 6);
        assert_eq!(visible_len(&bold(&red("x"))), 1);
        assert_eq!(visible_len(""), 0);
    }

    #[test]
    fn test_pad_cell_uses_visible_width() {
        let padded = pad_cell(&green("on"), 5);
        assert_eq!(visible_len(&padded), 5);
        assert!(padded.ends_with("   "));

        // never truncates
        assert_eq!(pad_cell("abcdef", 3), "abcdef");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            vec!["nas".to_string(), online_badge(true), yes_no(true)],
            vec!["mac-studio".to_string(), online_badge(false), yes_no(false)],
        ];
        let table = render_table("Devices", &["NAME", "STATUS", "WOL"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Devices"));

        // the STATUS column starts at the same visible offset on every row
        let offset = |line: &str, needle: &str| {
            let idx = line.find(needle).unwrap();
            visible_len(&line[..idx])
        };
        assert_eq!(offset(lines[2], "online"), offset(lines[3], "offline"));
    }
}
