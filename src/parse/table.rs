// src/parse/table.rs

use scraper::ElementRef;
use std::collections::BTreeMap;

/// Flatten a `<table>` into rows of cell text.
///
/// `colspan` repeats a cell across columns and `rowspan` carries it down into
/// the following rows, so every row lines up column-for-column the way a
/// spreadsheet import would see it. Header rows (those in `<thead>`, or
/// leading rows made only of `<th>`) are left out, so row 0 is the first data
/// row. Rows of nested tables are not descended into.
pub fn table_grid(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let mut grid = Vec::new();
    // column → (text, rows still to fill)
    let mut carried: BTreeMap<usize, (String, usize)> = BTreeMap::new();
    let mut in_header = true;

    for (row, in_thead) in rows_of(table) {
        let mut out = Vec::new();
        let mut cells = child_elements(row).filter(|c| is_cell(c)).peekable();
        let mut col = 0;

        let header = in_thead
            || (cells.peek().is_some()
                && child_elements(row)
                    .filter(|c| is_cell(c))
                    .all(|c| c.value().name() == "th"));
        in_header = in_header && header;

        loop {
            if let Some(text) = take_carried(&mut carried, col) {
                out.push(text);
                col += 1;
                continue;
            }
            match cells.next() {
                Some(cell) => {
                    let text = cell_text(cell);
                    let colspan = span_attr(cell, "colspan");
                    let rowspan = span_attr(cell, "rowspan");
                    for _ in 0..colspan {
                        if rowspan > 1 {
                            carried.insert(col, (text.clone(), rowspan - 1));
                        }
                        out.push(text.clone());
                        col += 1;
                    }
                }
                // a carried cell further right still belongs to this row
                None if carried.range(col..).next().is_some() => {
                    out.push(String::new());
                    col += 1;
                }
                None => break,
            }
        }

        if !in_header {
            grid.push(out);
        }
    }

    grid
}

fn take_carried(carried: &mut BTreeMap<usize, (String, usize)>, col: usize) -> Option<String> {
    let (text, left) = carried.get_mut(&col)?;
    let text = text.clone();
    *left -= 1;
    if *left == 0 {
        carried.remove(&col);
    }
    Some(text)
}

/// `tr` elements directly under the table or under its `thead`/`tbody`/`tfoot`,
/// each flagged with whether it sits in a `<thead>`.
fn rows_of<'a>(table: ElementRef<'a>) -> Vec<(ElementRef<'a>, bool)> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push((child, false)),
            section @ ("thead" | "tbody" | "tfoot") => rows.extend(
                child_elements(child)
                    .filter(|r| r.value().name() == "tr")
                    .map(|r| (r, section == "thead")),
            ),
            _ => {}
        }
    }
    rows
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn is_cell(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "td" | "th")
}

fn span_attr(cell: ElementRef<'_>, name: &str) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| (1..=1000).contains(n))
        .unwrap_or(1)
}

/// Cell text with runs of whitespace collapsed.
pub fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn grid_of(html: &str) -> Vec<Vec<String>> {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("table").unwrap();
        table_grid(doc.select(&sel).next().unwrap())
    }

    #[test]
    fn plain_rows() {
        let g = grid_of("<table><tr><td> a </td><td>b\n c</td></tr><tr><th>1</th><td>2</td></tr></table>");
        assert_eq!(g, vec![vec!["a", "b c"], vec!["1", "2"]]);
    }

    #[test]
    fn colspan_repeats_text() {
        let g = grid_of(r#"<table><tr><td colspan="3">title</td></tr><tr><td>x</td><td>y</td><td>z</td></tr></table>"#);
        assert_eq!(g[0], vec!["title", "title", "title"]);
        assert_eq!(g[1], vec!["x", "y", "z"]);
    }

    #[test]
    fn rowspan_carries_down() {
        let g = grid_of(
            r#"<table><tbody>
                <tr><td rowspan="2">k</td><td>1</td></tr>
                <tr><td>2</td></tr>
                <tr><td>m</td><td>3</td></tr>
            </tbody></table>"#,
        );
        assert_eq!(g, vec![vec!["k", "1"], vec!["k", "2"], vec!["m", "3"]]);
    }

    #[test]
    fn rowspan_past_a_short_row() {
        let g = grid_of(
            r#"<table>
                <tr><td>a</td><td>b</td><td rowspan="2">c</td></tr>
                <tr><td>x</td></tr>
                <tr><td>y</td><td>z</td><td>w</td></tr>
            </table>"#,
        );
        assert_eq!(
            g,
            vec![vec!["a", "b", "c"], vec!["x", "", "c"], vec!["y", "z", "w"]]
        );
    }

    #[test]
    fn leading_header_rows_are_dropped() {
        let g = grid_of(
            r#"<table>
                <tr><th colspan="2">title</th></tr>
                <tr><th>k</th><th>v</th></tr>
                <tr><td>1</td><td>2</td></tr>
                <tr><th>3</th><th>4</th></tr>
            </table>"#,
        );
        assert_eq!(g, vec![vec!["1", "2"], vec!["3", "4"]]);

        let g = grid_of("<table><thead><tr><td>h</td></tr></thead><tbody><tr><td>d</td></tr></tbody></table>");
        assert_eq!(g, vec![vec!["d"]]);
    }

    #[test]
    fn nested_tables_are_skipped() {
        let g = grid_of("<table><tr><td><table><tr><td>inner</td></tr></table></td></tr></table>");
        assert_eq!(g.len(), 1);
    }
}
