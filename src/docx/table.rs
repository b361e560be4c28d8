use crate::color::{Rgb, to_hex};
use crate::model::{
    Alignment, Border, CellBorders, CellVAlign, Table, TableCell, TableProps, TableRow,
};

use super::body::{Container, collect_block_nodes, walk_blocks};
use super::styles::{Inherit, parse_shading, parse_table_borders, parse_table_props};
use super::xml::{Node, attr, child, children, is, toggle, twips_px, val};
use super::{PartScope, ResolveContext};

/// Parsed `w:tcPr` plus the cell node, before borders are resolved against
/// the row's position in the table.
struct RawCell<'a> {
    node: Node<'a>,
    grid_col: usize,
    col_span: u32,
    merge: VMerge,
    width: Option<f32>,
    /// Fill painted behind this cell.
    background: Option<Rgb>,
    /// Fill the cell's text sits on, including enclosing containers.
    shading: Option<Rgb>,
    own_borders: CellBorders,
    v_align: CellVAlign,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VMerge {
    Absent,
    Restart,
    Continue,
}

fn width_px(node: Node) -> Option<f32> {
    match attr(node, "type") {
        None | Some("dxa") => twips_px(node, "w"),
        _ => None,
    }
}

fn parse_cell<'a>(
    ctx: &ResolveContext,
    tc: Node<'a>,
    grid_col: usize,
    table_fill: Option<Rgb>,
    outer_shading: Option<Rgb>,
) -> RawCell<'a> {
    let tc_pr = child(tc, "tcPr");
    let col_span = tc_pr
        .and_then(|pr| val(pr, "gridSpan"))
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let merge = match tc_pr.and_then(|pr| child(pr, "vMerge")) {
        None => VMerge::Absent,
        Some(n) => match attr(n, "val") {
            Some("restart") => VMerge::Restart,
            _ => VMerge::Continue,
        },
    };
    let own = tc_pr
        .and_then(|pr| child(pr, "tcBorders"))
        .map(parse_table_borders)
        .unwrap_or_default();
    let background = tc_pr
        .and_then(|pr| child(pr, "shd"))
        .and_then(parse_shading)
        .and_then(|c| ctx.theme.resolve(&c))
        .or(table_fill);

    RawCell {
        node: tc,
        grid_col,
        col_span,
        merge,
        width: tc_pr.and_then(|pr| child(pr, "tcW")).and_then(width_px),
        background,
        shading: background.or(outer_shading),
        own_borders: CellBorders {
            top: own.top,
            bottom: own.bottom,
            left: own.left,
            right: own.right,
        },
        v_align: match tc_pr.and_then(|pr| val(pr, "vAlign")) {
            Some("center") => CellVAlign::Center,
            Some("bottom") => CellVAlign::Bottom,
            _ => CellVAlign::Top,
        },
    }
}

/// Edges not set on the cell come from the table: outer edges on the table
/// boundary, inside edges elsewhere.
fn positional_borders(
    props: &TableProps,
    row: usize,
    row_count: usize,
    cell: &RawCell,
    grid_len: usize,
) -> CellBorders {
    let b = &props.borders;
    let pick = |outer: bool, edge: &Option<Border>, inside: &Option<Border>| {
        if outer { edge.clone() } else { inside.clone() }
    };
    let span_end = cell.grid_col + cell.col_span as usize;
    let mut borders = cell.own_borders.clone();
    borders.inherit_from(&CellBorders {
        top: pick(row == 0, &b.top, &b.inside_h),
        bottom: pick(row + 1 == row_count, &b.bottom, &b.inside_h),
        left: pick(cell.grid_col == 0, &b.left, &b.inside_v),
        right: pick(grid_len == 0 || span_end >= grid_len, &b.right, &b.inside_v),
    });
    borders
}

pub(crate) fn parse_table(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    tbl: Node,
    container: Container,
) -> Table {
    let tbl_pr = child(tbl, "tblPr");
    let style_id = tbl_pr.and_then(|pr| val(pr, "tblStyle"));
    let style = ctx.styles.table_style(style_id);
    let effective_style = style.map(|s| s.id.as_str());

    let mut props = tbl_pr.map(parse_table_props).unwrap_or_default();
    if let Some(style_props) = style.and_then(|s| s.table.as_ref()) {
        props.inherit_from(style_props);
    }

    let col_widths: Vec<f32> = child(tbl, "tblGrid")
        .map(|grid| {
            children(grid, "gridCol")
                .map(|c| twips_px(c, "w").unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default();

    let table_fill = tbl_pr
        .and_then(|pr| child(pr, "shd"))
        .and_then(parse_shading)
        .and_then(|c| ctx.theme.resolve(&c));

    let row_nodes: Vec<Node> = collect_block_nodes(tbl)
        .into_iter()
        .filter(|n| is(*n, "tr"))
        .collect();
    let row_count = row_nodes.len();

    let mut rows: Vec<TableRow> = Vec::with_capacity(row_count);
    let mut merges: Vec<Vec<VMerge>> = Vec::with_capacity(row_count);
    for (ri, tr) in row_nodes.iter().enumerate() {
        let tr_pr = child(*tr, "trPr");
        let mut grid_col = tr_pr
            .and_then(|pr| val(pr, "gridBefore"))
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let mut raw_cells = Vec::new();
        for tc in collect_block_nodes(*tr).into_iter().filter(|n| is(*n, "tc")) {
            let cell = parse_cell(ctx, tc, grid_col, table_fill, container.shading);
            grid_col += cell.col_span as usize;
            raw_cells.push(cell);
        }

        let mut cells = Vec::with_capacity(raw_cells.len());
        for raw in &raw_cells {
            let cell_container = Container {
                table_style: effective_style,
                shading: raw.shading,
            };
            cells.push(TableCell {
                content: walk_blocks(ctx, scope, raw.node, cell_container),
                grid_col: raw.grid_col,
                col_span: raw.col_span,
                row_span: if raw.merge == VMerge::Continue { 0 } else { 1 },
                width: raw.width,
                background: raw.background.map(to_hex),
                borders: positional_borders(&props, ri, row_count, raw, col_widths.len()),
                v_align: raw.v_align,
            });
        }
        merges.push(raw_cells.iter().map(|c| c.merge).collect());

        rows.push(TableRow {
            cells,
            height: tr_pr
                .and_then(|pr| child(pr, "trHeight"))
                .and_then(|h| twips_px(h, "val")),
            is_header: tr_pr.and_then(|pr| toggle(pr, "tblHeader")).unwrap_or(false),
        });
    }

    extend_vertical_merges(&mut rows, &merges);

    Table {
        style_id: style_id.map(str::to_string),
        alignment: props.alignment.unwrap_or(Alignment::Left),
        col_widths,
        width: tbl_pr.and_then(|pr| child(pr, "tblW")).and_then(width_px),
        indent: props.indent.unwrap_or(0.0),
        borders: props.borders,
        rows,
    }
}

/// A `restart` cell spans itself plus every directly following `continue`
/// cell starting in the same grid column.
fn extend_vertical_merges(rows: &mut [TableRow], merges: &[Vec<VMerge>]) {
    for ri in 0..rows.len() {
        for ci in 0..rows[ri].cells.len() {
            if merges[ri][ci] != VMerge::Restart {
                continue;
            }
            let grid_col = rows[ri].cells[ci].grid_col;
            let mut span = 1;
            for next in ri + 1..rows.len() {
                let continues = rows[next]
                    .cells
                    .iter()
                    .zip(&merges[next])
                    .any(|(c, m)| c.grid_col == grid_col && *m == VMerge::Continue);
                if !continues {
                    break;
                }
                span += 1;
            }
            rows[ri].cells[ci].row_span = span;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cols: &[usize]) -> TableRow {
        TableRow {
            cells: cols
                .iter()
                .map(|&grid_col| TableCell {
                    content: Vec::new(),
                    grid_col,
                    col_span: 1,
                    row_span: 1,
                    width: None,
                    background: None,
                    borders: CellBorders::default(),
                    v_align: CellVAlign::Top,
                })
                .collect(),
            height: None,
            is_header: false,
        }
    }

    #[test]
    fn restart_absorbs_following_continuations() {
        use VMerge::{Absent, Continue, Restart};
        let merges = vec![
            vec![Restart, Absent],
            vec![Continue, Restart],
            vec![Continue, Continue],
            vec![Absent, Absent],
        ];
        let mut rows: Vec<TableRow> = merges.iter().map(|_| row(&[0, 1])).collect();
        for (r, m) in rows.iter_mut().zip(&merges) {
            for (cell, merge) in r.cells.iter_mut().zip(m) {
                cell.row_span = if *merge == Continue { 0 } else { 1 };
            }
        }
        extend_vertical_merges(&mut rows, &merges);
        assert_eq!(rows[0].cells[0].row_span, 3);
        assert_eq!(rows[1].cells[0].row_span, 0);
        assert_eq!(rows[2].cells[0].row_span, 0);
        assert_eq!(rows[1].cells[1].row_span, 2);
        assert_eq!(rows[2].cells[1].row_span, 0);
        assert_eq!(rows[3].cells[0].row_span, 1);
    }
}
