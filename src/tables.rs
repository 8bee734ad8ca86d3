use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::core::plan::Plan;

pub fn build_plan_table(plan: &Plan) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["Date", "Start", "End", "Action", "Target", "Power", "Price"]);

    let charge_rows = plan.charge.iter().map(|window| {
        (
            window.start,
            vec![
                Cell::new(window.start.format("%b %d")).add_attribute(Attribute::Dim),
                Cell::new(window.start.format("%H:%M")),
                Cell::new(window.end.format("%H:%M")).add_attribute(Attribute::Dim),
                Cell::new("Charge").fg(Color::Green),
                Cell::new(window.target_soc).set_alignment(CellAlignment::Right),
                Cell::new(window.power).set_alignment(CellAlignment::Right),
                Cell::new(""),
            ],
        )
    });
    let discharge_rows = plan.discharge.iter().map(|quarter| {
        (
            quarter.start,
            vec![
                Cell::new(quarter.start.format("%b %d")).add_attribute(Attribute::Dim),
                Cell::new(quarter.start.format("%H:%M")),
                Cell::new(quarter.end.format("%H:%M")).add_attribute(Attribute::Dim),
                Cell::new("Discharge").fg(Color::Red),
                Cell::new(""),
                Cell::new(""),
                match quarter.price {
                    Some(price) => Cell::new(price).set_alignment(CellAlignment::Right),
                    None => Cell::new("any").add_attribute(Attribute::Dim),
                },
            ],
        )
    });
    for (_, row) in charge_rows.merge_by(discharge_rows, |(lhs, _), (rhs, _)| lhs <= rhs) {
        table.add_row(row);
    }
    table
}
