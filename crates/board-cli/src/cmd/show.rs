use anyhow::Result;
use board_core::BoardState;
use board_sync::BoardController;
use serde::Serialize;

use crate::context::Context;
use crate::output::{print_json, print_table};

#[derive(Serialize)]
struct ColumnOut<'a> {
    id: &'a str,
    title: &'a str,
    items: &'a [board_core::Item],
}

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    print_board(&ctx.board, &ctx.board.snapshot(), json)
}

pub fn print_board(ctl: &BoardController, board: &BoardState, json: bool) -> Result<()> {
    let layout = ctl.layout();
    if json {
        let columns: Vec<ColumnOut<'_>> = layout
            .columns
            .iter()
            .map(|c| ColumnOut {
                id: &c.id,
                title: &c.title,
                items: board.items(&c.id).unwrap_or_default(),
            })
            .collect();
        return print_json(&serde_json::json!({
            "name": ctl.config().board.name,
            "revision": board.revision(),
            "columns": columns,
        }));
    }

    println!("{}", ctl.config().board.name);
    for column in &layout.columns {
        let items = board.items(&column.id).unwrap_or_default();
        println!();
        println!("{} ({})", column.title, items.len());
        if items.is_empty() {
            println!("  (empty)");
            continue;
        }
        let rows = items
            .iter()
            .map(|i| {
                vec![
                    i.order_position.to_string(),
                    i.id.clone(),
                    if i.completed { "x" } else { " " }.to_string(),
                    i.title.clone(),
                ]
            })
            .collect();
        print_table(2, &["#", "ID", "✓", "TITLE"], rows);
    }
    Ok(())
}
