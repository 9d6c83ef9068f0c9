use anyhow::Result;
use chrono::Local;

use crate::context::Context;
use crate::output::{print_json, print_table};

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let stats = ctx.board.stats(Local::now().date_naive());
    if json {
        return print_json(&stats);
    }
    println!(
        "{} of {} complete ({}%), streak {} day{}",
        stats.completed,
        stats.total,
        stats.completion_percent,
        stats.streak_days,
        if stats.streak_days == 1 { "" } else { "s" }
    );
    println!();
    let rows = stats
        .columns
        .iter()
        .map(|c| vec![c.id.clone(), c.title.clone(), c.count.to_string()])
        .collect();
    print_table(0, &["COLUMN", "TITLE", "ITEMS"], rows);
    Ok(())
}
