use anyhow::Result;
use board_core::NewItem;
use board_sync::SyncOutcome;

use crate::context::Context;
use crate::output::print_json;

pub fn add(ctx: &Context, title: &str, column: Option<String>, json: bool) -> Result<()> {
    let mut new = NewItem::new(title);
    new.column = column;
    let result = ctx.rt.block_on(ctx.board.create_item(new));
    ctx.flush_notifications();
    let item = result?;
    if json {
        print_json(&item)?;
    } else {
        println!("Added {} to {}: {}", item.id, item.column, item.title);
    }
    Ok(())
}

pub fn move_to(ctx: &Context, id: &str, to: &str, index: usize, json: bool) -> Result<()> {
    let result = ctx.rt.block_on(ctx.board.move_by_id(id, to, index));
    ctx.flush_notifications();
    report(ctx, id, result?, json, |item| {
        format!("Moved {id} to {} #{}", item.column, item.order_position)
    })
}

pub fn toggle(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let result = ctx.rt.block_on(ctx.board.toggle_item(id));
    ctx.flush_notifications();
    report(ctx, id, result?, json, |item| {
        if item.completed {
            format!("Completed {id}")
        } else {
            format!("Reopened {id} in {}", item.column)
        }
    })
}

pub fn remove(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let result = ctx.rt.block_on(ctx.board.delete_item(id));
    ctx.flush_notifications();
    let outcome = result?;
    if json {
        print_json(&serde_json::json!({ "id": id, "result": outcome }))?;
    } else {
        println!("Deleted {id}");
    }
    Ok(())
}

fn report(
    ctx: &Context,
    id: &str,
    outcome: SyncOutcome,
    json: bool,
    describe: impl FnOnce(&board_core::Item) -> String,
) -> Result<()> {
    let board = ctx.board.snapshot();
    let item = board.get(id);
    if json {
        return print_json(&serde_json::json!({ "result": outcome, "item": item }));
    }
    match (outcome, item) {
        (SyncOutcome::Unchanged, _) => println!("{id} is already there"),
        (_, Some(item)) => println!("{}", describe(item)),
        (_, None) => println!("{id} updated"),
    }
    Ok(())
}
