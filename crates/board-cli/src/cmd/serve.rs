use anyhow::Result;

use crate::context::Context;

pub fn run(ctx: Context, port: u16, open: bool) -> Result<()> {
    let Context { board, rt, .. } = ctx;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual = listener.local_addr()?.port();
        eprintln!("Serving {} on http://localhost:{actual}", board.config().board.name);
        board_server::serve_on(board, listener, open).await
    })
}
