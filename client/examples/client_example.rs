use minesweeper_client::{
    Action, AgentKind, BoardState, Cell, GameParams, MinesweeperClient, PlayAgentRequest,
    StepRequest,
};

fn print_board(state: &BoardState) {
    for row in &state.board {
        let line: String = row
            .iter()
            .map(|cell| match cell {
                Cell::Hidden => '.',
                Cell::Flagged => 'F',
                Cell::Mine => '*',
                Cell::Revealed { adjacent: 0 } => ' ',
                Cell::Revealed { adjacent } => char::from(b'0' + adjacent),
            })
            .collect();
        println!("{line}");
    }
    println!("Game over: {}, Won: {}", state.game_over, state.won);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let client = MinesweeperClient::new("http://localhost:8000")?;

    let game = client
        .new_game(&GameParams {
            width: 9,
            height: 9,
            mines: 10,
            seed: Some(42),
            mask: None,
        })
        .await?;
    println!("Created game with ID: {}", game.game_id);

    // Open the center by hand, then mark a corner
    let reveal = StepRequest {
        action: Action::Reveal,
        row: 4,
        col: 4,
    };
    let state = client.step(&game.game_id, &reveal).await?;
    print_board(&state);

    if !state.game_over {
        let flag = StepRequest {
            action: Action::Flag,
            row: 0,
            col: 0,
        };
        let state = client.step(&game.game_id, &flag).await?;
        print_board(&state);
        // Flag again to clear it before the agent takes over
        client.step(&game.game_id, &flag).await?;
    }

    let run = client
        .play_agent(
            Some(&game.game_id),
            &PlayAgentRequest {
                agent: AgentKind::BasicDeduction,
                ..Default::default()
            },
        )
        .await?;
    for (pass, frame) in run.frames.iter().enumerate() {
        println!("Pass {}: {} moves", pass + 1, frame.action.len());
    }
    print_board(&run.final_state);

    client.delete_game(&game.game_id).await?;
    println!("Deleted game {}", game.game_id);

    Ok(())
}
