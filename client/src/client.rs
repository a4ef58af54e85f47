use minesweeper_common::{
    models::GameParams,
    protocol::{
        BoardState, ErrorResponse, NewGameResponse, PlayAgentRequest, PlayAgentResponse,
        StepRequest,
    },
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Result;

/// HTTP client for minesweeper server API
pub struct MinesweeperClient {
    client: Client,
    base_url: Url,
}

impl MinesweeperClient {
    /// Create a new client connecting to the specified server URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::new();

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str, game_id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        if let Some(id) = game_id {
            url.query_pairs_mut().append_pair("id", id);
        }
        Ok(url)
    }

    /// Start a new game. The response carries the game ID used by every other call.
    pub async fn new_game(&self, params: &GameParams) -> Result<NewGameResponse> {
        let url = self.endpoint("/new_game", None)?;
        let response = self.client.post(url).json(params).send().await?;
        let game: NewGameResponse = parse(response, "create game").await?;

        debug!("Created game {}", game.game_id);
        Ok(game)
    }

    /// Apply a single reveal or flag action and return the resulting board
    pub async fn step(&self, game_id: &str, request: &StepRequest) -> Result<BoardState> {
        let url = self.endpoint("/step", Some(game_id))?;
        let response = self.client.post(url).json(request).send().await?;

        parse(response, "apply step").await
    }

    /// Fetch the current board without changing it
    pub async fn state(&self, game_id: &str) -> Result<BoardState> {
        let url = self.endpoint("/state", Some(game_id))?;
        let response = self.client.get(url).send().await?;

        parse(response, "fetch state").await
    }

    /// Let a solver agent play. Without a game ID the server starts a fresh game.
    pub async fn play_agent(
        &self,
        game_id: Option<&str>,
        request: &PlayAgentRequest,
    ) -> Result<PlayAgentResponse> {
        let url = self.endpoint("/play_agent", game_id)?;
        let response = self.client.post(url).json(request).send().await?;
        let run: PlayAgentResponse = parse(response, "play agent").await?;

        debug!("Agent finished game {} in {} passes", run.game_id, run.frames.len());
        Ok(run)
    }

    /// Drop a game from the server
    pub async fn delete_game(&self, game_id: &str) -> Result<()> {
        let url = self.endpoint("/game", Some(game_id))?;
        let response = self.client.delete(url).send().await?;

        if !response.status().is_success() {
            return Err(failure(response, "delete game").await.into());
        }
        Ok(())
    }
}

async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    if !response.status().is_success() {
        return Err(failure(response, what).await.into());
    }
    Ok(response.json().await?)
}

async fn failure(response: Response, what: &str) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => format!("Failed to {what}: {status}: {}", body.error),
        Err(_) => format!("Failed to {what}: {status}"),
    }
}
