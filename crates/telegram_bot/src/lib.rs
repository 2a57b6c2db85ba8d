//! Telegram bot.
//!
//! The bot is a thin front end: it turns messages and button presses into
//! ledger calls and renders the results back into the chat. All budgeting
//! rules live in the engine.

use engine::Ledger;
use teloxide::prelude::*;

mod flow;
mod handlers;
mod parsing;
mod state;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    ledger: Ledger,
    sessions: state::SessionStore,
}

pub struct Bot {
    token: String,
    ledger: Ledger,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            ledger: self.ledger.clone(),
            sessions: state::SessionStore::default(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    ledger: Option<Ledger>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn ledger(mut self, ledger: Ledger) -> BotBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        let ledger = self.ledger.ok_or("a ledger is required")?;
        Ok(Bot {
            token: self.token,
            ledger,
        })
    }
}
