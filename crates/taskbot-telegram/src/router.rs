use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn, Span};

use taskbot_core::{
    config::Config, export::CsvExporter, logging::component_span,
    messaging::port::MessagingPort, store::TaskStore,
};

use crate::dialog::DialogSessions;
use crate::handlers;
use crate::TelegramMessenger;

/// Everything the handlers need, injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<TaskStore>,
    pub exporter: Arc<CsvExporter>,
    pub messenger: Arc<dyn MessagingPort>,
    pub dialogs: Arc<DialogSessions>,
    pub span: Span,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<TaskStore>,
        exporter: Arc<CsvExporter>,
        messenger: Arc<dyn MessagingPort>,
        span: Span,
    ) -> Self {
        Self {
            cfg,
            store,
            exporter,
            messenger,
            dialogs: Arc::new(DialogSessions::default()),
            span,
        }
    }

    /// Longest text we send in one message.
    pub fn message_limit(&self) -> usize {
        self.cfg
            .telegram_message_limit
            .min(self.messenger.capabilities().max_message_len)
            .max(1)
    }
}

/// Run long polling until the dispatcher stops.
///
/// The store is expected to be connected with its schema in place.
pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<TaskStore>,
    exporter: Arc<CsvExporter>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "taskbot started"),
        Err(e) => warn!(error = %e, "could not fetch bot identity"),
    }
    info!(database = %store.path().display(), "using task database");

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState::new(
        cfg,
        store,
        exporter,
        messenger,
        component_span("commands"),
    ));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    info!("starting polling");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
