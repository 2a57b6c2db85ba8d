use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, MessageId},
};

use crate::{
    ConfigParameters, flow,
    parsing::{Action, Command, parse_action, parse_command},
    state::Session,
    ui,
};

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = from.id.0;
    let chat_id = msg.chat.id;
    let owner = user_id.to_string();

    // One update at a time per (user, chat); a second message waits here
    // until the previous one has been fully applied.
    let mut session = cfg.sessions.lock(user_id, chat_id).await;

    if let Some(cmd) = parse_command(text) {
        // Flow entry points and /cancel replace whatever dialogue was
        // running; informational commands leave it in place.
        let state = session.state.clone();
        let step = match cmd {
            Command::Start => Ok(flow::welcome(state)),
            Command::Categories => Ok(flow::categories_menu(state)),
            Command::Limits => Ok(flow::limits_menu(state)),
            Command::Expense => flow::begin_expense(&cfg.ledger, &owner).await,
            Command::Report => flow::report(&cfg.ledger, &owner, state).await,
            Command::Cancel => Ok(flow::cancel()),
        };
        return apply_step(&bot, chat_id, &mut session, step, None).await;
    }

    let Some(state) = session.state.clone() else {
        return Ok(());
    };
    let step = flow::on_text(&cfg.ledger, &owner, state, text).await;
    apply_step(&bot, chat_id, &mut session, step, None).await
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();
    let user_id = q.from.id.0;
    let owner = user_id.to_string();

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(action) = q.data.as_deref().and_then(parse_action) else {
        return Ok(());
    };

    let mut session = cfg.sessions.lock(user_id, chat_id).await;

    let step = match action {
        Action::CategoryList => flow::category_overview(&cfg.ledger, &owner).await,
        Action::CategoryAdd => Ok(flow::begin_add_category()),
        Action::CategoryEdit => flow::begin_edit(&cfg.ledger, &owner).await,
        Action::CategoryDelete => flow::begin_delete(&cfg.ledger, &owner).await,
        Action::LimitSet => flow::begin_limit(&cfg.ledger, &owner).await,
        Action::Select(_) | Action::DeleteYes(_) | Action::DeleteNo => {
            flow::on_select(&cfg.ledger, &owner, session.state.clone(), action).await
        }
    };

    apply_step(&bot, chat_id, &mut session, step, Some(message_id)).await
}

/// Commits the step: stores the next state and delivers the reply. Button
/// presses edit the keyboard message in place; free text gets a fresh
/// message. A storage failure leaves the dialogue state untouched.
async fn apply_step(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut Session,
    step: Result<flow::Step, engine::LedgerError>,
    edit: Option<MessageId>,
) -> ResponseResult<()> {
    let step = match step {
        Ok(step) => step,
        Err(err) => {
            tracing::error!("ledger failure: {err}");
            bot.send_message(chat_id, "Something went wrong on our side. Try again later.")
                .await?;
            return Ok(());
        }
    };

    session.state = step.next;

    let Some(reply) = step.reply else {
        return Ok(());
    };

    if let Some(message_id) = edit {
        let edited = match &reply.choices {
            Some(choices) => {
                bot.edit_message_text(chat_id, message_id, reply.text.clone())
                    .reply_markup(ui::keyboard(choices))
                    .await
            }
            None => {
                bot.edit_message_text(chat_id, message_id, reply.text.clone())
                    .await
            }
        };
        if edited.is_ok() {
            return Ok(());
        }
    }

    match reply.choices {
        Some(choices) => {
            bot.send_message(chat_id, reply.text)
                .reply_markup(ui::keyboard(&choices))
                .await?;
        }
        None => {
            bot.send_message(chat_id, reply.text).await?;
        }
    }
    Ok(())
}
