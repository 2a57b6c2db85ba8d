//! Dialogue transitions.
//!
//! Every function here maps (current state, user input) to a [`Step`]: the
//! next state plus what to say. Handlers only shuttle Telegram updates in and
//! replies out, so the whole conversation logic is testable without a bot.

use chrono::{Datelike, Local};
use engine::{Ledger, LedgerError, money};

use crate::{parsing::Action, state::FlowState, ui};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reply {
    pub text: String,
    /// Inline keyboard rows as (label, callback data).
    pub choices: Option<Vec<(String, String)>>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Reply {
        Reply {
            text: text.into(),
            choices: None,
        }
    }

    fn with_choices(text: impl Into<String>, choices: Vec<(String, String)>) -> Reply {
        Reply {
            text: text.into(),
            choices: Some(choices),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Step {
    pub next: Option<FlowState>,
    pub reply: Option<Reply>,
}

impl Step {
    fn idle(reply: Reply) -> Step {
        Step {
            next: None,
            reply: Some(reply),
        }
    }

    fn at(state: FlowState, reply: Reply) -> Step {
        Step {
            next: Some(state),
            reply: Some(reply),
        }
    }

    fn silent(state: FlowState) -> Step {
        Step {
            next: Some(state),
            reply: None,
        }
    }

    fn keeping(state: Option<FlowState>, reply: Reply) -> Step {
        Step {
            next: state,
            reply: Some(reply),
        }
    }
}

/// Informational command. Leaves any running dialogue where it was.
pub(crate) fn welcome(state: Option<FlowState>) -> Step {
    Step::keeping(
        state,
        Reply::text(
            "Hi! I track spending against monthly limits.\n\n\
             Commands:\n\
             /categories - manage expense categories\n\
             /limits - manage monthly limits\n\
             /expense - record an expense\n\
             /report - spend report for this month\n\
             /cancel - abort the current action",
        ),
    )
}

/// Informational command. Leaves any running dialogue where it was.
pub(crate) fn categories_menu(state: Option<FlowState>) -> Step {
    Step::keeping(
        state,
        Reply::with_choices(
            "Pick an action:",
            vec![
                ("Category list".to_string(), "cat:list".to_string()),
                ("Add category".to_string(), "cat:add".to_string()),
                ("Edit category".to_string(), "cat:edit".to_string()),
                ("Delete category".to_string(), "cat:delete".to_string()),
            ],
        ),
    )
}

/// Informational command. Leaves any running dialogue where it was.
pub(crate) fn limits_menu(state: Option<FlowState>) -> Step {
    Step::keeping(
        state,
        Reply::with_choices(
            "Monthly limits:",
            vec![
                ("Set a limit".to_string(), "limit:set".to_string()),
                ("Change a limit".to_string(), "limit:set".to_string()),
            ],
        ),
    )
}

pub(crate) fn cancel() -> Step {
    Step::idle(Reply::text("Action cancelled."))
}

pub(crate) fn begin_add_category() -> Step {
    Step::at(
        FlowState::AwaitCategoryName,
        Reply::text("Enter a name for the new category:"),
    )
}

pub(crate) async fn category_overview(ledger: &Ledger, owner: &str) -> Result<Step, LedgerError> {
    let (month, year) = current_period();
    let report = ledger.build_report(owner, month, year).await?;
    if report.categories.is_empty() {
        return Ok(Step::idle(Reply::text(
            "You have no categories yet. Create one with \"Add category\".",
        )));
    }
    Ok(Step::idle(Reply::text(ui::render_overview(&report))))
}

pub(crate) async fn begin_edit(ledger: &Ledger, owner: &str) -> Result<Step, LedgerError> {
    let Some(choices) = category_choices(ledger, owner).await? else {
        return Ok(Step::idle(Reply::text(
            "You have no categories to edit yet.",
        )));
    };
    Ok(Step::at(
        FlowState::AwaitCategoryEditSelect,
        Reply::with_choices("Pick a category to edit:", choices),
    ))
}

pub(crate) async fn begin_delete(ledger: &Ledger, owner: &str) -> Result<Step, LedgerError> {
    let Some(choices) = category_choices(ledger, owner).await? else {
        return Ok(Step::idle(Reply::text(
            "You have no categories to delete yet.",
        )));
    };
    Ok(Step::at(
        FlowState::AwaitCategoryDeleteSelect,
        Reply::with_choices("Pick a category to delete:", choices),
    ))
}

pub(crate) async fn begin_limit(ledger: &Ledger, owner: &str) -> Result<Step, LedgerError> {
    let Some(choices) = category_choices(ledger, owner).await? else {
        return Ok(Step::idle(Reply::text(
            "You have no categories yet. Create one first.",
        )));
    };
    Ok(Step::at(
        FlowState::AwaitLimitSelect,
        Reply::with_choices("Pick a category to set a limit for:", choices),
    ))
}

pub(crate) async fn begin_expense(ledger: &Ledger, owner: &str) -> Result<Step, LedgerError> {
    let Some(choices) = category_choices(ledger, owner).await? else {
        return Ok(Step::idle(Reply::text(
            "You have no categories yet. Create one first with /categories.",
        )));
    };
    Ok(Step::at(
        FlowState::AwaitExpenseSelect,
        Reply::with_choices("Pick an expense category:", choices),
    ))
}

/// Informational command. Leaves any running dialogue where it was.
pub(crate) async fn report(
    ledger: &Ledger,
    owner: &str,
    state: Option<FlowState>,
) -> Result<Step, LedgerError> {
    let (month, year) = current_period();
    let report = ledger.build_report(owner, month, year).await?;
    if report.categories.is_empty() {
        return Ok(Step::keeping(
            state,
            Reply::text("You have no categories to report on yet."),
        ));
    }
    Ok(Step::keeping(state, Reply::text(ui::render_report(&report))))
}

/// Handles a button press that only makes sense inside a dialogue.
///
/// A press that does not match the current state (stale keyboard, replayed
/// callback) drops the dialogue instead of acting on outdated data.
pub(crate) async fn on_select(
    ledger: &Ledger,
    owner: &str,
    state: Option<FlowState>,
    action: Action,
) -> Result<Step, LedgerError> {
    match (state, action) {
        (Some(FlowState::AwaitCategoryEditSelect), Action::Select(id)) => {
            let category = match ledger.category(owner, id).await {
                Ok(c) => c,
                Err(err) => return domain_error(err),
            };
            Ok(Step::at(
                FlowState::AwaitCategoryEditName { category_id: id },
                Reply::text(format!(
                    "Current name: {}\nEnter the new category name:",
                    category.name
                )),
            ))
        }
        (Some(FlowState::AwaitCategoryDeleteSelect), Action::Select(id)) => {
            let category = match ledger.category(owner, id).await {
                Ok(c) => c,
                Err(err) => return domain_error(err),
            };
            Ok(Step::at(
                FlowState::AwaitCategoryDeleteConfirm {
                    category_id: id,
                    name: category.name.clone(),
                },
                Reply::with_choices(
                    format!(
                        "Delete category \"{}\"?\n\
                         All its expenses and limits will be deleted too.",
                        category.name
                    ),
                    vec![
                        ("Yes, delete".to_string(), format!("del:yes:{id}")),
                        ("No, keep it".to_string(), "del:no".to_string()),
                    ],
                ),
            ))
        }
        (
            Some(FlowState::AwaitCategoryDeleteConfirm { category_id, name }),
            Action::DeleteYes(id),
        ) => {
            if id != category_id {
                return Ok(stale());
            }
            if let Err(err) = ledger.delete_category(owner, category_id).await {
                return domain_error(err);
            }
            Ok(Step::idle(Reply::text(format!(
                "Category \"{name}\" and everything recorded under it are deleted."
            ))))
        }
        (Some(FlowState::AwaitCategoryDeleteConfirm { .. }), Action::DeleteNo) => {
            Ok(Step::idle(Reply::text("Deletion cancelled.")))
        }
        (Some(FlowState::AwaitLimitSelect), Action::Select(id)) => {
            let (month, year) = current_period();
            let category = match ledger.category(owner, id).await {
                Ok(c) => c,
                Err(err) => return domain_error(err),
            };
            let current = match ledger.limit_amount(owner, id, month, year).await {
                Ok(v) => v,
                Err(err) => return domain_error(err),
            };
            Ok(Step::at(
                FlowState::AwaitLimitAmount {
                    category_id: id,
                    name: category.name.clone(),
                },
                Reply::text(format!(
                    "Category: {}\n\
                     Current limit for {month}/{year}: {}\n\n\
                     Enter the new monthly limit:",
                    category.name,
                    money::format(current)
                )),
            ))
        }
        (Some(FlowState::AwaitExpenseSelect), Action::Select(id)) => {
            let category = match ledger.category(owner, id).await {
                Ok(c) => c,
                Err(err) => return domain_error(err),
            };
            Ok(Step::at(
                FlowState::AwaitExpenseAmount {
                    category_id: id,
                    name: category.name.clone(),
                },
                Reply::text(format!(
                    "Category: {}\nEnter the amount spent:",
                    category.name
                )),
            ))
        }
        _ => Ok(stale()),
    }
}

/// Handles free text while a dialogue is waiting for it.
///
/// Invalid input reprompts in the same state; a conflict or a vanished
/// category ends the dialogue. Text arriving while a keyboard is shown is
/// ignored, the keyboard stays active.
pub(crate) async fn on_text(
    ledger: &Ledger,
    owner: &str,
    state: FlowState,
    text: &str,
) -> Result<Step, LedgerError> {
    match state {
        FlowState::AwaitCategoryName => match ledger.create_category(owner, text).await {
            Ok(category) => Ok(Step::idle(Reply::text(format!(
                "Category \"{}\" added!",
                category.name
            )))),
            Err(LedgerError::Validation(_)) => Ok(Step::at(
                FlowState::AwaitCategoryName,
                Reply::text("The category name cannot be empty. Try again:"),
            )),
            Err(LedgerError::Conflict(name)) => Ok(Step::idle(Reply::text(format!(
                "A category named \"{name}\" already exists."
            )))),
            Err(err) => domain_error(err),
        },
        FlowState::AwaitCategoryEditName { category_id } => {
            match ledger.rename_category(owner, category_id, text).await {
                Ok(category) => Ok(Step::idle(Reply::text(format!(
                    "Category renamed to \"{}\"!",
                    category.name
                )))),
                Err(LedgerError::Validation(_)) => Ok(Step::at(
                    FlowState::AwaitCategoryEditName { category_id },
                    Reply::text("The category name cannot be empty. Try again:"),
                )),
                Err(LedgerError::Conflict(name)) => Ok(Step::idle(Reply::text(format!(
                    "A category named \"{name}\" already exists."
                )))),
                Err(err) => domain_error(err),
            }
        }
        FlowState::AwaitLimitAmount { category_id, name } => {
            let (month, year) = current_period();
            let amount = match money::parse(text) {
                Ok(v) => v,
                Err(_) => {
                    return Ok(Step::at(
                        FlowState::AwaitLimitAmount { category_id, name },
                        Reply::text("Please enter a valid number."),
                    ));
                }
            };
            match ledger
                .upsert_limit(owner, category_id, month, year, amount)
                .await
            {
                Ok(()) => Ok(Step::idle(Reply::text(format!(
                    "Limit for \"{name}\" for {month}/{year} set to {}.",
                    money::format(amount)
                )))),
                Err(LedgerError::Validation(_)) => Ok(Step::at(
                    FlowState::AwaitLimitAmount { category_id, name },
                    Reply::text("The limit cannot be negative. Enter a non-negative number:"),
                )),
                Err(err) => domain_error(err),
            }
        }
        FlowState::AwaitExpenseAmount { category_id, name } => {
            let (month, year) = current_period();
            let amount = match money::parse(text) {
                Ok(v) => v,
                Err(_) => {
                    return Ok(Step::at(
                        FlowState::AwaitExpenseAmount { category_id, name },
                        Reply::text("Please enter a valid number."),
                    ));
                }
            };
            let today = Local::now().date_naive();
            match ledger.record_expense(owner, category_id, amount, today).await {
                Ok(_) => {}
                Err(LedgerError::Validation(_)) => {
                    return Ok(Step::at(
                        FlowState::AwaitExpenseAmount { category_id, name },
                        Reply::text("The amount must be a positive number. Try again:"),
                    ));
                }
                Err(err) => return domain_error(err),
            }

            let limit = match ledger.limit_amount(owner, category_id, month, year).await {
                Ok(v) => v,
                Err(err) => return domain_error(err),
            };
            let spent = match ledger.sum_expenses(owner, category_id, month, year).await {
                Ok(v) => v,
                Err(err) => return domain_error(err),
            };

            let remaining = limit - spent;
            let text = if remaining >= 0.0 {
                format!(
                    "✅ Expense recorded under \"{name}\"\n\
                     Spent: {}\n\
                     Left before the limit: {}",
                    money::format(amount),
                    money::format(remaining)
                )
            } else {
                format!(
                    "❌ Expense recorded under \"{name}\"\n\
                     Spent: {}\n\
                     Watch out! Over the limit by: {}",
                    money::format(amount),
                    money::format(remaining.abs())
                )
            };
            Ok(Step::idle(Reply::text(text)))
        }
        // A keyboard is on screen; free text is not an answer to it.
        state @ (FlowState::AwaitCategoryEditSelect
        | FlowState::AwaitCategoryDeleteSelect
        | FlowState::AwaitCategoryDeleteConfirm { .. }
        | FlowState::AwaitLimitSelect
        | FlowState::AwaitExpenseSelect) => Ok(Step::silent(state)),
    }
}

fn stale() -> Step {
    Step::idle(Reply::text("That button is no longer active."))
}

/// Conflict and not-found end the dialogue; database failures bubble up to
/// the handler.
fn domain_error(err: LedgerError) -> Result<Step, LedgerError> {
    match err {
        LedgerError::Database(_) => Err(err),
        LedgerError::NotFound(_) => Ok(Step::idle(Reply::text(
            "That category does not exist anymore.",
        ))),
        other => Ok(Step::idle(Reply::text(other.to_string()))),
    }
}

async fn category_choices(
    ledger: &Ledger,
    owner: &str,
) -> Result<Option<Vec<(String, String)>>, LedgerError> {
    let categories = ledger.list_categories(owner).await?;
    if categories.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        categories
            .into_iter()
            .map(|c| (c.name, format!("sel:{}", c.id)))
            .collect(),
    ))
}

fn current_period() -> (u32, i32) {
    let today = Local::now().date_naive();
    (today.month(), today.year())
}

#[cfg(test)]
mod tests {
    use migration::MigratorTrait;
    use sea_orm::Database;
    use uuid::Uuid;

    use super::*;

    async fn ledger() -> Ledger {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        Ledger::builder().database(db).build()
    }

    #[tokio::test]
    async fn empty_category_name_reprompts() {
        let ledger = ledger().await;
        let step = on_text(&ledger, "1", FlowState::AwaitCategoryName, "   ")
            .await
            .unwrap();
        assert_eq!(step.next, Some(FlowState::AwaitCategoryName));
    }

    #[tokio::test]
    async fn duplicate_category_name_ends_the_dialogue() {
        let ledger = ledger().await;
        ledger.create_category("1", "Food").await.unwrap();

        let step = on_text(&ledger, "1", FlowState::AwaitCategoryName, "Food")
            .await
            .unwrap();
        assert_eq!(step.next, None);
        assert!(step.reply.unwrap().text.contains("already exists"));
    }

    #[tokio::test]
    async fn successful_add_confirms_and_goes_idle() {
        let ledger = ledger().await;
        let step = on_text(&ledger, "1", FlowState::AwaitCategoryName, "Food")
            .await
            .unwrap();
        assert_eq!(step.next, None);
        assert!(step.reply.unwrap().text.contains("\"Food\" added"));
    }

    #[tokio::test]
    async fn selection_without_a_dialogue_is_stale() {
        let ledger = ledger().await;
        let step = on_select(&ledger, "1", None, Action::Select(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(step.next, None);
        assert!(step.reply.unwrap().text.contains("no longer active"));
    }

    #[tokio::test]
    async fn delete_confirm_for_a_different_id_is_stale() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();

        let step = on_select(
            &ledger,
            "1",
            Some(FlowState::AwaitCategoryDeleteConfirm {
                category_id: cat.id,
                name: "Food".to_string(),
            }),
            Action::DeleteYes(Uuid::new_v4()),
        )
        .await
        .unwrap();
        assert_eq!(step.next, None);
        assert!(step.reply.unwrap().text.contains("no longer active"));
        assert_eq!(ledger.list_categories("1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn selecting_a_deleted_category_ends_the_dialogue() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();
        ledger.delete_category("1", cat.id).await.unwrap();

        let step = on_select(
            &ledger,
            "1",
            Some(FlowState::AwaitCategoryEditSelect),
            Action::Select(cat.id),
        )
        .await
        .unwrap();
        assert_eq!(step.next, None);
    }

    #[tokio::test]
    async fn limit_select_shows_the_current_value() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();
        let (month, year) = current_period();
        ledger
            .upsert_limit("1", cat.id, month, year, 250.0)
            .await
            .unwrap();

        let step = on_select(
            &ledger,
            "1",
            Some(FlowState::AwaitLimitSelect),
            Action::Select(cat.id),
        )
        .await
        .unwrap();
        assert!(matches!(
            step.next,
            Some(FlowState::AwaitLimitAmount { .. })
        ));
        assert!(step.reply.unwrap().text.contains("250,00"));
    }

    #[tokio::test]
    async fn garbage_limit_input_reprompts() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();

        let state = FlowState::AwaitLimitAmount {
            category_id: cat.id,
            name: "Food".to_string(),
        };
        let step = on_text(&ledger, "1", state.clone(), "abc").await.unwrap();
        assert_eq!(step.next, Some(state));
    }

    #[tokio::test]
    async fn valid_limit_input_persists_and_goes_idle() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();

        let step = on_text(
            &ledger,
            "1",
            FlowState::AwaitLimitAmount {
                category_id: cat.id,
                name: "Food".to_string(),
            },
            "150",
        )
        .await
        .unwrap();
        assert_eq!(step.next, None);
        assert!(step.reply.unwrap().text.contains("150,00"));

        let (month, year) = current_period();
        let stored = ledger.limit_amount("1", cat.id, month, year).await.unwrap();
        assert!((stored - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn menus_leave_a_running_dialogue_in_place() {
        let state = Some(FlowState::AwaitCategoryName);
        assert_eq!(welcome(state.clone()).next, state);
        assert_eq!(categories_menu(state.clone()).next, state);
        assert_eq!(limits_menu(state.clone()).next, state);
    }

    #[tokio::test]
    async fn report_mid_dialogue_keeps_the_dialogue_running() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();
        let state = FlowState::AwaitExpenseAmount {
            category_id: cat.id,
            name: "Food".to_string(),
        };

        let step = report(&ledger, "1", Some(state.clone())).await.unwrap();
        assert_eq!(step.next, Some(state.clone()));

        // The pending amount still lands after the detour.
        let step = on_text(&ledger, "1", state, "30").await.unwrap();
        assert_eq!(step.next, None);
        let (month, year) = current_period();
        let spent = ledger.sum_expenses("1", cat.id, month, year).await.unwrap();
        assert!((spent - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn expense_under_the_limit_confirms_with_remaining() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();
        let (month, year) = current_period();
        ledger
            .upsert_limit("1", cat.id, month, year, 100.0)
            .await
            .unwrap();

        let step = on_text(
            &ledger,
            "1",
            FlowState::AwaitExpenseAmount {
                category_id: cat.id,
                name: "Food".to_string(),
            },
            "30",
        )
        .await
        .unwrap();
        assert_eq!(step.next, None);
        let text = step.reply.unwrap().text;
        assert!(text.starts_with('✅'));
        assert!(text.contains("70,00"));
    }

    #[tokio::test]
    async fn expense_over_the_limit_warns_with_the_overshoot() {
        let ledger = ledger().await;
        let cat = ledger.create_category("1", "Food").await.unwrap();
        let (month, year) = current_period();
        ledger
            .upsert_limit("1", cat.id, month, year, 100.0)
            .await
            .unwrap();

        let step = on_text(
            &ledger,
            "1",
            FlowState::AwaitExpenseAmount {
                category_id: cat.id,
                name: "Food".to_string(),
            },
            "130",
        )
        .await
        .unwrap();
        let text = step.reply.unwrap().text;
        assert!(text.starts_with('❌'));
        assert!(text.contains("30,00"));
    }

    #[test]
    fn cancel_goes_idle_with_a_confirmation() {
        let step = cancel();
        assert_eq!(step.next, None);
        assert_eq!(step.reply.unwrap().text, "Action cancelled.");
    }

    #[tokio::test]
    async fn free_text_while_a_keyboard_is_shown_is_ignored() {
        let ledger = ledger().await;
        let step = on_text(&ledger, "1", FlowState::AwaitExpenseSelect, "hello")
            .await
            .unwrap();
        assert_eq!(step.next, Some(FlowState::AwaitExpenseSelect));
        assert_eq!(step.reply, None);
    }
}
