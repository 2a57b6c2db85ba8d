use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    Categories,
    Limits,
    Expense,
    Report,
    Cancel,
}

/// Recognizes a slash command. Everything after the first word (including a
/// `@botname` suffix on the command itself) is ignored.
pub(crate) fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let word = trimmed.split_whitespace().next().unwrap_or("");
    let word = word.split('@').next().unwrap_or(word);

    match word {
        "/start" => Some(Command::Start),
        "/categories" => Some(Command::Categories),
        "/limits" => Some(Command::Limits),
        "/expense" => Some(Command::Expense),
        "/report" => Some(Command::Report),
        "/cancel" => Some(Command::Cancel),
        _ => None,
    }
}

/// A decoded callback button press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    CategoryList,
    CategoryAdd,
    CategoryEdit,
    CategoryDelete,
    LimitSet,
    Select(Uuid),
    DeleteYes(Uuid),
    DeleteNo,
}

/// Decodes callback data in the `scope:verb[:id]` form the keyboards emit.
/// Unknown or malformed data yields `None` and the press is dropped.
pub(crate) fn parse_action(data: &str) -> Option<Action> {
    match data {
        "cat:list" => return Some(Action::CategoryList),
        "cat:add" => return Some(Action::CategoryAdd),
        "cat:edit" => return Some(Action::CategoryEdit),
        "cat:delete" => return Some(Action::CategoryDelete),
        "limit:set" => return Some(Action::LimitSet),
        "del:no" => return Some(Action::DeleteNo),
        _ => {}
    }

    if let Some(id) = data.strip_prefix("sel:") {
        return Uuid::parse_str(id).ok().map(Action::Select);
    }
    if let Some(id) = data.strip_prefix("del:yes:") {
        return Uuid::parse_str(id).ok().map(Action::DeleteYes);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognized() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/report"), Some(Command::Report));
        assert_eq!(parse_command("  /cancel  "), Some(Command::Cancel));
    }

    #[test]
    fn command_with_bot_suffix_and_arguments() {
        assert_eq!(
            parse_command("/categories@spendwatch_bot now"),
            Some(Command::Categories)
        );
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("12,50"), None);
        assert_eq!(parse_command("/unknown"), None);
    }

    #[test]
    fn menu_actions_decode() {
        assert_eq!(parse_action("cat:add"), Some(Action::CategoryAdd));
        assert_eq!(parse_action("limit:set"), Some(Action::LimitSet));
        assert_eq!(parse_action("del:no"), Some(Action::DeleteNo));
    }

    #[test]
    fn selection_carries_the_category_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_action(&format!("sel:{id}")), Some(Action::Select(id)));
        assert_eq!(
            parse_action(&format!("del:yes:{id}")),
            Some(Action::DeleteYes(id))
        );
    }

    #[test]
    fn malformed_data_is_dropped() {
        assert_eq!(parse_action("sel:not-a-uuid"), None);
        assert_eq!(parse_action("del:yes:"), None);
        assert_eq!(parse_action("something else"), None);
    }
}
