use engine::{BudgetStatus, Report, money};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// One button per row, like every picker in the bot.
pub(crate) fn keyboard(choices: &[(String, String)]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        choices
            .iter()
            .map(|(label, data)| vec![InlineKeyboardButton::callback(label.clone(), data.clone())]),
    )
}

/// Category list with what is left of each limit this month.
pub(crate) fn render_overview(report: &Report) -> String {
    let mut text = String::from("📋 Categories and remaining limits:\n\n");
    for row in &report.categories {
        let remaining = row.remaining();
        if remaining >= 0.0 {
            text.push_str(&format!(
                "✅ {}: {} left of {}\n",
                row.name,
                money::format(remaining),
                money::format(row.limit)
            ));
        } else {
            text.push_str(&format!(
                "❌ {}: over by {} (limit {})\n",
                row.name,
                money::format(remaining.abs()),
                money::format(row.limit)
            ));
        }
    }
    text
}

/// Full monthly report: one block per category, then the totals.
pub(crate) fn render_report(report: &Report) -> String {
    let mut text = format!("📊 Report for {}/{}:\n\n", report.month, report.year);

    for row in &report.categories {
        text.push_str(&format!(
            "{} {}:\n   Limit: {}\n   Spent: {} ({:.1}%)\n\n",
            status_mark(row.status()),
            row.name,
            money::format(row.limit),
            money::format(row.spent),
            row.percent_used()
        ));
    }

    text.push_str(&format!(
        "TOTAL {}:\nTotal limit: {}\nTotal spent: {} ({:.1}%)\n",
        status_mark(report.status()),
        money::format(report.total_limit()),
        money::format(report.total_spent()),
        report.percent_used(),
    ));

    let remaining = report.remaining_funds();
    if remaining >= 0.0 {
        text.push_str(&format!(
            "Remaining funds: {} ({:.1}%)",
            money::format(remaining),
            report.remaining_percent()
        ));
    } else {
        text.push_str(&format!("Overspent by: {}", money::format(remaining.abs())));
    }

    text
}

fn status_mark(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Under => "✅",
        BudgetStatus::Over => "❌",
        BudgetStatus::NoLimit => "⚠️",
    }
}

#[cfg(test)]
mod tests {
    use engine::CategoryReport;
    use uuid::Uuid;

    use super::*;

    fn report() -> Report {
        Report {
            month: 5,
            year: 2024,
            categories: vec![
                CategoryReport {
                    category_id: Uuid::new_v4(),
                    name: "Food".to_string(),
                    limit: 100.0,
                    spent: 130.0,
                },
                CategoryReport {
                    category_id: Uuid::new_v4(),
                    name: "Misc".to_string(),
                    limit: 0.0,
                    spent: 20.0,
                },
            ],
        }
    }

    #[test]
    fn report_marks_each_category_and_the_totals() {
        let text = render_report(&report());
        assert!(text.contains("📊 Report for 5/2024"));
        assert!(text.contains("❌ Food"));
        assert!(text.contains("Spent: 130,00 (130.0%)"));
        assert!(text.contains("⚠️ Misc"));
        assert!(text.contains("TOTAL ❌"));
        assert!(text.contains("Total spent: 150,00 (150.0%)"));
        assert!(text.contains("Overspent by: 50,00"));
    }

    #[test]
    fn report_shows_remaining_funds_when_under() {
        let mut report = report();
        report.categories[0].spent = 50.0;
        report.categories.pop();
        let text = render_report(&report);
        assert!(text.contains("Remaining funds: 50,00 (50.0%)"));
    }

    #[test]
    fn overview_shows_overspend_as_negative() {
        let text = render_overview(&report());
        assert!(text.contains("❌ Food: over by 30,00 (limit 100,00)"));
        assert!(text.contains("❌ Misc: over by 20,00 (limit 0,00)"));
    }
}
