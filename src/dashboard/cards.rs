//! Summary cards for the dashboard's headline numbers.

use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{dashboard::aggregation::MonthlySummary, html::currency_rounded_with_tooltip};

const CARD_STYLE: &str = "flex flex-col gap-1 p-4 rounded-lg shadow \
    bg-white dark:bg-gray-800";

const CARD_LABEL_STYLE: &str = "text-sm text-gray-500 dark:text-gray-400";

const CARD_VALUE_STYLE: &str = "text-2xl font-bold whitespace-nowrap";

const CARD_VALUE_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const CARD_VALUE_RED_STYLE: &str = "text-red-600 dark:text-red-400";

fn amount_color_class(amount: Decimal) -> &'static str {
    if amount >= Decimal::ZERO {
        CARD_VALUE_GREEN_STYLE
    } else {
        CARD_VALUE_RED_STYLE
    }
}

fn card(label: &str, value: Markup, color_class: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            span class=(CARD_LABEL_STYLE) { (label) }

            span class={(CARD_VALUE_STYLE) " " (color_class)}
            {
                (value)
            }
        }
    }
}

/// Renders the five summary cards for the current month.
pub(super) fn summary_cards(summary: &MonthlySummary) -> Markup {
    html! {
        section
            id="summary-cards"
            class="grid grid-cols-2 md:grid-cols-3 xl:grid-cols-5 gap-4 w-full mb-4"
        {
            (card(
                "Income",
                currency_rounded_with_tooltip(summary.income),
                CARD_VALUE_GREEN_STYLE,
            ))

            (card(
                "Expenses",
                currency_rounded_with_tooltip(summary.expense),
                CARD_VALUE_RED_STYLE,
            ))

            (card(
                "Net",
                currency_rounded_with_tooltip(summary.net),
                amount_color_class(summary.net),
            ))

            (card(
                "Live Total",
                currency_rounded_with_tooltip(summary.live_total),
                amount_color_class(summary.live_total),
            ))

            (card(
                "Live Money",
                currency_rounded_with_tooltip(summary.live_money),
                amount_color_class(summary.live_money),
            ))
        }
    }
}
