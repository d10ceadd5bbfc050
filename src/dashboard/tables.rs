//! Table views for dashboard data display.

use maud::{Markup, html};

use crate::{
    account::{AccountBalance, live_balance_total},
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
};

/// Renders a table of every account and its live balance with a total row.
pub(super) fn live_balances_table(balances: &[AccountBalance]) -> Markup {
    if balances.is_empty() {
        return html! {};
    }

    let total = live_balance_total(balances);

    html! {
        div
        {
            h3 class="text-xl font-semibold mb-4" { "Account Balances" }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE)
                            {
                                "Account"
                            }
                            th scope="col" class="px-6 py-3 text-right"
                            {
                                "Balance"
                            }
                        }
                    }

                    tbody
                    {
                        @for balance in balances {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th
                                    scope="row"
                                    class="px-6 py-4 font-medium text-gray-900
                                        whitespace-nowrap dark:text-white"
                                {
                                    (balance.account.name)
                                }

                                td class="px-6 py-4 text-right"
                                {
                                    (format_currency(balance.live))
                                }
                            }
                        }
                    }

                    tfoot
                    {
                        tr class="font-semibold text-gray-900 dark:text-white"
                        {
                            th scope="row" class=(TABLE_CELL_STYLE)
                            {
                                "Total"
                            }
                            td class="px-6 py-4 text-right"
                            {
                                (format_currency(total))
                            }
                        }
                    }
                }
            }
        }
    }
}
