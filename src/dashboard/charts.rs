//! Chart generation for the dashboard.
//!
//! Builds the ECharts configurations for the daily expenses bar chart, the
//! six-month expense trend line and the budget-vs-actual bar chart. Each
//! chart is serialized to JSON and initialized by a small script in the page
//! head.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::{Bar, Line},
};
use maud::PreEscaped;

use crate::{dashboard::aggregation::BudgetVsActual, html::HeadElement};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Bar chart of expenses per day for the current month.
pub(super) fn daily_expenses_chart(labels: Vec<String>, values: Vec<f64>) -> Chart {
    Chart::new()
        .title(Title::new().text("Daily Expenses").subtext("This month"))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Expenses").data(values))
}

/// Line chart of total expenses per month over the last six months.
pub(super) fn trend_chart(labels: Vec<String>, values: Vec<f64>) -> Chart {
    Chart::new()
        .title(
            Title::new()
                .text("Expense Trend")
                .subtext("Last six months"),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Expenses").data(values))
}

/// Grouped bar chart comparing budgeted limits against actual spend per
/// category for the current month.
pub(super) fn budget_chart(data: BudgetVsActual) -> Chart {
    Chart::new()
        .title(
            Title::new()
                .text("Budget vs Actual")
                .subtext("This month, budgeted categories"),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("8%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(data.labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            Bar::new()
                .name("Budgeted")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(data.budgeted),
        )
        .series(
            Bar::new()
                .name("Spent")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(data.spent),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
